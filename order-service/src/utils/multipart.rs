use axum::extract::Multipart;
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::collections::HashMap;
use std::str::FromStr;

/// Largest accepted upload (images and receipts).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct FormFile {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A fully read `multipart/form-data` body: text fields by name plus file parts.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, FormFile>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            AppError::BadRequest(anyhow::anyhow!("Failed to read multipart field: {}", e))
        })? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| {
                            AppError::BadRequest(anyhow::anyhow!("Failed to read file bytes: {}", e))
                        })?
                        .to_vec();

                    if data.len() > MAX_UPLOAD_BYTES {
                        return Err(AppError::BadRequest(anyhow::anyhow!(
                            "File too large (max 5MB)"
                        )));
                    }

                    // An empty file input still arrives as a part with no bytes.
                    if !data.is_empty() {
                        form.files.insert(
                            name,
                            FormFile {
                                filename,
                                content_type,
                                data,
                            },
                        );
                    }
                }
                None => {
                    let value = field.text().await.map_err(|e| {
                        AppError::BadRequest(anyhow::anyhow!("Failed to read field {}: {}", name, e))
                    })?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    /// Trimmed text value; blank counts as absent.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn required_text(&self, name: &str) -> Result<String, AppError> {
        self.text(name)
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("{} is required", name)))
    }

    pub fn parse<T: FromStr>(&self, name: &str) -> Result<Option<T>, AppError> {
        self.text(name)
            .map(|v| {
                v.parse::<T>()
                    .map_err(|_| AppError::BadRequest(anyhow::anyhow!("{} is invalid: {}", name, v)))
            })
            .transpose()
    }

    pub fn required<T: FromStr>(&self, name: &str) -> Result<T, AppError> {
        self.parse(name)?
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("{} is required", name)))
    }

    pub fn decimal(&self, name: &str) -> Result<Decimal, AppError> {
        self.required::<Decimal>(name)
    }

    pub fn take_file(&mut self, name: &str) -> Option<FormFile> {
        self.files.remove(name)
    }
}
