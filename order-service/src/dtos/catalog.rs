use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100, message = "nama_kategori must be 1-100 characters"))]
    pub nama_kategori: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentMethodRequest {
    #[validate(length(min = 1, max = 100, message = "nama_metode must be 1-100 characters"))]
    pub nama_metode: String,
    #[serde(default)]
    pub is_active: bool,
}
