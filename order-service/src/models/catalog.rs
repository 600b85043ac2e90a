//! Menu reference data: categories, products and payment methods.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i64,
    #[serde(rename = "nama_kategori")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i64,
    #[serde(rename = "nama_produk")]
    pub name: String,
    #[serde(rename = "deskripsi")]
    pub description: Option<String>,
    #[serde(rename = "harga")]
    pub price: Decimal,
    #[serde(rename = "kategori_id")]
    pub category_id: i64,
    #[serde(rename = "gambar_url")]
    pub image_url: Option<String>,
}

/// Product as listed on the public menu.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductWithCategory {
    #[serde(flatten)]
    pub product: Product,
    #[serde(rename = "kategori")]
    pub category: Option<Category>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category_id: i64,
    pub image_url: Option<String>,
}

/// Full replacement of the editable product fields. `image_url` of `None`
/// keeps the stored image.
#[derive(Debug, Clone)]
pub struct ProductUpdate {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category_id: i64,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PaymentMethod {
    pub id: i64,
    #[serde(rename = "nama_metode")]
    pub name: String,
    pub is_active: bool,
    #[serde(rename = "nomor_rekening")]
    pub account_number: Option<String>,
    #[serde(rename = "nama_rekening")]
    pub account_holder: Option<String>,
    #[serde(rename = "gambar_qris_url")]
    pub qris_image_url: Option<String>,
}

impl PaymentMethod {
    pub fn is_cash(&self) -> bool {
        self.name.eq_ignore_ascii_case(super::CASH_METHOD_NAME)
    }
}

#[derive(Debug, Clone)]
pub struct NewPaymentMethod {
    pub name: String,
    pub is_active: bool,
}

/// `qris_image_url` of `None` keeps the stored image.
#[derive(Debug, Clone)]
pub struct PaymentMethodUpdate {
    pub name: String,
    pub account_number: Option<String>,
    pub account_holder: Option<String>,
    pub qris_image_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(name: &str) -> PaymentMethod {
        PaymentMethod {
            id: 1,
            name: name.to_string(),
            is_active: true,
            account_number: None,
            account_holder: None,
            qris_image_url: None,
        }
    }

    #[test]
    fn cash_is_matched_case_insensitively() {
        assert!(method("Cash").is_cash());
        assert!(method("CASH").is_cash());
        assert!(method("cash").is_cash());
        assert!(!method("Cashless").is_cash());
        assert!(!method("Pakasir").is_cash());
    }

    #[test]
    fn product_serializes_with_storefront_field_names() {
        let product = Product {
            id: 7,
            name: "Es Teh".to_string(),
            description: None,
            price: Decimal::new(5000, 0),
            category_id: 2,
            image_url: Some("https://cdn.example/es-teh.png".to_string()),
        };

        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["nama_produk"], "Es Teh");
        assert_eq!(json["kategori_id"], 2);
        assert_eq!(json["harga"], 5000.0);
    }
}
