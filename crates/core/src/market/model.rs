//! Catalog, cart and vendor profile models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A catalog entry. Immutable from the client side except via full replace
/// (`save_products`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image_urls: Vec<String>,
    pub category: String,
    pub vendor_id: String,
    pub created_at: String,
    pub updated_at: String,
}

/// One cart line. Multiple lines may reference the same product; every
/// `add_to_cart` call creates a new row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub added_at: String,
}

/// Insert payload for a cart line. The store assigns the id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartItem {
    pub product_id: i32,
    pub quantity: i32,
}

/// Cached vendor profile, keyed by the vendor id string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorProfile {
    pub id: String,
    pub name: String,
    pub description: String,
    pub contact_info: String,
    pub location: String,
}
