//! Database models for products, cart lines and vendor profiles.

use std::str::FromStr;

use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use sokoni_core::market::{CartItem, Product, VendorProfile};
use sokoni_core::{Error, Result};

#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone, Serialize, Deserialize,
)]
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProductDB {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: String,
    pub image_urls: String,
    pub category: String,
    pub vendor_id: String,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<ProductDB> for Product {
    type Error = Error;

    fn try_from(row: ProductDB) -> Result<Self> {
        let price = Decimal::from_str(&row.price)
            .map_err(|e| Error::validation(format!("Invalid price '{}': {}", row.price, e)))?;
        let image_urls: Vec<String> = serde_json::from_str(&row.image_urls)?;
        Ok(Product {
            id: row.id,
            name: row.name,
            description: row.description,
            price,
            image_urls,
            category: row.category,
            vendor_id: row.vendor_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<&Product> for ProductDB {
    type Error = Error;

    fn try_from(product: &Product) -> Result<Self> {
        Ok(ProductDB {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.to_string(),
            image_urls: serde_json::to_string(&product.image_urls)?,
            category: product.category.clone(),
            vendor_id: product.vendor_id.clone(),
            created_at: product.created_at.clone(),
            updated_at: product.updated_at.clone(),
        })
    }
}

#[derive(Queryable, Identifiable, Selectable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::cart_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CartItemDB {
    pub id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub added_at: String,
}

impl From<CartItemDB> for CartItem {
    fn from(row: CartItemDB) -> Self {
        CartItem {
            id: row.id,
            product_id: row.product_id,
            quantity: row.quantity,
            added_at: row.added_at,
        }
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::cart_items)]
pub struct NewCartItemDB {
    pub product_id: i32,
    pub quantity: i32,
    pub added_at: String,
}

#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone, Serialize, Deserialize,
)]
#[diesel(table_name = crate::schema::vendor_profiles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct VendorProfileDB {
    pub id: String,
    pub name: String,
    pub description: String,
    pub contact_info: String,
    pub location: String,
}

impl From<VendorProfileDB> for VendorProfile {
    fn from(row: VendorProfileDB) -> Self {
        VendorProfile {
            id: row.id,
            name: row.name,
            description: row.description,
            contact_info: row.contact_info,
            location: row.location,
        }
    }
}

impl From<&VendorProfile> for VendorProfileDB {
    fn from(profile: &VendorProfile) -> Self {
        VendorProfileDB {
            id: profile.id.clone(),
            name: profile.name.clone(),
            description: profile.description.clone(),
            contact_info: profile.contact_info.clone(),
            location: profile.location.clone(),
        }
    }
}
