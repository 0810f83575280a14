//! Store contracts implemented by the durable storage crate.
//!
//! The queue, facade and worker take these as injected dependencies so tests
//! can substitute fakes without touching global state.

use async_trait::async_trait;

use super::{CartItem, NewCartItem, Product, VendorProfile};
use crate::Result;

#[async_trait]
pub trait ProductStore: Send + Sync {
    fn get_products(&self) -> Result<Vec<Product>>;
    fn get_products_by_category(&self, category: &str) -> Result<Vec<Product>>;
    fn get_product(&self, product_id: i32) -> Result<Option<Product>>;
    /// Full replace of the listed products, all-or-nothing.
    async fn save_products(&self, products: Vec<Product>) -> Result<()>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn add_to_cart(&self, item: NewCartItem) -> Result<CartItem>;
    fn get_cart(&self) -> Result<Vec<CartItem>>;
    async fn clear_cart(&self) -> Result<()>;
}

#[async_trait]
pub trait VendorProfileStore: Send + Sync {
    fn get_vendor_profile(&self, vendor_id: &str) -> Result<Option<VendorProfile>>;
    async fn save_vendor_profiles(&self, profiles: Vec<VendorProfile>) -> Result<()>;
}
