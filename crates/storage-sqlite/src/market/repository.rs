//! Repositories for products, cart and vendor profiles.
//!
//! Reads go straight to the pool; mutations run on the writer actor so each
//! logical operation is one all-or-nothing transaction.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;

use sokoni_core::market::{
    CartItem, CartStore, NewCartItem, Product, ProductStore, VendorProfile, VendorProfileStore,
};
use sokoni_core::{Error, Result};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{cart_items, products, vendor_profiles};

use super::model::{CartItemDB, NewCartItemDB, ProductDB, VendorProfileDB};

pub struct ProductRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ProductRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl ProductStore for ProductRepository {
    fn get_products(&self) -> Result<Vec<Product>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = products::table
            .load::<ProductDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(Product::try_from).collect()
    }

    fn get_products_by_category(&self, category: &str) -> Result<Vec<Product>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = products::table
            .filter(products::category.eq(category))
            .load::<ProductDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(Product::try_from).collect()
    }

    fn get_product(&self, product_id: i32) -> Result<Option<Product>> {
        let mut conn = get_connection(&self.pool)?;
        let row = products::table
            .find(product_id)
            .first::<ProductDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        row.map(Product::try_from).transpose()
    }

    async fn save_products(&self, incoming: Vec<Product>) -> Result<()> {
        let rows = incoming
            .iter()
            .map(ProductDB::try_from)
            .collect::<Result<Vec<_>>>()?;
        self.writer
            .exec(move |conn| {
                for row in rows {
                    diesel::insert_into(products::table)
                        .values(&row)
                        .on_conflict(products::id)
                        .do_update()
                        .set(&row)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(())
            })
            .await
    }
}

pub struct CartRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl CartRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl CartStore for CartRepository {
    async fn add_to_cart(&self, item: NewCartItem) -> Result<CartItem> {
        if item.quantity <= 0 {
            return Err(Error::validation(format!(
                "Cart quantity must be positive, got {}",
                item.quantity
            )));
        }
        self.writer
            .exec(move |conn| {
                let row = NewCartItemDB {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    added_at: Utc::now().to_rfc3339(),
                };
                let inserted = diesel::insert_into(cart_items::table)
                    .values(&row)
                    .returning(CartItemDB::as_returning())
                    .get_result::<CartItemDB>(conn)
                    .map_err(StorageError::from)?;
                Ok(CartItem::from(inserted))
            })
            .await
    }

    fn get_cart(&self) -> Result<Vec<CartItem>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = cart_items::table
            .load::<CartItemDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(CartItem::from).collect())
    }

    async fn clear_cart(&self) -> Result<()> {
        self.writer
            .exec(move |conn| {
                diesel::delete(cart_items::table)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}

pub struct VendorProfileRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl VendorProfileRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl VendorProfileStore for VendorProfileRepository {
    fn get_vendor_profile(&self, vendor_id: &str) -> Result<Option<VendorProfile>> {
        let mut conn = get_connection(&self.pool)?;
        let row = vendor_profiles::table
            .find(vendor_id)
            .first::<VendorProfileDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(VendorProfile::from))
    }

    async fn save_vendor_profiles(&self, profiles: Vec<VendorProfile>) -> Result<()> {
        let rows: Vec<VendorProfileDB> = profiles.iter().map(VendorProfileDB::from).collect();
        self.writer
            .exec(move |conn| {
                for row in rows {
                    diesel::insert_into(vendor_profiles::table)
                        .values(&row)
                        .on_conflict(vendor_profiles::id)
                        .do_update()
                        .set(&row)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(())
            })
            .await
    }
}
