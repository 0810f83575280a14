//! First-run demonstration dataset.
//!
//! Seeding is idempotent: products and vendor profiles are keyed upserts,
//! demo cart lines are only inserted into an empty cart. Safe to run on
//! every startup.

use chrono::Utc;
use diesel::prelude::*;

use sokoni_core::Result;

use crate::db::WriteHandle;
use crate::errors::StorageError;
use crate::market::{NewCartItemDB, ProductDB, VendorProfileDB};
use crate::schema::{cart_items, products, vendor_profiles};

fn demo_products(now: &str) -> Vec<ProductDB> {
    let product = |id: i32, name: &str, description: &str, price: &str, category: &str, vendor: &str| {
        ProductDB {
            id,
            name: name.to_string(),
            description: description.to_string(),
            price: price.to_string(),
            image_urls: "[\"https://images.unsplash.com/photo-1600585154340-be6161a56a0c\"]"
                .to_string(),
            category: category.to_string(),
            vendor_id: vendor.to_string(),
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    };
    vec![
        product(
            1,
            "Handwoven Basket",
            "Traditional handwoven basket made from natural fibers.",
            "25.99",
            "Crafts",
            "vendor1",
        ),
        product(
            2,
            "Organic Coffee Beans",
            "Locally grown organic coffee beans from the Northwest Region.",
            "12.50",
            "Food",
            "vendor2",
        ),
        product(
            3,
            "Beaded Necklace",
            "Handcrafted beaded necklace with vibrant colors.",
            "15.00",
            "Jewelry",
            "vendor1",
        ),
        product(
            4,
            "Wooden Sculpture",
            "Intricately carved wooden sculpture from local artisans.",
            "45.00",
            "Crafts",
            "vendor3",
        ),
        product(
            5,
            "Traditional Drum",
            "Handmade drum with authentic regional designs.",
            "60.00",
            "Music",
            "vendor1",
        ),
        product(
            6,
            "Palm Oil",
            "Pure, locally sourced palm oil for cooking.",
            "8.99",
            "Food",
            "vendor2",
        ),
        product(
            7,
            "Embroidered Fabric",
            "Colorful embroidered fabric for traditional attire.",
            "30.00",
            "Textiles",
            "vendor3",
        ),
        product(
            8,
            "Leather Sandals",
            "Handcrafted leather sandals with durable stitching.",
            "22.50",
            "Fashion",
            "vendor4",
        ),
    ]
}

fn demo_vendor_profiles() -> Vec<VendorProfileDB> {
    let profile = |id: &str, name: &str, description: &str, contact: &str, location: &str| {
        VendorProfileDB {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            contact_info: contact.to_string(),
            location: location.to_string(),
        }
    };
    vec![
        profile(
            "vendor1",
            "Cameroon Crafts Co.",
            "Specializing in traditional crafts and jewelry.",
            "contact@camcrafts.example",
            "Bamenda",
        ),
        profile(
            "vendor2",
            "Highland Coffee Farms",
            "Organic coffee and tea from the Northwest Region.",
            "info@highlandcoffee.example",
            "Buea",
        ),
        profile(
            "vendor3",
            "Artisan Collective",
            "Handcrafted sculptures, textiles and ceramics.",
            "artisan@collective.example",
            "Yaounde",
        ),
        profile(
            "vendor4",
            "Leatherworks",
            "Quality leather goods and accessories.",
            "leatherworks@shop.example",
            "Douala",
        ),
    ]
}

/// Seed the demonstration dataset in one transaction.
pub async fn seed_demo_data(writer: &WriteHandle) -> Result<()> {
    writer
        .exec(move |conn| {
            let now = Utc::now().to_rfc3339();

            for row in demo_products(&now) {
                diesel::insert_into(products::table)
                    .values(&row)
                    .on_conflict(products::id)
                    .do_update()
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
            }

            for row in demo_vendor_profiles() {
                diesel::insert_into(vendor_profiles::table)
                    .values(&row)
                    .on_conflict(vendor_profiles::id)
                    .do_update()
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
            }

            // Cart lines have auto-increment ids, so a keyed upsert cannot
            // make them idempotent; only seed an empty cart.
            let cart_count: i64 = cart_items::table
                .count()
                .get_result(conn)
                .map_err(StorageError::from)?;
            if cart_count == 0 {
                let lines = [(1, 2), (2, 1), (4, 1)];
                for (product_id, quantity) in lines {
                    diesel::insert_into(cart_items::table)
                        .values(&NewCartItemDB {
                            product_id,
                            quantity,
                            added_at: now.clone(),
                        })
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
            }

            Ok(())
        })
        .await
}
