//! SQLite-backed Local Durable Store: product cache, cart, vendor profiles
//! and the sync-operation ledger.

pub mod db;
pub mod errors;
pub mod ledger;
pub mod market;
pub mod schema;
pub mod seed;

pub use db::{create_pool, get_connection, init, run_migrations, spawn_writer, DbPool, WriteHandle};
pub use errors::StorageError;
pub use ledger::SyncQueueRepository;
pub use market::{CartRepository, ProductRepository, VendorProfileRepository};
