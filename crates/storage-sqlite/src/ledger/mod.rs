//! The durable sync-operation ledger.

mod model;
mod repository;

pub use model::*;
pub use repository::*;
