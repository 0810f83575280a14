//! SQLite repositories for the marketplace collections.

mod model;
mod repository;

pub use model::*;
pub use repository::*;
