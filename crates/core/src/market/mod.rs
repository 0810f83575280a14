//! Marketplace domain models and store contracts.

mod model;
mod traits;

pub use model::*;
pub use traits::*;
