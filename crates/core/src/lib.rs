//! Domain models and contracts for the sokoni offline sync core.

pub mod errors;
pub mod market;
pub mod network;
pub mod sync;

pub use errors::{DatabaseError, Error, Result};
