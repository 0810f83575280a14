//! Sync ledger models, policy and contracts.

mod ledger;
mod model;
mod policy;

pub use ledger::*;
pub use model::*;
pub use policy::*;
