//! Network quality classification, tier policy and the connectivity monitor.

mod image;
mod model;
mod monitor;
mod policy;

pub use image::*;
pub use model::*;
pub use monitor::*;
pub use policy::*;
