pub mod store;
pub mod tracker;

pub use store::*;
pub use tracker::*;
