pub mod camera;
pub mod entity;
pub mod focus;
pub mod store;

pub use camera::*;
pub use entity::*;
pub use focus::*;
pub use store::*;
