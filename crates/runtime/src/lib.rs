pub mod backoff;
pub mod event_bus;
pub mod throttle;

pub use backoff::*;
pub use event_bus::*;
pub use throttle::*;
