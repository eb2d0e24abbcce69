pub mod config;
pub mod connection;
pub mod protocol;

pub use config::*;
pub use connection::*;
pub use protocol::*;
