pub mod clock;
pub mod connection;
pub mod models;
pub mod service;

pub use connection::{LogStore, StoreError};
pub use models::*;
