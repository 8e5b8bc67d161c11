pub mod error;
pub mod models;
pub mod routes;
pub mod routes_debug;

pub use error::ApiError;
