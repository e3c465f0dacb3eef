pub mod manager;
pub mod models;

pub use manager::{connect_lazy, health_check, DatabaseError};
