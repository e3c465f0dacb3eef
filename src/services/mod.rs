pub mod accessors;
pub mod auth_service;
pub mod cache;
pub mod profile;
pub mod tenancy;
