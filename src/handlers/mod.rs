pub mod admin;
pub mod auth;
pub mod master;
pub mod public;
