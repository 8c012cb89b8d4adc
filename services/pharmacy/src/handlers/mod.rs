pub mod admin;
pub mod auth;
pub mod pharmacy_config;
pub mod system;
pub mod validation;
