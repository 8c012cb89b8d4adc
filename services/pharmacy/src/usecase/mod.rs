pub mod account;
pub mod bootstrap;
pub mod pharmacy_config;
pub mod staff;
