//! sea-orm entities for the pharmacy store.

pub mod doctors;
pub mod partners;
pub mod patients;
pub mod pharmacy_config;
pub mod staff;
pub mod users;
