//! Domain types shared across Rxdesk crates.
//!
//! This crate contains only pure types with no framework dependencies.
//! Import in `usecase/` and `domain/` layers as well as the token crate.

pub mod id;
pub mod schedule;
pub mod user;
