//! Token handling and request authentication for Rxdesk services.
//!
//! Provides JWT issuance/validation, bearer header parsing, the `Identity`
//! extractor and the role-based authorization check.

pub mod identity;
pub mod token;
