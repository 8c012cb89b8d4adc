//! Request body extraction with field validation.
//!
//! Malformed JSON and rule violations both answer 400 with
//! `{ "message": "Validation failed", "error": <details> }`; rule violations
//! list every failing field's message, joined with ", " in field-name order.
//! Bodies over [`MAX_BODY_BYTES`] answer 413.

use std::borrow::Cow;

use axum::Json;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use rxdesk_domain::schedule::{WeeklySchedule, is_clock_time};
use rxdesk_domain::user::UserRole;

use crate::error::{ApiError, PharmacyServiceError};

/// Largest accepted request body, enforced through `DefaultBodyLimit`.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// JSON body that has passed its `validator` rules.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => PharmacyServiceError::PayloadTooLarge {
                    limit: MAX_BODY_BYTES,
                }
                .during("Request entity too large"),
                _ => ApiError::validation(rejection.body_text()),
            })?;
        value
            .validate()
            .map_err(|errors| ApiError::validation(describe(&errors)))?;
        Ok(Self(value))
    }
}

/// Flatten field errors, including those of nested structs, into one line.
pub fn describe(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();
    collect_messages(errors, &mut messages);
    messages.join(", ")
}

fn collect_messages(errors: &ValidationErrors, out: &mut Vec<String>) {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));
    for (field, kind) in fields {
        match kind {
            ValidationErrorsKind::Field(errs) => {
                out.extend(errs.iter().map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{field} is invalid"),
                }));
            }
            ValidationErrorsKind::Struct(inner) => collect_messages(inner, out),
            ValidationErrorsKind::List(items) => {
                for inner in items.values() {
                    collect_messages(inner, out);
                }
            }
        }
    }
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// Optional `+`, then digits, whitespace, `-`, `(` and `)`.
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let rest = value.strip_prefix('+').unwrap_or(value);
    let ok = !rest.is_empty()
        && rest
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_whitespace() || matches!(c, '-' | '(' | ')'));
    if ok {
        Ok(())
    } else {
        Err(invalid("phone", "Please provide a valid phone number"))
    }
}

/// Three ASCII letters, e.g. `INR`. Case is normalised when the value is stored.
pub fn validate_currency(value: &str) -> Result<(), ValidationError> {
    if value.len() == 3 && value.bytes().all(|b| b.is_ascii_alphabetic()) {
        Ok(())
    } else {
        Err(invalid(
            "currency",
            "Currency must be a 3-letter code (e.g., INR, USD)",
        ))
    }
}

/// Every weekday needs 24-hour `open`/`close` times.
pub fn validate_working_hours(schedule: &WeeklySchedule) -> Result<(), ValidationError> {
    for (day, hours) in schedule.days() {
        if !is_clock_time(&hours.open) || !is_clock_time(&hours.close) {
            let mut err = invalid(
                "working_hours",
                "Working hours must use HH:MM 24-hour times for every day",
            );
            err.add_param(Cow::Borrowed("day"), &day);
            return Err(err);
        }
    }
    Ok(())
}

/// Administrators are only created by other administrators or at startup.
pub fn validate_self_service_role(role: &UserRole) -> Result<(), ValidationError> {
    if *role == UserRole::Admin {
        return Err(invalid(
            "role",
            "Role must be one of patient, doctor, pharmacist, partner",
        ));
    }
    Ok(())
}
