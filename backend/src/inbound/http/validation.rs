//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every rejected field surfaces as `invalid_request` with
//! `details: {"field": ..., "code": ...}` so clients can highlight the
//! offending input.

use serde_json::json;

use crate::domain::{
    CredentialValidationError, Error, InvalidIdentifier, LotId, LotValidationError,
    RegistrationValidationError, ReservationId, SpotId, SpotNumberError, VehicleNumberError,
};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidValue,
    InvalidUuid,
    EmptyUpdate,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidValue => "invalid_value",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::EmptyUpdate => "empty_update",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &'static str {
        self.0
    }
}

pub(crate) fn field_error(field: FieldName, code: ErrorCode, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

fn invalid_value(field: &'static str, error: impl std::fmt::Display) -> Error {
    field_error(FieldName::new(field), ErrorCode::InvalidValue, error.to_string())
}

pub(crate) fn registration_error(error: RegistrationValidationError) -> Error {
    invalid_value(error.field(), error)
}

pub(crate) fn credentials_error(error: CredentialValidationError) -> Error {
    let field = match error {
        CredentialValidationError::InvalidEmail => "email",
        CredentialValidationError::EmptyPassword
        | CredentialValidationError::PasswordTooLong { .. } => "password",
    };
    invalid_value(field, error)
}

pub(crate) fn lot_error(error: LotValidationError) -> Error {
    invalid_value(error.field(), error)
}

pub(crate) fn spot_number_error(error: SpotNumberError) -> Error {
    invalid_value("number", error)
}

pub(crate) fn vehicle_number_error(error: VehicleNumberError) -> Error {
    invalid_value("vehicle_number", error)
}

pub(crate) fn empty_update_error() -> Error {
    field_error(
        FieldName::new("body"),
        ErrorCode::EmptyUpdate,
        "at least one field must be provided",
    )
}

fn identifier_error(field: FieldName, error: InvalidIdentifier) -> Error {
    field_error(field, ErrorCode::InvalidUuid, error.to_string())
}

pub(crate) fn parse_lot_id(field: FieldName, raw: &str) -> Result<LotId, Error> {
    LotId::new(raw).map_err(|error| identifier_error(field, error))
}

pub(crate) fn parse_spot_id(field: FieldName, raw: &str) -> Result<SpotId, Error> {
    SpotId::new(raw).map_err(|error| identifier_error(field, error))
}

pub(crate) fn parse_reservation_id(field: FieldName, raw: &str) -> Result<ReservationId, Error> {
    ReservationId::new(raw).map_err(|error| identifier_error(field, error))
}
