//! Crate-wide error taxonomy.
//!
//! Every operation reports one specific variant; callers propagate them with `?`
//! and never fold them into a generic failure.

use std::collections::TryReserveError;

use crate::object::ObjectKind;

/// Result type for all wlz-engine operations.
pub type Result<T> = std::result::Result<T, WlzError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WlzError {
    #[error("invalid parameter: {0}")]
    InvalidParam(&'static str),
    #[error("memory allocation failed")]
    AllocationError,
    #[error("required parameter is null: {0}")]
    NullParam(&'static str),
    #[error("object domain is null")]
    DomainNull,
    #[error("object values are null")]
    ValuesNull,
    #[error("domain variant does not match a 2D domain object")]
    DomainTypeMismatch,
    #[error("domain is not a plane domain")]
    PlaneDomainTypeMismatch,
    #[error("value table variant does not match the object")]
    ValueTableTypeMismatch,
    #[error("grey type {0} is not valid here")]
    InvalidGreyType(&'static str),
    #[error("unsupported object kind: {0:?}")]
    UnsupportedObjectKind(ObjectKind),
    #[error("invalid index range {first}..={last}")]
    InvalidRange { first: usize, last: usize },
    #[error("transform failed: {0}")]
    TransformError(String),
    #[error("object nesting exceeds {max} levels")]
    NestingTooDeep { max: usize },
    #[error("object codec error: {0}")]
    Codec(String),
}

impl From<TryReserveError> for WlzError {
    fn from(_: TryReserveError) -> Self {
        Self::AllocationError
    }
}

impl From<quick_xml::DeError> for WlzError {
    fn from(err: quick_xml::DeError) -> Self {
        Self::Codec(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(WlzError::DomainNull.to_string(), "object domain is null");
        assert_eq!(
            WlzError::InvalidRange { first: 4, last: 2 }.to_string(),
            "invalid index range 4..=2"
        );
        assert_eq!(
            WlzError::UnsupportedObjectKind(ObjectKind::Transform).to_string(),
            "unsupported object kind: Transform"
        );
    }

    #[test]
    fn test_try_reserve_maps_to_allocation_error() {
        let mut v: Vec<u64> = Vec::new();
        let err = v.try_reserve_exact(usize::MAX).unwrap_err();
        assert_eq!(WlzError::from(err), WlzError::AllocationError);
    }
}
