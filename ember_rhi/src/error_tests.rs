//! Unit tests for error.rs
//!
//! Tests all Error variants and their implementations (Display, Debug, Clone, std::error::Error).

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("vkCreateRenderPass failed".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("vkCreateRenderPass failed"));
}

#[test]
fn test_out_of_memory_display() {
    assert_eq!(format!("{}", Error::OutOfMemory), "Out of GPU memory");
}

#[test]
fn test_invalid_config_display() {
    let err = Error::InvalidConfig("no catch-all buffer".to_string());
    let display = format!("{}", err);
    assert!(display.starts_with("Invalid configuration"));
    assert!(display.contains("no catch-all buffer"));
}

#[test]
fn test_contract_violation_display() {
    let err = Error::ContractViolation("dangling input attachment".to_string());
    assert_eq!(format!("{}", err), "Contract violation: dangling input attachment");
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::OutOfMemory;
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_from_serde_json() {
    let parse: std::result::Result<u32, serde_json::Error> = serde_json::from_str("{ nope");
    let err: Error = parse.unwrap_err().into();
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn test_result_question_mark_propagation() {
    fn inner() -> Result<u32> {
        Err(Error::InvalidResource("texture".to_string()))
    }
    fn outer() -> Result<u32> {
        let value = inner()?;
        Ok(value + 1)
    }
    assert_eq!(outer(), Err(Error::InvalidResource("texture".to_string())));
}
