//! Input validation tests
//!
//! Tests for the request input checks in subscription-api.

use spotter_types::RequestMode;

/// Maximum length for actor names (must match handler constant)
const MAX_ACTOR_LEN: usize = 64;

/// Validate an actor name (mirrors the handler logic for testing)
fn validate_actor(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Actor name cannot be empty");
    }
    if name.len() > MAX_ACTOR_LEN {
        return Err("Actor name too long");
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '@' | ':'))
    {
        return Err("Invalid characters in actor name");
    }
    Ok(())
}

// ============================================================================
// Valid Actor Names
// ============================================================================

#[test]
fn test_valid_simple_actor() {
    assert!(validate_actor("frontdesk").is_ok());
}

#[test]
fn test_valid_email_actor() {
    assert!(validate_actor("coach.anna@example.com").is_ok());
}

#[test]
fn test_valid_system_actor() {
    assert!(validate_actor("system:stale-request-reaper").is_ok());
}

#[test]
fn test_valid_max_length_actor() {
    let name = "a".repeat(MAX_ACTOR_LEN);
    assert!(validate_actor(&name).is_ok());
}

// ============================================================================
// Invalid Actor Names
// ============================================================================

#[test]
fn test_invalid_empty_actor() {
    assert!(validate_actor("").is_err());
    assert!(validate_actor("  ").is_err());
}

#[test]
fn test_invalid_too_long_actor() {
    let name = "a".repeat(MAX_ACTOR_LEN + 1);
    assert!(validate_actor(&name).is_err());
}

#[test]
fn test_invalid_space_in_actor() {
    assert!(validate_actor("front desk").is_err());
}

#[test]
fn test_invalid_quote_injection() {
    assert!(validate_actor("admin'--").is_err());
}

#[test]
fn test_invalid_angle_bracket_xss() {
    assert!(validate_actor("admin<script>").is_err());
}

#[test]
fn test_invalid_newline_log_injection() {
    assert!(validate_actor("admin\nINFO forged").is_err());
}

#[test]
fn test_invalid_unicode_homoglyph() {
    // Cyrillic 'а' looks like ASCII 'a' but is different
    assert!(validate_actor("аdmin").is_err());
}

// ============================================================================
// Path Ids
// ============================================================================

#[test]
fn test_valid_uuid_user_id() {
    let uuid = "550e8400-e29b-41d4-a716-446655440000";
    assert!(uuid::Uuid::parse_str(uuid).is_ok());
}

#[test]
fn test_invalid_id_formats() {
    let invalid_ids = [
        "",
        "42",
        "not-a-uuid",
        "550e8400-e29b-41d4-a716",
        "550e8400-e29b-41d4-a716-446655440000-extra",
        "' OR 1=1 --",
        "../../../etc/passwd",
    ];

    for id in invalid_ids {
        assert!(uuid::Uuid::parse_str(id).is_err(), "Should reject: {}", id);
    }
}

// ============================================================================
// Request Bodies
// ============================================================================

#[test]
fn test_request_mode_wire_names() {
    let parse = |s: &str| serde_json::from_value::<RequestMode>(serde_json::json!(s));

    assert_eq!(parse("new").unwrap(), RequestMode::New);
    assert_eq!(parse("renewal").unwrap(), RequestMode::Renewal);
    assert_eq!(parse("advance_payment").unwrap(), RequestMode::AdvancePayment);
    assert!(parse("upgrade").is_err());
    assert!(parse("NEW").is_err());
}

#[test]
fn test_request_mode_defaults_to_new() {
    assert_eq!(RequestMode::default(), RequestMode::New);
}

#[test]
fn test_periods_reject_negative_values() {
    // Periods deserialize as u32, so a negative count never reaches the engine
    let parsed = serde_json::from_value::<u32>(serde_json::json!(-1));
    assert!(parsed.is_err());
}
