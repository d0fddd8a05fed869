//! Shared constants for end-to-end tests

// ============================================================================
// Test Accounts
// ============================================================================

pub const ALICE: &str = "alice";
pub const TOKEN_ALICE: &str = "token-alice";

pub const BOB: &str = "bob";
pub const TOKEN_BOB: &str = "token-bob";

pub const CAROL: &str = "carol";
pub const TOKEN_CAROL: &str = "token-carol";

/// Every test account with its tracker token.
pub const ACCOUNTS: &[(&str, &str)] = &[(ALICE, TOKEN_ALICE), (BOB, TOKEN_BOB), (CAROL, TOKEN_CAROL)];

// ============================================================================
// Timing
// ============================================================================

/// Upper bound for anything a test waits on
pub const TEST_TIMEOUT_MS: u64 = 5000;

/// 2023-11-14T22:13:20Z
pub const BASE_TIMESTAMP: i64 = 1_700_000_000;
