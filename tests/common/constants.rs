//! Shared constants for integration tests
//!
//! Every canned response of the fake service is keyed by one of these.

#![allow(dead_code)]

// ============================================================================
// App ids
// ============================================================================

/// Has three pages of reviews, one review repeated across pages.
pub const APP_WITH_REVIEWS: u64 = 100;

/// Steam answers with `success: 2`.
pub const APP_STEAM_FAILURE: u64 = 200;

/// Every endpoint answers 404.
pub const APP_MISSING: u64 = 404;

/// SteamSpy knows the app but has no playtime figure.
pub const APP_WITHOUT_PLAYTIME: u64 = 300;

/// Distinct reviews served for [`APP_WITH_REVIEWS`].
pub const DISTINCT_REVIEWS: usize = 5;

/// Median playtime SteamSpy reports for [`APP_WITH_REVIEWS`], in minutes.
pub const MEDIAN_PLAYTIME_MINUTES: u64 = 150;

// ============================================================================
// Classifier replies
// ============================================================================

/// Review text the fake model scores as joyful.
pub const JOYFUL_REVIEW: &str = "Absolutely wonderful game";

/// Review text the fake model scores as angry.
pub const ANGRY_REVIEW: &str = "Refunded after an hour";

/// Review text for which the fake model returns an HTTP error.
pub const BROKEN_REVIEW: &str = "trigger server error";

/// Review text for which the fake model returns prose instead of JSON.
pub const PROSE_REVIEW: &str = "trigger prose reply";

/// Model name reported by the fake Ollama.
pub const FAKE_MODEL: &str = "fake-model";

/// Timeout for the fake service to start accepting connections.
pub const SERVICE_READY_TIMEOUT_MS: u64 = 5000;
