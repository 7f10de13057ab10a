//! Centralized default constants for the packmate system.
//!
//! **This module is the single source of truth** for shared default values.
//! All crates should reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// TRIPS
// =============================================================================

/// Categories seeded onto every new trip, in display order.
pub const DEFAULT_CATEGORIES: [&str; 5] = [
    "General",
    "Clothing",
    "Toiletries",
    "Electronics",
    "Documents",
];

/// Category assigned to items created without an explicit category.
pub const DEFAULT_ITEM_CATEGORY: &str = "General";

// =============================================================================
// DISPLAY
// =============================================================================

/// Fixed display offset for rendered timestamps, in seconds east of UTC.
/// UTC+5:30 (IST) — presentation only, the stored timestamp stays UTC.
pub const DISPLAY_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// strftime pattern for rendered item timestamps.
pub const DISPLAY_TIME_FORMAT: &str = "%d %b %Y, %I:%M %p";

// =============================================================================
// ASSISTANT
// =============================================================================

/// Maximum retained conversation turns per conversation. Oldest dropped first.
pub const HISTORY_CAP: usize = 20;

/// Attribution display name for assistant-confirmed additions when the
/// current user has no known display name.
pub const ASSISTANT_ATTRIBUTION: &str = "AI Assistant";

/// Fixed reply substituted for any generation or parse failure.
pub const FALLBACK_REPLY: &str = "Sorry, I'm having trouble thinking right now.";

/// Default generation model.
pub const GEN_MODEL: &str = "gemini-2.0-flash";

/// Timeout for generation requests (seconds).
pub const GEN_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;

// =============================================================================
// CALENDAR
// =============================================================================

/// IANA timezone attached to created calendar events.
pub const CALENDAR_TIMEZONE: &str = "Asia/Kolkata";

/// Duration of created calendar events, in hours.
pub const CALENDAR_EVENT_HOURS: i64 = 1;
