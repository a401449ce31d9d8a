use serde::{Deserialize, Serialize};

/// A user's rating. Stars double as the maximum number of books the user
/// may hold concurrently.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rating {
    pub stars: u32,
}

impl Rating {
    /// The rating backend's own invariant: `1 <= stars <= 100`. The
    /// gateway sends signed deltas and lets the backend own the clamp;
    /// these constants exist for the quota check and tests, not to
    /// re-clamp a value the gateway doesn't own.
    pub const MIN_STARS: u32 = 1;
    pub const MAX_STARS: u32 = 100;
}
