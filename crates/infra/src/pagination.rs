use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Resolve a client-supplied page size, falling back to the default and
/// clamping into `1..=MAX_PAGE_SIZE`.
pub fn page_size(requested: Option<i32>) -> i64 {
    requested
        .map(i64::from)
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE)
}

/// Position in a newest-first listing ordered by `(created_at, id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keyset {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

impl Keyset {
    pub fn new(created_at: DateTime<Utc>, id: Uuid) -> Self {
        Self { created_at, id }
    }

    /// True when a row at `(created_at, id)` belongs on a page that starts
    /// after this position, i.e. it sorts strictly later in descending order.
    pub fn admits(&self, created_at: DateTime<Utc>, id: Uuid) -> bool {
        (created_at, id) < (self.created_at, self.id)
    }
}
