//! Per-term pagination cursor and its string encoding in the shared store

/// Identifier assigned by the search service to each item
///
/// Identifiers grow monotonically, so numeric order is arrival order.
pub type ItemId = u64;

pub const NEWEST_ID: &str = "newest_id";
pub const OLDEST_ID: &str = "oldest_id";
pub const LAST_SUCCESS: &str = "last_success";
pub const SUCCESS: &str = "success";

/// Hash fields making up a cursor, in the order `TermCursor::from_fields` expects
pub const CURSOR_FIELDS: [&str; 4] = [NEWEST_ID, OLDEST_ID, LAST_SUCCESS, SUCCESS];

/// Stored placeholder for an absent identifier
const NULL: &str = "null";

/// The persisted pagination state of one search term
///
/// A term that has never been fetched has every field absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TermCursor {
    /// Most recent item known as of the last fetch that did not leave a gap
    pub newest_id: Option<ItemId>,

    /// Oldest item returned by the most recent fetch
    pub oldest_id: Option<ItemId>,

    /// Point at which the backlog was last known to be fully drained
    pub last_success: Option<ItemId>,

    /// Whether the most recent fetch retrieved everything above the previous high-water mark
    pub success: Option<bool>,
}

impl TermCursor {
    /// Whether the previous fetch drained the term
    ///
    /// An absent flag counts as drained: a term that was never fetched has no
    /// outstanding gap to resume into.
    pub fn previous_succeeded(&self) -> bool {
        self.success.unwrap_or(true)
    }

    /// Whether the cursor has never been written
    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }

    /// Decodes a cursor from the raw values of `CURSOR_FIELDS`
    ///
    /// Missing, `null` and malformed values all decode as absent, so a
    /// corrupted record degrades to a resync instead of failing the term.
    pub fn from_fields(values: &[Option<String>]) -> Self {
        let get = |i: usize| values.get(i).and_then(|v| v.as_deref());

        Self {
            newest_id: parse_id(get(0)),
            oldest_id: parse_id(get(1)),
            last_success: parse_id(get(2)),
            success: parse_flag(get(3)),
        }
    }

    /// Encodes the cursor as `(field, value)` pairs for a multi-field write
    pub fn to_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            (NEWEST_ID, encode_id(self.newest_id)),
            (OLDEST_ID, encode_id(self.oldest_id)),
            (LAST_SUCCESS, encode_id(self.last_success)),
            (
                SUCCESS,
                match self.success {
                    Some(true) => "true".to_string(),
                    Some(false) => "false".to_string(),
                    None => NULL.to_string(),
                },
            ),
        ]
    }
}

fn parse_id(raw: Option<&str>) -> Option<ItemId> {
    match raw.map(str::trim) {
        None | Some(NULL) => None,
        Some(s) => match s.parse::<ItemId>() {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!("Ignoring malformed cursor identifier {:?}", s);
                None
            }
        },
    }
}

fn parse_flag(raw: Option<&str>) -> Option<bool> {
    match raw.map(str::trim) {
        Some("true") => Some(true),
        Some("false") => Some(false),
        None | Some(NULL) => None,
        Some(other) => {
            tracing::warn!("Ignoring malformed cursor success flag {:?}", other);
            None
        }
    }
}

fn encode_id(id: Option<ItemId>) -> String {
    id.map(|v| v.to_string()).unwrap_or_else(|| NULL.to_string())
}
