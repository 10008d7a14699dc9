/// Work item state definitions for tracking crawl progress
///
/// Every discovered URL walks the same state machine:
///
/// ```text
/// Discovered -> Enqueued -> Fetching -> Fetched -> [Parsed ->] Persisted
///                                   \-> Failed (from Fetching, Fetched or Parsed)
/// ```
///
/// There is no retrying state: a failure is final for the run.
use std::fmt;

/// Whether a work item is crawled for further links or only saved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// HTML page, parsed for further links and assets
    Page,

    /// Image, script, stylesheet or media file; fetched and saved, never parsed
    Asset,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Asset => "asset",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents the current state of a work item in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemState {
    // ===== Active States =====
    /// URL was found in markup but not yet offered to the frontier
    Discovered,

    /// URL is claimed in the visited set and waiting in a queue
    Enqueued,

    /// A worker is fetching the URL
    Fetching,

    /// Response body received
    Fetched,

    /// Page markup was parsed and its links pushed to the frontier
    Parsed,

    // ===== Terminal States =====
    /// Content was written to the mirror
    Persisted,

    /// Fetch or write failed; the URL is not retried
    Failed,
}

impl ItemState {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Persisted | Self::Failed)
    }

    /// Returns true if the item ended up on disk
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Persisted)
    }

    /// Checks whether moving from `self` to `next` follows the state machine
    pub fn can_transition_to(&self, next: ItemState) -> bool {
        use ItemState::*;
        matches!(
            (self, next),
            (Discovered, Enqueued)
                | (Enqueued, Fetching)
                // Assets reused from a previous run skip the network
                | (Enqueued, Persisted)
                | (Fetching, Fetched)
                | (Fetching, Failed)
                | (Fetched, Parsed)
                | (Fetched, Persisted)
                | (Fetched, Failed)
                | (Parsed, Persisted)
                | (Parsed, Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Enqueued => "enqueued",
            Self::Fetching => "fetching",
            Self::Fetched => "fetched",
            Self::Parsed => "parsed",
            Self::Persisted => "persisted",
            Self::Failed => "failed",
        }
    }

    /// Returns all possible item states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Discovered,
            Self::Enqueued,
            Self::Fetching,
            Self::Fetched,
            Self::Parsed,
            Self::Persisted,
            Self::Failed,
        ]
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!ItemState::Discovered.is_terminal());
        assert!(!ItemState::Enqueued.is_terminal());
        assert!(!ItemState::Fetching.is_terminal());
        assert!(!ItemState::Fetched.is_terminal());
        assert!(!ItemState::Parsed.is_terminal());

        assert!(ItemState::Persisted.is_terminal());
        assert!(ItemState::Failed.is_terminal());
    }

    #[test]
    fn test_is_success() {
        assert!(ItemState::Persisted.is_success());
        assert!(!ItemState::Failed.is_success());
        assert!(!ItemState::Enqueued.is_success());
    }

    #[test]
    fn test_page_happy_path() {
        let path = [
            ItemState::Discovered,
            ItemState::Enqueued,
            ItemState::Fetching,
            ItemState::Fetched,
            ItemState::Parsed,
            ItemState::Persisted,
        ];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be allowed",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_asset_skips_parse() {
        assert!(ItemState::Fetched.can_transition_to(ItemState::Persisted));
    }

    #[test]
    fn test_no_retry_from_failed() {
        for state in ItemState::all_states() {
            assert!(!ItemState::Failed.can_transition_to(state));
            assert!(!ItemState::Persisted.can_transition_to(state));
        }
    }

    #[test]
    fn test_no_failure_before_fetching() {
        assert!(!ItemState::Discovered.can_transition_to(ItemState::Failed));
        assert!(!ItemState::Enqueued.can_transition_to(ItemState::Failed));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ItemState::Persisted), "persisted");
        assert_eq!(format!("{}", ItemKind::Asset), "asset");
    }
}
