// Matching service for guest self-lookup
//
// Pure functions over a guest list and a typed query, reusable from the
// CLI and from the invitation registry.

pub mod core;
pub mod models;

// Re-export commonly used types
pub use models::{GuestMatch, MatchType};

use crate::directory::Guest;

/// Guests whose name qualifies for `query`, in list order
///
/// A blank query (or one with no letters or digits) matches nobody.
pub fn match_guests(guests: &[Guest], query: &str) -> Vec<Guest> {
    match_guests_detailed(guests, query)
        .into_iter()
        .filter_map(|m| m.guest(guests).cloned())
        .collect()
}

/// Like [`match_guests`] but keeps positions and the rule that fired
pub fn match_guests_detailed(guests: &[Guest], query: &str) -> Vec<GuestMatch> {
    core::compute_matches(guests.iter().map(|g| g.name.as_str()), query)
}

/// First qualifying guest in list order
pub fn best_match<'a>(guests: &'a [Guest], query: &str) -> Option<&'a Guest> {
    match_guests_detailed(guests, query)
        .first()
        .and_then(|m| m.guest(guests))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> Vec<Guest> {
        vec![
            Guest::new("John Okafor", "Table 1"),
            Guest::new("Chidi Eze", "Table 2"),
            Guest::new("Chidi Eze", "Table 5"),
            Guest::new("Oluwaseun Adeyemi", "Table 3"),
        ]
    }

    #[test]
    fn test_short_word_query() {
        let found = match_guests(&directory(), "Eze");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].table, "Table 2");
        assert_eq!(found[1].table, "Table 5");
    }

    #[test]
    fn test_short_partial_query_finds_nobody() {
        assert!(match_guests(&directory(), "Joh").is_empty());
    }

    #[test]
    fn test_empty_query() {
        assert!(match_guests(&directory(), "").is_empty());
        assert!(match_guests(&directory(), "  ").is_empty());
    }

    #[test]
    fn test_best_match_is_first_in_list() {
        let guests = directory();
        assert_eq!(best_match(&guests, "chidi").map(|g| g.table.as_str()), Some("Table 2"));
        assert_eq!(best_match(&guests, "nobody"), None);
    }

    #[test]
    fn test_detailed_reports_rule() {
        let guests = directory();
        let matches = match_guests_detailed(&guests, "oluwaseunadey");
        assert_eq!(
            matches,
            vec![GuestMatch {
                index: 3,
                match_type: MatchType::Prefix
            }]
        );
        assert_eq!(matches[0].match_type.label(), "[Prefix]");
    }
}
