//! Core name matching rules for guest self-lookup

use super::models::{GuestMatch, MatchType};

/// Partial matches need at least this many normalized characters
pub const MIN_PARTIAL_QUERY_LEN: usize = 9;

/// Share of query characters a fuzzy walk must consume
const FUZZY_THRESHOLD: f64 = 0.8;

/// Lowercase and keep only ASCII letters and digits
pub fn normalize(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Normalized words of a name, split on whitespace and hyphens
pub fn name_words(name: &str) -> Vec<String> {
    name.split(|c: char| c.is_whitespace() || c == '-')
        .map(normalize)
        .filter(|w| !w.is_empty())
        .collect()
}

/// Greedy in-order walk of `query` through `target`
///
/// Returns (matched characters, query index reached).
fn subsequence_walk(target: &str, query: &str) -> (usize, usize) {
    let query: Vec<char> = query.chars().collect();
    let mut matched = 0;
    let mut query_index = 0;

    for c in target.chars() {
        if query_index >= query.len() {
            break;
        }
        if c == query[query_index] {
            matched += 1;
            query_index += 1;
        }
    }

    (matched, query_index)
}

fn fuzzy_includes(target: &str, query: &str) -> bool {
    let len = query.chars().count();
    if len == 0 {
        return false;
    }
    let (matched, query_index) = subsequence_walk(target, query);
    matched as f64 / len as f64 >= FUZZY_THRESHOLD
        && query_index as f64 / len as f64 >= FUZZY_THRESHOLD
}

/// Decide whether a name qualifies for an already normalized query
/// Priority: Word → Prefix → Substring → Fuzzy
pub fn match_name(name: &str, query: &str) -> Option<MatchType> {
    if query.is_empty() {
        return None;
    }

    let words = name_words(name);

    // 1. Whole word, regardless of query length
    if words.iter().any(|w| w == query) {
        return Some(MatchType::Word);
    }

    // 2. Short queries must be whole words
    if query.len() < MIN_PARTIAL_QUERY_LEN {
        return None;
    }

    // 3. Full name prefix
    let normalized_name = normalize(name);
    if normalized_name.starts_with(query) {
        return Some(MatchType::Prefix);
    }

    // 4. Word prefix, or substring of a word at least as long as the query
    if words.iter().any(|w| w.starts_with(query)) {
        return Some(MatchType::Prefix);
    }
    if words.iter().any(|w| w.len() >= query.len() && w.contains(query)) {
        return Some(MatchType::Substring);
    }

    // 5. Ordered subsequence over the whole name
    if fuzzy_includes(&normalized_name, query) {
        return Some(MatchType::Fuzzy);
    }

    None
}

/// Qualifying guests in input order
pub fn compute_matches<'a, I>(names: I, query: &str) -> Vec<GuestMatch>
where
    I: IntoIterator<Item = &'a str>,
{
    let query = normalize(query.trim());
    if query.is_empty() {
        return Vec::new();
    }

    names
        .into_iter()
        .enumerate()
        .filter(|(_, name)| !name.is_empty())
        .filter_map(|(index, name)| {
            match_name(name, &query).map(|match_type| GuestMatch { index, match_type })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  O'Brien-Smith Jr. 2nd "), "obriensmithjr2nd");
        assert_eq!(normalize("Ẹ̀ze"), "ze");
    }

    #[test]
    fn test_name_words() {
        assert_eq!(name_words("Mary-Jane  Okafor"), vec!["mary", "jane", "okafor"]);
        assert_eq!(name_words(" - "), Vec::<String>::new());
    }

    #[test]
    fn test_short_whole_word_matches() {
        assert_eq!(match_name("Chidi Eze", "eze"), Some(MatchType::Word));
        assert_eq!(match_name("Mary-Jane Okafor", "jane"), Some(MatchType::Word));
    }

    #[test]
    fn test_short_partial_never_matches() {
        assert_eq!(match_name("John Okafor", "joh"), None);
        assert_eq!(match_name("John Okafor", "johnokaf"), None);
    }

    #[test]
    fn test_long_prefix_matches() {
        assert_eq!(match_name("John Okafor", "johnokafo"), Some(MatchType::Prefix));
        assert_eq!(match_name("Oluwaseun Adeyemi", "oluwaseun"), Some(MatchType::Word));
        assert_eq!(match_name("Oluwaseunfunmi Adeyemi", "oluwaseun"), Some(MatchType::Prefix));
    }

    #[test]
    fn test_long_substring_matches() {
        assert_eq!(match_name("Ada Babatundeolu", "batundeol"), Some(MatchType::Substring));
    }

    #[test]
    fn test_fuzzy_subsequence_matches() {
        // Words skipped in the middle still line up in order
        assert_eq!(match_name("Tunde Martins Akande", "tundeakande"), Some(MatchType::Fuzzy));
        assert_eq!(match_name("Tunde Martins Akande", "akandetunde"), None);
    }

    #[test]
    fn test_fuzzy_partial_threshold() {
        // 10 of 11 query characters found in order
        assert_eq!(match_name("Tunde Martins Akande", "tundeakandz"), Some(MatchType::Fuzzy));
        // Only 7 of 11
        assert_eq!(match_name("Tunde Martins Akande", "tundeakzzzz"), None);
    }

    #[test]
    fn test_compute_matches_preserves_order() {
        let names = ["Chidi Eze", "", "Ngozi Eze", "Emeka Obi"];
        let matches = compute_matches(names.iter().copied(), "  EZE ");
        let indices: Vec<usize> = matches.iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![0, 2]);
    }

    #[test]
    fn test_blank_query_matches_nothing() {
        let names = ["Chidi Eze"];
        assert!(compute_matches(names.iter().copied(), "").is_empty());
        assert!(compute_matches(names.iter().copied(), "   \t").is_empty());
        assert!(compute_matches(names.iter().copied(), "!!!").is_empty());
    }
}
