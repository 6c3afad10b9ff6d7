use crate::directory::Guest;

/// Which rule qualified a guest for a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    Word,      // Query equals one whole word of the name
    Prefix,    // Name or one of its words starts with the query
    Substring, // A word contains the query
    Fuzzy,     // Query characters appear in order inside the name
}

impl MatchType {
    /// Get display label for match type
    pub fn label(&self) -> &'static str {
        match self {
            MatchType::Word => "[Exact]",
            MatchType::Prefix => "[Prefix]",
            MatchType::Substring => "[Partial]",
            MatchType::Fuzzy => "[Fuzzy]",
        }
    }
}

/// A qualifying guest, by position in the searched list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestMatch {
    pub index: usize,
    pub match_type: MatchType,
}

impl GuestMatch {
    /// Resolve the match against the list it was computed from
    pub fn guest<'a>(&self, guests: &'a [Guest]) -> Option<&'a Guest> {
        guests.get(self.index)
    }
}
