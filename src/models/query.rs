//! Search query normalization

use std::fmt;

/// A catalog search, decided once at the boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// Pure-digit input; matches the record id and also digit substrings in text fields
    ById(i64),
    /// Free text; case-sensitive substring match
    ByText(String),
}

impl SearchQuery {
    /// Trim the input and detect id lookups
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(id) = trimmed.parse::<i64>() {
                return SearchQuery::ById(id);
            }
        }
        SearchQuery::ByText(trimmed.to_string())
    }

    pub fn id(&self) -> Option<i64> {
        match self {
            SearchQuery::ById(id) => Some(*id),
            SearchQuery::ByText(_) => None,
        }
    }

    /// Text used for substring matching
    pub fn text(&self) -> String {
        self.to_string()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SearchQuery::ByText(text) if text.is_empty())
    }
}

impl From<i64> for SearchQuery {
    fn from(id: i64) -> Self {
        SearchQuery::ById(id)
    }
}

impl From<&str> for SearchQuery {
    fn from(raw: &str) -> Self {
        SearchQuery::parse(raw)
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchQuery::ById(id) => write!(f, "{}", id),
            SearchQuery::ByText(text) => f.write_str(text),
        }
    }
}
