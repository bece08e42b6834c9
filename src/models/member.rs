//! Member (borrower) model and related types

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::book::normalize_optional;

/// Ordered set of book ids held by a member, oldest loan first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BorrowedBooks(IndexSet<i64>);

impl BorrowedBooks {
    const SEPARATOR: char = '|';

    /// Parse the stored `1|4|9` representation; unparsable entries are dropped
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split(Self::SEPARATOR)
                .filter_map(|part| part.trim().parse::<i64>().ok())
                .collect(),
        )
    }

    pub fn to_db_string(&self) -> String {
        self.0
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(&Self::SEPARATOR.to_string())
    }

    /// Returns false if the id was already present
    pub fn insert(&mut self, book_id: i64) -> bool {
        self.0.insert(book_id)
    }

    /// Returns false if the id was not present
    pub fn remove(&mut self, book_id: i64) -> bool {
        self.0.shift_remove(&book_id)
    }

    pub fn contains(&self, book_id: i64) -> bool {
        self.0.contains(&book_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.0.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<i64> {
        self.iter().collect()
    }
}

impl FromIterator<i64> for BorrowedBooks {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Member as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub borrowed_books: BorrowedBooks,
}

/// Raw member row
#[derive(Debug, Clone, FromRow)]
pub struct MemberRow {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub borrowed_books: String,
}

impl From<MemberRow> for Member {
    fn from(row: MemberRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            address: row.address,
            borrowed_books: BorrowedBooks::parse(&row.borrowed_books),
        }
    }
}

/// Create member request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewMember {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    pub address: Option<String>,
}

impl NewMember {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: Some(address.into()),
        }
    }

    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            address: normalize_optional(self.address),
        }
    }
}

/// Contact edits; the borrowed list is not reachable from here
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct MemberDetails {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    pub address: Option<String>,
}

impl MemberDetails {
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.map(|n| n.trim().to_string()),
            address: self.address.map(|a| a.trim().to_string()),
        }
    }
}

/// Field-level store update
#[derive(Debug, Clone, Default)]
pub struct UpdateMember {
    pub details: MemberDetails,
    pub borrowed_books: Option<BorrowedBooks>,
}

impl UpdateMember {
    pub fn borrowed_books(books: BorrowedBooks) -> Self {
        Self {
            details: MemberDetails::default(),
            borrowed_books: Some(books),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.borrowed_books.is_none() && self.details.name.is_none() && self.details.address.is_none()
    }
}
