//! Book (catalog entry) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Full book model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub genre: Option<String>,
    pub cover_url: Option<String>,
    pub borrow_status: bool,
    /// Holding member, present iff `borrow_status` is true
    pub issued_to: Option<i64>,
    pub issued_at: Option<DateTime<Utc>>,
}

impl Book {
    pub fn is_available(&self) -> bool {
        !self.borrow_status
    }
}

/// Loan state of a book; the only way the store changes borrow fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanState {
    Available,
    Issued {
        member_id: i64,
        issued_at: DateTime<Utc>,
    },
}

impl LoanState {
    /// Column values `(borrow_status, issued_to, issued_at)`
    pub fn columns(&self) -> (bool, Option<i64>, Option<DateTime<Utc>>) {
        match *self {
            LoanState::Available => (false, None, None),
            LoanState::Issued { member_id, issued_at } => (true, Some(member_id), Some(issued_at)),
        }
    }
}

/// Create book request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "author must not be empty"))]
    pub author: String,
    pub isbn: Option<String>,
    pub genre: Option<String>,
    pub cover_url: Option<String>,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            ..Self::default()
        }
    }

    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = Some(isbn.into());
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_cover_url(mut self, cover_url: impl Into<String>) -> Self {
        self.cover_url = Some(cover_url.into());
        self
    }

    /// Trim text fields, turning blank optional fields into `None`
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            isbn: normalize_optional(self.isbn),
            genre: normalize_optional(self.genre),
            cover_url: normalize_optional(self.cover_url),
        }
    }
}

/// Bibliographic edits; borrow fields are not reachable from here
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookDetails {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "author must not be empty"))]
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub genre: Option<String>,
    pub cover_url: Option<String>,
}

impl BookDetails {
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.map(|t| t.trim().to_string()),
            author: self.author.map(|a| a.trim().to_string()),
            isbn: self.isbn.map(|i| i.trim().to_string()),
            genre: self.genre.map(|g| g.trim().to_string()),
            cover_url: self.cover_url.map(|c| c.trim().to_string()),
        }
    }
}

/// Field-level store update
#[derive(Debug, Clone, Default)]
pub struct UpdateBook {
    pub details: BookDetails,
    pub loan: Option<LoanState>,
}

impl UpdateBook {
    pub fn loan(state: LoanState) -> Self {
        Self {
            details: BookDetails::default(),
            loan: Some(state),
        }
    }

    pub fn is_empty(&self) -> bool {
        let d = &self.details;
        self.loan.is_none()
            && d.title.is_none()
            && d.author.is_none()
            && d.isbn.is_none()
            && d.genre.is_none()
            && d.cover_url.is_none()
    }
}

pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
