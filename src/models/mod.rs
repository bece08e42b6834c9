//! Data models for the catalog

pub mod book;
pub mod member;
pub mod query;

// Re-export commonly used types
pub use book::{Book, BookDetails, LoanState, NewBook, UpdateBook};
pub use member::{BorrowedBooks, Member, MemberDetails, NewMember, UpdateMember};
pub use query::SearchQuery;
