//! Loan bookkeeping across the books and members tables.
//!
//! Both sides of a loan are written on the same connection; callers run
//! these inside a transaction so the pair commits or rolls back together.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use super::{books::BooksRepository, members::MembersRepository};
use crate::{
    error::AppResult,
    models::{
        book::{Book, LoanState, UpdateBook},
        member::{Member, UpdateMember},
    },
};

#[derive(Debug, Clone, Copy, Default)]
pub struct LoansRepository;

impl LoansRepository {
    /// Mark the book issued to the member and append it to the member's list
    pub async fn attach(
        &self,
        conn: &mut SqliteConnection,
        book: &Book,
        member: &Member,
        issued_at: DateTime<Utc>,
    ) -> AppResult<()> {
        BooksRepository
            .update(
                conn,
                book.id,
                &UpdateBook::loan(LoanState::Issued {
                    member_id: member.id,
                    issued_at,
                }),
            )
            .await?;

        let mut borrowed = member.borrowed_books.clone();
        if borrowed.insert(book.id) {
            MembersRepository
                .update(conn, member.id, &UpdateMember::borrowed_books(borrowed))
                .await?;
        }

        Ok(())
    }

    /// Mark the book available and drop it from its holder's list.
    ///
    /// Returns the holder id when a holder record still existed.
    pub async fn detach(&self, conn: &mut SqliteConnection, book: &Book) -> AppResult<Option<i64>> {
        BooksRepository
            .update(conn, book.id, &UpdateBook::loan(LoanState::Available))
            .await?;

        let Some(holder_id) = book.issued_to else {
            return Ok(None);
        };

        let Some(holder) = MembersRepository.find_by_id(conn, holder_id).await? else {
            tracing::warn!(
                "Book {} was issued to member {} which no longer exists",
                book.id,
                holder_id
            );
            return Ok(None);
        };

        let mut borrowed = holder.borrowed_books;
        if borrowed.remove(book.id) {
            MembersRepository
                .update(conn, holder_id, &UpdateMember::borrowed_books(borrowed))
                .await?;
        }

        Ok(Some(holder_id))
    }

    /// Scrub a book id from every member list that still mentions it
    pub async fn forget_book(&self, conn: &mut SqliteConnection, book_id: i64) -> AppResult<usize> {
        let mut scrubbed = 0;
        for member in MembersRepository.list(conn).await? {
            let mut borrowed = member.borrowed_books;
            if borrowed.remove(book_id) {
                MembersRepository
                    .update(conn, member.id, &UpdateMember::borrowed_books(borrowed))
                    .await?;
                scrubbed += 1;
            }
        }
        Ok(scrubbed)
    }
}
