//! Loan management service: issuing and returning books

use chrono::Utc;

use super::WriteLock;
use crate::{
    error::{AppError, AppResult},
    models::book::Book,
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    lock: WriteLock,
}

impl LoansService {
    pub fn new(repository: Repository, lock: WriteLock) -> Self {
        Self { repository, lock }
    }

    /// Lend a book to a member.
    ///
    /// Book and member are both written in one transaction under the write
    /// lock, so two concurrent issues of the same book cannot both succeed.
    pub async fn issue_book(&self, book_id: i64, member_id: i64) -> AppResult<Book> {
        let _guard = self.lock.acquire().await;
        let mut tx = self.repository.begin().await?;

        let book = self.repository.books.get_by_id(&mut *tx, book_id).await?;
        let member = self.repository.members.get_by_id(&mut *tx, member_id).await?;

        if book.borrow_status {
            return Err(AppError::AlreadyIssued {
                book_id,
                member_id: book.issued_to.unwrap_or_default(),
            });
        }

        self.repository
            .loans
            .attach(&mut *tx, &book, &member, Utc::now())
            .await?;
        let issued = self.repository.books.get_by_id(&mut *tx, book_id).await?;
        tx.commit().await?;

        tracing::info!("Book {} issued to member {}", book_id, member_id);
        Ok(issued)
    }

    /// Take a book back from whoever holds it.
    ///
    /// `claimed_member` is only a hint from the caller; the holder recorded
    /// on the book is authoritative.
    pub async fn return_book(&self, book_id: i64, claimed_member: Option<i64>) -> AppResult<Book> {
        let _guard = self.lock.acquire().await;
        let mut tx = self.repository.begin().await?;

        let book = self.repository.books.get_by_id(&mut *tx, book_id).await?;
        if !book.borrow_status {
            return Err(AppError::NotIssued(book_id));
        }

        if let Some(claimed) = claimed_member {
            if book.issued_to != Some(claimed) {
                tracing::warn!(
                    "Return of book {} claimed by member {} but it is held by {:?}",
                    book_id,
                    claimed,
                    book.issued_to
                );
            }
        }

        let holder = self.repository.loans.detach(&mut *tx, &book).await?;
        let returned = self.repository.books.get_by_id(&mut *tx, book_id).await?;
        tx.commit().await?;

        match holder {
            Some(member_id) => tracing::info!("Book {} returned by member {}", book_id, member_id),
            None => tracing::info!("Book {} returned (holder record missing)", book_id),
        }
        Ok(returned)
    }

    /// Books currently held by a member, oldest loan first
    pub async fn member_loans(&self, member_id: i64) -> AppResult<Vec<Book>> {
        let mut conn = self.repository.acquire().await?;
        let member = self.repository.members.get_by_id(&mut *conn, member_id).await?;

        let mut books = Vec::with_capacity(member.borrowed_books.len());
        for book_id in member.borrowed_books.iter() {
            match self.repository.books.find_by_id(&mut *conn, book_id).await? {
                Some(book) if book.issued_to == Some(member_id) => books.push(book),
                _ => tracing::warn!(
                    "Member {} lists book {} which is not on loan to them",
                    member_id,
                    book_id
                ),
            }
        }

        Ok(books)
    }
}
