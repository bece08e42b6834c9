//! Catalog management service: books and members

use validator::Validate;

use super::WriteLock;
use crate::{
    config::DeletePolicy,
    error::{AppError, AppResult},
    models::{
        book::{Book, BookDetails, NewBook, UpdateBook},
        member::{Member, MemberDetails, NewMember, UpdateMember},
        query::SearchQuery,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    lock: WriteLock,
    delete_policy: DeletePolicy,
}

impl CatalogService {
    pub fn new(repository: Repository, lock: WriteLock, delete_policy: DeletePolicy) -> Self {
        Self {
            repository,
            lock,
            delete_policy,
        }
    }

    /// Add a book; returns the id assigned by the store
    pub async fn add_book(&self, book: NewBook, explicit_id: Option<i64>) -> AppResult<i64> {
        let book = book.normalized();
        book.validate()?;

        let _guard = self.lock.acquire().await;
        let mut tx = self.repository.begin().await?;
        let id = self
            .repository
            .books
            .insert(&mut *tx, &book, explicit_id)
            .await?;
        tx.commit().await?;

        tracing::info!("Catalog: added book id={} title={:?}", id, book.title);
        Ok(id)
    }

    /// Add a member; returns the id assigned by the store
    pub async fn add_member(&self, member: NewMember, explicit_id: Option<i64>) -> AppResult<i64> {
        let member = member.normalized();
        member.validate()?;

        let _guard = self.lock.acquire().await;
        let mut tx = self.repository.begin().await?;
        let id = self
            .repository
            .members
            .insert(&mut *tx, &member, explicit_id)
            .await?;
        tx.commit().await?;

        tracing::info!("Catalog: added member id={} name={:?}", id, member.name);
        Ok(id)
    }

    pub async fn get_book(&self, id: i64) -> AppResult<Book> {
        let mut conn = self.repository.acquire().await?;
        self.repository.books.get_by_id(&mut *conn, id).await
    }

    pub async fn get_member(&self, id: i64) -> AppResult<Member> {
        let mut conn = self.repository.acquire().await?;
        self.repository.members.get_by_id(&mut *conn, id).await
    }

    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        let mut conn = self.repository.acquire().await?;
        self.repository.books.list(&mut *conn).await
    }

    pub async fn list_members(&self) -> AppResult<Vec<Member>> {
        let mut conn = self.repository.acquire().await?;
        self.repository.members.list(&mut *conn).await
    }

    /// Edit bibliographic fields; loan state is left alone
    pub async fn update_book(&self, id: i64, details: BookDetails) -> AppResult<Book> {
        let details = details.normalized();
        details.validate()?;

        let _guard = self.lock.acquire().await;
        let mut tx = self.repository.begin().await?;
        self.repository
            .books
            .update(&mut *tx, id, &UpdateBook { details, loan: None })
            .await?;
        let book = self.repository.books.get_by_id(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!("Catalog: updated book id={}", id);
        Ok(book)
    }

    /// Edit contact fields; the borrowed list is left alone
    pub async fn update_member(&self, id: i64, details: MemberDetails) -> AppResult<Member> {
        let details = details.normalized();
        details.validate()?;

        let _guard = self.lock.acquire().await;
        let mut tx = self.repository.begin().await?;
        self.repository
            .members
            .update(
                &mut *tx,
                id,
                &UpdateMember {
                    details,
                    borrowed_books: None,
                },
            )
            .await?;
        let member = self.repository.members.get_by_id(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!("Catalog: updated member id={}", id);
        Ok(member)
    }

    /// Delete a book.
    ///
    /// An issued book is refused under [`DeletePolicy::Block`] and returned
    /// first under [`DeletePolicy::Cascade`].
    pub async fn delete_book(&self, id: i64) -> AppResult<()> {
        let _guard = self.lock.acquire().await;
        let mut tx = self.repository.begin().await?;

        let book = self.repository.books.get_by_id(&mut *tx, id).await?;
        if book.borrow_status {
            let member_id = book.issued_to.unwrap_or_default();
            match self.delete_policy {
                DeletePolicy::Block => {
                    return Err(AppError::BookOnLoan {
                        book_id: id,
                        member_id,
                    })
                }
                DeletePolicy::Cascade => {
                    self.repository.loans.detach(&mut *tx, &book).await?;
                    tracing::info!(
                        "Catalog: returned book id={} from member {} before deletion",
                        id,
                        member_id
                    );
                }
            }
        }

        self.repository.books.delete(&mut *tx, id).await?;
        let scrubbed = self.repository.loans.forget_book(&mut *tx, id).await?;
        if scrubbed > 0 {
            tracing::warn!(
                "Catalog: removed stale reference to book id={} from {} member(s)",
                id,
                scrubbed
            );
        }
        tx.commit().await?;

        tracing::info!("Catalog: deleted book id={}", id);
        Ok(())
    }

    /// Delete a member.
    ///
    /// A member holding books is refused under [`DeletePolicy::Block`]; under
    /// [`DeletePolicy::Cascade`] each held book is returned first.
    pub async fn delete_member(&self, id: i64) -> AppResult<()> {
        let _guard = self.lock.acquire().await;
        let mut tx = self.repository.begin().await?;

        self.repository.members.get_by_id(&mut *tx, id).await?;
        let held = self.repository.books.list_issued_to(&mut *tx, id).await?;

        if !held.is_empty() {
            match self.delete_policy {
                DeletePolicy::Block => {
                    return Err(AppError::MemberHasLoans {
                        member_id: id,
                        count: held.len(),
                    })
                }
                DeletePolicy::Cascade => {
                    for book in &held {
                        self.repository.loans.detach(&mut *tx, book).await?;
                    }
                    tracing::info!(
                        "Catalog: returned {} book(s) held by member id={} before deletion",
                        held.len(),
                        id
                    );
                }
            }
        }

        self.repository.members.delete(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!("Catalog: deleted member id={}", id);
        Ok(())
    }

    /// Search books by id or by title/author/isbn substring
    pub async fn search_books(&self, query: impl Into<SearchQuery>) -> AppResult<Vec<Book>> {
        let query = query.into();
        let mut conn = self.repository.acquire().await?;
        self.repository.books.search(&mut *conn, &query).await
    }

    /// Search members by id or by name/address substring
    pub async fn search_members(&self, query: impl Into<SearchQuery>) -> AppResult<Vec<Member>> {
        let query = query.into();
        let mut conn = self.repository.acquire().await?;
        self.repository.members.search(&mut *conn, &query).await
    }
}
