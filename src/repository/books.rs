//! Books repository for database operations

use sqlx::SqliteConnection;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, NewBook, UpdateBook},
    models::query::SearchQuery,
};

const BOOK_COLUMNS: &str =
    "id, title, author, isbn, genre, cover_url, borrow_status, issued_to, issued_at";

#[derive(Debug, Clone, Copy, Default)]
pub struct BooksRepository;

impl BooksRepository {
    /// Insert a book; the store assigns the id unless one is supplied
    pub async fn insert(
        &self,
        conn: &mut SqliteConnection,
        book: &NewBook,
        explicit_id: Option<i64>,
    ) -> AppResult<i64> {
        if let Some(id) = explicit_id {
            if self.exists(conn, id).await? {
                return Err(AppError::DuplicateKey(format!("book id {} already exists", id)));
            }
        }

        let result = sqlx::query(
            r#"
            INSERT INTO books (id, title, author, isbn, genre, cover_url, borrow_status)
            VALUES (?, ?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(explicit_id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.genre)
        .bind(&book.cover_url)
        .execute(&mut *conn)
        .await
        .map_err(|e| unique_violation(e, explicit_id))?;

        Ok(result.last_insert_rowid())
    }

    /// Get book by ID
    pub async fn get_by_id(&self, conn: &mut SqliteConnection, id: i64) -> AppResult<Book> {
        self.find_by_id(conn, id)
            .await?
            .ok_or(AppError::BookNotFound(id))
    }

    pub async fn find_by_id(&self, conn: &mut SqliteConnection, id: i64) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE id = ?",
            BOOK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(book)
    }

    pub async fn exists(&self, conn: &mut SqliteConnection, id: i64) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = ?)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(exists)
    }

    /// All books ordered by id
    pub async fn list(&self, conn: &mut SqliteConnection) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books ORDER BY id",
            BOOK_COLUMNS
        ))
        .fetch_all(&mut *conn)
        .await?;

        Ok(books)
    }

    /// Books whose `issued_to` points at the member
    pub async fn list_issued_to(
        &self,
        conn: &mut SqliteConnection,
        member_id: i64,
    ) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE issued_to = ? ORDER BY id",
            BOOK_COLUMNS
        ))
        .bind(member_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(books)
    }

    /// Field-level update
    pub async fn update(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
        update: &UpdateBook,
    ) -> AppResult<()> {
        if update.is_empty() {
            return match self.exists(conn, id).await? {
                true => Ok(()),
                false => Err(AppError::BookNotFound(id)),
            };
        }

        let details = &update.details;
        let mut sets: Vec<&str> = Vec::new();

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(concat!($name, " = ?"));
                }
            };
        }

        add_field!(details.title, "title");
        add_field!(details.author, "author");
        add_field!(details.isbn, "isbn");
        add_field!(details.genre, "genre");
        add_field!(details.cover_url, "cover_url");
        if update.loan.is_some() {
            sets.push("borrow_status = ?");
            sets.push("issued_to = ?");
            sets.push("issued_at = ?");
        }

        let query = format!("UPDATE books SET {} WHERE id = ?", sets.join(", "));
        let mut builder = sqlx::query(&query);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val.clone());
                }
            };
        }

        bind_field!(details.title);
        bind_field!(details.author);
        // Blank optional text clears the column
        bind_field!(details.isbn.as_ref().map(|v| non_blank(v)));
        bind_field!(details.genre.as_ref().map(|v| non_blank(v)));
        bind_field!(details.cover_url.as_ref().map(|v| non_blank(v)));
        if let Some(loan) = update.loan {
            let (borrow_status, issued_to, issued_at) = loan.columns();
            builder = builder.bind(borrow_status).bind(issued_to).bind(issued_at);
        }

        let result = builder.bind(id).execute(&mut *conn).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::BookNotFound(id));
        }

        Ok(())
    }

    pub async fn delete(&self, conn: &mut SqliteConnection, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::BookNotFound(id));
        }

        Ok(())
    }

    /// Id match, or case-sensitive substring of title, author or isbn
    pub async fn search(
        &self,
        conn: &mut SqliteConnection,
        query: &SearchQuery,
    ) -> AppResult<Vec<Book>> {
        let text = query.text();
        let books = sqlx::query_as::<_, Book>(&format!(
            r#"
            SELECT {} FROM books
            WHERE id = ?
               OR instr(title, ?) > 0
               OR instr(author, ?) > 0
               OR instr(COALESCE(isbn, ''), ?) > 0
            ORDER BY id
            "#,
            BOOK_COLUMNS
        ))
        .bind(query.id())
        .bind(&text)
        .bind(&text)
        .bind(&text)
        .fetch_all(&mut *conn)
        .await?;

        Ok(books)
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub(crate) fn unique_violation(err: sqlx::Error, explicit_id: Option<i64>) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::DuplicateKey(
            explicit_id
                .map(|id| format!("id {} already exists", id))
                .unwrap_or_else(|| "duplicate key".to_string()),
        ),
        _ => AppError::Database(err),
    }
}
