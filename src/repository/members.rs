//! Members repository for database operations

use sqlx::SqliteConnection;

use super::books::unique_violation;
use crate::{
    error::{AppError, AppResult},
    models::member::{Member, MemberRow, NewMember, UpdateMember},
    models::query::SearchQuery,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct MembersRepository;

impl MembersRepository {
    /// Insert a member with an empty borrowed list
    pub async fn insert(
        &self,
        conn: &mut SqliteConnection,
        member: &NewMember,
        explicit_id: Option<i64>,
    ) -> AppResult<i64> {
        if let Some(id) = explicit_id {
            if self.exists(conn, id).await? {
                return Err(AppError::DuplicateKey(format!("member id {} already exists", id)));
            }
        }

        let result = sqlx::query(
            "INSERT INTO members (id, name, address, borrowed_books) VALUES (?, ?, ?, '')",
        )
        .bind(explicit_id)
        .bind(&member.name)
        .bind(&member.address)
        .execute(&mut *conn)
        .await
        .map_err(|e| unique_violation(e, explicit_id))?;

        Ok(result.last_insert_rowid())
    }

    /// Get member by ID
    pub async fn get_by_id(&self, conn: &mut SqliteConnection, id: i64) -> AppResult<Member> {
        self.find_by_id(conn, id)
            .await?
            .ok_or(AppError::MemberNotFound(id))
    }

    pub async fn find_by_id(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
    ) -> AppResult<Option<Member>> {
        let row = sqlx::query_as::<_, MemberRow>(
            "SELECT id, name, address, borrowed_books FROM members WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.map(Member::from))
    }

    pub async fn exists(&self, conn: &mut SqliteConnection, id: i64) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM members WHERE id = ?)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(exists)
    }

    /// All members ordered by id
    pub async fn list(&self, conn: &mut SqliteConnection) -> AppResult<Vec<Member>> {
        let rows = sqlx::query_as::<_, MemberRow>(
            "SELECT id, name, address, borrowed_books FROM members ORDER BY id",
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows.into_iter().map(Member::from).collect())
    }

    /// Field-level update
    pub async fn update(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
        update: &UpdateMember,
    ) -> AppResult<()> {
        if update.is_empty() {
            return match self.exists(conn, id).await? {
                true => Ok(()),
                false => Err(AppError::MemberNotFound(id)),
            };
        }

        let mut sets: Vec<&str> = Vec::new();
        if update.details.name.is_some() {
            sets.push("name = ?");
        }
        if update.details.address.is_some() {
            sets.push("address = ?");
        }
        if update.borrowed_books.is_some() {
            sets.push("borrowed_books = ?");
        }

        let query = format!("UPDATE members SET {} WHERE id = ?", sets.join(", "));
        let mut builder = sqlx::query(&query);

        if let Some(ref name) = update.details.name {
            builder = builder.bind(name.clone());
        }
        if let Some(ref address) = update.details.address {
            let address = address.trim();
            builder = builder.bind((!address.is_empty()).then(|| address.to_string()));
        }
        if let Some(ref borrowed) = update.borrowed_books {
            builder = builder.bind(borrowed.to_db_string());
        }

        let result = builder.bind(id).execute(&mut *conn).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::MemberNotFound(id));
        }

        Ok(())
    }

    pub async fn delete(&self, conn: &mut SqliteConnection, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM members WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::MemberNotFound(id));
        }

        Ok(())
    }

    /// Id match, or case-sensitive substring of name or address
    pub async fn search(
        &self,
        conn: &mut SqliteConnection,
        query: &SearchQuery,
    ) -> AppResult<Vec<Member>> {
        let text = query.text();
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT id, name, address, borrowed_books FROM members
            WHERE id = ?
               OR instr(name, ?) > 0
               OR instr(COALESCE(address, ''), ?) > 0
            ORDER BY id
            "#,
        )
        .bind(query.id())
        .bind(&text)
        .bind(&text)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows.into_iter().map(Member::from).collect())
    }
}
