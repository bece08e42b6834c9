//! Book handlers

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use serde_json::{json, Value};

use super::envelope::{required_id, required_text, Request, Scalar};
use crate::{
    error::{AppError, AppResult},
    models::book::{BookDetails, NewBook},
    AppState,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddBookParams {
    id: Option<Scalar>,
    title: Option<String>,
    author: Option<String>,
    isbn: Option<String>,
    genre: Option<String>,
    cover_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBookParams {
    #[serde(rename = "bookID")]
    book_id: Option<Scalar>,
    title: Option<String>,
    author: Option<String>,
    isbn: Option<String>,
    genre: Option<String>,
    cover_url: Option<String>,
}

#[derive(Deserialize)]
struct BookIdParams {
    #[serde(rename = "bookID")]
    book_id: Option<Scalar>,
}

#[derive(Deserialize)]
struct SearchParams {
    query: Option<Scalar>,
}

#[derive(Deserialize)]
struct RecommendParams {
    limit: Option<usize>,
}

/// `listBooks`
pub async fn list_books(state: &AppState, _request: &Request) -> AppResult<Value> {
    let books = state.services.catalog.list_books().await?;
    Ok(serde_json::to_value(books)?)
}

/// `getBook{bookID}`
pub async fn get_book(state: &AppState, request: &Request) -> AppResult<Value> {
    let params: BookIdParams = request.params()?;
    let id = required_id(params.book_id.as_ref(), "bookID")?;
    let book = state.services.catalog.get_book(id).await?;
    Ok(serde_json::to_value(book)?)
}

/// `addBook{title, author, isbn?, genre?, coverUrl?, id?}`
pub async fn add_book(state: &AppState, request: &Request) -> AppResult<Value> {
    let params: AddBookParams = request.params()?;

    let (title, author) = match (
        required_text(params.title.as_ref(), "title"),
        required_text(params.author.as_ref(), "author"),
    ) {
        (Ok(title), Ok(author)) => (title, author),
        _ => {
            return Err(AppError::InvalidInput(
                "Missing required fields: title, author".to_string(),
            ))
        }
    };
    let explicit_id = params.id.as_ref().map(|id| id.as_id("id")).transpose()?;

    let book = NewBook {
        title,
        author,
        isbn: params.isbn,
        genre: params.genre,
        cover_url: params.cover_url,
    };
    let id = state.services.catalog.add_book(book, explicit_id).await?;
    Ok(json!({ "id": id }))
}

/// `updateBook{bookID, title?, author?, isbn?, genre?, coverUrl?}`
pub async fn update_book(state: &AppState, request: &Request) -> AppResult<Value> {
    let params: UpdateBookParams = request.params()?;
    let id = required_id(params.book_id.as_ref(), "bookID")?;

    let details = BookDetails {
        title: params.title,
        author: params.author,
        isbn: params.isbn,
        genre: params.genre,
        cover_url: params.cover_url,
    };
    let book = state.services.catalog.update_book(id, details).await?;
    Ok(serde_json::to_value(book)?)
}

/// `delete-book{bookID}`
pub async fn delete_book(state: &AppState, request: &Request) -> AppResult<Value> {
    let params: BookIdParams = request.params()?;
    let id = required_id(params.book_id.as_ref(), "bookID")?;
    state.services.catalog.delete_book(id).await?;
    Ok(json!({ "ok": true }))
}

/// `searchBooks{query}`
pub async fn search_books(state: &AppState, request: &Request) -> AppResult<Value> {
    let params: SearchParams = request.params()?;
    let query = params
        .query
        .map(|q| q.as_text())
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput("Missing required field: query".to_string()))?;

    let books = state.services.catalog.search_books(query.as_str()).await?;
    Ok(serde_json::to_value(books)?)
}

/// `recommendBooks{limit?}`
pub async fn recommend_books(state: &AppState, request: &Request) -> AppResult<Value> {
    let params: RecommendParams = request.params()?;
    let mut rng = StdRng::from_entropy();
    let books = state
        .services
        .recommendations
        .recommend(params.limit, &mut rng)
        .await?;
    Ok(serde_json::to_value(books)?)
}
