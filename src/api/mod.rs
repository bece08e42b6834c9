//! Request dispatcher: maps named methods onto catalog engine calls.
//!
//! Every outcome, including unknown methods and engine failures, becomes a
//! [`Response`] envelope; nothing is raised past this layer.

pub mod books;
pub mod envelope;
pub mod health;
pub mod loans;
pub mod members;
pub mod server;

pub use envelope::{Request, Response};

use crate::{
    error::{AppError, AppResult},
    AppState,
};
use serde_json::Value;

/// Routes requests to handlers
#[derive(Clone)]
pub struct Dispatcher {
    state: AppState,
}

impl Dispatcher {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Run one request and wrap the outcome in an envelope
    pub async fn dispatch(&self, request: &Request) -> Response {
        tracing::debug!("Dispatching request id={} method={}", request.id, request.method);

        match self.route(request).await {
            Ok(data) => Response::success(request.id, data),
            Err(err) => {
                log_failure(request, &err);
                Response::failure(request.id, &err)
            }
        }
    }

    async fn route(&self, request: &Request) -> AppResult<Value> {
        let state = &self.state;
        match request.method.as_str() {
            // Books
            "listBooks" => books::list_books(state, request).await,
            "getBook" => books::get_book(state, request).await,
            "addBook" => books::add_book(state, request).await,
            "updateBook" => books::update_book(state, request).await,
            "delete-book" => books::delete_book(state, request).await,
            "searchBooks" => books::search_books(state, request).await,
            "recommendBooks" => books::recommend_books(state, request).await,
            // Members
            "listMembers" => members::list_members(state, request).await,
            "getMember" => members::get_member(state, request).await,
            "addMember" => members::add_member(state, request).await,
            "updateMember" => members::update_member(state, request).await,
            "delete-member" => members::delete_member(state, request).await,
            "searchMember" => members::search_member(state, request).await,
            // Loans
            "checkoutBook" => loans::checkout_book(state, request).await,
            "returnBook" => loans::return_book(state, request).await,
            "memberLoans" => loans::member_loans(state, request).await,
            // Health
            "health" => health::health_check(state, request).await,
            other => Err(AppError::UnknownMethod(other.to_string())),
        }
    }
}

fn log_failure(request: &Request, err: &AppError) {
    match err {
        AppError::Database(e) => {
            tracing::error!("Database error in {} (id={}): {:?}", request.method, request.id, e)
        }
        AppError::Internal(msg) => {
            tracing::error!("Internal error in {} (id={}): {}", request.method, request.id, msg)
        }
        AppError::UnknownMethod(method) => {
            tracing::warn!("Unknown method {:?} (id={})", method, request.id)
        }
        other => tracing::info!(
            "Request {} (id={}) rejected: {}",
            request.method,
            request.id,
            other
        ),
    }
}
