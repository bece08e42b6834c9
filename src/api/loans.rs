//! Loan handlers

use serde::Deserialize;
use serde_json::{json, Value};

use super::envelope::{required_id, Request, Scalar};
use crate::{error::AppResult, AppState};

#[derive(Deserialize)]
struct LoanParams {
    #[serde(rename = "bookID")]
    book_id: Option<Scalar>,
    #[serde(rename = "memberID")]
    member_id: Option<Scalar>,
}

/// `checkoutBook{bookID, memberID}`
pub async fn checkout_book(state: &AppState, request: &Request) -> AppResult<Value> {
    let params: LoanParams = request.params()?;
    let book_id = required_id(params.book_id.as_ref(), "bookID")?;
    let member_id = required_id(params.member_id.as_ref(), "memberID")?;

    state.services.loans.issue_book(book_id, member_id).await?;
    Ok(json!({ "ok": true }))
}

/// `returnBook{bookID, memberID?}`; the member id is advisory
pub async fn return_book(state: &AppState, request: &Request) -> AppResult<Value> {
    let params: LoanParams = request.params()?;
    let book_id = required_id(params.book_id.as_ref(), "bookID")?;
    let claimed = params
        .member_id
        .as_ref()
        .map(|id| id.as_id("memberID"))
        .transpose()?;

    state.services.loans.return_book(book_id, claimed).await?;
    Ok(json!({ "ok": true }))
}

/// `memberLoans{memberID}`
pub async fn member_loans(state: &AppState, request: &Request) -> AppResult<Value> {
    let params: LoanParams = request.params()?;
    let member_id = required_id(params.member_id.as_ref(), "memberID")?;

    let books = state.services.loans.member_loans(member_id).await?;
    Ok(serde_json::to_value(books)?)
}
