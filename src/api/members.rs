//! Member handlers

use serde::Deserialize;
use serde_json::{json, Value};

use super::envelope::{required_id, required_text, Request, Scalar};
use crate::{
    error::{AppError, AppResult},
    models::{
        member::{MemberDetails, NewMember},
        query::SearchQuery,
    },
    AppState,
};

#[derive(Deserialize)]
struct AddMemberParams {
    id: Option<Scalar>,
    name: Option<String>,
    address: Option<String>,
}

#[derive(Deserialize)]
struct UpdateMemberParams {
    #[serde(rename = "memberID")]
    member_id: Option<Scalar>,
    name: Option<String>,
    address: Option<String>,
}

#[derive(Deserialize)]
struct MemberIdParams {
    #[serde(rename = "memberID")]
    member_id: Option<Scalar>,
}

#[derive(Deserialize)]
struct SearchMemberParams {
    #[serde(rename = "memberID")]
    member_id: Option<Scalar>,
    query: Option<Scalar>,
}

/// `listMembers`
pub async fn list_members(state: &AppState, _request: &Request) -> AppResult<Value> {
    let members = state.services.catalog.list_members().await?;
    Ok(serde_json::to_value(members)?)
}

/// `getMember{memberID}`
pub async fn get_member(state: &AppState, request: &Request) -> AppResult<Value> {
    let params: MemberIdParams = request.params()?;
    let id = required_id(params.member_id.as_ref(), "memberID")?;
    let member = state.services.catalog.get_member(id).await?;
    Ok(serde_json::to_value(member)?)
}

/// `addMember{name, address?, id?}`
pub async fn add_member(state: &AppState, request: &Request) -> AppResult<Value> {
    let params: AddMemberParams = request.params()?;
    let name = required_text(params.name.as_ref(), "name")?;
    let explicit_id = params.id.as_ref().map(|id| id.as_id("id")).transpose()?;

    let member = NewMember {
        name,
        address: params.address,
    };
    let id = state.services.catalog.add_member(member, explicit_id).await?;
    Ok(json!({ "id": id }))
}

/// `updateMember{memberID, name?, address?}`
pub async fn update_member(state: &AppState, request: &Request) -> AppResult<Value> {
    let params: UpdateMemberParams = request.params()?;
    let id = required_id(params.member_id.as_ref(), "memberID")?;

    let details = MemberDetails {
        name: params.name,
        address: params.address,
    };
    let member = state.services.catalog.update_member(id, details).await?;
    Ok(serde_json::to_value(member)?)
}

/// `delete-member{memberID}`
pub async fn delete_member(state: &AppState, request: &Request) -> AppResult<Value> {
    let params: MemberIdParams = request.params()?;
    let id = required_id(params.member_id.as_ref(), "memberID")?;
    state.services.catalog.delete_member(id).await?;
    Ok(json!({ "ok": true }))
}

/// `searchMember{memberID}` (exact id) or `searchMember{query}` (id or substring)
pub async fn search_member(state: &AppState, request: &Request) -> AppResult<Value> {
    let params: SearchMemberParams = request.params()?;

    let members = match (params.member_id, params.query) {
        // An explicit member id is an exact lookup
        (Some(member_id), _) => match state
            .services
            .catalog
            .get_member(member_id.as_id("memberID")?)
            .await
        {
            Ok(member) => vec![member],
            Err(AppError::MemberNotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        },
        (None, Some(query)) if !query.as_text().trim().is_empty() => {
            let query = SearchQuery::parse(&query.as_text());
            state.services.catalog.search_members(query).await?
        }
        _ => {
            return Err(AppError::InvalidInput(
                "Missing required field: memberID or query".to_string(),
            ))
        }
    };

    Ok(serde_json::to_value(members)?)
}
