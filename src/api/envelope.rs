//! Request and response envelopes of the line protocol

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult, ErrorCode};

/// One request line: `{"id": 1, "method": "listBooks", ...params}`
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub id: u64,
    pub method: String,
    pub params: Map<String, Value>,
}

/// Why a line could not be turned into a [`Request`]
#[derive(Debug, thiserror::Error)]
pub enum MalformedRequest {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("request is not a JSON object")]
    NotAnObject,
    #[error("request has no integer id")]
    MissingId,
}

impl Request {
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        let params = match params {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            id,
            method: method.into(),
            params,
        }
    }

    /// Parse a request line. A missing method is not malformed; it is
    /// answered as an unknown method.
    pub fn parse(line: &str) -> Result<Self, MalformedRequest> {
        let Value::Object(mut params) = serde_json::from_str::<Value>(line)? else {
            return Err(MalformedRequest::NotAnObject);
        };

        let id = params
            .remove("id")
            .and_then(|v| v.as_u64())
            .ok_or(MalformedRequest::MissingId)?;
        let method = match params.remove("method") {
            Some(Value::String(method)) => method,
            _ => String::new(),
        };

        Ok(Self { id, method, params })
    }

    /// Serialize as a single line (without the trailing newline)
    pub fn to_line(&self) -> AppResult<String> {
        let mut object = self.params.clone();
        object.insert("id".to_string(), Value::from(self.id));
        object.insert("method".to_string(), Value::String(self.method.clone()));
        Ok(serde_json::to_string(&Value::Object(object))?)
    }

    /// Deserialize the parameter bag into a typed struct
    pub fn params<T: DeserializeOwned>(&self) -> AppResult<T> {
        serde_json::from_value(Value::Object(self.params.clone()))
            .map_err(|e| AppError::InvalidInput(e.to_string()))
    }
}

/// One response line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
}

impl Response {
    pub fn success(id: u64, data: Value) -> Self {
        Self {
            id,
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    pub fn failure(id: u64, error: &AppError) -> Self {
        Self {
            id,
            success: false,
            data: None,
            error: Some(error.to_string()),
            code: Some(error.code()),
        }
    }

    pub fn to_line(&self) -> AppResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Unwrap the payload, turning a failure envelope back into an error
    pub fn into_result(self) -> AppResult<Value> {
        if self.success {
            Ok(self.data.unwrap_or(Value::Null))
        } else {
            Err(AppError::Remote {
                code: self.code,
                message: self.error.unwrap_or_else(|| "Backend error".to_string()),
            })
        }
    }
}

/// An id or query parameter sent either as a number or as a string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Text(String),
}

impl Scalar {
    /// Resolve to an id, rejecting non-numeric text
    pub fn as_id(&self, field: &str) -> AppResult<i64> {
        match self {
            Scalar::Int(id) => Ok(*id),
            Scalar::Text(text) => text
                .trim()
                .parse::<i64>()
                .map_err(|_| AppError::InvalidInput(format!("{} must be an integer", field))),
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            Scalar::Int(id) => id.to_string(),
            Scalar::Text(text) => text.clone(),
        }
    }
}

/// A required id parameter
pub fn required_id(value: Option<&Scalar>, field: &str) -> AppResult<i64> {
    value
        .ok_or_else(|| AppError::InvalidInput(format!("Missing required field: {}", field)))?
        .as_id(field)
}

/// A required non-blank text parameter
pub fn required_text(value: Option<&String>, field: &str) -> AppResult<String> {
    match value.map(|v| v.trim()) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(AppError::InvalidInput(format!("Missing required field: {}", field))),
    }
}
