//! Method replies and their HTTP encoding.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;

/// What a method handle produces. Bodies are the bare DTO / PagedResult, no envelope.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    Ok(Value),
    Created(Value),
    NoContent,
}

impl Reply {
    pub fn ok<T: Serialize>(data: &T) -> Result<Self, AppError> {
        Ok(Reply::Ok(to_json(data)?))
    }

    pub fn created<T: Serialize>(data: &T) -> Result<Self, AppError> {
        Ok(Reply::Created(to_json(data)?))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Reply::Ok(_) => StatusCode::OK,
            Reply::Created(_) => StatusCode::CREATED,
            Reply::NoContent => StatusCode::NO_CONTENT,
        }
    }
}

fn to_json<T: Serialize>(data: &T) -> Result<Value, AppError> {
    serde_json::to_value(data).map_err(|e| AppError::BadRequest(format!("unserializable reply: {}", e)))
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Ok(v) => (StatusCode::OK, Json(v)).into_response(),
            Reply::Created(v) => (StatusCode::CREATED, Json(v)).into_response(),
            Reply::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}
