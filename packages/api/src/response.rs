// ABOUTME: Shared API response envelope
// ABOUTME: Every success is wrapped as {success, data, error}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::error::AppError;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

pub type ApiResult = Result<Response, AppError>;

pub fn ok<T: Serialize>(data: T) -> ApiResult {
    Ok((StatusCode::OK, Json(ApiResponse::success(data))).into_response())
}

pub fn created<T: Serialize>(data: T) -> ApiResult {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(data))).into_response())
}

/// Body returned by delete endpoints
#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: String,
}

pub fn deleted(id: impl Into<String>) -> ApiResult {
    ok(Deleted { id: id.into() })
}
