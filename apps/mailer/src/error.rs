//! # Mailer エラー定義
//!
//! HTTP 受付層で発生するエラーと、HTTP レスポンスへの変換を定義する。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::usecase::mail::SubmitError;

/// エラーレスポンス（RFC 7807 Problem Details）
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub error_type: String,
    pub title:      String,
    pub status:     u16,
    pub detail:     String,
}

/// HTTP 受付層で発生するエラー
#[derive(Debug, Error)]
pub enum MailerError {
    /// 不正なリクエスト
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    /// 配送キューに投入できない
    #[error("配送依頼を受け付けられません: {0}")]
    Unavailable(#[from] SubmitError),
}

impl IntoResponse for MailerError {
    fn into_response(self) -> Response {
        let (status, error_type, title, detail) = match &self {
            MailerError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "https://postflow.example.com/errors/bad-request",
                "Bad Request",
                msg.clone(),
            ),
            MailerError::Unavailable(e) => {
                tracing::warn!(error = %e, "配送依頼を拒否");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "https://postflow.example.com/errors/service-unavailable",
                    "Service Unavailable",
                    e.to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorResponse {
                error_type: error_type.to_string(),
                title: title.to_string(),
                status: status.as_u16(),
                detail,
            }),
        )
            .into_response()
    }
}
