//! # ヘルスチェックハンドラ
//!
//! メール配送サービスの稼働状態を確認するためのエンドポイント。
//!
//! ## エンドポイント
//!
//! ```text
//! GET /health
//! ```
//!
//! ## レスポンス例
//!
//! ```json
//! {
//!   "status": "healthy",
//!   "version": "0.1.0"
//! }
//! ```
//!
//! シャットダウン中（キュー排出中）は `503` と `"draining"` を返し、
//! ロードバランサーが新しい配送依頼を振り分けないようにする。

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use postflow_shared::HealthResponse;

use super::MailState;

/// ヘルスチェックエンドポイント
pub async fn health_check(
    State(state): State<Arc<MailState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let version = env!("CARGO_PKG_VERSION");
    if state.mailer.is_closed() {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse::draining(version)),
        )
    } else {
        (StatusCode::OK, Json(HealthResponse::healthy(version)))
    }
}
