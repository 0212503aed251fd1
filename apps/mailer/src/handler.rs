//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、配送処理はディスパッチャーに委譲

pub mod health;
pub mod mail;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
pub use health::health_check;
pub use mail::{MailState, SubmitResponse, submit_mail};

/// ルーターを構築する
pub fn router(state: Arc<MailState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/internal/mail", post(submit_mail))
        .with_state(state)
}
