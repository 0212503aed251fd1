//! # 配送依頼ハンドラ
//!
//! Web 層から配送依頼を受け付け、ディスパッチャーのキューに投入する。
//! 配送の完了は待たない。
//!
//! ## エンドポイント
//!
//! ```text
//! POST /internal/mail
//! ```
//!
//! ## リクエスト例
//!
//! ```json
//! {
//!   "to": "alice@example.com",
//!   "subject": "Failed login attempt",
//!   "data": "invalid login attempt",
//!   "template": "",
//!   "attachments": []
//! }
//! ```
//!
//! 受付時は `202 Accepted` と採番したメッセージ ID を返す。
//! キューが満杯またはシャットダウン中は `503` を返す。
//!
//! ## 添付ファイル
//!
//! `attachments` は添付ルート（`MAIL_ATTACHMENT_DIR`）からの相対パスとして解決する。
//! ルート外を指すパス・存在しないパスは `400`。
//! 添付ルートが未設定の場合、添付付きの依頼はすべて `400` になる。

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use axum::{Json, extract::State, http::StatusCode};
use postflow_domain::mail::{Message, MessageId};
use serde::Serialize;

use crate::{error::MailerError, usecase::mail::Mailer};

/// 配送依頼 API の共有状態
pub struct MailState {
    pub mailer:          Mailer,
    /// 添付ファイルを読み込めるディレクトリ（未設定なら添付を受け付けない）
    pub attachment_root: Option<PathBuf>,
}

impl MailState {
    pub fn new(mailer: Mailer) -> Self {
        Self {
            mailer,
            attachment_root: None,
        }
    }

    pub fn with_attachment_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.attachment_root = Some(root.into());
        self
    }
}

/// 受付レスポンス
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub id: MessageId,
}

/// 配送依頼を受け付ける
///
/// キューの空きを待たずに投入する（満杯なら即座に 503）。
pub async fn submit_mail(
    State(state): State<Arc<MailState>>,
    Json(mut message): Json<Message>,
) -> Result<(StatusCode, Json<SubmitResponse>), MailerError> {
    if message.to.trim().is_empty() {
        return Err(MailerError::BadRequest("宛先（to）は必須です".to_string()));
    }

    if !message.attachments.is_empty() {
        let Some(root) = &state.attachment_root else {
            return Err(MailerError::BadRequest(
                "添付ファイルは受け付けていません".to_string(),
            ));
        };
        message.attachments = confine_attachments(root, &message.attachments).await?;
    }

    let id = state.mailer.try_submit(message)?;

    Ok((StatusCode::ACCEPTED, Json(SubmitResponse { id })))
}

/// 添付パスを添付ルート配下の正規化済みパスに解決する
async fn confine_attachments(
    root: &Path,
    attachments: &[PathBuf],
) -> Result<Vec<PathBuf>, MailerError> {
    let root = tokio::fs::canonicalize(root).await.map_err(|e| {
        tracing::error!(root = %root.display(), error = %e, "添付ルートを解決できません");
        MailerError::BadRequest("添付ファイルは受け付けていません".to_string())
    })?;

    let mut resolved = Vec::with_capacity(attachments.len());
    for path in attachments {
        let rejected = || {
            MailerError::BadRequest(format!(
                "添付ファイル {} は許可されていません",
                path.display()
            ))
        };
        let canonical = tokio::fs::canonicalize(root.join(path))
            .await
            .map_err(|_| rejected())?;
        if !canonical.starts_with(&root) {
            return Err(rejected());
        }
        resolved.push(canonical);
    }
    Ok(resolved)
}
