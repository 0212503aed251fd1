//! # 配送パイプライン
//!
//! 受付済みメッセージ 1 件を送信メールに組み立てて送信する。
//!
//! 段階は HTML レンダリング → プレーンテキストレンダリング → CSS インライン化
//! → 添付ファイル読み込み → 送信 の順で、最初に失敗した段階で打ち切る。
//! 失敗した場合、SMTP 接続は行われない。

use std::sync::Arc;

use postflow_domain::mail::{EmailMessage, MailError, QueuedMessage, TemplateFormat};
use postflow_infra::{attachment::load_attachments, mail_transport::MailTransport};

use super::{CssInliner, TemplateRenderer};

/// 配送パイプライン
///
/// 状態を持たないため、`Arc` で包んで全ワーカーから共有する。
pub struct MailPipeline {
    renderer:  TemplateRenderer,
    inliner:   CssInliner,
    transport: Arc<dyn MailTransport>,
}

impl MailPipeline {
    pub fn new(renderer: TemplateRenderer, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            renderer,
            inliner: CssInliner::new(),
            transport,
        }
    }

    /// 送信メールを組み立てる（送信は行わない）
    pub async fn compose(&self, message: &QueuedMessage) -> Result<EmailMessage, MailError> {
        let html = self.renderer.render(message, TemplateFormat::Html)?;
        let text_body = self.renderer.render(message, TemplateFormat::Plain)?;
        let html_body = self.inliner.inline(&html)?;
        let attachments = load_attachments(message.attachments()).await?;

        Ok(EmailMessage {
            from: message.from().to_string(),
            from_name: message.from_name().to_string(),
            to: message.to().to_string(),
            subject: message.subject().to_string(),
            text_body,
            html_body,
            attachments,
        })
    }

    /// メッセージを組み立てて送信する
    pub async fn deliver(&self, message: &QueuedMessage) -> Result<(), MailError> {
        let email = self.compose(message).await?;

        tracing::debug!(
            mail.id = %message.id(),
            mail.to = %email.to,
            mail.attachments = email.attachments.len(),
            "メール送信開始"
        );

        self.transport.send(&email).await
    }
}
