//! Noop メール送信実装
//!
//! メールを実際に送信せず、ログ出力のみ行う。
//! `MAIL_BACKEND=noop` で配送を無効化したい環境で使用する。

use async_trait::async_trait;
use postflow_domain::mail::{EmailMessage, MailError};

use super::MailTransport;

/// Noop メール送信（ログ出力のみ）
#[derive(Debug, Clone, Default)]
pub struct NoopMailTransport;

#[async_trait]
impl MailTransport for NoopMailTransport {
    async fn send(&self, email: &EmailMessage) -> Result<(), MailError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            attachments = email.attachments.len(),
            "Noop: メール送信をスキップ"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sendがエラーを返さない() {
        let transport = NoopMailTransport;
        let email = EmailMessage {
            from:        "noreply@example.com".to_string(),
            from_name:   String::new(),
            to:          "test@example.com".to_string(),
            subject:     "テスト件名".to_string(),
            text_body:   "テスト".to_string(),
            html_body:   "<p>テスト</p>".to_string(),
            attachments: Vec::new(),
        };

        let result = transport.send(&email).await;
        assert!(result.is_ok());
    }
}
