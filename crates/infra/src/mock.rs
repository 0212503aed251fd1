//! # テスト用モック
//!
//! ディスパッチャーのテストで使用するインメモリのメール送信モック。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! postflow-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use postflow_domain::mail::{EmailMessage, MailError};

use crate::mail_transport::MailTransport;

// ===== MockMailTransport =====

/// 送信内容を記録するモック
///
/// `Clone` しても記録は共有されるため、ディスパッチャーに渡した後も
/// テスト側から送信履歴を検査できる。
#[derive(Clone, Default)]
pub struct MockMailTransport {
    sent:     Arc<Mutex<Vec<EmailMessage>>>,
    attempts: Arc<Mutex<Vec<String>>>,
    failure:  Option<MailError>,
    delay:    Option<Duration>,
    panic_on: Option<String>,
}

impl MockMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 常に指定エラーで失敗するモック
    pub fn failing(error: MailError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// 送信ごとに指定時間待機する（遅い SMTP サーバーの模擬）
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// 指定宛先への送信時にパニックする（ワーカー内部障害の模擬）
    pub fn panicking_on(mut self, to: impl Into<String>) -> Self {
        self.panic_on = Some(to.into());
        self
    }

    /// 送信に成功したメール
    pub fn sent_emails(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// 送信が試行された宛先（成功・失敗を問わない）
    pub fn attempted_recipients(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for MockMailTransport {
    async fn send(&self, email: &EmailMessage) -> Result<(), MailError> {
        self.attempts.lock().unwrap().push(email.to.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.panic_on.as_deref() == Some(email.to.as_str()) {
            panic!("MockMailTransport: {} への送信でパニック", email.to);
        }

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}
