//! # メール送信
//!
//! 完成済みメールの送信を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `MailTransport` trait でメール送信を抽象化
//! - **2 つの実装**: SMTP（本番・Mailpit）、Noop（送信無効化）
//! - **環境変数切替**: `MAIL_BACKEND` でランタイム選択
//! - **リトライしない**: 失敗はそのまま返し、再送は結果を観測する側が判断する

mod noop;
mod smtp;

use async_trait::async_trait;
pub use noop::NoopMailTransport;
use postflow_domain::mail::{EmailMessage, MailError};
pub use smtp::{EncryptionMode, SmtpConfig, SmtpMailTransport};

/// メール送信トレイト
///
/// 配送パイプラインの最終段。複数ワーカーから同時に呼ばれるため `Send + Sync`。
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// メールを送信する
    async fn send(&self, email: &EmailMessage) -> Result<(), MailError>;
}
