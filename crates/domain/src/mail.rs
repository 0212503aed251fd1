//! # メール
//!
//! 非同期メール配送に関するドメインモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`Message`] | 配送依頼 | 呼び出し側が組み立てる値。送信元・テンプレートは省略可 |
//! | [`QueuedMessage`] | 受付済みメッセージ | 既定値を解決し ID を振った不変の値 |
//! | [`EmailMessage`] | 送信メール | レンダリング・インライン化済みでトランスポートに渡す完成形 |
//! | [`Outcome`] | 配送結果 | 受付済みメッセージ 1 件につき必ず 1 件発行される |
//!
//! ## 設計方針
//!
//! - **投入時の正規化**: [`Message::resolve`] が唯一の既定値解決ポイント
//! - **不透明なペイロード**: テンプレートに渡すデータは `serde_json::Value` で保持し、
//!   レンダラーは具体的な型を知らない

mod email;
mod error;
mod message;
mod outcome;

pub use email::{Attachment, EmailMessage};
pub use error::MailError;
pub use message::{DEFAULT_TEMPLATE, Message, MessageId, QueuedMessage, SenderDefaults, TemplateFormat};
pub use outcome::Outcome;
