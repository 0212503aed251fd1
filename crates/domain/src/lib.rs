//! # PostFlow ドメイン層
//!
//! メール配送サブシステムのドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **値オブジェクト**: `Message` は投入後に変更されない値として扱う
//! - **正規化は一度だけ**: 送信元・テンプレートの既定値は投入時に解決し、
//!   ワーカー内部では解決済みの [`mail::QueuedMessage`] のみを扱う
//! - **エラー分類**: 配送失敗は [`mail::MailError`] で表現し、
//!   すべてメッセージ単位に閉じる
//!
//! ## 依存関係の方向
//!
//! ```text
//! mailer → infra → domain
//! ```
//!
//! ドメイン層はインフラ層（SMTP、ファイルシステム）に一切依存しない。
//!
//! ## 使用例
//!
//! ```rust
//! use postflow_domain::mail::{Message, SenderDefaults};
//!
//! let defaults = SenderDefaults::new("noreply@example.com", "PostFlow");
//! let queued = Message::new("a@example.com", "Welcome").resolve(&defaults);
//!
//! assert_eq!(queued.from(), "noreply@example.com");
//! assert_eq!(queued.template(), "mail");
//! ```

#[macro_use]
mod macros;

pub mod mail;
