//! # PostFlow インフラ層
//!
//! 外部システム（SMTP サーバー、ファイルシステム）との通信を担当する。
//!
//! ## 設計方針
//!
//! ドメイン層で定義された値（[`EmailMessage`](postflow_domain::mail::EmailMessage) など）を
//! 外部システムに届ける具体的な実装を提供する。外部システムの詳細をカプセル化し、
//! 失敗はすべて [`MailError`](postflow_domain::mail::MailError) に変換して返す。
//!
//! ## 依存関係
//!
//! ```text
//! mailer → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`mail_transport`] - メール送信の抽象と SMTP / Noop 実装
//! - [`attachment`] - 添付ファイルの読み込み
//! - `mock` - テスト用モック（`test-utils` feature）

pub mod attachment;
pub mod mail_transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
