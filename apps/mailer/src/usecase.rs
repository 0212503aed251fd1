//! # ユースケース層
//!
//! メール配送サービスのアプリケーションロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: 送信手段は `Arc<dyn MailTransport>` で外部から注入
//! - **薄いハンドラ**: ハンドラは投入だけを行い、配送はユースケースに集約

pub mod mail;
