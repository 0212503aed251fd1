//! # Mailer ライブラリ
//!
//! メール配送サービスの設定・ユースケース・ハンドラを公開する。
//! 統合テストから内部モジュールへアクセスするためにライブラリとしても提供する。

pub mod config;
pub mod error;
pub mod handler;
pub mod usecase;
