//! # メール配送ユースケース
//!
//! 配送依頼をキューに受け付け、バックグラウンドで
//! レンダリング → CSS インライン化 → 添付読み込み → SMTP 送信を行う。
//!
//! ## モジュール構成
//!
//! - [`template_renderer`] - tera テンプレートエンジンによる本文生成
//! - [`css_inliner`] - HTML 本文の CSS インライン化
//! - [`pipeline`] - 1 件分の配送段階の統合
//! - [`dispatcher`] - 有界キューとワーカープール

pub mod css_inliner;
pub mod dispatcher;
pub mod pipeline;
pub mod template_renderer;

pub use css_inliner::CssInliner;
pub use dispatcher::{DispatcherOptions, Mailer, Outcomes, SubmitError};
pub use pipeline::MailPipeline;
pub use template_renderer::TemplateRenderer;
