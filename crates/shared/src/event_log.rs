//! # ビジネスイベントログとエラーコンテキストの構造化ヘルパー
//!
//! メール配送の結果を `jq` で追跡できるよう、ログフィールドの命名規約と
//! ヘルパーマクロを提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`error.kind`）を使用。tracing の
//! `$($field:ident).+` パターンでサポートされ、JSON 出力でフラットなキーになる。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.result`: 結果（[`event::result`] の定数を使用）
///
/// ## 推奨フィールド
///
/// - `event.entity_id`: メッセージ ID
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const MAIL: &str = "mail";
    }

    /// イベントアクション
    pub mod action {
        pub const MAIL_QUEUED: &str = "mail.queued";
        pub const MAIL_SENT: &str = "mail.sent";
        pub const MAIL_FAILED: &str = "mail.failed";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// テンプレート・CSS インライン化など、メッセージ内容の生成
        pub const CONTENT: &str = "content";
        /// SMTP サーバー・ファイルシステムなどの外部リソース
        pub const EXTERNAL_SERVICE: &str = "external_service";
        /// ワーカー自体の障害
        pub const INTERNAL: &str = "internal";
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_log_business_eventがコンパイルできる() {
        crate::log_business_event!(
            event.category = super::event::category::MAIL,
            event.action = super::event::action::MAIL_SENT,
            event.result = super::event::result::SUCCESS,
            "テスト"
        );
    }
}
