//! # ログ出力の初期化
//!
//! mailer プロセス全体で 1 つの subscriber を組み立てる。
//! 出力形式は `LOG_FORMAT`、レベルは `RUST_LOG` で切り替える。

use std::str::FromStr;

/// ログ出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 1 行 1 イベントの JSON（ログ収集基盤向け）
    Json,
    /// 端末向けの整形済みテキスト
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(format!("未対応のログ形式です: {other:?}（json | pretty）")),
        }
    }
}

impl LogFormat {
    /// `LOG_FORMAT` の値を解決する
    ///
    /// 未設定なら既定値。解釈できない値は警告して既定値に戻す
    /// （subscriber 初期化前のため警告は stderr に出す）。
    pub fn resolve(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return Self::default();
        };
        value.parse().unwrap_or_else(|reason| {
            eprintln!("WARNING: LOG_FORMAT を無視します: {reason}");
            Self::default()
        })
    }

    pub fn from_env() -> Self {
        Self::resolve(std::env::var("LOG_FORMAT").ok().as_deref())
    }
}

/// `RUST_LOG` 未設定時の既定フィルタ
pub const DEFAULT_FILTER: &str = "info,postflow=debug";

/// トレーシング初期化設定
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// `app` スパンに載せるサービス名
    pub service_name:   String,
    pub log_format:     LogFormat,
    /// `RUST_LOG` 未設定時のフィルタ
    pub default_filter: String,
}

impl TracingConfig {
    pub fn new(service_name: impl Into<String>, log_format: LogFormat) -> Self {
        Self {
            service_name: service_name.into(),
            log_format,
            default_filter: DEFAULT_FILTER.to_string(),
        }
    }

    pub fn from_env(service_name: impl Into<String>) -> Self {
        Self::new(service_name, LogFormat::from_env())
    }

    pub fn with_default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = filter.into();
        self
    }
}

/// グローバル subscriber を登録し、`app` スパンを返す
///
/// 呼び出し側がスパンに入っている間、JSON 出力の各行に
/// `span.service` が付く。
#[cfg(feature = "observability")]
pub fn init_tracing(config: &TracingConfig) -> tracing::Span {
    use tracing_subscriber::{
        EnvFilter,
        Layer as _,
        layer::SubscriberExt,
        util::SubscriberInitExt,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();

    tracing::info_span!("app", service = %config.service_name)
}
