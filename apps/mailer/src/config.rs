//! # Mailer 設定
//!
//! 環境変数からメール配送サービスの設定を読み込む。
//! 未設定・空文字の変数は既定値を使い、数値として解釈できない値は
//! [`ConfigError`] として起動を中止する。

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use postflow_domain::mail::SenderDefaults;
use postflow_infra::mail_transport::{EncryptionMode, SmtpConfig};
use thiserror::Error;

use crate::usecase::mail::DispatcherOptions;

/// 設定読み込みエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// 値を解釈できない
    #[error("環境変数 {key} の値が不正です: {value:?}（{reason}）")]
    Invalid {
        key:    &'static str,
        value:  String,
        reason: String,
    },
}

/// 送信バックエンド
///
/// `MAIL_BACKEND` 環境変数で切り替える:
/// - `smtp`: SMTP サーバー経由で送信（Mailpit / 本番 SMTP）
/// - `noop`: 送信しない（ログ出力のみ）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MailBackend {
    #[default]
    Smtp,
    Noop,
}

impl FromStr for MailBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "smtp" => Ok(Self::Smtp),
            "noop" => Ok(Self::Noop),
            other => Err(format!("未対応のバックエンドです: {other}（smtp | noop）")),
        }
    }
}

/// メール配送サービスの設定
#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// バインドアドレス
    pub host:           String,
    /// ポート番号
    pub port:           u16,
    /// 送信バックエンド
    pub backend:        MailBackend,
    /// SMTP 接続設定（backend=smtp の場合に使用）
    pub smtp:           SmtpConfig,
    /// 送信元の既定値
    pub sender:         SenderDefaults,
    /// 追加テンプレートのディレクトリ（未設定なら埋め込みテンプレートのみ）
    pub template_dir:   Option<PathBuf>,
    /// HTTP 経由の添付を読み込めるディレクトリ（未設定なら添付を受け付けない）
    pub attachment_dir: Option<PathBuf>,
    /// ディスパッチャーの起動オプション
    pub dispatcher:     DispatcherOptions,
}

impl MailerConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意の参照関数から設定を読み込む
    ///
    /// テストではプロセス環境変数を書き換えずに値を差し込むために使う。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars { lookup };

        let mut smtp = SmtpConfig::new(
            vars.string("SMTP_HOST", "localhost"),
            vars.parse("SMTP_PORT", 1025)?,
        );
        smtp.username = vars.string("SMTP_USERNAME", "");
        smtp.password = vars.string("SMTP_PASSWORD", "");
        smtp.encryption = EncryptionMode::parse(&vars.string("SMTP_ENCRYPTION", "tls"));
        smtp.domain = vars.string("SMTP_DOMAIN", "");
        smtp.connect_timeout = Duration::from_secs(vars.parse(
            "SMTP_CONNECT_TIMEOUT_SECS",
            SmtpConfig::DEFAULT_TIMEOUT.as_secs(),
        )?);
        smtp.send_timeout = Duration::from_secs(vars.parse(
            "SMTP_SEND_TIMEOUT_SECS",
            SmtpConfig::DEFAULT_TIMEOUT.as_secs(),
        )?);

        Ok(Self {
            host: vars.string("MAILER_HOST", "0.0.0.0"),
            port: vars.parse("MAILER_PORT", 3100)?,
            backend: vars.parse("MAIL_BACKEND", MailBackend::default())?,
            smtp,
            sender: SenderDefaults::new(
                vars.string("MAIL_FROM_ADDRESS", "noreply@postflow.example.com"),
                vars.string("MAIL_FROM_NAME", "PostFlow"),
            ),
            template_dir: vars.get("MAIL_TEMPLATE_DIR").map(PathBuf::from),
            attachment_dir: vars.get("MAIL_ATTACHMENT_DIR").map(PathBuf::from),
            dispatcher: DispatcherOptions {
                queue_capacity: vars.parse(
                    "MAIL_QUEUE_CAPACITY",
                    DispatcherOptions::DEFAULT_QUEUE_CAPACITY,
                )?,
                workers:        vars.parse("MAIL_WORKERS", DispatcherOptions::DEFAULT_WORKERS)?,
            },
        })
    }
}

struct Vars<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    /// 空白のみの値は未設定とみなす
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|value| !value.trim().is_empty())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parse<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: ToString,
    {
        let Some(value) = self.get(key) else {
            return Ok(default);
        };
        value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        })
    }
}
