//! SMTP メール送信実装
//!
//! lettre の `AsyncSmtpConnection` を直接使用してメールを送信する。
//! 開発環境では Mailpit（ローカル SMTP サーバー）に接続する。
//!
//! 送信ごとに新しい SMTP セッションを張る（コネクションプールは使わない）。
//! 接続段階（TCP / TLS / EHLO / AUTH）と送信段階でタイムアウトとエラー種別を分けるため、
//! `AsyncSmtpTransport` ではなく低レベル API を使っている。

use std::{fmt, time::Duration};

use async_trait::async_trait;
use lettre::{
    Address,
    Message,
    message::{Attachment as MimeAttachment, Mailbox, MultiPart, header::ContentType},
    transport::smtp::{
        self,
        authentication::{Credentials, Mechanism},
        client::{AsyncSmtpConnection, TlsParameters},
        extension::ClientId,
    },
};
use postflow_domain::mail::{EmailMessage, MailError};

use super::MailTransport;

const AUTH_MECHANISMS: &[Mechanism] = &[Mechanism::Plain, Mechanism::Login];

/// SMTP 接続の暗号化方式
///
/// 設定値 `tls` / `ssl` / `none` のいずれかに対応する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum EncryptionMode {
    /// 平文で接続し、サーバーが対応していれば STARTTLS で昇格する
    #[default]
    StartTls,
    /// 接続時点から TLS（SMTPS）
    ImplicitTls,
    /// 暗号化しない（Mailpit などローカル開発用）
    Plaintext,
}

impl EncryptionMode {
    /// 設定文字列から暗号化方式を解決する
    ///
    /// 未知の値は [`StartTls`](EncryptionMode::StartTls) にフォールバックする。
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "tls" | "starttls" => Self::StartTls,
            "ssl" => Self::ImplicitTls,
            "none" => Self::Plaintext,
            other => {
                tracing::warn!(
                    value = other,
                    "未知の SMTP 暗号化方式のため STARTTLS を使用します"
                );
                Self::StartTls
            }
        }
    }
}

/// SMTP 接続設定
///
/// 起動時に一度だけ組み立て、以後は読み取り専用で共有する。
#[derive(Clone)]
pub struct SmtpConfig {
    /// SMTP サーバーのホスト名（例: "localhost"）
    pub host:            String,
    /// SMTP サーバーのポート番号（例: 1025 for Mailpit）
    pub port:            u16,
    /// 認証ユーザー名（空なら認証しない）
    pub username:        String,
    /// 認証パスワード
    pub password:        String,
    /// 暗号化方式
    pub encryption:      EncryptionMode,
    /// EHLO で名乗るドメイン（空ならホスト名）
    pub domain:          String,
    /// 接続確立（TCP / TLS / 認証）のタイムアウト
    pub connect_timeout: Duration,
    /// 接続確立後の送信のタイムアウト
    pub send_timeout:    Duration,
}

impl SmtpConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            username: String::new(),
            password: String::new(),
            encryption: EncryptionMode::default(),
            domain: String::new(),
            connect_timeout: Self::DEFAULT_TIMEOUT,
            send_timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    fn credentials(&self) -> Option<Credentials> {
        (!self.username.is_empty())
            .then(|| Credentials::new(self.username.clone(), self.password.clone()))
    }

    fn hello_name(&self) -> ClientId {
        if self.domain.is_empty() {
            ClientId::default()
        } else {
            ClientId::Domain(self.domain.clone())
        }
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("encryption", &self.encryption)
            .field("domain", &self.domain)
            .field("connect_timeout", &self.connect_timeout)
            .field("send_timeout", &self.send_timeout)
            .finish()
    }
}

/// SMTP メール送信
pub struct SmtpMailTransport {
    config: SmtpConfig,
}

impl SmtpMailTransport {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    /// SMTP セッションを確立する（TLS 昇格と認証を含む）
    async fn connect(&self) -> Result<AsyncSmtpConnection, smtp::Error> {
        let hello_name = self.config.hello_name();

        let implicit_tls = match self.config.encryption {
            EncryptionMode::ImplicitTls => Some(TlsParameters::new(self.config.host.clone())?),
            EncryptionMode::StartTls | EncryptionMode::Plaintext => None,
        };

        let mut conn = AsyncSmtpConnection::connect_tokio1(
            (self.config.host.as_str(), self.config.port),
            Some(self.config.connect_timeout),
            &hello_name,
            implicit_tls,
            None,
        )
        .await?;

        if self.config.encryption == EncryptionMode::StartTls && conn.can_starttls() {
            conn.starttls(TlsParameters::new(self.config.host.clone())?, &hello_name)
                .await?;
        }

        if let Some(credentials) = self.config.credentials() {
            conn.auth(AUTH_MECHANISMS, &credentials).await?;
        }

        Ok(conn)
    }
}

/// 送信メールを MIME メッセージに変換する
///
/// 本文は text/plain と text/html の multipart/alternative。
/// 添付ファイルがある場合は multipart/mixed で包み、投入順に追加する。
fn build_message(email: &EmailMessage) -> Result<Message, MailError> {
    let from_address: Address = email
        .from
        .parse()
        .map_err(|e| MailError::InvalidAddress(format!("送信元 {:?}: {e}", email.from)))?;
    let from_name = (!email.from_name.is_empty()).then(|| email.from_name.clone());
    let to: Mailbox = email
        .to
        .parse()
        .map_err(|e| MailError::InvalidAddress(format!("宛先 {:?}: {e}", email.to)))?;

    let body = MultiPart::alternative_plain_html(email.text_body.clone(), email.html_body.clone());

    let builder = Message::builder()
        .from(Mailbox::new(from_name, from_address))
        .to(to)
        .subject(&email.subject);

    let message = if email.attachments.is_empty() {
        builder.multipart(body)
    } else {
        let mut mixed = MultiPart::mixed().multipart(body);
        for attachment in &email.attachments {
            let content_type = ContentType::parse(&attachment.content_type).map_err(|e| {
                MailError::AttachmentRead {
                    path:   attachment.filename.clone().into(),
                    reason: format!("Content-Type {:?} を解釈できません: {e}", attachment.content_type),
                }
            })?;
            mixed = mixed.singlepart(
                MimeAttachment::new(attachment.filename.clone())
                    .body(attachment.content.clone(), content_type),
            );
        }
        builder.multipart(mixed)
    };

    message.map_err(|e| MailError::Send(format!("メッセージ構築失敗: {e}")))
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, email: &EmailMessage) -> Result<(), MailError> {
        let message = build_message(email)?;

        let connected = tokio::time::timeout(self.config.connect_timeout, self.connect()).await;
        let mut conn = match connected {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => return Err(MailError::Connect(e.to_string())),
            Err(_) => {
                return Err(MailError::Connect(format!(
                    "{}:{} への接続が {:?} 以内に完了しませんでした",
                    self.config.host, self.config.port, self.config.connect_timeout
                )));
            }
        };

        tracing::debug!(
            host = %self.config.host,
            port = self.config.port,
            encryption = %self.config.encryption,
            encrypted = conn.is_encrypted(),
            "SMTP セッションを確立"
        );

        let formatted = message.formatted();
        let sent = tokio::time::timeout(
            self.config.send_timeout,
            conn.send(message.envelope(), &formatted),
        )
        .await;

        match sent {
            Ok(Ok(_response)) => {
                match tokio::time::timeout(self.config.send_timeout, conn.quit()).await {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => tracing::debug!(error = %e, "QUIT の応答を受け取れませんでした"),
                    Err(_) => tracing::debug!("QUIT の応答がタイムアウトしました"),
                }
                Ok(())
            }
            Ok(Err(e)) => {
                // abort は QUIT の応答を待つため、これも送信タイムアウトで打ち切る
                let _ = tokio::time::timeout(self.config.send_timeout, conn.abort()).await;
                Err(MailError::Send(e.to_string()))
            }
            Err(_) => {
                // 応答しないサーバーに QUIT は送らず、接続を破棄する
                drop(conn);
                Err(MailError::Send(format!(
                    "送信が {:?} 以内に完了しませんでした",
                    self.config.send_timeout
                )))
            }
        }
    }
}
