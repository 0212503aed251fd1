//! # 配送依頼と受付済みメッセージ

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// テンプレート名が省略されたときに使う正規テンプレート
pub const DEFAULT_TEMPLATE: &str = "mail";

define_uuid_id! {
    /// メッセージ ID
    ///
    /// 投入時に採番され、配送結果（[`Outcome`](super::Outcome)）との対応付けに使う。
    pub struct MessageId;
}

/// 送信元の既定値
///
/// SMTP 設定から組み立てられ、起動後は変更されない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderDefaults {
    pub from_address: String,
    pub from_name:    String,
}

impl SenderDefaults {
    pub fn new(from_address: impl Into<String>, from_name: impl Into<String>) -> Self {
        Self {
            from_address: from_address.into(),
            from_name:    from_name.into(),
        }
    }
}

/// 配送依頼
///
/// HTTP 層などの呼び出し側が組み立てる値。`from` / `from_name` / `template` は
/// 空でもよく、[`resolve`](Message::resolve) で既定値に置き換わる。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// 送信元アドレス（空なら既定値）
    #[serde(default)]
    pub from:        String,
    /// 送信元表示名（空なら既定値）
    #[serde(default)]
    pub from_name:   String,
    /// 宛先アドレス
    pub to:          String,
    /// 件名
    #[serde(default)]
    pub subject:     String,
    /// 添付ファイルのパス（この順で添付される）
    #[serde(default)]
    pub attachments: Vec<PathBuf>,
    /// テンプレートに `message` として渡すペイロード
    #[serde(default)]
    pub data:        serde_json::Value,
    /// テンプレートの論理名（空なら [`DEFAULT_TEMPLATE`]）
    #[serde(default)]
    pub template:    String,
}

impl Message {
    pub fn new(to: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            ..Self::default()
        }
    }

    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = from.into();
        self
    }

    pub fn with_from_name(mut self, from_name: impl Into<String>) -> Self {
        self.from_name = from_name.into();
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_attachment(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachments.push(path.into());
        self
    }

    /// 既定値を解決して受付済みメッセージに変換する
    ///
    /// 空の送信元・表示名は `defaults` で、空のテンプレート名は
    /// [`DEFAULT_TEMPLATE`] で置き換える。新しい [`MessageId`] を採番する。
    pub fn resolve(self, defaults: &SenderDefaults) -> QueuedMessage {
        fn or_default(value: String, default: &str) -> String {
            if value.trim().is_empty() {
                default.to_string()
            } else {
                value
            }
        }

        QueuedMessage {
            id:          MessageId::new(),
            from:        or_default(self.from, &defaults.from_address),
            from_name:   or_default(self.from_name, &defaults.from_name),
            to:          self.to,
            subject:     self.subject,
            attachments: self.attachments,
            data:        self.data,
            template:    or_default(self.template, DEFAULT_TEMPLATE),
        }
    }
}

/// 受付済みメッセージ
///
/// 既定値がすべて解決された不変の値。ディスパッチャーが所有し、
/// 呼び出し側からは変更できない。
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedMessage {
    id:          MessageId,
    from:        String,
    from_name:   String,
    to:          String,
    subject:     String,
    attachments: Vec<PathBuf>,
    data:        serde_json::Value,
    template:    String,
}

impl QueuedMessage {
    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn from_name(&self) -> &str {
        &self.from_name
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn attachments(&self) -> &[PathBuf] {
        &self.attachments
    }

    pub fn data(&self) -> &serde_json::Value {
        &self.data
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// 指定形式のテンプレートファイル名を返す（例: `mail.html.tera`）
    pub fn template_file(&self, format: TemplateFormat) -> String {
        format.file_name(&self.template)
    }
}

/// テンプレート形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum TemplateFormat {
    /// HTML 本文
    Html,
    /// プレーンテキスト本文
    Plain,
}

impl TemplateFormat {
    /// テンプレートファイルの拡張子
    pub const EXTENSION: &'static str = "tera";

    /// 論理名と形式からテンプレートファイル名を組み立てる
    pub fn file_name(self, template: &str) -> String {
        format!("{template}.{format}.{ext}", format = self, ext = Self::EXTENSION)
    }
}
