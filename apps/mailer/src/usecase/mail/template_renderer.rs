//! # テンプレートレンダラー
//!
//! tera テンプレートエンジンで配送メールの本文を HTML/plaintext 両形式で生成する。
//!
//! ## 設計方針
//!
//! - **命名規約**: `{テンプレート名}.{html|plain}.tera`
//! - **`include_str!` によるコンパイル時埋め込み**: 正規テンプレート `mail` はバイナリに埋め込む
//! - **ディレクトリ優先**: `from_dir` で読み込んだファイルは埋め込みテンプレートを上書きする
//! - **コンテキスト**: `message` キー 1 つだけにペイロードを包んで渡す
//! - **ステートレス**: レンダリング時に状態を変更しないため、複数ワーカーから共有できる

use std::path::Path;

use postflow_domain::mail::{MailError, QueuedMessage, TemplateFormat};
use tera::{Context, Tera};

/// バイナリに埋め込む既定テンプレート
const EMBEDDED_TEMPLATES: &[(&str, &str)] = &[
    (
        "mail.html.tera",
        include_str!("../../../templates/mail.html.tera"),
    ),
    (
        "mail.plain.tera",
        include_str!("../../../templates/mail.plain.tera"),
    ),
];

/// HTML としてエスケープするテンプレートの接尾辞
const AUTOESCAPE_SUFFIXES: &[&str] = &[".html.tera", ".html"];

/// テンプレートに渡すコンテキストのキー
const CONTEXT_KEY: &str = "message";

/// テンプレートレンダラー
pub struct TemplateRenderer {
    engine: Tera,
}

impl TemplateRenderer {
    /// 埋め込みテンプレートのみでレンダラーを作成する
    pub fn new() -> Result<Self, MailError> {
        Self::from_raw(EMBEDDED_TEMPLATES.iter().copied())
    }

    /// 名前と本文の組からレンダラーを作成する
    pub fn from_raw<'a>(
        templates: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, MailError> {
        let mut engine = Tera::default();
        engine.autoescape_on(AUTOESCAPE_SUFFIXES.to_vec());
        engine
            .add_raw_templates(templates)
            .map_err(|e| MailError::TemplateRender(describe(&e)))?;

        Ok(Self { engine })
    }

    /// ディレクトリ配下の `*.tera` を読み込んでレンダラーを作成する
    ///
    /// ディレクトリに存在しない既定テンプレートは埋め込み版で補う。
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, MailError> {
        let glob = dir.as_ref().join("**").join(format!("*.{}", TemplateFormat::EXTENSION));
        let mut engine = Tera::new(&glob.to_string_lossy())
            .map_err(|e| MailError::TemplateRender(describe(&e)))?;
        engine.autoescape_on(AUTOESCAPE_SUFFIXES.to_vec());

        let fallbacks: Vec<(&str, &str)> = EMBEDDED_TEMPLATES
            .iter()
            .copied()
            .filter(|(name, _)| !engine.get_template_names().any(|loaded| loaded == *name))
            .collect();
        engine
            .add_raw_templates(fallbacks)
            .map_err(|e| MailError::TemplateRender(describe(&e)))?;

        Ok(Self { engine })
    }

    /// 登録済みテンプレート名（ソート済み）
    pub fn template_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .engine
            .get_template_names()
            .map(ToString::to_string)
            .collect();
        names.sort();
        names
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.engine.get_template_names().any(|loaded| loaded == name)
    }

    /// メッセージの本文を指定形式でレンダリングする
    pub fn render(
        &self,
        message: &QueuedMessage,
        format: TemplateFormat,
    ) -> Result<String, MailError> {
        let name = message.template_file(format);
        if !self.has_template(&name) {
            return Err(MailError::TemplateNotFound(name));
        }

        let mut context = Context::new();
        context.insert(CONTEXT_KEY, message.data());

        self.engine
            .render(&name, &context)
            .map_err(|e| MailError::TemplateRender(describe(&e)))
    }
}

/// tera のエラーは原因が source に入るため、連結して 1 行にする
fn describe(error: &tera::Error) -> String {
    let mut description = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        description.push_str(": ");
        description.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    description
}
