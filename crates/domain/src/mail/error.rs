//! # 配送エラー

use std::path::PathBuf;

use strum::IntoStaticStr;
use thiserror::Error;

/// メール配送エラー
///
/// すべてのバリアントは 1 件のメッセージに帰属し、ワーカーを停止させない。
/// [`kind`](MailError::kind) はログの `error.kind` フィールドに使う安定したラベル。
#[derive(Debug, Clone, PartialEq, Eq, Error, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum MailError {
    /// 指定名のテンプレートが存在しない
    #[error("テンプレートが見つかりません: {0}")]
    TemplateNotFound(String),

    /// テンプレートへのデータ埋め込みに失敗
    #[error("テンプレートのレンダリングに失敗: {0}")]
    TemplateRender(String),

    /// HTML への CSS インライン化に失敗
    #[error("CSS のインライン化に失敗: {0}")]
    Inline(String),

    /// 添付ファイルが存在しない、または読み込めない
    #[error("添付ファイルを読み込めません: {}: {}", .path.display(), .reason)]
    AttachmentRead { path: PathBuf, reason: String },

    /// 送信元・宛先アドレスの形式が不正
    #[error("メールアドレスが不正です: {0}")]
    InvalidAddress(String),

    /// SMTP セッションの確立（TCP / TLS / 認証）に失敗
    #[error("SMTP サーバーへの接続に失敗: {0}")]
    Connect(String),

    /// 接続確立後の送信が拒否された、またはタイムアウトした
    #[error("SMTP 送信に失敗: {0}")]
    Send(String),

    /// ワーカー内部の想定外の障害（パニックなど）
    #[error("配送ワーカー内部エラー: {0}")]
    InternalDispatch(String),
}

impl MailError {
    /// ログ用のエラー種別ラベルを返す（例: `"template_not_found"`）
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    /// SMTP サーバーとのやり取りで発生したエラーかどうか
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::Send(_))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(MailError::TemplateNotFound("x".into()), "template_not_found")]
    #[case(MailError::TemplateRender("x".into()), "template_render")]
    #[case(MailError::Inline("x".into()), "inline")]
    #[case(MailError::AttachmentRead { path: "a.pdf".into(), reason: "x".into() }, "attachment_read")]
    #[case(MailError::InvalidAddress("x".into()), "invalid_address")]
    #[case(MailError::Connect("x".into()), "connect")]
    #[case(MailError::Send("x".into()), "send")]
    #[case(MailError::InternalDispatch("x".into()), "internal_dispatch")]
    fn test_kindがsnake_caseのラベルを返す(#[case] error: MailError, #[case] expected: &str) {
        assert_eq!(error.kind(), expected);
    }

    #[test]
    fn test_attachment_readのメッセージにパスが含まれる() {
        let error = MailError::AttachmentRead {
            path:   PathBuf::from("/tmp/missing.pdf"),
            reason: "No such file or directory".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "添付ファイルを読み込めません: /tmp/missing.pdf: No such file or directory"
        );
    }

    #[test]
    fn test_is_transportは接続と送信のみ真になる() {
        assert!(MailError::Connect("x".into()).is_transport());
        assert!(MailError::Send("x".into()).is_transport());
        assert!(!MailError::TemplateNotFound("x".into()).is_transport());
    }
}
