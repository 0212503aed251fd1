//! # 送信メール

/// 送信メール
///
/// レンダリング・CSS インライン化・添付読み込みを終えた完成形。
/// インフラ層の `MailTransport` 実装に渡される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// 送信元メールアドレス
    pub from:        String,
    /// 送信元表示名（空なら表示名なし）
    pub from_name:   String,
    /// 送信先メールアドレス
    pub to:          String,
    /// 件名
    pub subject:     String,
    /// プレーンテキスト本文
    pub text_body:   String,
    /// HTML 本文（CSS インライン化済み）
    pub html_body:   String,
    /// 添付ファイル（投入順）
    pub attachments: Vec<Attachment>,
}

/// 添付ファイル
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    /// 受信者に表示されるファイル名
    pub filename:     String,
    /// MIME タイプ（例: `application/pdf`）
    pub content_type: String,
    /// ファイル内容
    pub content:      Vec<u8>,
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("size", &self.content.len())
            .finish()
    }
}
