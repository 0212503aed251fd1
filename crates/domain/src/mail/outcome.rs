//! # 配送結果

use super::{MailError, MessageId, QueuedMessage};

/// 配送結果
///
/// 受付済みメッセージ 1 件につき、ちょうど 1 件発行される。
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// SMTP サーバーが受理した
    Sent { id: MessageId },
    /// いずれかの段階で失敗した（残りの段階は実行されていない）
    Failed {
        message: Box<QueuedMessage>,
        error:   MailError,
    },
}

impl Outcome {
    pub fn failed(message: QueuedMessage, error: MailError) -> Self {
        Self::Failed {
            message: Box::new(message),
            error,
        }
    }

    /// 対象メッセージの ID
    pub fn id(&self) -> MessageId {
        match self {
            Self::Sent { id } => *id,
            Self::Failed { message, .. } => message.id(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }

    /// 失敗時のエラーを返す
    pub fn error(&self) -> Option<&MailError> {
        match self {
            Self::Sent { .. } => None,
            Self::Failed { error, .. } => Some(error),
        }
    }
}
