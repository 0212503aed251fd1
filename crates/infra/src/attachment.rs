//! # 添付ファイル読み込み
//!
//! 添付ファイルは送信直前に読み込む。存在しない・読めないファイルは
//! そのメッセージだけを失敗させ、SMTP 接続は試みない。

use std::path::{Path, PathBuf};

use postflow_domain::mail::{Attachment, MailError};

/// 添付ファイルを指定順に読み込む
///
/// 最初に失敗したファイルで打ち切り、[`MailError::AttachmentRead`] を返す。
pub async fn load_attachments(paths: &[PathBuf]) -> Result<Vec<Attachment>, MailError> {
    let mut attachments = Vec::with_capacity(paths.len());
    for path in paths {
        attachments.push(load_attachment(path).await?);
    }
    Ok(attachments)
}

async fn load_attachment(path: &Path) -> Result<Attachment, MailError> {
    let read_error = |reason: String| MailError::AttachmentRead {
        path: path.to_path_buf(),
        reason,
    };

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| read_error("ファイル名を含まないパスです".to_string()))?;

    let content = tokio::fs::read(path)
        .await
        .map_err(|e| read_error(e.to_string()))?;

    Ok(Attachment {
        filename,
        content_type: content_type_for(path),
        content,
    })
}

/// 拡張子から MIME タイプを推定する（不明なら `application/octet-stream`）
pub fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}
