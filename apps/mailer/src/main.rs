//! # Mailer サーバー
//!
//! 配送依頼を受け付け、バックグラウンドでメールを送信する内部サービス。
//!
//! ## 役割
//!
//! - **受付**: `POST /internal/mail` で配送依頼をキューに投入し、即座に応答する
//! - **配送**: ワーカーがテンプレートをレンダリングし、CSS をインライン化して SMTP で送信する
//! - **結果の記録**: 配送結果をビジネスイベントとして構造化ログに出力する
//!
//! ```text
//! ┌──────────────┐  POST   ┌──────────────┐  queue  ┌──────────────┐  SMTP  ┌──────────────┐
//! │   Web 層     │────────▶│   handler    │────────▶│   worker     │───────▶│ SMTP サーバー │
//! └──────────────┘         └──────────────┘         └──────────────┘        └──────────────┘
//! ```
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `MAILER_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `MAILER_PORT` | No | ポート番号（デフォルト: `3100`） |
//! | `MAIL_BACKEND` | No | `smtp` または `noop`（デフォルト: `smtp`） |
//! | `SMTP_HOST` / `SMTP_PORT` | No | SMTP サーバー（デフォルト: `localhost:1025`） |
//! | `SMTP_USERNAME` / `SMTP_PASSWORD` | No | 認証情報（未設定なら認証しない） |
//! | `SMTP_ENCRYPTION` | No | `tls` / `ssl` / `none`（デフォルト: `tls`） |
//! | `MAIL_FROM_ADDRESS` / `MAIL_FROM_NAME` | No | 送信元の既定値 |
//! | `MAIL_TEMPLATE_DIR` | No | 追加テンプレートのディレクトリ |
//! | `MAIL_ATTACHMENT_DIR` | No | HTTP 経由の添付を読み込めるディレクトリ（未設定なら添付不可） |
//! | `MAIL_QUEUE_CAPACITY` / `MAIL_WORKERS` | No | キュー容量とワーカー数（デフォルト: `100` / `1`） |
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境（Mailpit）
//! SMTP_ENCRYPTION=none cargo run -p postflow-mailer
//!
//! # 本番環境
//! SMTP_HOST=smtp.example.com SMTP_PORT=465 SMTP_ENCRYPTION=ssl cargo run -p postflow-mailer --release
//! ```

use std::{net::SocketAddr, sync::Arc};

use postflow_infra::mail_transport::{MailTransport, NoopMailTransport, SmtpMailTransport};
use postflow_mailer::{
    config::{MailBackend, MailerConfig},
    handler::{MailState, router},
    usecase::mail::{Mailer, MailPipeline, Outcomes, TemplateRenderer},
};
use postflow_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Mailer サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    let tracing_config = TracingConfig::from_env("mailer");
    let _tracing_guard = init_tracing(&tracing_config).entered();

    // 設定読み込み
    let config = MailerConfig::from_env()?;

    tracing::info!(
        "Mailer サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    // 送信バックエンドを選択
    let transport: Arc<dyn MailTransport> = match config.backend {
        MailBackend::Smtp => {
            tracing::info!(smtp = ?config.smtp, "SMTP で送信します");
            Arc::new(SmtpMailTransport::new(config.smtp.clone()))
        }
        MailBackend::Noop => {
            tracing::warn!("MAIL_BACKEND=noop のためメールは送信されません");
            Arc::new(NoopMailTransport)
        }
    };

    // テンプレート読み込み
    let renderer = match &config.template_dir {
        Some(dir) => TemplateRenderer::from_dir(dir)?,
        None => TemplateRenderer::new()?,
    };
    tracing::info!(templates = ?renderer.template_names(), "テンプレートを読み込みました");

    // ディスパッチャー起動
    let pipeline = Arc::new(MailPipeline::new(renderer, transport));
    let (mailer, outcomes) = Mailer::start(pipeline, config.sender.clone(), config.dispatcher);
    let observer = tokio::spawn(observe_outcomes(outcomes));

    // ルーター構築
    let mut state = MailState::new(mailer.clone());
    if let Some(dir) = &config.attachment_dir {
        tracing::info!(attachment_dir = %dir.display(), "添付ファイルを受け付けます");
        state = state.with_attachment_root(dir);
    }
    let app = router(Arc::new(state)).layer(TraceLayer::new_for_http());

    // サーバー起動
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Mailer サーバーが起動しました: {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 受付済みのメッセージを送り切ってから終了する
    mailer.shutdown().await;
    let (sent, failed) = observer.await?;
    tracing::info!(sent, failed, "Mailer サーバーを停止しました");

    Ok(())
}

/// 配送結果を読み続け、成功・失敗の件数を返す
///
/// 個々の結果はディスパッチャーがビジネスイベントとして記録済み。
async fn observe_outcomes(mut outcomes: Outcomes) -> (usize, usize) {
    let (mut sent, mut failed) = (0, 0);
    while let Some(outcome) = outcomes.recv().await {
        if outcome.is_success() {
            sent += 1;
        } else {
            failed += 1;
        }
    }
    (sent, failed)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "シグナルハンドラの登録に失敗");
        std::future::pending::<()>().await;
    }
    tracing::info!("シャットダウンシグナルを受信しました");
}
