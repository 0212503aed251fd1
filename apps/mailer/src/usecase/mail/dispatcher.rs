//! # メールディスパッチャー
//!
//! 受付済みメッセージをキューに積み、バックグラウンドのワーカーで配送する。
//!
//! ## 設計方針
//!
//! - **有界キュー**: `tokio::sync::mpsc` の有界チャネル。満杯時は
//!   [`Mailer::submit`] が空きを待ち、[`Mailer::try_submit`] は即座に
//!   [`SubmitError::QueueFull`] を返す
//! - **ワーカー共有**: 複数ワーカーは受信側を `Mutex` で共有し、取り出しは FIFO
//! - **1 件 1 結果**: 受付済みメッセージごとに [`Outcome`] をちょうど 1 件発行する
//! - **障害の隔離**: 配送は 1 件ずつ `tokio::spawn` で実行し、パニックは
//!   [`MailError::InternalDispatch`] としてそのメッセージの結果に変換する
//! - **グレースフルシャットダウン**: [`Mailer::shutdown`] は受付を締め切り、
//!   キューに残ったメッセージを配送し終えるまで待機する

use std::sync::{Arc, PoisonError, RwLock};

use postflow_domain::mail::{MailError, Message, MessageId, Outcome, QueuedMessage, SenderDefaults};
use postflow_shared::{
    event_log::{error, event},
    log_business_event,
};
use thiserror::Error;
use tokio::{
    sync::{Mutex, mpsc},
    task::{JoinError, JoinHandle},
};

use super::MailPipeline;

/// ディスパッチャーの起動オプション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherOptions {
    /// キューに保持できるメッセージ数（0 は 1 として扱う）
    pub queue_capacity: usize,
    /// 並行して配送するワーカー数（0 は 1 として扱う）
    pub workers:        usize,
}

impl DispatcherOptions {
    pub const DEFAULT_QUEUE_CAPACITY: usize = 100;
    pub const DEFAULT_WORKERS: usize = 1;
}

impl Default for DispatcherOptions {
    fn default() -> Self {
        Self {
            queue_capacity: Self::DEFAULT_QUEUE_CAPACITY,
            workers:        Self::DEFAULT_WORKERS,
        }
    }
}

/// 投入エラー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// キューが満杯（`try_submit` のみ）
    #[error("配送キューが満杯です")]
    QueueFull,

    /// シャットダウン済みで受付を締め切っている
    #[error("メールディスパッチャーは停止しています")]
    Closed,
}

/// 配送結果の受信側
///
/// 結果チャネルは非有界のため、呼び出し側は継続的に読み出す必要がある。
/// 全ワーカーが終了すると [`recv`](Outcomes::recv) は `None` を返す。
pub struct Outcomes {
    rx: mpsc::UnboundedReceiver<Outcome>,
}

impl Outcomes {
    /// 次の配送結果を待つ
    pub async fn recv(&mut self) -> Option<Outcome> {
        self.rx.recv().await
    }

    /// 既に発行済みの配送結果があれば取り出す
    pub fn try_recv(&mut self) -> Option<Outcome> {
        self.rx.try_recv().ok()
    }
}

/// メールディスパッチャーのハンドル
///
/// `Clone` で複製でき、HTTP ハンドラなど複数の投入元から共有できる。
#[derive(Clone)]
pub struct Mailer {
    inner: Arc<Inner>,
}

struct Inner {
    sender:   RwLock<Option<mpsc::Sender<QueuedMessage>>>,
    defaults: SenderDefaults,
    workers:  Mutex<Vec<JoinHandle<()>>>,
}

impl Mailer {
    /// ワーカーを起動し、投入用ハンドルと結果の受信側を返す
    ///
    /// tokio ランタイム内で呼び出すこと。
    pub fn start(
        pipeline: Arc<MailPipeline>,
        defaults: SenderDefaults,
        options: DispatcherOptions,
    ) -> (Self, Outcomes) {
        let (tx, rx) = mpsc::channel(options.queue_capacity.max(1));
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let queue = Arc::new(Mutex::new(rx));

        let workers = (0..options.workers.max(1))
            .map(|worker| {
                tokio::spawn(run_worker(
                    worker,
                    Arc::clone(&pipeline),
                    Arc::clone(&queue),
                    outcome_tx.clone(),
                ))
            })
            .collect::<Vec<_>>();

        tracing::info!(
            queue_capacity = options.queue_capacity.max(1),
            workers = workers.len(),
            "メールディスパッチャーを起動"
        );

        let mailer = Self {
            inner: Arc::new(Inner {
                sender: RwLock::new(Some(tx)),
                defaults,
                workers: Mutex::new(workers),
            }),
        };

        (mailer, Outcomes { rx: outcome_rx })
    }

    /// 送信元の既定値
    pub fn defaults(&self) -> &SenderDefaults {
        &self.inner.defaults
    }

    /// 受付を締め切っているかどうか
    pub fn is_closed(&self) -> bool {
        self.sender().is_err()
    }

    /// メッセージを投入する（キューが満杯なら空きを待つ）
    pub async fn submit(&self, message: Message) -> Result<MessageId, SubmitError> {
        let sender = self.sender()?;
        let queued = message.resolve(&self.inner.defaults);
        let id = queued.id();
        let to = queued.to().to_string();

        sender.send(queued).await.map_err(|_| SubmitError::Closed)?;

        log_queued(id, &to);
        Ok(id)
    }

    /// メッセージを投入する（キューが満杯なら即座に失敗する）
    pub fn try_submit(&self, message: Message) -> Result<MessageId, SubmitError> {
        let sender = self.sender()?;
        let queued = message.resolve(&self.inner.defaults);
        let id = queued.id();
        let to = queued.to().to_string();

        sender.try_send(queued).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SubmitError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
        })?;

        log_queued(id, &to);
        Ok(id)
    }

    /// 受付を締め切り、キューに残ったメッセージの配送完了を待つ
    ///
    /// 複数回呼び出しても安全。2 回目以降は最初の呼び出しの完了を待って返る。
    /// 途中で future が破棄された場合も、再度呼び出せば残りのワーカーを待つ。
    pub async fn shutdown(&self) {
        let sender = self
            .inner
            .sender
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if sender.is_some() {
            tracing::info!("メールディスパッチャーを停止中（キューを排出します）");
        }
        drop(sender);

        // 完了したハンドルだけを取り除く
        let mut workers = self.inner.workers.lock().await;
        while let Some(handle) = workers.last_mut() {
            let joined = handle.await;
            workers.pop();
            if let Err(e) = joined {
                tracing::error!(error = %e, "配送ワーカーが異常終了");
            }
        }
    }

    fn sender(&self) -> Result<mpsc::Sender<QueuedMessage>, SubmitError> {
        self.inner
            .sender
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(SubmitError::Closed)
    }
}

fn log_queued(id: MessageId, to: &str) {
    log_business_event!(
        event.category = event::category::MAIL,
        event.action = event::action::MAIL_QUEUED,
        event.entity_id = %id,
        event.result = event::result::SUCCESS,
        mail.to = to,
        "メールを配送キューに投入"
    );
}

/// キューが閉じられ空になるまでメッセージを取り出して配送する
async fn run_worker(
    worker: usize,
    pipeline: Arc<MailPipeline>,
    queue: Arc<Mutex<mpsc::Receiver<QueuedMessage>>>,
    outcomes: mpsc::UnboundedSender<Outcome>,
) {
    tracing::debug!(worker, "配送ワーカーを起動");

    loop {
        let next = queue.lock().await.recv().await;
        let Some(message) = next else {
            break;
        };

        let outcome = dispatch(&pipeline, message).await;
        if outcomes.send(outcome).is_err() {
            tracing::warn!(worker, "配送結果の受信側が破棄されているため結果を通知できません");
        }
    }

    tracing::debug!(worker, "配送ワーカーを終了");
}

/// 1 件を配送し、結果を記録して返す
async fn dispatch(pipeline: &Arc<MailPipeline>, message: QueuedMessage) -> Outcome {
    let task = {
        let pipeline = Arc::clone(pipeline);
        let message = message.clone();
        tokio::spawn(async move { pipeline.deliver(&message).await })
    };

    let result = match task.await {
        Ok(result) => result,
        Err(e) => Err(MailError::InternalDispatch(join_error_reason(e))),
    };

    match result {
        Ok(()) => {
            log_business_event!(
                event.category = event::category::MAIL,
                event.action = event::action::MAIL_SENT,
                event.entity_id = %message.id(),
                event.result = event::result::SUCCESS,
                mail.to = message.to(),
                mail.template = message.template(),
                "メール送信成功"
            );
            Outcome::Sent { id: message.id() }
        }
        Err(e) => {
            log_business_event!(
                event.category = event::category::MAIL,
                event.action = event::action::MAIL_FAILED,
                event.entity_id = %message.id(),
                event.result = event::result::FAILURE,
                mail.to = message.to(),
                mail.template = message.template(),
                error.category = error_category(&e),
                error.kind = e.kind(),
                error = %e,
                "メール送信失敗"
            );
            Outcome::failed(message, e)
        }
    }
}

fn error_category(error: &MailError) -> &'static str {
    match error {
        MailError::InternalDispatch(_) => error::category::INTERNAL,
        MailError::AttachmentRead { .. } => error::category::EXTERNAL_SERVICE,
        e if e.is_transport() => error::category::EXTERNAL_SERVICE,
        _ => error::category::CONTENT,
    }
}

fn join_error_reason(error: JoinError) -> String {
    if !error.is_panic() {
        return error.to_string();
    }

    let payload = error.into_panic();
    if let Some(reason) = payload.downcast_ref::<String>() {
        format!("panic: {reason}")
    } else if let Some(reason) = payload.downcast_ref::<&str>() {
        format!("panic: {reason}")
    } else {
        "panic".to_string()
    }
}
