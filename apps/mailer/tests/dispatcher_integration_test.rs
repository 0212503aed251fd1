//! ディスパッチャーの統合テスト
//!
//! 実際のテンプレート・CSS インライナー・添付読み込みを通し、
//! 送信だけをモックに差し替えて配送結果の契約を検証する。

use std::{path::PathBuf, sync::Arc, time::Duration};

use postflow_domain::mail::{MailError, Message, MessageId, Outcome, SenderDefaults};
use postflow_infra::mock::MockMailTransport;
use postflow_mailer::usecase::mail::{
    DispatcherOptions,
    MailPipeline,
    Mailer,
    Outcomes,
    SubmitError,
    TemplateRenderer,
};
use pretty_assertions::assert_eq;
use serde_json::json;

const TIMEOUT: Duration = Duration::from_secs(5);

fn defaults() -> SenderDefaults {
    SenderDefaults::new("noreply@postflow.example.com", "PostFlow")
}

fn start_with(
    renderer: TemplateRenderer,
    transport: &MockMailTransport,
    options: DispatcherOptions,
) -> (Mailer, Outcomes) {
    let pipeline = MailPipeline::new(renderer, Arc::new(transport.clone()));
    Mailer::start(Arc::new(pipeline), defaults(), options)
}

fn start(transport: &MockMailTransport) -> (Mailer, Outcomes) {
    start_with(
        TemplateRenderer::new().unwrap(),
        transport,
        DispatcherOptions::default(),
    )
}

async fn next_outcome(outcomes: &mut Outcomes) -> Outcome {
    tokio::time::timeout(TIMEOUT, outcomes.recv())
        .await
        .expect("配送結果がタイムアウト")
        .expect("結果チャネルが閉じている")
}

/// shutdown 後に残りの結果をすべて回収する
async fn collect_after_shutdown(mailer: &Mailer, outcomes: &mut Outcomes) -> Vec<Outcome> {
    tokio::time::timeout(TIMEOUT, mailer.shutdown())
        .await
        .expect("shutdown がタイムアウト");
    let mut collected = Vec::new();
    while let Some(outcome) = outcomes.recv().await {
        collected.push(outcome);
    }
    collected
}

fn welcome() -> Message {
    Message::new("a@example.com", "Welcome").with_data(json!({ "name": "Alice" }))
}

#[tokio::test]
async fn test_既定テンプレートと既定の送信元で送信される() {
    let transport = MockMailTransport::new();
    let (mailer, mut outcomes) = start(&transport);

    let id = mailer.submit(welcome()).await.unwrap();
    let outcome = next_outcome(&mut outcomes).await;

    assert_eq!(outcome, Outcome::Sent { id });
    let sent = transport.sent_emails();
    assert_eq!(sent.len(), 1);
    let email = &sent[0];
    assert_eq!(email.from, "noreply@postflow.example.com");
    assert_eq!(email.from_name, "PostFlow");
    assert_eq!(email.to, "a@example.com");
    assert_eq!(email.subject, "Welcome");
    assert!(!email.html_body.is_empty());
    assert!(!email.text_body.is_empty());
    assert!(email.html_body.contains("Alice"));
    assert!(!email.html_body.contains("<style"));
    assert!(email.html_body.contains("style=\""));

    mailer.shutdown().await;
}

#[tokio::test]
async fn test_単一ワーカーでは投入順に結果が届く() {
    let transport = MockMailTransport::new();
    let (mailer, mut outcomes) = start(&transport);

    let first = mailer
        .submit(Message::new("m1@example.com", "M1"))
        .await
        .unwrap();
    let second = mailer
        .submit(Message::new("m2@example.com", "M2"))
        .await
        .unwrap();
    let collected = collect_after_shutdown(&mailer, &mut outcomes).await;

    let ids: Vec<MessageId> = collected.iter().map(Outcome::id).collect();
    assert_eq!(ids, vec![first, second]);
    assert_eq!(
        transport.attempted_recipients(),
        vec!["m1@example.com", "m2@example.com"]
    );
}

#[tokio::test]
async fn test_存在しないテンプレートは送信を試みずに失敗する() {
    let transport = MockMailTransport::new();
    let (mailer, mut outcomes) = start(&transport);

    mailer
        .submit(welcome().with_template("nonexistent"))
        .await
        .unwrap();
    let outcome = next_outcome(&mut outcomes).await;

    assert_eq!(
        outcome.error(),
        Some(&MailError::TemplateNotFound(
            "nonexistent.html.tera".to_string()
        ))
    );
    assert!(transport.attempted_recipients().is_empty());

    mailer.shutdown().await;
}

#[tokio::test]
async fn test_htmlレンダリングの失敗では送信を試みない() {
    let transport = MockMailTransport::new();
    let renderer = TemplateRenderer::from_raw([
        ("welcome.html.tera", "<p>{{ message.user.name }}</p>"),
        ("welcome.plain.tera", "{{ message }}"),
    ])
    .unwrap();
    let (mailer, mut outcomes) = start_with(renderer, &transport, DispatcherOptions::default());

    mailer
        .submit(
            Message::new("a@example.com", "x")
                .with_template("welcome")
                .with_data(json!("not an object")),
        )
        .await
        .unwrap();
    let outcome = next_outcome(&mut outcomes).await;

    assert!(matches!(
        outcome.error(),
        Some(MailError::TemplateRender(_))
    ));
    assert!(transport.attempted_recipients().is_empty());

    mailer.shutdown().await;
}

#[tokio::test]
async fn test_存在しない添付ファイルは接続を試みずに失敗する() {
    let transport = MockMailTransport::new();
    let (mailer, mut outcomes) = start(&transport);
    let missing = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("does-not-exist.pdf");

    mailer
        .submit(welcome().with_attachment(missing.clone()))
        .await
        .unwrap();
    let outcome = next_outcome(&mut outcomes).await;

    match outcome {
        Outcome::Failed { message, error } => {
            assert_eq!(message.to(), "a@example.com");
            assert!(matches!(
                error,
                MailError::AttachmentRead { ref path, .. } if *path == missing
            ));
        }
        other => panic!("失敗を期待したが {other:?}"),
    }
    assert!(transport.attempted_recipients().is_empty());

    mailer.shutdown().await;
}

#[tokio::test]
async fn test_失敗したメッセージの後もワーカーは処理を続ける() {
    let transport = MockMailTransport::new();
    let (mailer, mut outcomes) = start(&transport);

    mailer
        .submit(welcome().with_template("nonexistent"))
        .await
        .unwrap();
    let ok = mailer.submit(welcome()).await.unwrap();
    let collected = collect_after_shutdown(&mailer, &mut outcomes).await;

    assert_eq!(collected.len(), 2);
    assert!(!collected[0].is_success());
    assert_eq!(collected[1], Outcome::Sent { id: ok });
}

#[tokio::test]
async fn test_送信エラーは失敗結果として報告される() {
    let transport = MockMailTransport::failing(MailError::Connect("connection refused".into()));
    let (mailer, mut outcomes) = start(&transport);

    let id = mailer.submit(welcome()).await.unwrap();
    let outcome = next_outcome(&mut outcomes).await;

    assert_eq!(outcome.id(), id);
    assert_eq!(
        outcome.error(),
        Some(&MailError::Connect("connection refused".into()))
    );

    mailer.shutdown().await;
}

#[tokio::test]
async fn test_パニックはinternal_dispatchになりワーカーは継続する() {
    let transport = MockMailTransport::new().panicking_on("boom@example.com");
    let (mailer, mut outcomes) = start(&transport);

    mailer
        .submit(Message::new("boom@example.com", "x"))
        .await
        .unwrap();
    let ok = mailer
        .submit(Message::new("ok@example.com", "x"))
        .await
        .unwrap();
    let collected = collect_after_shutdown(&mailer, &mut outcomes).await;

    assert_eq!(collected.len(), 2);
    assert!(matches!(
        collected[0].error(),
        Some(MailError::InternalDispatch(_))
    ));
    assert_eq!(collected[1], Outcome::Sent { id: ok });
}

/// 1 件目が送信中になるまで待つ（以降の投入はキューに留まる）
async fn wait_until_first_attempt(transport: &MockMailTransport) {
    tokio::time::timeout(TIMEOUT, async {
        while transport.attempted_recipients().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("1 件目の送信が始まらない");
}

#[tokio::test]
async fn test_shutdownは未処理のn件すべての結果を発行してから返る() {
    let transport = MockMailTransport::new().with_delay(Duration::from_millis(200));
    let (mailer, mut outcomes) = start_with(
        TemplateRenderer::new().unwrap(),
        &transport,
        DispatcherOptions {
            queue_capacity: 8,
            workers:        1,
        },
    );

    let mut ids = vec![mailer.submit(Message::new("user0@example.com", "x")).await.unwrap()];
    wait_until_first_attempt(&transport).await;
    for i in 1..5 {
        let id = mailer
            .try_submit(Message::new(format!("user{i}@example.com"), "x"))
            .unwrap();
        ids.push(id);
    }

    // 2 件目以降はまだ処理されていない
    assert_eq!(transport.attempted_recipients().len(), 1);
    assert!(outcomes.try_recv().is_none());

    tokio::time::timeout(TIMEOUT, mailer.shutdown())
        .await
        .unwrap();

    // shutdown 完了時点で全結果が発行済み
    let mut collected = Vec::new();
    while let Some(outcome) = outcomes.try_recv() {
        collected.push(outcome.id());
    }
    assert_eq!(collected, ids);
    assert_eq!(transport.sent_emails().len(), 5);
}

#[tokio::test]
async fn test_複数ワーカーでも各メッセージの結果はちょうど1件() {
    let transport = MockMailTransport::new().with_delay(Duration::from_millis(5));
    let (mailer, mut outcomes) = start_with(
        TemplateRenderer::new().unwrap(),
        &transport,
        DispatcherOptions {
            queue_capacity: 4,
            workers:        3,
        },
    );

    let mut ids = Vec::new();
    for i in 0..12 {
        ids.push(
            mailer
                .submit(Message::new(format!("user{i}@example.com"), "x"))
                .await
                .unwrap(),
        );
    }
    let collected = collect_after_shutdown(&mailer, &mut outcomes).await;

    let mut received: Vec<MessageId> = collected.iter().map(Outcome::id).collect();
    received.sort_by_key(|id| *id.as_uuid());
    ids.sort_by_key(|id| *id.as_uuid());
    assert_eq!(received, ids);
}

#[tokio::test]
async fn test_キューが満杯ならtry_submitはqueue_fullを返す() {
    let transport = MockMailTransport::new().with_delay(Duration::from_millis(500));
    let (mailer, mut outcomes) = start_with(
        TemplateRenderer::new().unwrap(),
        &transport,
        DispatcherOptions {
            queue_capacity: 1,
            workers:        1,
        },
    );

    mailer.submit(welcome()).await.unwrap();
    wait_until_first_attempt(&transport).await;

    assert!(mailer.try_submit(welcome()).is_ok());
    assert_eq!(mailer.try_submit(welcome()), Err(SubmitError::QueueFull));

    let collected = collect_after_shutdown(&mailer, &mut outcomes).await;
    assert_eq!(collected.len(), 2);
}

#[tokio::test]
async fn test_shutdown後の投入はclosedになる() {
    let transport = MockMailTransport::new();
    let (mailer, mut outcomes) = start(&transport);
    let handle = mailer.clone();

    mailer.shutdown().await;

    assert_eq!(handle.submit(welcome()).await, Err(SubmitError::Closed));
    assert_eq!(handle.try_submit(welcome()), Err(SubmitError::Closed));
    assert_eq!(outcomes.recv().await, None);
    assert!(transport.attempted_recipients().is_empty());
}
