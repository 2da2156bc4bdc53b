//! Generation pipeline tests driven through the orchestrator with
//! in-memory collaborators.

mod common;

use std::time::Duration;

use tokio::task::JoinSet;

use pretty_assertions::assert_eq;

use cleancommit::config::Config;
use cleancommit::error::{CommitError, ErrorCode};
use cleancommit::models::ProviderType;
use cleancommit::prompt::TRUNCATION_MARKER;
use cleancommit::protocol::{Command, Event};

use common::{errors, loading_flags, FakeFactory, FakeHost, FakeRepo, Harness, MemorySecrets, Reply};

const DIFF: &str = "diff --git a/src/lib.rs b/src/lib.rs\n+pub fn answer() -> u32 { 42 }\n";

fn error_code(event: &Event) -> ErrorCode {
    match event {
        Event::Error { code, .. } => *code,
        other => panic!("not an error event: {other:?}"),
    }
}

#[tokio::test]
async fn generates_message_from_staged_diff() {
    let mut h = Harness::ready(DIFF, Reply::Message("feat: add answer".into()));

    h.orchestrator.handle(Command::GenerateCommit).await;

    let events = h.drain();
    assert_eq!(
        events,
        vec![
            Event::Loading { is_loading: true },
            Event::CommitGenerated {
                message: "feat: add answer".into()
            },
            Event::Loading { is_loading: false },
        ]
    );
    assert_eq!(h.factory.call_count(), 1);
    assert_eq!(h.factory.diffs.lock().unwrap().clone(), vec![DIFF.to_string()]);

    let state = h.orchestrator.state().await;
    assert_eq!(state.generated_message.as_deref(), Some("feat: add answer"));
    assert!(!state.is_loading);
    assert_eq!(state.error, None);
}

#[tokio::test]
async fn missing_key_fails_without_calling_provider() {
    let mut h = Harness::new(
        Config::default(),
        FakeRepo::with_diff(DIFF),
        MemorySecrets::default(),
        FakeHost::default(),
        FakeFactory::replying(Reply::Message("unused".into())),
    );

    h.orchestrator.handle(Command::GenerateCommit).await;

    let events = h.drain();
    let errs = errors(&events);
    assert_eq!(errs.len(), 1);
    assert_eq!(
        errs[0],
        &Event::Error {
            error: "API key not set for Google Gemini".into(),
            code: ErrorCode::NoApiKey,
            provider: Some(ProviderType::Gemini),
            retryable: false,
        }
    );
    assert_eq!(h.factory.call_count(), 0);
}

#[tokio::test]
async fn blank_key_counts_as_missing() {
    let mut h = Harness::new(
        Config::default(),
        FakeRepo::with_diff(DIFF),
        MemorySecrets::with_key(ProviderType::Gemini, "   "),
        FakeHost::default(),
        FakeFactory::replying(Reply::Message("unused".into())),
    );

    h.orchestrator.handle(Command::GenerateCommit).await;

    let events = h.drain();
    assert_eq!(error_code(errors(&events)[0]), ErrorCode::NoApiKey);
    assert_eq!(h.factory.call_count(), 0);
}

#[tokio::test]
async fn empty_diff_reports_no_staged_changes() {
    let mut h = Harness::ready("  \n", Reply::Message("unused".into()));

    h.orchestrator.handle(Command::GenerateCommit).await;

    let events = h.drain();
    let errs = errors(&events);
    assert_eq!(errs.len(), 1);
    assert_eq!(error_code(errs[0]), ErrorCode::NoStagedChanges);
    assert_eq!(h.factory.call_count(), 0);
    assert_eq!(loading_flags(&events), vec![true, false]);
}

#[tokio::test]
async fn outside_repository_reports_no_git_repo() {
    let mut h = Harness::new(
        Config::default(),
        FakeRepo::outside_repository(),
        MemorySecrets::with_key(ProviderType::Gemini, "test-key"),
        FakeHost::default(),
        FakeFactory::replying(Reply::Message("unused".into())),
    );

    h.orchestrator.handle(Command::GenerateCommit).await;

    let events = h.drain();
    let errs = errors(&events);
    assert_eq!(errs.len(), 1);
    match errs[0] {
        Event::Error { error, code, .. } => {
            assert_eq!(*code, ErrorCode::NoGitRepo);
            assert_eq!(error, "No repository found");
        }
        _ => unreachable!(),
    }
    assert_eq!(h.factory.call_count(), 0);
}

#[tokio::test]
async fn provider_failure_is_forwarded_as_is() {
    let failure = CommitError::new(
        ErrorCode::RateLimit,
        "Rate limit exceeded. Please wait and try again.",
    )
    .with_provider(ProviderType::Gemini)
    .retryable();
    let mut h = Harness::ready(DIFF, Reply::Fail(failure));

    h.orchestrator.handle(Command::GenerateCommit).await;

    let events = h.drain();
    assert_eq!(
        events,
        vec![
            Event::Loading { is_loading: true },
            Event::Error {
                error: "Rate limit exceeded. Please wait and try again.".into(),
                code: ErrorCode::RateLimit,
                provider: Some(ProviderType::Gemini),
                retryable: true,
            },
            Event::Loading { is_loading: false },
        ]
    );
    let state = h.orchestrator.state().await;
    assert!(!state.is_loading);
    assert_eq!(
        state.error.as_deref(),
        Some("Rate limit exceeded. Please wait and try again.")
    );
}

#[tokio::test]
async fn provider_panic_becomes_unknown_error() {
    let mut h = Harness::ready(DIFF, Reply::Panic);

    h.orchestrator.handle(Command::GenerateCommit).await;

    let events = h.drain();
    assert_eq!(loading_flags(&events), vec![true, false]);
    let errs = errors(&events);
    assert_eq!(errs.len(), 1);
    match errs[0] {
        Event::Error { error, code, .. } => {
            assert_eq!(*code, ErrorCode::Unknown);
            assert!(error.contains("provider exploded"), "got: {error}");
        }
        _ => unreachable!(),
    }
    assert!(!h.orchestrator.is_generating());

    // The guard was released, so the next request runs.
    h.orchestrator.handle(Command::GenerateCommit).await;
    assert_eq!(h.factory.call_count(), 2);
}

#[tokio::test]
async fn oversized_diff_is_truncated_before_sending() {
    let mut config = Config::default();
    config.generation.max_diff_size = 40;
    let diff = "line one of the diff\n".repeat(20);
    let mut h = Harness::new(
        config,
        FakeRepo::with_diff(&diff),
        MemorySecrets::with_key(ProviderType::Gemini, "test-key"),
        FakeHost::default(),
        FakeFactory::replying(Reply::Message("chore: bulk".into())),
    );

    h.orchestrator.handle(Command::GenerateCommit).await;

    let sent = h.factory.diffs.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].ends_with(TRUNCATION_MARKER));
    assert!(sent[0].chars().count() <= 40 + TRUNCATION_MARKER.chars().count());
    assert!(matches!(h.drain()[1], Event::CommitGenerated { .. }));
}

#[tokio::test]
async fn concurrent_request_is_ignored() {
    let factory = FakeFactory::replying(Reply::Message("fix: once".into()))
        .with_delay(Duration::from_millis(50));
    let mut h = Harness::new(
        Config::default(),
        FakeRepo::with_diff(DIFF),
        MemorySecrets::with_key(ProviderType::Gemini, "test-key"),
        FakeHost::default(),
        factory,
    );

    let first = h.orchestrator.clone();
    let second = h.orchestrator.clone();
    tokio::join!(
        first.handle(Command::GenerateCommit),
        second.handle(Command::GenerateCommit)
    );

    assert_eq!(h.factory.call_count(), 1);
    let events = h.drain();
    assert_eq!(loading_flags(&events), vec![true, false]);
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, Event::CommitGenerated { .. }))
            .count(),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn loading_events_alternate_under_contention() {
    let mut h = Harness::ready(DIFF, Reply::Message("fix: race".into()));

    let mut tasks = JoinSet::new();
    for _ in 0..4 {
        let orchestrator = h.orchestrator.clone();
        tasks.spawn(async move {
            for _ in 0..50 {
                orchestrator.handle(Command::GenerateCommit).await;
                tokio::task::yield_now().await;
            }
        });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.unwrap();
    }

    // A request may only open once the previous one has announced it is done.
    let flags = loading_flags(&h.drain());
    assert!(!flags.is_empty());
    for pair in flags.chunks(2) {
        assert_eq!(pair, [true, false]);
    }
    assert!(!h.orchestrator.is_generating());
}

#[tokio::test]
async fn configured_provider_is_used() {
    let mut config = Config::default();
    config.provider.name = ProviderType::Groq;
    let mut h = Harness::new(
        config,
        FakeRepo::with_diff(DIFF),
        MemorySecrets::with_key(ProviderType::Gemini, "gemini-only"),
        FakeHost::default(),
        FakeFactory::replying(Reply::Message("unused".into())),
    );

    h.orchestrator.handle(Command::GenerateCommit).await;

    // Gemini's key does not unlock Groq.
    let events = h.drain();
    match errors(&events)[0] {
        Event::Error { code, provider, .. } => {
            assert_eq!(*code, ErrorCode::NoApiKey);
            assert_eq!(*provider, Some(ProviderType::Groq));
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn webview_ready_resets_session_and_lists_changes() {
    let mut h = Harness::ready(DIFF, Reply::Message("feat: add answer".into()));
    h.orchestrator.handle(Command::GenerateCommit).await;
    h.drain();

    h.orchestrator.handle(Command::WebviewReady).await;

    let events = h.drain();
    match &events[0] {
        Event::SetState { state } => {
            assert!(state.has_api_key);
            assert!(state.has_staged_changes);
            assert_eq!(state.generated_message, None);
            assert_eq!(state.provider_label, "Google Gemini");
        }
        other => panic!("expected setState, got {other:?}"),
    }
    match &events[1] {
        Event::ChangesUpdated { changes, staged } => {
            assert!(changes.is_empty());
            assert_eq!(staged.len(), 1);
        }
        other => panic!("expected changesUpdated, got {other:?}"),
    }
}
