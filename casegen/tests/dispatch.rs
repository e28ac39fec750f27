//! Dispatcher tests against a scripted backend.
//!
//! Time is paused, so scripted delays decide completion order without slowing
//! the suite down.

use std::sync::Arc;
use std::time::Duration;

use casegen::backend::{BackendError, ChatRequest};
use casegen::client::{ClientSettings, GenerationClient, GenerationError};
use casegen::core::types::{SourceBundle, SpecBatch, SpecItem};
use casegen::dispatch::{DispatchError, Dispatcher};
use casegen::io::transcript::NullTranscript;
use casegen::test_support::{ScriptedBackend, ScriptedReply, status_error};

fn batch(count: usize) -> SpecBatch {
    SpecBatch {
        subject: "Cache.Get".to_string(),
        items: (0..count)
            .map(|index| SpecItem {
                name: format!("TestCase{index}"),
                instructions: format!("{index}. check case {index}"),
            })
            .collect(),
    }
}

fn bundle() -> Arc<SourceBundle> {
    Arc::new(SourceBundle {
        package: "cache".to_string(),
        text: "// file: cache.go\npackage cache\n".to_string(),
    })
}

fn client(backend: &Arc<ScriptedBackend>) -> Arc<GenerationClient> {
    let settings = ClientSettings {
        model: "gpt-4".to_string(),
        max_tokens: 4000,
        retry_backoff: Duration::from_secs(10),
        extra_instructions: None,
    };
    let client = GenerationClient::new(backend.clone(), Arc::new(NullTranscript), settings)
        .expect("client");
    Arc::new(client)
}

/// Index of the case a code request was made for.
fn case_index(request: &ChatRequest, count: usize) -> usize {
    let user = &request.messages[1].content;
    (0..count)
        .find(|index| user.contains(&format!("func TestCase{index}(")))
        .expect("request names a known case")
}

#[tokio::test(start_paused = true)]
async fn results_follow_batch_order_not_completion_order() {
    let count = 5;
    let backend = Arc::new(ScriptedBackend::from_fn(move |request| {
        let index = case_index(request, count);
        ScriptedReply {
            // later cases finish first
            delay: Duration::from_millis(100 * (count - index) as u64),
            result: Ok(format!("func TestCase{index}(t *testing.T) {{}}")),
        }
    }));

    let fragments = Dispatcher::new(client(&backend), count)
        .dispatch(&batch(count), bundle())
        .await
        .expect("dispatch");

    let expected: Vec<String> = (0..count)
        .map(|index| format!("func TestCase{index}(t *testing.T) {{}}"))
        .collect();
    assert_eq!(fragments, expected);
    assert_eq!(backend.calls(), count);
}

#[tokio::test(start_paused = true)]
async fn in_flight_requests_never_exceed_concurrency() {
    let backend = Arc::new(ScriptedBackend::from_fn(|_| ScriptedReply {
        delay: Duration::from_secs(1),
        result: Ok("func TestX(t *testing.T) {}".to_string()),
    }));

    let started = tokio::time::Instant::now();
    let fragments = Dispatcher::new(client(&backend), 2)
        .dispatch(&batch(6), bundle())
        .await
        .expect("dispatch");

    assert_eq!(fragments.len(), 6);
    assert_eq!(backend.max_in_flight(), 2);
    // three waves of two
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(3), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(4), "elapsed {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn zero_concurrency_still_makes_progress() {
    let backend = Arc::new(ScriptedBackend::from_fn(|_| ScriptedReply {
        delay: Duration::from_millis(10),
        result: Ok("func TestX(t *testing.T) {}".to_string()),
    }));

    let fragments = Dispatcher::new(client(&backend), 0)
        .dispatch(&batch(3), bundle())
        .await
        .expect("dispatch");

    assert_eq!(fragments.len(), 3);
    assert_eq!(backend.max_in_flight(), 1);
}

#[tokio::test(start_paused = true)]
async fn first_failure_names_the_case_and_cancels_the_rest() {
    let count = 5;
    let backend = Arc::new(ScriptedBackend::from_fn(move |request| {
        let index = case_index(request, count);
        ScriptedReply {
            delay: Duration::from_secs(1),
            result: if index == 2 {
                Err(status_error(400))
            } else {
                Ok(format!("func TestCase{index}(t *testing.T) {{}}"))
            },
        }
    }));

    let err = Dispatcher::new(client(&backend), 1)
        .dispatch(&batch(count), bundle())
        .await
        .unwrap_err();

    match err {
        DispatchError::Item {
            index,
            name,
            source,
        } => {
            assert_eq!(index, 2);
            assert_eq!(name, "TestCase2");
            assert!(matches!(
                source,
                GenerationError::Backend(BackendError::Status { status: 400, .. })
            ));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // the last case never reaches the backend
    assert!(backend.calls() <= 4, "calls {}", backend.calls());
}

#[tokio::test(start_paused = true)]
async fn transient_failure_in_one_case_is_retried_without_failing_the_batch() {
    let backend = Arc::new(ScriptedBackend::queue(vec![
        Err(status_error(429)),
        Ok("func TestCase0(t *testing.T) {}".to_string()),
    ]));

    let fragments = Dispatcher::new(client(&backend), 1)
        .dispatch(&batch(1), bundle())
        .await
        .expect("dispatch");

    assert_eq!(fragments, vec!["func TestCase0(t *testing.T) {}"]);
    assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn empty_batch_makes_no_requests() {
    let backend = Arc::new(ScriptedBackend::queue(Vec::new()));

    let fragments = Dispatcher::new(client(&backend), 2)
        .dispatch(&batch(0), bundle())
        .await
        .expect("dispatch");

    assert!(fragments.is_empty());
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn every_request_carries_subject_and_package() {
    let backend = Arc::new(ScriptedBackend::from_fn(|_| ScriptedReply {
        delay: Duration::ZERO,
        result: Ok("func TestX(t *testing.T) {}".to_string()),
    }));

    Dispatcher::new(client(&backend), 2)
        .dispatch(&batch(2), bundle())
        .await
        .expect("dispatch");

    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        let user = &request.messages[1].content;
        assert!(user.contains("`Cache.Get`"));
        assert!(user.contains("package cache\n"));
    }
}
