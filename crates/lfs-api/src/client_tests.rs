use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;

use super::*;
use crate::{
    ApiResponse, CommitSha, Committer, DecodeTarget, LockOutcome, LockRequest, LockResponse,
    LockService, Method, ResponseSlot,
};

// ---------------------------------------------------------------------------
// Stub lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum FailAt {
    Nowhere,
    Build,
    Execute,
    /// Decodes the body into the target, then reports a transport failure.
    ExecuteAfterDecode,
    Cleanup,
}

struct StubLifecycle {
    fail_at: FailAt,
    body: Vec<u8>,
    builds: AtomicUsize,
    executions: AtomicUsize,
    cleanups: AtomicUsize,
    addressed: Mutex<Vec<String>>,
}

impl StubLifecycle {
    fn new(fail_at: FailAt, body: impl Into<Vec<u8>>) -> Self {
        Self {
            fail_at,
            body: body.into(),
            builds: AtomicUsize::new(0),
            executions: AtomicUsize::new(0),
            cleanups: AtomicUsize::new(0),
            addressed: Mutex::new(Vec::new()),
        }
    }

    fn addressed(&self) -> Vec<String> {
        self.addressed.lock().unwrap().clone()
    }

    fn counts(&self) -> (usize, usize, usize) {
        (
            self.builds.load(Ordering::SeqCst),
            self.executions.load(Ordering::SeqCst),
            self.cleanups.load(Ordering::SeqCst),
        )
    }
}

struct StubRequest {
    path: String,
}

#[derive(Debug)]
struct StubResponse {
    status: u16,
    body: Vec<u8>,
}

impl ApiResponse for StubResponse {
    fn status(&self) -> u16 {
        self.status
    }

    fn body(&self) -> &[u8] {
        &self.body
    }
}

#[async_trait]
impl Lifecycle for StubLifecycle {
    type Request = StubRequest;
    type Response = StubResponse;

    async fn build(
        &self,
        base: &Endpoint,
        schema: &RequestSchema,
    ) -> Result<StubRequest, ApiError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        self.addressed
            .lock()
            .unwrap()
            .push(format!("{}{}", base.as_str(), schema.path()));
        if self.fail_at == FailAt::Build {
            return Err(ApiError::Build {
                method: schema.method(),
                path: schema.path().to_string(),
                message: "unsupported".to_string(),
            });
        }
        Ok(StubRequest {
            path: schema.path().to_string(),
        })
    }

    async fn execute(
        &self,
        request: StubRequest,
        into: Option<&dyn DecodeTarget>,
    ) -> Result<StubResponse, ApiError> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        if self.fail_at == FailAt::Execute {
            return Err(ApiError::Transport {
                message: format!("connection reset while requesting {}", request.path),
                timed_out: false,
            });
        }
        if let Some(target) = into {
            target.decode(&self.body)?;
        }
        if self.fail_at == FailAt::ExecuteAfterDecode {
            return Err(ApiError::Transport {
                message: "connection reset after the body was read".to_string(),
                timed_out: false,
            });
        }
        Ok(StubResponse {
            status: 200,
            body: self.body.clone(),
        })
    }

    async fn cleanup(&self, _response: &StubResponse) -> Result<(), ApiError> {
        self.cleanups.fetch_add(1, Ordering::SeqCst);
        if self.fail_at == FailAt::Cleanup {
            return Err(ApiError::Cleanup {
                message: "stream already closed".to_string(),
            });
        }
        Ok(())
    }
}

fn client(fail_at: FailAt, body: &str) -> Client<StubLifecycle> {
    Client::new(
        "https://git-server.com/repo.git/info/lfs",
        StubLifecycle::new(fail_at, body),
    )
    .unwrap()
}

const GRANTED: &str = r#"{
    "lock": {
        "id": "some-lock-id",
        "path": "/path/to/lock",
        "committer": { "name": "Jane Doe", "email": "jane@example.com" },
        "locked_at": "2016-05-17T15:49:06Z"
    }
}"#;

fn lock_request() -> LockRequest {
    LockRequest {
        path: "/path/to/lock".to_string(),
        latest_remote_commit: CommitSha::new("deadbeef").unwrap(),
        committer: Committer::new("Jane Doe", "jane@example.com"),
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[test]
fn new_rejects_unparseable_endpoint() {
    let result = Client::new("::not a url::", StubLifecycle::new(FailAt::Nowhere, ""));
    assert!(matches!(result, Err(ApiError::Construction { .. })));
}

#[test]
fn new_keeps_the_parsed_endpoint() {
    let client = client(FailAt::Nowhere, "");
    assert_eq!(
        client.base().as_str(),
        "https://git-server.com/repo.git/info/lfs"
    );
}

// ---------------------------------------------------------------------------
// Phase sequencing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn build_failure_skips_execute_and_cleanup() {
    let client = client(FailAt::Build, GRANTED);
    let (slot, schema) = LockService.lock(lock_request());

    let err = client.call(schema).await.unwrap_err();

    assert!(matches!(err, ApiError::Build { method: Method::Post, ref path, .. } if path == "/locks"));
    assert_eq!(client.lifecycle().counts(), (1, 0, 0));
    assert!(!slot.is_filled());
}

#[tokio::test]
async fn execute_failure_skips_cleanup() {
    let client = client(FailAt::Execute, GRANTED);
    let (slot, schema) = LockService.lock(lock_request());

    let err = client.call(schema).await.unwrap_err();

    assert!(matches!(err, ApiError::Transport { .. }));
    assert_eq!(client.lifecycle().counts(), (1, 1, 0));
    assert!(!slot.is_filled());
}

#[tokio::test]
async fn execute_failure_after_decoding_leaves_the_target_empty() {
    let client = client(FailAt::ExecuteAfterDecode, GRANTED);
    let (slot, schema) = LockService.lock(lock_request());

    let err = client.call(schema).await.unwrap_err();

    assert!(matches!(err, ApiError::Transport { .. }));
    assert_eq!(client.lifecycle().counts(), (1, 1, 0));
    assert!(!slot.is_filled());
}

#[tokio::test]
async fn build_failure_clears_a_value_left_by_an_earlier_call() {
    let (slot, schema) = LockService.lock(lock_request());
    client(FailAt::Nowhere, GRANTED)
        .call(schema.clone())
        .await
        .unwrap();
    assert!(slot.is_filled());

    let err = client(FailAt::Build, GRANTED).call(schema).await.unwrap_err();

    assert!(matches!(err, ApiError::Build { .. }));
    assert!(!slot.is_filled());
}

#[tokio::test]
async fn cleanup_failure_is_returned_and_discards_the_decoded_body() {
    let client = client(FailAt::Cleanup, GRANTED);
    let (slot, schema) = LockService.lock(lock_request());

    let err = client.call(schema).await.unwrap_err();

    assert!(matches!(err, ApiError::Cleanup { .. }));
    assert_eq!(client.lifecycle().counts(), (1, 1, 1));
    assert!(!slot.is_filled());
}

#[tokio::test]
async fn decode_failure_surfaces_as_decode_error() {
    let client = client(FailAt::Nowhere, r#"{"lock": "not an object"}"#);
    let (slot, schema) = LockService.lock(lock_request());

    let err = client.call(schema).await.unwrap_err();

    assert!(matches!(
        err,
        ApiError::Decode {
            target: "LockResponse",
            ..
        }
    ));
    assert_eq!(client.lifecycle().counts(), (1, 1, 0));
    assert!(!slot.is_filled());
}

#[tokio::test]
async fn success_populates_the_decode_target() {
    let client = client(FailAt::Nowhere, GRANTED);
    let (slot, schema) = LockService.lock(lock_request());

    let response = client.call(schema).await.unwrap();

    assert_eq!(response.status(), 200);
    assert!(response.is_success());
    assert_eq!(response.body(), GRANTED.as_bytes());
    assert_eq!(client.lifecycle().counts(), (1, 1, 1));

    let outcome = slot.take().unwrap().outcome().unwrap();
    match outcome {
        LockOutcome::Granted(lock) => {
            assert_eq!(lock.id.as_str(), "some-lock-id");
            assert!(lock.is_held());
        }
        other => panic!("expected a granted lock, got {other:?}"),
    }
}

#[tokio::test]
async fn denial_is_a_successful_call_with_a_domain_outcome() {
    let client = client(FailAt::Nowhere, r#"{"err": "locked by John Doe"}"#);
    let (slot, schema) = LockService.lock(lock_request());

    client.call(schema).await.unwrap();

    assert_eq!(
        slot.take().map(LockResponse::outcome).transpose().unwrap(),
        Some(LockOutcome::Denied {
            reason: "locked by John Doe".to_string()
        })
    );
}

#[tokio::test]
async fn schema_without_target_still_runs_every_phase() {
    let client = client(FailAt::Nowhere, "not json at all");

    let response = client
        .call(RequestSchema::new(Method::Get, "/locks"))
        .await
        .unwrap();

    assert_eq!(response.body(), b"not json at all");
    assert_eq!(client.lifecycle().counts(), (1, 1, 1));
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Echo {
    n: usize,
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_share_one_client() {
    const CALLS: usize = 64;
    let client = Arc::new(client(FailAt::Nowhere, r#"{"n": 1}"#));

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..CALLS {
        let client = Arc::clone(&client);
        tasks.spawn(async move {
            let slot = ResponseSlot::<Echo>::new();
            let schema =
                RequestSchema::new(Method::Get, format!("/objects/{i}")).decoding_into(&slot);
            client.call(schema).await.map(|_| slot.take())
        });
    }

    let mut decoded = 0;
    while let Some(joined) = tasks.join_next().await {
        decoded += joined.unwrap().unwrap().unwrap().n;
    }

    assert_eq!(decoded, CALLS);
    assert_eq!(client.lifecycle().counts(), (CALLS, CALLS, CALLS));
    assert_eq!(
        client.base().as_str(),
        "https://git-server.com/repo.git/info/lfs"
    );
}

#[tokio::test]
async fn requests_are_addressed_from_the_client_endpoint() {
    let lifecycle = Arc::new(StubLifecycle::new(FailAt::Nowhere, "{}"));
    let primary = Client::from_parts(
        Endpoint::parse("https://primary.example/lfs").unwrap(),
        Arc::clone(&lifecycle),
    );
    let mirror = Client::from_parts(
        Endpoint::parse("https://mirror.example/lfs").unwrap(),
        Arc::clone(&lifecycle),
    );

    primary
        .call(RequestSchema::new(Method::Get, "/locks"))
        .await
        .unwrap();
    mirror
        .call(RequestSchema::new(Method::Get, "/locks"))
        .await
        .unwrap();

    assert_eq!(
        lifecycle.addressed(),
        vec![
            "https://primary.example/lfs/locks".to_string(),
            "https://mirror.example/lfs/locks".to_string(),
        ]
    );
}

#[tokio::test]
async fn clones_share_the_lifecycle() {
    let client = client(FailAt::Nowhere, "{}");
    let clone = client.clone();

    clone
        .call(RequestSchema::new(Method::Get, "/locks"))
        .await
        .unwrap();

    assert_eq!(client.lifecycle().counts(), (1, 1, 1));
    assert_eq!(clone.base(), client.base());
}
