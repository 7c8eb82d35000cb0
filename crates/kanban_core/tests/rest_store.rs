use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::Router;
use kanban_core::store::{RemoteStore, RestOptions, RestRemoteStore, StoreError};
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    uri: String,
    body: String,
}

/// Local HTTP endpoint that records requests and replays scripted responses.
#[derive(Default)]
struct FakeDatabase {
    requests: Mutex<Vec<Recorded>>,
    responses: Mutex<VecDeque<(u16, String)>>,
}

impl FakeDatabase {
    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

async fn record(
    State(fake): State<Arc<FakeDatabase>>,
    method: Method,
    uri: Uri,
    body: String,
) -> (StatusCode, String) {
    fake.requests.lock().unwrap().push(Recorded {
        method: method.to_string(),
        uri: uri.to_string(),
        body,
    });
    let (status, body) = fake
        .responses
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((200, "null".to_string()));
    (StatusCode::from_u16(status).unwrap(), body)
}

async fn serve(responses: &[(u16, &str)]) -> (String, Arc<FakeDatabase>) {
    let fake = Arc::new(FakeDatabase::default());
    fake.responses.lock().unwrap().extend(
        responses
            .iter()
            .map(|(status, body)| (*status, body.to_string())),
    );
    let app = Router::new()
        .fallback(record)
        .with_state(Arc::clone(&fake));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), fake)
}

fn store(url: &str, auth_token: Option<&str>) -> RestRemoteStore {
    RestRemoteStore::new(
        url,
        RestOptions {
            auth_token: auth_token.map(str::to_string),
            ..RestOptions::default()
        },
    )
    .unwrap()
}

fn changes(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn get_maps_path_to_json_url_with_auth_token() {
    let (url, fake) = serve(&[(200, r#"{"title":"Plan"}"#), (200, "null")]).await;
    let store = store(&url, Some("secret"));

    assert_eq!(
        store.get("/tasks/t1/").await.unwrap(),
        Some(json!({"title": "Plan"}))
    );
    assert_eq!(store.get("contacts").await.unwrap(), None);

    let requests = fake.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].uri, "/tasks/t1.json?auth=secret");
    assert_eq!(requests[1].uri, "/contacts.json?auth=secret");
}

#[tokio::test]
async fn error_status_maps_to_remote_error() {
    let (url, _fake) = serve(&[(401, r#"{"error":"Permission denied"}"#)]).await;
    let store = store(&url, None);

    let err = store.get("tasks").await.unwrap_err();

    match err {
        StoreError::Remote { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("Permission denied"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn set_and_remove_accept_empty_bodies() {
    let (url, fake) = serve(&[(200, ""), (200, "")]).await;
    let store = store(&url, None);

    store.set("tasks/t1", json!({"title": "Plan"})).await.unwrap();
    store.remove("tasks/t1").await.unwrap();

    let requests = fake.requests();
    assert_eq!(requests[0].method, "PUT");
    assert_eq!(requests[0].uri, "/tasks/t1.json");
    assert_eq!(
        serde_json::from_str::<Value>(&requests[0].body).unwrap(),
        json!({"title": "Plan"})
    );
    assert_eq!(requests[1].method, "DELETE");
    assert_eq!(requests[1].uri, "/tasks/t1.json");
}

#[tokio::test]
async fn update_sends_multi_path_patch() {
    let (url, fake) = serve(&[(200, "{}")]).await;
    let store = store(&url, None);
    let batch = changes(json!({
        "contacts/c1": null,
        "tasks/t1/assignedTo": ["c2"]
    }));

    store.update("", batch.clone()).await.unwrap();

    let requests = fake.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "PATCH");
    assert_eq!(requests[0].uri, "/.json");
    assert_eq!(
        serde_json::from_str::<Value>(&requests[0].body).unwrap(),
        Value::Object(batch)
    );
}

#[tokio::test]
async fn overlapping_update_is_rejected_before_any_request() {
    let (url, fake) = serve(&[]).await;
    let store = store(&url, None);

    let err = store
        .update("", changes(json!({"tasks": null, "tasks/t1/title": "X"})))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::InvalidPath(_)));
    assert!(fake.requests().is_empty());
}

#[tokio::test]
async fn push_returns_generated_name() {
    let (url, fake) = serve(&[(200, r#"{"name":"-Nq1"}"#), (200, "{}")]).await;
    let store = store(&url, None);

    let key = store.push("tasks", json!({"title": "Queued"})).await.unwrap();
    assert_eq!(key, "-Nq1");
    assert_eq!(fake.requests()[0].method, "POST");
    assert_eq!(fake.requests()[0].uri, "/tasks.json");

    assert!(matches!(
        store.push("tasks", json!({"title": "Lost"})).await,
        Err(StoreError::Remote { .. })
    ));
}

#[tokio::test]
async fn liveness_check_reads_root_shallowly() {
    let (url, fake) = serve(&[(200, r#"{"tasks":true}"#), (503, "down"), (200, "true")]).await;
    let store = store(&url, None);

    assert!(store.is_connected().await);
    assert!(!store.is_connected().await);
    assert_eq!(
        store.get(".info/connected").await.unwrap(),
        Some(Value::Bool(true))
    );

    let requests = fake.requests();
    assert!(requests.iter().all(|r| r.uri == "/.json?shallow=true"));
    assert_eq!(requests.len(), 3);
}
