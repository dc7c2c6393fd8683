use std::{
	collections::HashMap,
	future::IntoFuture,
	sync::{Arc, Mutex},
};

use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::{HeaderMap, StatusCode},
	response::IntoResponse,
	routing,
};
use serde_json::Value;
use tokio::{
	net::TcpListener,
	sync::{oneshot, oneshot::Sender},
};

use memos_client::{
	Error, ListPageRequest, MemoPatch, MemoState, MemosClient, Visibility, auth_headers,
};

#[derive(Clone, Debug, Default)]
struct Recorded {
	method: String,
	path: String,
	query: HashMap<String, String>,
	authorization: Option<String>,
	body: Option<Value>,
}

type Log = Arc<Mutex<Vec<Recorded>>>;

async fn start_memos_server(log: Log) -> (String, Sender<()>) {
	let app = Router::new()
		.route("/api/v1/memos", routing::get(list_handler).post(create_handler))
		.route("/api/v1/memos/{id}", routing::patch(update_handler).delete(delete_handler))
		.with_state(log);
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind memos server.");
	let addr = listener.local_addr().expect("Failed to read memos server address.");
	let (tx, rx) = oneshot::channel();
	let server = axum::serve(listener, app).with_graceful_shutdown(async move {
		let _ = rx.await;
	});

	tokio::spawn(async move {
		let _ = server.into_future().await;
	});

	(format!("http://{addr}"), tx)
}

fn record(
	log: &Log,
	method: &str,
	path: String,
	query: HashMap<String, String>,
	headers: &HeaderMap,
	body: Option<Value>,
) {
	let authorization = headers
		.get("authorization")
		.and_then(|value| value.to_str().ok())
		.map(str::to_string);

	log.lock().expect("log lock").push(Recorded {
		method: method.to_string(),
		path,
		query,
		authorization,
		body,
	});
}

async fn list_handler(
	State(log): State<Log>,
	Query(query): Query<HashMap<String, String>>,
	headers: HeaderMap,
) -> impl IntoResponse {
	let page_token = query.get("pageToken").cloned();

	record(&log, "GET", "/api/v1/memos".to_string(), query, &headers, None);

	if page_token.as_deref() == Some("boom") {
		return (StatusCode::BAD_GATEWAY, Json(serde_json::json!({ "message": "upstream down" })))
			.into_response();
	}

	Json(serde_json::json!({
		"memos": [
			{
				"name": "memos/2",
				"content": "Second",
				"visibility": "PUBLIC",
				"tags": ["b"],
				"displayTime": "2024-01-02T00:00:00Z",
				"state": "NORMAL"
			},
			{
				"name": "memos/1",
				"content": "First",
				"visibility": "PRIVATE",
				"displayTime": "2024-01-01T00:00:00Z",
				"state": "NORMAL"
			}
		],
		"nextPageToken": "page-2"
	}))
	.into_response()
}

async fn create_handler(
	State(log): State<Log>,
	headers: HeaderMap,
	Json(body): Json<Value>,
) -> impl IntoResponse {
	let content = body.get("content").cloned().unwrap_or(Value::Null);
	let visibility = body.get("visibility").cloned().unwrap_or(Value::Null);

	record(&log, "POST", "/api/v1/memos".to_string(), HashMap::new(), &headers, Some(body));

	Json(serde_json::json!({
		"name": "memos/99",
		"content": content,
		"visibility": visibility,
		"createTime": "2024-03-01T08:00:00Z",
		"state": "NORMAL"
	}))
}

async fn update_handler(
	State(log): State<Log>,
	Path(id): Path<String>,
	Query(query): Query<HashMap<String, String>>,
	headers: HeaderMap,
	Json(body): Json<Value>,
) -> impl IntoResponse {
	let pinned = body.get("pinned").and_then(Value::as_bool).unwrap_or(false);

	record(&log, "PATCH", format!("/api/v1/memos/{id}"), query, &headers, Some(body));

	Json(serde_json::json!({ "name": format!("memos/{id}"), "pinned": pinned, "state": "ARCHIVED" }))
}

async fn delete_handler(
	State(log): State<Log>,
	Path(id): Path<String>,
	headers: HeaderMap,
) -> impl IntoResponse {
	record(&log, "DELETE", format!("/api/v1/memos/{id}"), HashMap::new(), &headers, None);

	StatusCode::OK
}

fn remote(base_url: &str) -> memos_config::Remote {
	memos_config::Remote {
		base_url: base_url.to_string(),
		token: "secret".to_string(),
		timeout_ms: 5_000,
		default_visibility: "workspace".to_string(),
	}
}

#[test]
fn builds_bearer_auth_header() {
	let headers = auth_headers("secret").expect("Failed to build headers.");
	let value = headers.get("authorization").expect("Missing authorization header.");

	assert_eq!(value, "Bearer secret");
}

#[test]
fn empty_token_is_a_config_error() {
	let mut cfg = remote("http://127.0.0.1:1");

	cfg.token = " ".to_string();

	let err = MemosClient::new(&cfg).expect_err("expected config error");

	assert!(matches!(err, Error::InvalidConfig { .. }), "unexpected error: {err}");
}

#[tokio::test]
async fn list_page_sends_paging_and_filter_parameters() {
	let log = Log::default();
	let (base_url, shutdown) = start_memos_server(log.clone()).await;
	let client = MemosClient::new(&remote(&base_url)).expect("client");
	let page = client
		.list_memos_page(&ListPageRequest {
			page_size: 100,
			page_token: Some("page-1".to_string()),
			state: MemoState::Archived,
			old_filter: Some("display_time_after == 1704038400".to_string()),
		})
		.await
		.expect("page");

	let _ = shutdown.send(());

	assert_eq!(page.memos.len(), 2);
	assert_eq!(page.memos[0].name, "memos/2");
	assert_eq!(page.memos[0].visibility, Visibility::Public);
	assert_eq!(page.memos[1].tags, Vec::<String>::new());
	assert_eq!(page.next_page_token.as_deref(), Some("page-2"));

	let recorded = log.lock().expect("log lock").clone();
	let request = &recorded[0];

	assert_eq!(request.authorization.as_deref(), Some("Bearer secret"));
	assert_eq!(request.query.get("pageSize").map(String::as_str), Some("100"));
	assert_eq!(request.query.get("pageToken").map(String::as_str), Some("page-1"));
	assert_eq!(request.query.get("state").map(String::as_str), Some("ARCHIVED"));
	assert_eq!(request.query.get("sort").map(String::as_str), Some("display_time"));
	assert_eq!(request.query.get("direction").map(String::as_str), Some("DESC"));
	assert_eq!(
		request.query.get("oldFilter").map(String::as_str),
		Some("display_time_after == 1704038400")
	);
}

#[tokio::test]
async fn non_success_status_carries_server_message() {
	let log = Log::default();
	let (base_url, shutdown) = start_memos_server(log).await;
	let client = MemosClient::new(&remote(&base_url)).expect("client");
	let err = client
		.list_memos_page(&ListPageRequest {
			page_size: 100,
			page_token: Some("boom".to_string()),
			state: MemoState::Normal,
			old_filter: None,
		})
		.await
		.expect_err("expected status error");

	let _ = shutdown.send(());

	match err {
		Error::Status { status, method, path, message } => {
			assert_eq!(status, 502);
			assert_eq!(method, "GET");
			assert_eq!(path, "/memos");
			assert_eq!(message, "upstream down");
		},
		other => panic!("unexpected error: {other}"),
	}
}

#[tokio::test]
async fn create_posts_content_and_visibility() {
	let log = Log::default();
	let (base_url, shutdown) = start_memos_server(log.clone()).await;
	let client = MemosClient::new(&remote(&base_url)).expect("client");
	let memo = client.create_memo("hello", Visibility::Protected).await.expect("memo");

	let _ = shutdown.send(());

	assert_eq!(memo.name, "memos/99");
	assert_eq!(memo.visibility, Visibility::Protected);
	assert_eq!(memo.create_time.as_deref(), Some("2024-03-01T08:00:00Z"));

	let recorded = log.lock().expect("log lock").clone();

	assert_eq!(
		recorded[0].body,
		Some(serde_json::json!({ "content": "hello", "visibility": "PROTECTED" }))
	);
}

#[tokio::test]
async fn update_sends_mask_and_partial_body() {
	let log = Log::default();
	let (base_url, shutdown) = start_memos_server(log.clone()).await;
	let client = MemosClient::new(&remote(&base_url)).expect("client");
	let patch = MemoPatch {
		pinned: Some(true),
		state: Some(MemoState::Archived),
		..Default::default()
	};
	let memo = client.update_memo("memos/7", &patch).await.expect("memo");

	let _ = shutdown.send(());

	assert!(memo.pinned);
	assert_eq!(memo.state, MemoState::Archived);

	let recorded = log.lock().expect("log lock").clone();
	let request = &recorded[0];

	assert_eq!(request.method, "PATCH");
	assert_eq!(request.path, "/api/v1/memos/7");
	assert_eq!(request.query.get("updateMask").map(String::as_str), Some("pinned,state"));
	assert_eq!(
		request.body,
		Some(serde_json::json!({ "name": "memos/7", "pinned": true, "state": "ARCHIVED" }))
	);
}

#[tokio::test]
async fn delete_accepts_empty_body() {
	let log = Log::default();
	let (base_url, shutdown) = start_memos_server(log.clone()).await;
	let client = MemosClient::new(&remote(&base_url)).expect("client");

	client.delete_memo("memos/5").await.expect("delete");

	let _ = shutdown.send(());
	let recorded = log.lock().expect("log lock").clone();

	assert_eq!(recorded[0].method, "DELETE");
	assert_eq!(recorded[0].path, "/api/v1/memos/5");
}

#[tokio::test]
async fn invalid_names_never_reach_the_server() {
	let log = Log::default();
	let (base_url, shutdown) = start_memos_server(log.clone()).await;
	let client = MemosClient::new(&remote(&base_url)).expect("client");
	let err = client.delete_memo("notes/5").await.expect_err("expected name error");

	let _ = shutdown.send(());

	assert!(matches!(err, Error::InvalidName { .. }), "unexpected error: {err}");
	assert!(log.lock().expect("log lock").is_empty());
}

#[tokio::test]
async fn transport_failures_are_network_errors() {
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
	let addr = listener.local_addr().expect("addr");

	drop(listener);

	let client = MemosClient::new(&remote(&format!("http://{addr}"))).expect("client");
	let err = client.delete_memo("memos/1").await.expect_err("expected network error");

	assert!(
		matches!(err, Error::Network { .. } | Error::Timeout { .. }),
		"unexpected error: {err}"
	);
}
