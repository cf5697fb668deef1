use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tasktrack::api::{ApiClient, Task};
use tasktrack::{cli, render};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

fn task(id: u64, title: &str, done: bool) -> Task {
    Task {
        id,
        title: title.to_string(),
        done,
    }
}

/// In-process stand-in for the remote task service, bound to an ephemeral
/// port. Speaks just enough HTTP/1.1 for the client and counts every request
/// so validation tests can assert that nothing went over the wire.
struct FakeService {
    base_url: String,
    tasks: Arc<Mutex<Vec<Task>>>,
    hits: Arc<AtomicUsize>,
}

async fn spawn_service(initial: Vec<Task>) -> FakeService {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let tasks = Arc::new(Mutex::new(initial));
    let hits = Arc::new(AtomicUsize::new(0));

    let state = tasks.clone();
    let counter = hits.clone();
    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            let state = state.clone();
            let counter = counter.clone();
            tokio::spawn(async move {
                let _ = handle_connection(socket, state, counter).await;
            });
        }
    });

    FakeService {
        base_url: format!("http://{addr}"),
        tasks,
        hits,
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

async fn handle_connection(
    mut socket: TcpStream,
    state: Arc<Mutex<Vec<Task>>>,
    hits: Arc<AtomicUsize>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find_subslice(&buf, b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let line = line.to_ascii_lowercase();
            line.strip_prefix("content-length:")
                .and_then(|v| v.trim().parse::<usize>().ok())
        })
        .unwrap_or(0);

    let body_start = header_end + 4;
    while buf.len() < body_start + content_length {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = &buf[body_start..(body_start + content_length).min(buf.len())];

    let request_line = head.lines().next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default();
    let (path, query) = match target.split_once('?') {
        Some((p, q)) => (p.to_string(), q.to_string()),
        None => (target.to_string(), String::new()),
    };

    hits.fetch_add(1, Ordering::SeqCst);

    let (status, payload) = route(&method, &path, &query, body, &state);
    let response = format!(
        "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{payload}",
        payload.len()
    );
    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await?;

    Ok(())
}

fn route(
    method: &str,
    path: &str,
    query: &str,
    body: &[u8],
    state: &Arc<Mutex<Vec<Task>>>,
) -> (&'static str, String) {
    let mut tasks = state.lock().unwrap();

    match (method, path) {
        ("GET", "/tasks") => ("200 OK", serde_json::to_string(&*tasks).unwrap()),
        ("POST", "/tasks") => match serde_json::from_slice::<Task>(body) {
            Ok(new_task) => {
                if tasks.iter().any(|t| t.id == new_task.id) {
                    (
                        "400 Bad Request",
                        r#"{"detail": "Task ID already exists"}"#.to_string(),
                    )
                } else {
                    tasks.push(new_task);
                    ("200 OK", r#"{"message": "Task added"}"#.to_string())
                }
            }
            Err(_) => (
                "422 Unprocessable Entity",
                r#"{"detail": "Invalid task body"}"#.to_string(),
            ),
        },
        ("PUT", _) if path.starts_with("/tasks/") => {
            let id = path.trim_start_matches("/tasks/").parse::<u64>().ok();
            let done = query.strip_prefix("done=").map(|v| v == "true");
            match (id, done) {
                (Some(id), Some(done)) => {
                    if let Some(t) = tasks.iter_mut().find(|t| t.id == id) {
                        t.done = done;
                        ("200 OK", r#"{"message": "Task updated"}"#.to_string())
                    } else {
                        ("404 Not Found", r#"{"detail": "Task not found"}"#.to_string())
                    }
                }
                _ => (
                    "422 Unprocessable Entity",
                    r#"{"detail": "Invalid request"}"#.to_string(),
                ),
            }
        }
        ("DELETE", _) if path.starts_with("/tasks/") => {
            match path.trim_start_matches("/tasks/").parse::<u64>().ok() {
                Some(id) if tasks.iter().any(|t| t.id == id) => {
                    tasks.retain(|t| t.id != id);
                    ("200 OK", r#"{"message": "Task deleted"}"#.to_string())
                }
                _ => ("404 Not Found", r#"{"detail": "Task not found"}"#.to_string()),
            }
        }
        _ => ("404 Not Found", r#"{"detail": "Not Found"}"#.to_string()),
    }
}

#[tokio::test]
async fn test_end_to_end_workflow() {
    let service = spawn_service(vec![]).await;
    let client = ApiClient::with_base_url(&service.base_url).unwrap();

    // Add a task
    cli::handle_add(&client, 1, vec!["buy".to_string(), "milk".to_string()])
        .await
        .unwrap();

    let tasks = client.list().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0], task(1, "buy milk", false));

    // List tasks
    cli::handle_list(&client).await.unwrap();

    // Mark it done, then not done
    cli::handle_set_done(&client, 1, true).await.unwrap();
    assert!(client.list().await.unwrap()[0].done);

    cli::handle_set_done(&client, 1, false).await.unwrap();
    assert!(!client.list().await.unwrap()[0].done);

    // Remove it
    cli::handle_remove(&client, 1).await.unwrap();
    assert!(client.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_add_validation_never_hits_network() {
    let service = spawn_service(vec![]).await;
    let client = ApiClient::with_base_url(&service.base_url).unwrap();

    // Missing title
    let result = cli::handle_add(&client, 1, vec![]).await;
    assert!(result.is_err());

    // Whitespace-only title
    let result = cli::handle_add(&client, 1, vec!["   ".to_string()]).await;
    assert!(result.is_err());

    // Zero id
    let result = cli::handle_add(&client, 0, vec!["title".to_string()]).await;
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("both ID and title"));

    assert_eq!(service.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_duplicate_id_surfaces_server_detail() {
    let service = spawn_service(vec![task(1, "existing", false)]).await;
    let client = ApiClient::with_base_url(&service.base_url).unwrap();

    let result = cli::handle_add(&client, 1, vec!["again".to_string()]).await;
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("already exists"));

    // The original task is untouched
    assert_eq!(service.tasks.lock().unwrap().len(), 1);
    assert_eq!(service.tasks.lock().unwrap()[0].title, "existing");
}

#[tokio::test]
async fn test_toggle_changes_only_target_task() {
    let service = spawn_service(vec![task(1, "a", false), task(2, "b", false)]).await;
    let client = ApiClient::with_base_url(&service.base_url).unwrap();

    client.set_done(1, true).await.unwrap();

    let tasks = client.list().await.unwrap();
    assert!(tasks.iter().find(|t| t.id == 1).unwrap().done);
    assert!(!tasks.iter().find(|t| t.id == 2).unwrap().done);
}

#[tokio::test]
async fn test_toggle_then_refresh_renders_done_state_with_undo_control() {
    let service = spawn_service(vec![task(1, "a", false)]).await;
    let client = ApiClient::with_base_url(&service.base_url).unwrap();

    client.set_done(1, true).await.unwrap();

    let refreshed = client.list().await.unwrap();
    let rows = render::rows(&refreshed, None);
    assert_eq!(rows.len(), 1);
    assert!(rows[0].done);
    assert_eq!(rows[0].action_label(), "undo");
    assert!(render::format_row(&rows[0]).contains("✅"));
}

#[tokio::test]
async fn test_delete_removes_exactly_one() {
    let service = spawn_service(vec![
        task(1, "a", false),
        task(2, "b", false),
        task(3, "c", false),
    ])
    .await;
    let client = ApiClient::with_base_url(&service.base_url).unwrap();

    cli::handle_remove(&client, 2).await.unwrap();

    let tasks = client.list().await.unwrap();
    assert_eq!(tasks.len(), 2);
    assert!(!tasks.iter().any(|t| t.id == 2));
    assert!(tasks.iter().any(|t| t.id == 1));
    assert!(tasks.iter().any(|t| t.id == 3));
}

#[tokio::test]
async fn test_mutations_on_unknown_id_surface_not_found() {
    let service = spawn_service(vec![task(1, "a", false)]).await;
    let client = ApiClient::with_base_url(&service.base_url).unwrap();

    let result = client.remove(99).await;
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("not found"));

    let result = client.set_done(99, true).await;
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("not found"));
}

#[tokio::test]
async fn test_empty_collection_renders_placeholder() {
    let service = spawn_service(vec![]).await;
    let client = ApiClient::with_base_url(&service.base_url).unwrap();

    let tasks = client.list().await.unwrap();
    let lines = render::list_lines(&render::rows(&tasks, None));
    assert_eq!(lines, vec![render::EMPTY_PLACEHOLDER.to_string()]);
}

#[tokio::test]
async fn test_unreachable_service_is_an_error_not_a_panic() {
    // Reserve a port, then drop the listener so nothing answers there.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::with_base_url(format!("http://{addr}")).unwrap();
    assert!(client.list().await.is_err());
    assert!(cli::handle_list(&client).await.is_err());
}
