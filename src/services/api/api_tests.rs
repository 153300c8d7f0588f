use super::*;

use std::io::{Read, Write};
use std::net::TcpListener;

// One-shot HTTP server: accepts a single connection, reads the request
// (headers plus any Content-Length body), answers with `response`, and
// hands the raw request back for assertions.
fn canned_server(response: &'static str) -> (String, std::thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf: Vec<u8> = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            buf.extend_from_slice(&chunk[..n]);
            if let Some(body_start) = headers_end(&buf) {
                let headers = String::from_utf8_lossy(&buf[..body_start]).to_string();
                if buf.len() - body_start >= content_length(&headers) {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
        String::from_utf8_lossy(&buf).to_string()
    });
    (format!("http://{addr}"), handle)
}

fn headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

fn content_length(headers: &str) -> usize {
    headers
        .lines()
        .find_map(|l| {
            let (name, value) = l.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .unwrap_or(0)
}

#[test]
fn fetch_row_parses_record() {
    let (base, server) = canned_server(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 24\r\nConnection: close\r\n\r\n{\"id\":\"42\",\"name\":\"Ana\"}",
    );
    let client = ApiClient::new(base);
    let rec = client.fetch_row("42").unwrap();
    let fields: Vec<(String, String)> = rec
        .edit_fields()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    assert_eq!(fields, vec![("name".to_string(), "Ana".to_string())]);
    let request = server.join().unwrap();
    assert!(request.starts_with("GET /api/row/42 "));
}

#[test]
fn fetch_row_maps_non_2xx_to_missing() {
    let (base, server) = canned_server(
        "HTTP/1.1 404 NOT FOUND\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
    );
    let client = ApiClient::new(base);
    assert_eq!(
        client.fetch_row("999"),
        Err(LoadError::RowMissing { status: 404 })
    );
    let _ = server.join().unwrap();
}

#[test]
fn fetch_row_reports_malformed_body() {
    let (base, server) = canned_server(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 4\r\nConnection: close\r\n\r\nnope",
    );
    let client = ApiClient::new(base);
    match client.fetch_row("42") {
        Err(LoadError::Body(_)) => {}
        other => panic!("expected Body error, got {other:?}"),
    }
    let _ = server.join().unwrap();
}

#[test]
fn update_row_posts_rendered_fields() {
    let (base, server) =
        canned_server("HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
    let client = ApiClient::new(base);
    client
        .update_row("42", &[("name".to_string(), "Ana".to_string())])
        .unwrap();
    let request = server.join().unwrap();
    assert!(request.starts_with("POST /api/row/42 "));
    assert!(request.to_ascii_lowercase().contains("content-type: application/json"));
    let body_start = request.find("\r\n\r\n").unwrap() + 4;
    let body: JsonValue = serde_json::from_str(&request[body_start..]).unwrap();
    assert_eq!(body, serde_json::json!({"name": "Ana"}));
}

#[test]
fn update_row_surfaces_status_on_failure() {
    let (base, server) = canned_server(
        "HTTP/1.1 500 INTERNAL SERVER ERROR\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
    );
    let client = ApiClient::new(base);
    let err = client
        .update_row("42", &[("name".to_string(), "Ana".to_string())])
        .unwrap_err();
    assert!(err.contains("500"), "got: {err}");
    let _ = server.join().unwrap();
}

#[test]
fn urls_keep_the_id_verbatim() {
    let client = ApiClient::new("http://rows.example.com/");
    assert_eq!(client.row_url("42"), "http://rows.example.com/api/row/42");
    assert_eq!(
        client.document_url("42"),
        "http://rows.example.com/api/row/42/pdf"
    );
    // no trimming, no validation
    assert_eq!(
        client.row_url(" 4 2 "),
        "http://rows.example.com/api/row/ 4 2 "
    );
}

#[test]
fn expand_env_substitutes_known_vars() {
    std::env::set_var("ROW_TUI_TEST_HOST", "rows.internal");
    assert_eq!(
        expand_env("http://${ROW_TUI_TEST_HOST}:8080"),
        "http://rows.internal:8080"
    );
    assert_eq!(expand_env("${ROW_TUI_TEST_UNSET_VAR}x"), "x");
}
