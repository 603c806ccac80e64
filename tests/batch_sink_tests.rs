// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use analytics_tracker::errors::TrackerError;
use analytics_tracker::record::{EventType, Properties, Record};
use analytics_tracker::sink::{BatchConfig, BatchSink, Sink, Transport};
use flate2::read::GzDecoder;
use std::collections::VecDeque;
use std::io::Read;
use std::sync::{Arc, Mutex};

/// Transport that records every post and replays scripted responses.
/// Once the script runs out it keeps answering success.
struct FakeTransport {
    posts: Arc<Mutex<Vec<(Vec<u8>, Vec<(String, String)>)>>>,
    responses: Arc<Mutex<VecDeque<Result<(u16, String), TrackerError>>>>,
}

impl Transport for FakeTransport {
    fn post(
        &self,
        body: Vec<u8>,
        headers: &[(&'static str, String)],
    ) -> Result<(u16, String), TrackerError> {
        self.posts.lock().unwrap().push((
            body,
            headers
                .iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
        ));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok((200, "{\"code\":0}".to_string())))
    }
}

type Posts = Arc<Mutex<Vec<(Vec<u8>, Vec<(String, String)>)>>>;

fn fake_sink(
    config: BatchConfig,
    responses: Vec<Result<(u16, String), TrackerError>>,
) -> (BatchSink, Posts) {
    let posts: Posts = Arc::new(Mutex::new(Vec::new()));
    let transport = FakeTransport {
        posts: posts.clone(),
        responses: Arc::new(Mutex::new(responses.into_iter().collect())),
    };
    (
        BatchSink::with_transport(config, Box::new(transport)),
        posts,
    )
}

fn config(max_buffer_length: usize, compress: bool) -> BatchConfig {
    BatchConfig {
        app_id: "app-1".to_string(),
        max_buffer_length,
        compress,
        ..BatchConfig::default()
    }
}

fn record(name: &str) -> Record {
    Record {
        event_type: EventType::Track,
        time: "2025-01-01 00:00:00.000".to_string(),
        event_name: Some(name.to_string()),
        event_id: None,
        account_id: None,
        distinct_id: Some("user-1".to_string()),
        ip: None,
        uuid: None,
        first_check_id: None,
        app_id: None,
        properties: Properties::new(),
    }
}

fn event_names(body: &[u8]) -> Vec<String> {
    let parsed: Vec<serde_json::Value> = serde_json::from_slice(body).unwrap();
    parsed
        .iter()
        .map(|v| v["#event_name"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_size_triggered_flush_chunks_in_order() {
    let (mut sink, posts) = fake_sink(config(2, false), vec![]);

    for name in ["r1", "r2", "r3", "r4", "r5"] {
        sink.add(record(name)).unwrap();
    }

    let posts = posts.lock().unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(event_names(&posts[0].0), vec!["r1", "r2"]);
    assert_eq!(event_names(&posts[1].0), vec!["r3", "r4"]);
    assert_eq!(sink.buffer_len(), 1);
}

#[test]
fn test_explicit_flush_drains_remainder() {
    let (mut sink, posts) = fake_sink(config(2, false), vec![]);

    for name in ["r1", "r2", "r3"] {
        sink.add(record(name)).unwrap();
    }
    sink.flush().unwrap();

    let posts = posts.lock().unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(event_names(&posts[1].0), vec!["r3"]);
    assert_eq!(sink.buffer_len(), 0);
}

#[test]
fn test_close_flushes() {
    let (mut sink, posts) = fake_sink(config(10, false), vec![]);

    sink.add(record("r1")).unwrap();
    sink.close().unwrap();

    assert_eq!(posts.lock().unwrap().len(), 1);
    assert_eq!(sink.buffer_len(), 0);
}

#[test]
fn test_nonzero_code_is_server_error_and_buffer_clears() {
    let (mut sink, _) = fake_sink(config(10, false), vec![Ok((200, "{\"code\":1}".to_string()))]);

    sink.add(record("r1")).unwrap();
    let err = sink.flush().unwrap_err();
    assert!(matches!(err, TrackerError::Server(_)));
    assert_eq!(sink.buffer_len(), 0);
}

#[test]
fn test_non_200_status_is_server_error() {
    let (mut sink, _) = fake_sink(
        config(10, false),
        vec![Ok((500, "internal error".to_string()))],
    );

    sink.add(record("r1")).unwrap();
    let err = sink.flush().unwrap_err();
    assert!(matches!(err, TrackerError::Server(_)));
}

#[test]
fn test_unparsable_200_body_is_server_error() {
    let (mut sink, _) = fake_sink(config(10, false), vec![Ok((200, "not json".to_string()))]);

    sink.add(record("r1")).unwrap();
    let err = sink.flush().unwrap_err();
    assert!(matches!(err, TrackerError::Server(_)));
}

#[test]
fn test_connection_error_propagates_and_buffer_clears() {
    let (mut sink, _) = fake_sink(
        config(2, false),
        vec![Err(TrackerError::Connection("refused".to_string()))],
    );

    sink.add(record("r1")).unwrap();
    let err = sink.add(record("r2")).unwrap_err();
    assert!(matches!(err, TrackerError::Connection(_)));
    // At-most-once: the failed buffer is dropped by default
    assert_eq!(sink.buffer_len(), 0);
}

#[test]
fn test_retain_on_failure_keeps_buffer() {
    let mut retain = config(2, false);
    retain.retain_on_failure = true;
    let (mut sink, posts) = fake_sink(
        retain,
        vec![Err(TrackerError::Connection("refused".to_string()))],
    );

    sink.add(record("r1")).unwrap();
    assert!(sink.add(record("r2")).is_err());
    assert_eq!(sink.buffer_len(), 2);

    // Next flush succeeds and re-sends the retained records
    sink.flush().unwrap();
    assert_eq!(sink.buffer_len(), 0);
    let posts = posts.lock().unwrap();
    assert_eq!(event_names(&posts[1].0), vec!["r1", "r2"]);
}

#[test]
fn test_accepted_chunks_are_not_resent_after_partial_failure() {
    let mut retain = config(2, false);
    retain.retain_on_failure = true;
    let (mut sink, posts) = fake_sink(
        retain,
        vec![
            Err(TrackerError::Connection("refused".to_string())),
            Ok((200, "{\"code\":0}".to_string())),
            Ok((200, "{\"code\":1}".to_string())),
        ],
    );

    // First flush fails outright, both records retained
    sink.add(record("r1")).unwrap();
    assert!(sink.add(record("r2")).is_err());
    assert_eq!(sink.buffer_len(), 2);

    // Second flush covers two chunks: [r1, r2] is accepted, [r3] is
    // rejected. Only the rejected record stays behind for retry.
    let err = sink.add(record("r3")).unwrap_err();
    assert!(matches!(err, TrackerError::Server(_)));
    assert_eq!(posts.lock().unwrap().len(), 3);
    assert_eq!(sink.buffer_len(), 1);

    // The retry posts r3 alone, never duplicating r1 or r2
    sink.flush().unwrap();
    assert_eq!(sink.buffer_len(), 0);
    let posts = posts.lock().unwrap();
    assert_eq!(event_names(&posts[3].0), vec!["r3"]);
}

#[test]
fn test_buffer_length_clamped_to_hard_cap() {
    let (sink, _) = fake_sink(config(100_000, false), vec![]);
    assert_eq!(sink.max_buffer_length(), 2000);

    let (sink, _) = fake_sink(config(0, false), vec![]);
    assert_eq!(sink.max_buffer_length(), 1);
}

#[test]
fn test_gzip_body_and_headers() {
    let (mut sink, posts) = fake_sink(config(10, true), vec![]);

    sink.add(record("r1")).unwrap();
    sink.flush().unwrap();

    let posts = posts.lock().unwrap();
    let (body, headers) = &posts[0];

    let mut decoder = GzDecoder::new(&body[..]);
    let mut decoded = Vec::new();
    decoder.read_to_end(&mut decoded).unwrap();
    assert_eq!(event_names(&decoded), vec!["r1"]);

    assert!(headers.contains(&("appid".to_string(), "app-1".to_string())));
    assert!(headers.contains(&("compress".to_string(), "gzip".to_string())));
    assert!(headers.contains(&("TE-Integration-Count".to_string(), "1".to_string())));
    assert!(headers.contains(&(
        "Content-Type".to_string(),
        "application/plaintext".to_string()
    )));
}

#[test]
fn test_compress_disabled_marks_header_none() {
    let (mut sink, posts) = fake_sink(config(10, true), vec![]);
    sink.set_compress(false);

    sink.add(record("r1")).unwrap();
    sink.flush().unwrap();

    let posts = posts.lock().unwrap();
    let (body, headers) = &posts[0];
    assert_eq!(event_names(body), vec!["r1"]);
    assert!(headers.contains(&("compress".to_string(), "none".to_string())));
}

// One-shot HTTP server for exercising the real reqwest transport.
fn serve_once(response_body: &'static str) -> (std::net::SocketAddr, std::sync::mpsc::Receiver<String>) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = std::sync::mpsc::channel();

    std::thread::spawn(move || {
        use std::io::Write;

        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        let header_end = loop {
            let n = stream.read(&mut chunk).unwrap();
            request.extend_from_slice(&chunk[..n]);
            if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&request[..header_end]).to_string();
        let content_length: usize = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse().ok())?
            })
            .unwrap_or(0);
        while request.len() < header_end + content_length {
            let n = stream.read(&mut chunk).unwrap();
            request.extend_from_slice(&chunk[..n]);
        }

        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            response_body.len(),
            response_body
        );
        stream.write_all(response.as_bytes()).unwrap();
        tx.send(String::from_utf8_lossy(&request).to_string()).unwrap();
    });

    (addr, rx)
}

#[test]
fn test_http_transport_round_trip() {
    let (addr, request_rx) = serve_once("{\"code\":0}");

    let mut sink = BatchSink::new(BatchConfig {
        server_url: format!("http://{}", addr),
        app_id: "app-1".to_string(),
        max_buffer_length: 10,
        compress: false,
        timeout_seconds: 5,
        retain_on_failure: false,
    })
    .unwrap();

    sink.add(record("wire_event")).unwrap();
    sink.flush().unwrap();
    assert_eq!(sink.buffer_len(), 0);

    let request = request_rx.recv().unwrap();
    let lowered = request.to_lowercase();
    assert!(request.starts_with("POST /sync_server"));
    assert!(lowered.contains("appid: app-1"));
    assert!(lowered.contains("compress: none"));
    assert!(request.contains("\"#event_name\":\"wire_event\""));
}
