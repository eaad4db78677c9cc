use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use flashgen::config::GenerationSettings;
use flashgen::llm::{ChatCompletionClient, GenerationRequest, TextGenerator, Topic};
use flashgen::{CardSource, FallbackPolicy, FallbackReason, GenerateError, Generator};

/// Serves exactly one HTTP response and hands back the raw request it saw.
async fn one_shot_server(status: &'static str, body: String) -> (SocketAddr, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;

        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        request
    });

    (addr, handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn settings_for(addr: SocketAddr) -> GenerationSettings {
    GenerationSettings {
        endpoint: format!("http://{addr}/v1/chat/completions"),
        ..Default::default()
    }
}

/// Local responders must not be routed through a proxy from the environment.
fn client_for(settings: &GenerationSettings, api_key: &str) -> ChatCompletionClient {
    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    ChatCompletionClient::with_http(http, settings, api_key)
}

fn generator_for(addr: SocketAddr) -> Generator<ChatCompletionClient> {
    let settings = settings_for(addr);
    let client = client_for(&settings, "test-key");
    Generator::new(client, settings, FallbackPolicy::DefaultDeck)
}

#[tokio::test]
async fn end_to_end_world_war_two() {
    let body = r#"{"choices":[{"message":{"content":"[{\"question\":\"When did WWII end?\",\"answer\":\"1945\"}]"}}]}"#;
    let (addr, server) = one_shot_server("200 OK", body.to_string()).await;

    let generation = generator_for(addr).generate("World War II").await.unwrap();

    assert_eq!(generation.source, CardSource::Generated);
    assert_eq!(generation.cards.len(), 1);
    assert_eq!(generation.cards.cards()[0].question(), "When did WWII end?");
    assert_eq!(generation.cards.cards()[0].answer(), "1945");

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /v1/chat/completions"));
    assert!(request.to_ascii_lowercase().contains("authorization: bearer test-key"));
    assert!(request.contains("Create 10 flashcards about World War II."));
    assert!(request.contains(r#""model":"gpt-4o-mini""#));
    assert!(request.contains(r#""max_tokens":500"#));
}

#[tokio::test]
async fn server_error_yields_fallback_deck() {
    let (addr, server) =
        one_shot_server("500 Internal Server Error", r#"{"error":"boom"}"#.to_string()).await;

    let generation = generator_for(addr).generate("chemistry").await.unwrap();

    assert_eq!(
        generation.source,
        CardSource::Fallback {
            reason: FallbackReason::Generation
        }
    );
    assert_eq!(
        generation.cards,
        FallbackPolicy::DefaultDeck.cards_for(FallbackReason::Generation)
    );
    server.await.unwrap();
}

#[tokio::test]
async fn prose_reply_yields_fallback_deck() {
    let body = r#"{"choices":[{"message":{"content":"I cannot help with that."}}]}"#;
    let (addr, server) = one_shot_server("200 OK", body.to_string()).await;

    let generation = generator_for(addr).generate("chemistry").await.unwrap();
    assert_eq!(
        generation.source,
        CardSource::Fallback {
            reason: FallbackReason::Extraction
        }
    );
    assert!(!generation.cards.is_empty());
    server.await.unwrap();
}

#[tokio::test]
async fn client_reports_non_success_status() {
    let (addr, server) = one_shot_server("401 Unauthorized", "{}".to_string()).await;
    let settings = settings_for(addr);
    let client = client_for(&settings, "bad-key");
    let request = GenerationRequest::new(Topic::parse("rust").unwrap(), &settings);

    let result = client.complete(&request).await;
    assert!(matches!(result, Err(GenerateError::GenerationFailed(_))));
    server.await.unwrap();
}

#[tokio::test]
async fn unreachable_service_yields_fallback_deck() {
    // Bind then drop so the port is (almost certainly) closed.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let generation = generator_for(addr).generate("chemistry").await.unwrap();
    assert!(generation.is_fallback());
    assert!(!generation.cards.is_empty());
}

#[tokio::test]
async fn blank_topic_never_connects() {
    // No server is listening; a request would fall back rather than error.
    let addr: SocketAddr = "127.0.0.1:9".parse().unwrap();
    let result = generator_for(addr).generate("   ").await;
    assert!(matches!(result, Err(GenerateError::EmptyTopic)));
}
