use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use super::decoder::LineDecoder;
use super::event::{StreamEvent, StreamGuard};
use super::frame::{parse_line, FrameOutcome};
use crate::config::ApiSettings;
use crate::errors::{ChatError, ChatResult};
use crate::models::question::StaticQuestion;
use crate::models::request::ChatRequest;
use crate::verification::base::{CredentialProvider, CREDENTIAL_HEADER};

/// Turn a chunked response body into stream events.
///
/// The returned stream ends with exactly one terminal event: `Complete` on the
/// sentinel or on end of input, `Error` on an error frame or a read failure.
/// Malformed frames are logged and skipped. Nothing after the first terminal
/// frame is read.
pub fn frame_events<S, B, E>(bytes: S) -> impl Stream<Item = StreamEvent>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    async_stream::stream! {
        let mut bytes = Box::pin(bytes);
        let mut decoder = LineDecoder::new();

        while let Some(chunk) = bytes.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield StreamEvent::from(ChatError::Transport(e.to_string()));
                    return;
                }
            };

            for line in decoder.push(chunk.as_ref()) {
                match parse_line(&line) {
                    FrameOutcome::Done => {
                        debug!("Stream finished with sentinel");
                        yield StreamEvent::Complete;
                        return;
                    }
                    FrameOutcome::Error(message) => {
                        debug!("Stream failed with error frame: {}", message);
                        yield StreamEvent::from(ChatError::StreamProtocol(message));
                        return;
                    }
                    FrameOutcome::Delta(text) => {
                        yield StreamEvent::Delta(text);
                    }
                    FrameOutcome::Malformed(reason) => {
                        let err = ChatError::FrameDecode(reason);
                        warn!("{} (payload: {:?})", err, line);
                    }
                    FrameOutcome::Ignored | FrameOutcome::Empty => {}
                }
            }
        }

        let tail = decoder.finish();
        if !tail.is_empty() {
            debug!("Discarding {} bytes of unterminated input", tail.len());
        }
        yield StreamEvent::Complete;
    }
}

#[derive(Deserialize)]
struct QuestionEnvelope {
    question: Option<StaticQuestion>,
}

/// HTTP client for the Lani Bot backend
pub struct ChatClient {
    client: Client,
    api: ApiSettings,
    credentials: Arc<dyn CredentialProvider>,
}

impl ChatClient {
    pub fn new(api: ApiSettings, credentials: Arc<dyn CredentialProvider>) -> ChatResult<Self> {
        // No overall request timeout: a streamed reply may legitimately take minutes
        let client = Client::builder()
            .connect_timeout(api.connect_timeout())
            .build()?;

        Ok(Self {
            client,
            api,
            credentials,
        })
    }

    /// Limit the caller should put on consuming one reply, if any
    pub fn stream_timeout(&self) -> Option<Duration> {
        self.api.stream_timeout()
    }

    /// Send `request` and stream the reply.
    ///
    /// Each call acquires its own credential and owns its own decode state. The
    /// stream yields zero or more `Delta`s followed by exactly one terminal event.
    /// Dropping it mid-read abandons the request without producing further events.
    pub fn stream_chat(&self, request: ChatRequest) -> BoxStream<'_, StreamEvent> {
        let stream = async_stream::stream! {
            let mut guard = StreamGuard::new();
            guard.awaiting_credential();

            let credential = match self.credentials.acquire_credential().await {
                Ok(credential) => credential,
                Err(e) => {
                    debug!("Credential unavailable: {}", e);
                    yield StreamEvent::from(e);
                    return;
                }
            };

            let response = match self.open(request.with_credential(credential.clone()), &credential).await {
                Ok(response) => response,
                Err(e) => {
                    yield StreamEvent::from(e);
                    return;
                }
            };

            guard.streaming();
            let mut events = Box::pin(frame_events(response.bytes_stream()));
            while let Some(event) = events.next().await {
                match guard.admit(event) {
                    Ok(event) => {
                        let terminal = event.is_terminal();
                        yield event;
                        if terminal {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
            debug!("Chat stream ended in state {:?}", guard.state());
        };
        Box::pin(stream)
    }

    /// Callback form of [`ChatClient::stream_chat`].
    ///
    /// `on_delta` runs once per delta in stream order, then exactly one of
    /// `on_complete` or `on_error` runs. Failures never escape as panics or errors.
    pub async fn stream_chat_with_callbacks<D, C, E>(
        &self,
        request: ChatRequest,
        mut on_delta: D,
        on_complete: C,
        on_error: E,
    ) where
        D: FnMut(&str),
        C: FnOnce(),
        E: FnOnce(String),
    {
        let mut events = self.stream_chat(request);
        while let Some(event) = events.next().await {
            match event {
                StreamEvent::Delta(text) => on_delta(&text),
                StreamEvent::Complete => {
                    on_complete();
                    return;
                }
                StreamEvent::Error(message) => {
                    on_error(message);
                    return;
                }
            }
        }
    }

    /// Fetch one random question from the fixed bank for the given topics.
    /// Any failure is logged and reported as `None`.
    pub async fn static_question(&self, llab_numbers: &[u32]) -> Option<StaticQuestion> {
        match self.fetch_static_question(llab_numbers).await {
            Ok(question) => question,
            Err(e) => {
                warn!("Static question error: {}", e);
                None
            }
        }
    }

    /// Whether the backend reports itself healthy
    pub async fn check_health(&self) -> bool {
        let response = match self.client.get(self.api.endpoint("health")).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Health check failed: {}", e);
                return false;
            }
        };

        match response.json::<Value>().await {
            Ok(body) => body.get("ok") == Some(&Value::Bool(true)),
            Err(_) => false,
        }
    }

    async fn open(&self, request: ChatRequest, credential: &str) -> ChatResult<Response> {
        let url = self.api.endpoint("chat");
        debug!(
            "Opening chat stream (LLABs: {:?}, mode: {}, turns: {})",
            request.llab_numbers,
            request.quiz_mode,
            request.messages.len()
        );

        let response = self
            .client
            .post(&url)
            .header(CREDENTIAL_HEADER, credential)
            .json(&request)
            .send()
            .await?;

        match response.status() {
            status if !status.is_success() => {
                let message = error_from_body(response).await;
                error!("Chat request failed with {}: {}", status, message);
                Err(ChatError::Transport(message))
            }
            StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT => {
                Err(ChatError::Transport("No response body".to_string()))
            }
            _ => Ok(response),
        }
    }

    async fn fetch_static_question(
        &self,
        llab_numbers: &[u32],
    ) -> ChatResult<Option<StaticQuestion>> {
        let response = self
            .client
            .post(self.api.endpoint("static-question"))
            .json(&json!({ "llab_numbers": llab_numbers }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Transport(format!("HTTP {}", status.as_u16())));
        }

        let envelope: QuestionEnvelope = response.json().await?;
        Ok(envelope.question)
    }
}

/// Best-effort message for a failed request: the body's `error` field, else the status code
async fn error_from_body(response: Response) -> String {
    let status = response.status();
    match response.json::<Value>().await {
        Ok(body) => match body.get("error") {
            Some(Value::String(message)) if !message.is_empty() => message.clone(),
            _ => format!("HTTP {}", status.as_u16()),
        },
        Err(_) => format!("HTTP {}", status.as_u16()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::request::{QuizMode, SessionParams};
    use crate::models::turn::Turn;
    use crate::verification::mock::MockCredential;
    use std::convert::Infallible;
    use std::sync::atomic::Ordering;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chunks(parts: &[&[u8]]) -> impl Stream<Item = Result<Vec<u8>, Infallible>> {
        futures::stream::iter(
            parts
                .iter()
                .map(|part| Ok(part.to_vec()))
                .collect::<Vec<_>>(),
        )
    }

    fn delta_frame(text: &str) -> String {
        format!(
            "data: {}\n\n",
            json!({"choices": [{"delta": {"content": text}}]})
        )
    }

    async fn collect(parts: &[&[u8]]) -> Vec<StreamEvent> {
        frame_events(chunks(parts)).collect().await
    }

    fn request() -> ChatRequest {
        let params = SessionParams::new([1, 2], QuizMode::Mixed).unwrap();
        ChatRequest::new(vec![Turn::user("hello")], &params)
    }

    fn client_for(server: &MockServer, credentials: MockCredential) -> ChatClient {
        let api = ApiSettings {
            base_url: server.uri(),
            ..ApiSettings::default()
        };
        ChatClient::new(api, Arc::new(credentials)).unwrap()
    }

    #[tokio::test]
    async fn test_deltas_then_sentinel() {
        let body = format!(
            "{}{}{}data: [DONE]\n\n",
            delta_frame("Ready"),
            delta_frame(", Cadet"),
            delta_frame("?")
        );
        let events = collect(&[body.as_bytes()]).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("Ready".into()),
                StreamEvent::Delta(", Cadet".into()),
                StreamEvent::Delta("?".into()),
                StreamEvent::Complete,
            ]
        );
    }

    #[tokio::test]
    async fn test_frame_split_across_chunks_is_parsed_once() {
        let frame = delta_frame("split");
        let (first, second) = frame.as_bytes().split_at(17);
        let events = collect(&[first, second, b"data: [DONE]\n"]).await;
        assert_eq!(
            events,
            vec![StreamEvent::Delta("split".into()), StreamEvent::Complete]
        );
    }

    #[tokio::test]
    async fn test_multibyte_character_split_across_chunks() {
        let frame = delta_frame("Welcome 🪽");
        let bytes = frame.as_bytes();
        // cut inside the four-byte character
        let cut = frame.find('🪽').unwrap() + 2;
        let events = collect(&[&bytes[..cut], &bytes[cut..]]).await;
        assert_eq!(
            events,
            vec![StreamEvent::Delta("Welcome 🪽".into()), StreamEvent::Complete]
        );
    }

    #[tokio::test]
    async fn test_error_frame_stops_the_stream() {
        let body = format!(
            "{}{}data: {{\"error\":\"limit exceeded\"}}\n\n{}data: [DONE]\n\n",
            delta_frame("one"),
            delta_frame("two"),
            delta_frame("three")
        );
        let events = collect(&[body.as_bytes()]).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("one".into()),
                StreamEvent::Delta("two".into()),
                StreamEvent::from(ChatError::StreamProtocol("limit exceeded".into())),
            ]
        );
        assert_eq!(events[2], StreamEvent::Error("limit exceeded".into()));
    }

    #[tokio::test]
    async fn test_sentinel_is_authoritative() {
        let body = format!("{}data: [DONE]\n\n{}", delta_frame("a"), delta_frame("b"));
        let events = collect(&[body.as_bytes()]).await;
        assert_eq!(
            events,
            vec![StreamEvent::Delta("a".into()), StreamEvent::Complete]
        );
    }

    #[tokio::test]
    async fn test_malformed_frame_is_skipped() {
        let body = format!(
            "{}data: {{not json}}\n\n{}",
            delta_frame("first"),
            delta_frame("second")
        );
        let events = collect(&[body.as_bytes()]).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("first".into()),
                StreamEvent::Delta("second".into()),
                StreamEvent::Complete,
            ]
        );
    }

    #[tokio::test]
    async fn test_end_of_input_completes() {
        let events = collect(&[b": keep-alive\n\n", b"data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n"]).await;
        assert_eq!(events, vec![StreamEvent::Complete]);
    }

    #[tokio::test]
    async fn test_unterminated_tail_is_not_parsed() {
        let partial = delta_frame("never");
        let partial = partial.trim_end();
        let events = collect(&[partial.as_bytes()]).await;
        assert_eq!(events, vec![StreamEvent::Complete]);
    }

    #[tokio::test]
    async fn test_read_failure_is_reported() {
        let parts: Vec<Result<Vec<u8>, String>> = vec![
            Ok(delta_frame("partial").into_bytes()),
            Err("connection reset".to_string()),
            Ok(delta_frame("lost").into_bytes()),
        ];
        let events: Vec<StreamEvent> = frame_events(futures::stream::iter(parts)).collect().await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("partial".into()),
                StreamEvent::Error("connection reset".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_credential_failure_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server, MockCredential::failing("Turnstile not initialized"));
        let events: Vec<StreamEvent> = client.stream_chat(request()).collect().await;
        assert_eq!(
            events,
            vec![StreamEvent::Error("Turnstile not initialized".into())]
        );
    }

    #[tokio::test]
    async fn test_credential_sent_in_body_and_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(header("X-Turnstile-Token", "tok-123"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(format!("{}data: [DONE]\n\n", delta_frame("hi"))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let credentials = MockCredential::token("tok-123");
        let calls = credentials.calls();
        let client = client_for(&server, credentials);
        let events: Vec<StreamEvent> = client.stream_chat(request()).collect().await;

        assert_eq!(
            events,
            vec![StreamEvent::Delta("hi".into()), StreamEvent::Complete]
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let received = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&received[0].body).unwrap();
        assert_eq!(body["turnstile_token"], json!("tok-123"));
        assert_eq!(body["llab_numbers"], json!([1, 2]));
        assert_eq!(body["quiz_mode"], json!("mixed"));
    }

    #[tokio::test]
    async fn test_error_status_uses_body_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(
                ResponseTemplate::new(429).set_body_json(json!({"error": "Rate limit exceeded"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, MockCredential::token("t"));
        let events: Vec<StreamEvent> = client.stream_chat(request()).collect().await;
        assert_eq!(
            events,
            vec![StreamEvent::Error("Rate limit exceeded".into())]
        );
    }

    #[tokio::test]
    async fn test_error_status_without_json_uses_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server, MockCredential::token("t"));
        let events: Vec<StreamEvent> = client.stream_chat(request()).collect().await;
        assert_eq!(events, vec![StreamEvent::Error("HTTP 502".into())]);
    }

    #[tokio::test]
    async fn test_no_content_has_no_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = client_for(&server, MockCredential::token("t"));
        let events: Vec<StreamEvent> = client.stream_chat(request()).collect().await;
        assert_eq!(events, vec![StreamEvent::Error("No response body".into())]);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_reported() {
        let api = ApiSettings {
            base_url: "http://127.0.0.1:9".to_string(),
            ..ApiSettings::default()
        };
        let client = ChatClient::new(api, Arc::new(MockCredential::token("t"))).unwrap();
        let events: Vec<StreamEvent> = client.stream_chat(request()).collect().await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], StreamEvent::Error(_)));
    }

    #[tokio::test]
    async fn test_callbacks_fire_in_order() {
        let server = MockServer::start().await;
        let body = format!(
            "{}{}data: {{\"error\":\"limit exceeded\"}}\n\n{}",
            delta_frame("a"),
            delta_frame("b"),
            delta_frame("c")
        );
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let client = client_for(&server, MockCredential::token("t"));
        let mut deltas = Vec::new();
        let mut completed = 0;
        let mut errors = Vec::new();
        client
            .stream_chat_with_callbacks(
                request(),
                |text| deltas.push(text.to_string()),
                || completed += 1,
                |message| errors.push(message),
            )
            .await;

        assert_eq!(deltas, vec!["a", "b"]);
        assert_eq!(completed, 0);
        assert_eq!(errors, vec!["limit exceeded".to_string()]);
    }

    #[tokio::test]
    async fn test_static_question() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/static-question"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "question": {
                    "id": "rank-1",
                    "type": "rank",
                    "questionType": "short_answer",
                    "question": "What rank wears two silver bars?",
                    "correctAnswer": "Captain"
                }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, MockCredential::token("t"));
        let question = client.static_question(&[3]).await.unwrap();
        assert_eq!(question.correct_answer, "Captain");

        let received = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&received[0].body).unwrap();
        assert_eq!(body, json!({"llab_numbers": [3]}));
    }

    #[tokio::test]
    async fn test_static_question_failures_are_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/static-question"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "At least one LLAB must be selected"})))
            .mount(&server)
            .await;

        let client = client_for(&server, MockCredential::token("t"));
        assert!(client.static_question(&[]).await.is_none());
    }

    #[tokio::test]
    async fn test_check_health() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ok": true, "service": "lani-bot-api"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, MockCredential::token("t"));
        assert!(client.check_health().await);
    }

    #[tokio::test]
    async fn test_check_health_requires_ok_true() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": "yes"})))
            .mount(&server)
            .await;

        let client = client_for(&server, MockCredential::token("t"));
        assert!(!client.check_health().await);
    }
}
