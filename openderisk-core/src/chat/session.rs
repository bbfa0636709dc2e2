//! Asynchronous chat submission and polling
//!
//! A chat job is submitted once, then its status is polled until the server
//! marks it final. Right after submission the server may briefly report the
//! session as unknown (code `E0103`); those answers are retried up to a
//! budget. The whole wait is bounded by a wall-clock timeout measured from
//! the end of the initial delay.

use crate::error::{ClientError, SESSION_NOT_FOUND_CODE};
use crate::http::{ApiRequest, Transport};
use crate::protocol::{ChatRequest, ChatStatus, Envelope, SubmitAck};
use futures::stream::{self, Stream};
use serde_json::Value;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub const SUBMIT_PATH: &str = "/api/v1/chat/completions";
pub const QUERY_PATH: &str = "/api/v1/chat/query";

const QUERY_FAILED: &str = "Failed to query chat status";

/// Lazy stream of answer chunks; dropping it cancels the wait
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String, ClientError>> + Send>>;

/// Timing and retry knobs for one chat
#[derive(Debug, Clone, PartialEq)]
pub struct ChatOptions {
    /// Overall polling budget
    pub timeout: Duration,

    /// How many `E0103` answers are tolerated
    pub max_transient_retries: u32,

    /// Wait between submission and the first poll
    pub initial_delay: Duration,

    pub poll_interval: Duration,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            max_transient_retries: 10,
            initial_delay: Duration::from_secs(2),
            poll_interval: Duration::from_secs(1),
        }
    }
}

impl ChatOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_transient_retries(mut self, retries: u32) -> Self {
        self.max_transient_retries = retries;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Outcome of a single status poll
#[derive(Debug, Clone, PartialEq)]
pub enum PollResult {
    /// Still running
    Pending,

    /// Done; carries the answer when one was produced
    Final(Option<String>),

    /// The server does not know the session yet
    TransientNotFound { response: Option<Value> },
}

impl PollResult {
    /// Classify the transport outcome of a status poll
    ///
    /// `E0103` is recognized both in a failure envelope and in the body of a
    /// non-2xx response. Any other status or an undecodable payload becomes
    /// an `Api` error; network errors pass through unchanged.
    pub fn classify(outcome: Result<Envelope, ClientError>) -> Result<Self, ClientError> {
        match outcome {
            Ok(Envelope::Success { data }) => {
                if data.is_null() {
                    return Ok(PollResult::Pending);
                }
                let status: ChatStatus = serde_json::from_value(data)
                    .map_err(|e| query_failed(ClientError::from(e)))?;
                if status.is_final {
                    Ok(PollResult::Final(status.answer().map(str::to_owned)))
                } else {
                    Ok(PollResult::Pending)
                }
            }
            Ok(envelope) if envelope.code() == Some(SESSION_NOT_FOUND_CODE) => {
                Ok(PollResult::TransientNotFound {
                    response: Some(envelope.to_value()),
                })
            }
            Ok(envelope) => Err(ClientError::api(QUERY_FAILED, envelope.to_value())),
            Err(e) if e.is_session_not_found() => Ok(PollResult::TransientNotFound {
                response: e.response().cloned(),
            }),
            Err(e @ (ClientError::Status { .. } | ClientError::Decode { .. })) => {
                Err(query_failed(e))
            }
            Err(e) => Err(e),
        }
    }
}

fn query_failed(cause: ClientError) -> ClientError {
    ClientError::Api {
        message: QUERY_FAILED.to_string(),
        code: cause.server_code().map(str::to_owned),
        response: cause.response().cloned(),
    }
}

/// State of one submitted chat job
///
/// Owned by exactly one stream; never shared.
#[derive(Debug)]
pub struct ChatSession {
    conv_id: String,
    started: Instant,
    transient_retries: u32,
    polls: u32,
    options: ChatOptions,
}

impl ChatSession {
    /// Submit a chat job and return a lazy stream of its answer
    ///
    /// Nothing is sent until the stream is first polled.
    pub fn submit_and_wait(
        transport: Arc<dyn Transport>,
        request: ChatRequest,
        options: ChatOptions,
    ) -> ChunkStream {
        let stage = Some((transport, request, options));

        Box::pin(stream::unfold(stage, |stage| async move {
            let (transport, request, options) = stage?;
            let result = async {
                let mut session = ChatSession::start(transport.as_ref(), &request, options).await?;
                session.wait_for_answer(transport.as_ref()).await
            }
            .await;

            match result {
                Ok(Some(answer)) => Some((Ok(answer), None)),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        }))
    }

    /// Submit the job, then sleep the initial delay
    pub async fn start(
        transport: &dyn Transport,
        request: &ChatRequest,
        options: ChatOptions,
    ) -> Result<Self, ClientError> {
        request.validate()?;

        let submit = ApiRequest::post(SUBMIT_PATH).with_json(request)?;
        let envelope = transport.request(submit).await?;

        let data = match envelope {
            Envelope::Success { data } => data,
            failure => {
                return Err(ClientError::api(
                    "Failed to submit chat",
                    failure.to_value(),
                ))
            }
        };

        let conv_id = SubmitAck::conv_id_from(&data).ok_or_else(|| {
            ClientError::api(
                "No conv_id in response",
                Envelope::Success { data: data.clone() }.to_value(),
            )
        })?;
        info!("Chat submitted, conv_id: {}", conv_id);

        tokio::time::sleep(options.initial_delay).await;

        Ok(Self {
            conv_id,
            started: Instant::now(),
            transient_retries: 0,
            polls: 0,
            options,
        })
    }

    pub fn conv_id(&self) -> &str {
        &self.conv_id
    }

    /// Status polls issued so far
    pub fn polls(&self) -> u32 {
        self.polls
    }

    pub fn transient_retries(&self) -> u32 {
        self.transient_retries
    }

    /// Issue one status poll
    pub async fn poll(&mut self, transport: &dyn Transport) -> Result<PollResult, ClientError> {
        self.polls += 1;
        // Polls are already repeated on their own schedule
        let request = ApiRequest::get(QUERY_PATH)
            .with_query("conv_id", &self.conv_id)
            .without_retry();
        PollResult::classify(transport.request(request).await)
    }

    /// Poll until final, returning the answer if one was produced
    pub async fn wait_for_answer(
        &mut self,
        transport: &dyn Transport,
    ) -> Result<Option<String>, ClientError> {
        while self.started.elapsed() < self.options.timeout {
            match self.poll(transport).await? {
                PollResult::Final(answer) => {
                    info!(
                        "Chat {} finished after {} polls",
                        self.conv_id, self.polls
                    );
                    return Ok(answer);
                }
                PollResult::Pending => {
                    debug!("Chat {} still running", self.conv_id);
                }
                PollResult::TransientNotFound { response } => {
                    if self.transient_retries >= self.options.max_transient_retries {
                        return Err(ClientError::Api {
                            message: "Failed to query chat status".to_string(),
                            code: Some(SESSION_NOT_FOUND_CODE.to_string()),
                            response,
                        });
                    }
                    self.transient_retries += 1;
                    warn!(
                        "Session {} not found yet, retry {}/{}",
                        self.conv_id, self.transient_retries, self.options.max_transient_retries
                    );
                }
            }
            tokio::time::sleep(self.options.poll_interval).await;
        }

        Err(ClientError::Timeout {
            timeout: self.options.timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use async_trait::async_trait;
    use futures::StreamExt;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport replaying a fixed submit answer and a queue of poll answers
    struct ScriptedTransport {
        submit: Mutex<Option<Result<Envelope, ClientError>>>,
        polls: Mutex<VecDeque<Result<Envelope, ClientError>>>,
        calls: Mutex<Vec<(HttpMethod, String, Instant)>>,
        origin: Instant,
    }

    impl ScriptedTransport {
        fn new(submit: Result<Envelope, ClientError>) -> Self {
            Self {
                submit: Mutex::new(Some(submit)),
                polls: Mutex::new(VecDeque::new()),
                calls: Mutex::new(Vec::new()),
                origin: Instant::now(),
            }
        }

        fn accepting(conv_id: &str) -> Self {
            Self::new(Ok(Envelope::success(json!({ "conv_id": conv_id }))))
        }

        fn then(self, poll: Result<Envelope, ClientError>) -> Self {
            self.polls.lock().unwrap().push_back(poll);
            self
        }

        fn then_times(self, poll: Envelope, times: usize) -> Self {
            (0..times).fold(self, |t, _| t.then(Ok(poll.clone())))
        }

        fn poll_count(&self) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(method, _, _)| *method == HttpMethod::Get)
                .count()
        }

        fn first_poll_offset(&self) -> Option<Duration> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .find(|(method, _, _)| *method == HttpMethod::Get)
                .map(|(_, _, at)| *at - self.origin)
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn request(&self, request: ApiRequest) -> Result<Envelope, ClientError> {
            self.calls
                .lock()
                .unwrap()
                .push((request.method, request.path.clone(), Instant::now()));

            match request.method {
                HttpMethod::Post => self
                    .submit
                    .lock()
                    .unwrap()
                    .take()
                    .unwrap_or_else(|| panic!("unexpected second submit")),
                _ => {
                    assert_eq!(request.path, QUERY_PATH);
                    assert_eq!(request.query_param("conv_id"), Some("c1"));
                    assert!(!request.retry_connect);
                    // An exhausted script means the job never finishes
                    self.polls
                        .lock()
                        .unwrap()
                        .pop_front()
                        .unwrap_or_else(|| Ok(running()))
                }
            }
        }
    }

    fn running() -> Envelope {
        Envelope::success(json!({ "is_final": false }))
    }

    fn finished(answer: &str) -> Envelope {
        Envelope::success(json!({ "is_final": true, "user_answer": answer }))
    }

    fn not_found() -> Envelope {
        Envelope::failure(Some("E0103"), Some("session not found"))
    }

    async fn run(
        transport: Arc<ScriptedTransport>,
        options: ChatOptions,
    ) -> Vec<Result<String, ClientError>> {
        ChatSession::submit_and_wait(transport, ChatRequest::text("Hello"), options)
            .collect()
            .await
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_poll_before_initial_delay() {
        let transport = Arc::new(ScriptedTransport::accepting("c1").then(Ok(finished("X"))));
        let options = ChatOptions::default().with_initial_delay(Duration::from_secs(2));

        let chunks = run(transport.clone(), options).await;

        assert_eq!(chunks.len(), 1);
        assert!(transport.first_poll_offset().unwrap() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_is_lazy() {
        let transport = Arc::new(ScriptedTransport::accepting("c1"));
        let stream = ChatSession::submit_and_wait(
            transport.clone(),
            ChatRequest::text("Hello"),
            ChatOptions::default(),
        );
        assert!(transport.calls.lock().unwrap().is_empty());
        drop(stream);
        assert!(transport.calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_not_found_within_budget() {
        for k in [0usize, 1, 3, 10] {
            let transport = Arc::new(
                ScriptedTransport::accepting("c1")
                    .then_times(not_found(), k)
                    .then(Ok(finished("X"))),
            );

            let chunks = run(transport.clone(), ChatOptions::default()).await;

            assert_eq!(chunks.len(), 1, "k = {}", k);
            assert_eq!(chunks[0].as_ref().unwrap(), "X");
            assert_eq!(transport.poll_count(), k + 1, "k = {}", k);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_not_found_beyond_budget() {
        let transport = Arc::new(ScriptedTransport::accepting("c1").then_times(not_found(), 4));
        let options = ChatOptions::default().with_max_transient_retries(3);

        let chunks = run(transport.clone(), options).await;

        assert_eq!(chunks.len(), 1);
        let err = chunks.into_iter().next().unwrap().unwrap_err();
        assert!(!err.is_timeout());
        assert!(matches!(err, ClientError::Api { ref message, .. } if message == "Failed to query chat status"));
        assert_eq!(err.server_code(), Some("E0103"));
        assert_eq!(transport.poll_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_in_error_status_is_retried() {
        let transport = Arc::new(
            ScriptedTransport::accepting("c1")
                .then(Err(ClientError::Status {
                    status: 404,
                    body: json!({ "success": false, "code": "E0103" }),
                }))
                .then(Ok(finished("X"))),
        );

        let chunks = run(transport.clone(), ChatOptions::default()).await;

        assert_eq!(chunks[0].as_ref().unwrap(), "X");
        assert_eq!(transport.poll_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_when_never_final() {
        let transport = Arc::new(ScriptedTransport::accepting("c1"));
        let options = ChatOptions::default().with_timeout(Duration::from_secs(5));

        let chunks = run(transport.clone(), options).await;

        assert_eq!(chunks.len(), 1);
        let err = chunks.into_iter().next().unwrap().unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(
            err.suggestion().as_deref(),
            Some("The chat did not complete within 5 seconds.")
        );
        // one poll per interval inside the budget
        assert_eq!(transport.poll_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_final_without_answer_yields_nothing() {
        let transport = Arc::new(
            ScriptedTransport::accepting("c1")
                .then(Ok(running()))
                .then(Ok(Envelope::success(json!({ "is_final": true, "user_answer": "" })))),
        );

        let chunks = run(transport.clone(), ChatOptions::default()).await;

        assert!(chunks.is_empty());
        assert_eq!(transport.poll_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_failure() {
        let transport = Arc::new(ScriptedTransport::new(Ok(Envelope::failure(
            Some("E0001"),
            Some("bad model"),
        ))));

        let chunks = run(transport.clone(), ChatOptions::default()).await;

        let err = chunks.into_iter().next().unwrap().unwrap_err();
        assert_eq!(err.to_string(), "Failed to submit chat");
        assert_eq!(err.server_code(), Some("E0001"));
        assert_eq!(err.details().as_deref(), Some("bad model"));
        assert_eq!(transport.poll_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_conv_id() {
        let transport = Arc::new(ScriptedTransport::new(Ok(Envelope::success(
            json!({ "conv_id": "" }),
        ))));

        let chunks = run(transport.clone(), ChatOptions::default()).await;

        let err = chunks.into_iter().next().unwrap().unwrap_err();
        assert_eq!(err.to_string(), "No conv_id in response");
        assert!(err.response().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_poll_failure_is_not_retried() {
        let transport = Arc::new(
            ScriptedTransport::accepting("c1")
                .then(Ok(Envelope::failure(Some("E0500"), Some("boom")))),
        );

        let chunks = run(transport.clone(), ChatOptions::default()).await;

        let err = chunks.into_iter().next().unwrap().unwrap_err();
        assert_eq!(err.to_string(), "Failed to query chat status");
        assert_eq!(err.server_code(), Some("E0500"));
        assert_eq!(transport.poll_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_status_during_poll_is_query_failure() {
        let body = json!({ "success": false, "code": "E0500", "err_msg": "internal" });
        let transport = Arc::new(ScriptedTransport::accepting("c1").then(Err(
            ClientError::Status {
                status: 500,
                body: body.clone(),
            },
        )));

        let chunks = run(transport.clone(), ChatOptions::default()).await;

        let err = chunks.into_iter().next().unwrap().unwrap_err();
        assert!(matches!(err, ClientError::Api { .. }));
        assert_eq!(err.to_string(), "Failed to query chat status");
        assert_eq!(err.server_code(), Some("E0500"));
        assert_eq!(err.response(), Some(&body));
        assert_eq!(transport.poll_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_undecodable_status_is_query_failure() {
        let transport = Arc::new(
            ScriptedTransport::accepting("c1")
                .then(Ok(Envelope::success(json!({ "is_final": "maybe" })))),
        );

        let chunks = run(transport, ChatOptions::default()).await;

        let err = chunks.into_iter().next().unwrap().unwrap_err();
        assert_eq!(err.to_string(), "Failed to query chat status");
        assert!(!err.is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_error_during_poll_propagates() {
        let transport = Arc::new(ScriptedTransport::accepting("c1").then(Err(
            ClientError::Network {
                message: "connection reset".to_string(),
            },
        )));

        let chunks = run(transport.clone(), ChatOptions::default()).await;

        let err = chunks.into_iter().next().unwrap().unwrap_err();
        assert!(matches!(err, ClientError::Network { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_input_is_rejected_before_sending() {
        let transport = Arc::new(ScriptedTransport::accepting("c1"));
        let chunks: Vec<_> = ChatSession::submit_and_wait(
            transport.clone(),
            ChatRequest::text("  "),
            ChatOptions::default(),
        )
        .collect()
        .await;

        assert!(matches!(chunks[0], Err(ClientError::InvalidRequest { .. })));
        assert!(transport.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_classify_null_data_is_pending() {
        let result = PollResult::classify(Ok(Envelope::success(Value::Null))).unwrap();
        assert_eq!(result, PollResult::Pending);
    }
}
