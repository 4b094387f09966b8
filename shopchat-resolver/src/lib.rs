#![deny(missing_docs)]
//! Turn resolver: model calls and tool calls, drained until the turn settles.
//!
//! One user turn becomes a sequence of model round trips. Each response is
//! dispatched block by block: text is emitted to the session, tool calls are
//! run against the tool host and fed back to the model.
//!
//! Continuation follows the response's block count, not its stop reason:
//!
//! - a tool call always triggers exactly one more model call, and the rest
//!   of that response is dropped;
//! - a text block that is the *only* block of its response triggers one
//!   more model call;
//! - a text block in a multi-block response does not, and dispatch moves on
//!   to the next block.
//!
//! The turn ends when a response runs out of blocks without triggering
//! another call.

mod config;

pub use config::{DEFAULT_SYSTEM_PROMPT, ResolverConfig};

use shopchat_turn::{
    BotResponse, Metadata, ModelRequest, Provider, ProviderError, ResponseBlock, ToolDescriptor,
    ToolHost, ToolHostError, Transcript, TranscriptEntry, Transport, TransportError,
};
use thiserror::Error;

/// Errors that abort a turn.
///
/// Nothing is retried and nothing is rolled back. The caller is expected to
/// send the session a single generic failure notification.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TurnError {
    /// The transcript had no entries to respond to.
    #[error("transcript is empty")]
    EmptyTranscript,

    /// The model call failed.
    #[error("model call failed: {0}")]
    Provider(#[from] ProviderError),

    /// The tool host failed (not the tool: tool failures are conversational).
    #[error("tool host failed: {0}")]
    ToolHost(#[from] ToolHostError),

    /// Emitting to the session failed.
    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),

    /// The configured round-trip ceiling was reached.
    #[error("round-trip limit reached ({0})")]
    RoundTripLimit(u32),
}

/// Summary of a settled turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The transcript as it stood when the turn settled.
    pub transcript: Transcript,
    /// Number of model calls made.
    pub model_calls: u32,
    /// Number of tool invocations made.
    pub tool_calls: u32,
    /// Number of replies emitted to the session.
    pub replies: u32,
}

/// Where the turn currently stands.
enum TurnState {
    /// Next step is a model call.
    AwaitingModel,
    /// Walking the blocks of the latest response.
    DispatchingBlock {
        blocks: std::vec::IntoIter<ResponseBlock>,
        total: usize,
        metadata: Option<Metadata>,
    },
    /// Next step is a tool invocation.
    AwaitingTool {
        name: String,
        input: serde_json::Value,
    },
    Done,
    Failed(TurnError),
}

/// Drives single turns against a [`Provider`].
///
/// Generic over `P: Provider` (not object-safe). Holds no per-turn state, so
/// one resolver can serve any number of concurrent sessions.
pub struct TurnResolver<P: Provider> {
    provider: P,
    config: ResolverConfig,
}

impl<P: Provider> TurnResolver<P> {
    /// Create a resolver around a provider.
    pub fn new(provider: P, config: ResolverConfig) -> Self {
        Self { provider, config }
    }

    /// The resolver's configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// The underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// List the host's tools, then resolve the turn with them.
    pub async fn run_turn<H: ToolHost, T: Transport>(
        &self,
        transcript: Transcript,
        host: &H,
        transport: &T,
    ) -> Result<TurnOutcome, TurnError> {
        if transcript.is_empty() {
            return Err(TurnError::EmptyTranscript);
        }
        let tools = host.list_tools().await?;
        tracing::debug!(tools = tools.len(), "tool descriptors fetched");
        self.resolve(transcript, &tools, host, transport).await
    }

    /// Resolve one turn.
    ///
    /// `transcript` must end with the newly submitted user turn. Every model
    /// call in the turn sees the same `tools`.
    pub async fn resolve<H: ToolHost, T: Transport>(
        &self,
        mut transcript: Transcript,
        tools: &[ToolDescriptor],
        host: &H,
        transport: &T,
    ) -> Result<TurnOutcome, TurnError> {
        if transcript.is_empty() {
            return Err(TurnError::EmptyTranscript);
        }

        let mut model_calls: u32 = 0;
        let mut tool_calls: u32 = 0;
        let mut replies: u32 = 0;
        let mut state = TurnState::AwaitingModel;

        loop {
            state = match state {
                TurnState::AwaitingModel => {
                    match self.config.max_round_trips {
                        Some(limit) if model_calls >= limit => {
                            TurnState::Failed(TurnError::RoundTripLimit(limit))
                        }
                        _ => {
                            // Metadata is detached before every call so the
                            // model never sees it.
                            let metadata = transcript
                                .last_mut()
                                .and_then(TranscriptEntry::take_leading_metadata);
                            if metadata.is_some() {
                                tracing::debug!("detached metadata from last transcript entry");
                            }

                            model_calls += 1;
                            let request = self.build_request(&transcript, tools);
                            match self.provider.complete(request).await {
                                Ok(response) => {
                                    tracing::debug!(
                                        call = model_calls,
                                        blocks = response.content.len(),
                                        stop_reason = ?response.stop_reason,
                                        input_tokens = response.usage.input_tokens,
                                        output_tokens = response.usage.output_tokens,
                                        "model responded"
                                    );
                                    let total = response.content.len();
                                    TurnState::DispatchingBlock {
                                        blocks: response.content.into_iter(),
                                        total,
                                        metadata,
                                    }
                                }
                                Err(e) => TurnState::Failed(e.into()),
                            }
                        }
                    }
                }

                TurnState::DispatchingBlock {
                    mut blocks,
                    total,
                    mut metadata,
                } => match blocks.next() {
                    None => TurnState::Done,
                    Some(ResponseBlock::Text { text }) => {
                        let event = BotResponse::reply(text.clone(), metadata.take());
                        match transport.emit(event).await {
                            Ok(()) => {
                                replies += 1;
                                transcript.push(TranscriptEntry::assistant(text));
                                if total > 1 {
                                    TurnState::DispatchingBlock {
                                        blocks,
                                        total,
                                        metadata,
                                    }
                                } else {
                                    TurnState::AwaitingModel
                                }
                            }
                            Err(e) => TurnState::Failed(e.into()),
                        }
                    }
                    Some(ResponseBlock::ToolUse { name, input, .. }) => {
                        TurnState::AwaitingTool { name, input }
                    }
                    Some(ResponseBlock::Other { kind }) => {
                        tracing::trace!(%kind, "skipping response block");
                        TurnState::DispatchingBlock {
                            blocks,
                            total,
                            metadata,
                        }
                    }
                },

                TurnState::AwaitingTool { name, input } => {
                    tracing::debug!(tool = %name, "invoking tool");
                    match host.call_tool(&name, input).await {
                        Ok(output) => {
                            tool_calls += 1;
                            transcript.push(TranscriptEntry::user_blocks(output.content));
                            TurnState::AwaitingModel
                        }
                        Err(e) => TurnState::Failed(e.into()),
                    }
                }

                TurnState::Done => {
                    tracing::info!(model_calls, tool_calls, replies, "turn settled");
                    return Ok(TurnOutcome {
                        transcript,
                        model_calls,
                        tool_calls,
                        replies,
                    });
                }

                TurnState::Failed(err) => {
                    tracing::warn!(error = %err, model_calls, tool_calls, "turn aborted");
                    return Err(err);
                }
            };
        }
    }

    fn build_request(&self, transcript: &Transcript, tools: &[ToolDescriptor]) -> ModelRequest {
        ModelRequest {
            model: if self.config.model.is_empty() {
                None
            } else {
                Some(self.config.model.clone())
            },
            system: Some(self.config.system_prompt.clone()),
            messages: transcript.clone(),
            tools: tools.to_vec(),
            max_tokens: self.config.max_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shopchat_turn::{
        MessageContent, ModelResponse, Role, StopReason, TokenUsage, ToolOutput, TranscriptBlock,
    };
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // -- Mock Provider --

    struct MockProvider {
        responses: Mutex<VecDeque<Result<ModelResponse, ProviderError>>>,
        requests: Mutex<Vec<ModelRequest>>,
    }

    impl MockProvider {
        fn new(responses: Vec<ModelResponse>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().map(Ok).collect()),
                requests: Mutex::new(vec![]),
            }
        }

        fn failing() -> Self {
            Self {
                responses: Mutex::new(VecDeque::from([Err(ProviderError::RateLimited)])),
                requests: Mutex::new(vec![]),
            }
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl Provider for &MockProvider {
        fn complete(
            &self,
            request: ModelRequest,
        ) -> impl std::future::Future<Output = Result<ModelResponse, ProviderError>> + Send
        {
            self.requests.lock().unwrap().push(request);
            // An exhausted queue means the model has nothing more to say.
            let response = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(response(vec![])));
            async move { response }
        }
    }

    // -- Mock ToolHost --

    struct MockHost {
        output: ToolOutput,
        calls: Mutex<Vec<(String, serde_json::Value)>>,
        listings: AtomicUsize,
    }

    impl MockHost {
        fn new(output: ToolOutput) -> Self {
            Self {
                output,
                calls: Mutex::new(vec![]),
                listings: AtomicUsize::new(0),
            }
        }
    }

    impl ToolHost for MockHost {
        fn list_tools(
            &self,
        ) -> impl std::future::Future<Output = Result<Vec<ToolDescriptor>, ToolHostError>> + Send
        {
            self.listings.fetch_add(1, Ordering::SeqCst);
            async move {
                Ok(vec![ToolDescriptor {
                    name: "search_products".into(),
                    description: "Search for products".into(),
                    input_schema: json!({"type": "object"}),
                }])
            }
        }

        fn call_tool(
            &self,
            name: &str,
            arguments: serde_json::Value,
        ) -> impl std::future::Future<Output = Result<ToolOutput, ToolHostError>> + Send {
            self.calls.lock().unwrap().push((name.to_string(), arguments));
            let output = self.output.clone();
            async move { Ok(output) }
        }
    }

    // -- Recording Transport --

    #[derive(Default)]
    struct RecordingTransport {
        events: Mutex<Vec<BotResponse>>,
    }

    impl Transport for RecordingTransport {
        fn emit(
            &self,
            response: BotResponse,
        ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send {
            self.events.lock().unwrap().push(response);
            async { Ok(()) }
        }
    }

    struct ClosedTransport;

    impl Transport for ClosedTransport {
        fn emit(
            &self,
            _response: BotResponse,
        ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send {
            async { Err(TransportError::Closed) }
        }
    }

    // -- Helpers --

    fn response(content: Vec<ResponseBlock>) -> ModelResponse {
        ModelResponse {
            content,
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage {
                input_tokens: 10,
                output_tokens: 5,
            },
            model: "mock-model".into(),
        }
    }

    fn text(t: &str) -> ResponseBlock {
        ResponseBlock::Text { text: t.into() }
    }

    fn tool_use(name: &str) -> ResponseBlock {
        ResponseBlock::ToolUse {
            id: "tu_1".into(),
            name: name.into(),
            input: json!({"keyword": "shoes"}),
        }
    }

    fn meta(key: &str, value: serde_json::Value) -> Metadata {
        let mut m = Metadata::new();
        m.insert(key.into(), value);
        m
    }

    fn resolver(provider: &MockProvider) -> TurnResolver<&MockProvider> {
        TurnResolver::new(provider, ResolverConfig::default())
    }

    fn replies(transport: &RecordingTransport) -> Vec<BotResponse> {
        transport.events.lock().unwrap().clone()
    }

    // -- Tests --

    #[tokio::test]
    async fn empty_transcript_is_rejected() {
        let provider = MockProvider::new(vec![]);
        let transport = RecordingTransport::default();
        let err = resolver(&provider)
            .resolve(vec![], &[], &MockHost::new(ToolOutput::default()), &transport)
            .await
            .unwrap_err();
        assert!(matches!(err, TurnError::EmptyTranscript));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn run_turn_rejects_empty_transcript_before_listing_tools() {
        let provider = MockProvider::new(vec![]);
        let host = MockHost::new(ToolOutput::default());
        let transport = RecordingTransport::default();

        let err = resolver(&provider)
            .run_turn(vec![], &host, &transport)
            .await
            .unwrap_err();

        assert!(matches!(err, TurnError::EmptyTranscript));
        assert_eq!(host.listings.load(Ordering::SeqCst), 0);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn single_text_block_triggers_one_more_call() {
        let provider = MockProvider::new(vec![response(vec![text("Hello!")]), response(vec![])]);
        let transport = RecordingTransport::default();

        let outcome = resolver(&provider)
            .resolve(
                vec![TranscriptEntry::user("hi")],
                &[],
                &MockHost::new(ToolOutput::default()),
                &transport,
            )
            .await
            .unwrap();

        assert_eq!(outcome.model_calls, 2);
        assert_eq!(provider.calls(), 2);
        assert_eq!(replies(&transport), vec![BotResponse::reply("Hello!", None)]);

        // The second call saw the assistant's text appended.
        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[1].messages.len(), 2);
        assert_eq!(requests[1].messages[1], TranscriptEntry::assistant("Hello!"));
    }

    #[tokio::test]
    async fn multi_block_text_does_not_recurse() {
        let provider = MockProvider::new(vec![response(vec![text("one"), text("two")])]);
        let transport = RecordingTransport::default();

        let outcome = resolver(&provider)
            .resolve(
                vec![TranscriptEntry::user("hi")],
                &[],
                &MockHost::new(ToolOutput::default()),
                &transport,
            )
            .await
            .unwrap();

        assert_eq!(outcome.model_calls, 1);
        assert_eq!(outcome.replies, 2);
        assert_eq!(outcome.transcript.len(), 3);
    }

    #[tokio::test]
    async fn single_tool_use_triggers_exactly_one_more_call() {
        let provider = MockProvider::new(vec![
            response(vec![tool_use("search_products")]),
            response(vec![text("a"), text("b")]),
        ]);
        let host = MockHost::new(ToolOutput::text("Found products"));
        let transport = RecordingTransport::default();

        let outcome = resolver(&provider)
            .resolve(vec![TranscriptEntry::user("shoes")], &[], &host, &transport)
            .await
            .unwrap();

        assert_eq!(outcome.model_calls, 2);
        assert_eq!(outcome.tool_calls, 1);
        let calls = host.calls.lock().unwrap();
        assert_eq!(calls[0].0, "search_products");
        assert_eq!(calls[0].1, json!({"keyword": "shoes"}));

        let requests = provider.requests.lock().unwrap();
        let last = requests[1].messages.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(
            last.content,
            MessageContent::Blocks(vec![TranscriptBlock::text("Found products")])
        );
    }

    #[tokio::test]
    async fn text_then_tool_use_emits_then_calls_tool() {
        let provider = MockProvider::new(vec![
            response(vec![text("Let me look."), tool_use("search_products")]),
            response(vec![text("x"), text("y")]),
        ]);
        let host = MockHost::new(ToolOutput::text("result"));
        let transport = RecordingTransport::default();

        let outcome = resolver(&provider)
            .resolve(vec![TranscriptEntry::user("shoes")], &[], &host, &transport)
            .await
            .unwrap();

        assert_eq!(outcome.model_calls, 2);
        assert_eq!(outcome.tool_calls, 1);
        let events = replies(&transport);
        assert_eq!(events[0], BotResponse::reply("Let me look.", None));
        assert_eq!(events.len(), 3);
    }

    #[tokio::test]
    async fn blocks_after_tool_use_are_dropped() {
        let provider = MockProvider::new(vec![
            response(vec![tool_use("search_products"), text("never shown")]),
            response(vec![]),
        ]);
        let host = MockHost::new(ToolOutput::text("result"));
        let transport = RecordingTransport::default();

        let outcome = resolver(&provider)
            .resolve(vec![TranscriptEntry::user("shoes")], &[], &host, &transport)
            .await
            .unwrap();

        assert_eq!(outcome.replies, 0);
        assert!(replies(&transport).is_empty());
    }

    #[tokio::test]
    async fn other_blocks_count_towards_total() {
        let provider = MockProvider::new(vec![response(vec![
            ResponseBlock::Other {
                kind: "thinking".into(),
            },
            text("answer"),
        ])]);
        let transport = RecordingTransport::default();

        let outcome = resolver(&provider)
            .resolve(
                vec![TranscriptEntry::user("hi")],
                &[],
                &MockHost::new(ToolOutput::default()),
                &transport,
            )
            .await
            .unwrap();

        // Two blocks in the response, so the text does not recurse.
        assert_eq!(outcome.model_calls, 1);
        assert_eq!(outcome.replies, 1);
    }

    #[tokio::test]
    async fn metadata_goes_to_first_text_only_and_never_to_model() {
        let provider = MockProvider::new(vec![response(vec![text("first"), text("second")])]);
        let transport = RecordingTransport::default();
        let transcript = vec![TranscriptEntry::user_blocks(vec![
            TranscriptBlock::text_with_metadata("look", meta("foo", json!(1))),
        ])];

        resolver(&provider)
            .resolve(
                transcript,
                &[],
                &MockHost::new(ToolOutput::default()),
                &transport,
            )
            .await
            .unwrap();

        assert_eq!(
            replies(&transport),
            vec![
                BotResponse::reply("first", Some(meta("foo", json!(1)))),
                BotResponse::reply("second", None),
            ]
        );
        let requests = provider.requests.lock().unwrap();
        let sent = serde_json::to_string(&requests[0].messages).unwrap();
        assert!(!sent.contains("metadata"));
    }

    #[tokio::test]
    async fn unconsumed_metadata_does_not_leak_into_later_iterations() {
        // User metadata is detached on the first call; that response is a
        // bare tool call, so the metadata is never surfaced.
        let provider = MockProvider::new(vec![
            response(vec![tool_use("search_products")]),
            response(vec![text("done"), text("bye")]),
        ]);
        let host = MockHost::new(ToolOutput::text("no metadata here"));
        let transport = RecordingTransport::default();
        let transcript = vec![TranscriptEntry::user_blocks(vec![
            TranscriptBlock::text_with_metadata("look", meta("foo", json!(1))),
        ])];

        resolver(&provider)
            .resolve(transcript, &[], &host, &transport)
            .await
            .unwrap();

        let events = replies(&transport);
        assert_eq!(events[0], BotResponse::reply("done", None));
    }

    #[tokio::test]
    async fn provider_failure_aborts_without_emitting() {
        let provider = MockProvider::failing();
        let transport = RecordingTransport::default();

        let err = resolver(&provider)
            .resolve(
                vec![TranscriptEntry::user("hi")],
                &[],
                &MockHost::new(ToolOutput::default()),
                &transport,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, TurnError::Provider(ProviderError::RateLimited)));
        assert!(replies(&transport).is_empty());
    }

    #[tokio::test]
    async fn transport_failure_aborts() {
        let provider = MockProvider::new(vec![response(vec![text("hello"), text("again")])]);

        let err = resolver(&provider)
            .resolve(
                vec![TranscriptEntry::user("hi")],
                &[],
                &MockHost::new(ToolOutput::default()),
                &ClosedTransport,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, TurnError::Transport(TransportError::Closed)));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn round_trip_ceiling_fails_the_turn() {
        let provider = MockProvider::new(vec![
            response(vec![text("a")]),
            response(vec![text("b")]),
            response(vec![text("c")]),
        ]);
        let transport = RecordingTransport::default();
        let config = ResolverConfig {
            max_round_trips: Some(2),
            ..ResolverConfig::default()
        };

        let err = TurnResolver::new(&provider, config)
            .resolve(
                vec![TranscriptEntry::user("hi")],
                &[],
                &MockHost::new(ToolOutput::default()),
                &transport,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, TurnError::RoundTripLimit(2)));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn run_turn_passes_listed_tools_to_every_call() {
        let provider = MockProvider::new(vec![
            response(vec![tool_use("search_products")]),
            response(vec![text("a"), text("b")]),
        ]);
        let host = MockHost::new(ToolOutput::text("r"));
        let transport = RecordingTransport::default();

        resolver(&provider)
            .run_turn(vec![TranscriptEntry::user("hi")], &host, &transport)
            .await
            .unwrap();

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        for request in requests.iter() {
            assert_eq!(request.tools.len(), 1);
            assert_eq!(request.tools[0].name, "search_products");
            assert_eq!(request.max_tokens, 1000);
            assert!(request.system.is_some());
        }
    }
}
