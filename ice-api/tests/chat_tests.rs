//! Streaming chat sub-protocol tests

use ice_api::{
    ChatRole, ChatTurn, DispatchConfig, DispatchRequest, Dispatcher, WorkspaceRuntime, RESET_ACK,
    RESET_TOKEN,
};
use ice_ipc::{ChatStreamPhase, ErrorCode};
use ice_test_utils::fixtures;
use ice_test_utils::{
    MockResponder, MockResponders, MockRuntime, RecordingEmitter, ResponderRoute, SessionContext,
};
use std::sync::Arc;

fn chat_dispatcher() -> (Dispatcher, Arc<MockResponder>) {
    let (runtime, responder) = fixtures::chat_runtime();
    let runtime: Arc<dyn WorkspaceRuntime> = Arc::new(runtime);
    let dispatcher = Dispatcher::with_defaults(runtime, DispatchConfig::default()).unwrap();
    (dispatcher, responder)
}

fn chat(conversation_id: &str, message: &str) -> DispatchRequest {
    DispatchRequest::new("system.chat.stream")
        .with_param("conversation_id", conversation_id)
        .with_param("message", message)
}

#[tokio::test]
async fn test_streaming_requires_emitter() {
    let (dispatcher, responder) = chat_dispatcher();

    let outcome = dispatcher.dispatch(chat("c1", "hello"), None, None).await;
    let response = outcome.response.unwrap();
    assert!(!response.ok);
    assert_eq!(response.error.as_deref(), Some("Streaming requires emit_event"));
    assert_eq!(responder.calls(), 0);
}

#[tokio::test]
async fn test_reply_is_streamed_as_chunks_then_end() {
    let (dispatcher, responder) = chat_dispatcher();
    let emitter = RecordingEmitter::new();

    let outcome = dispatcher
        .dispatch(chat("c1", "  hello there  ").with_id("m-1"), None, Some(&emitter))
        .await;
    assert!(outcome.response.is_none());

    let events = emitter.chat_events("c1");
    let phases: Vec<_> = events.iter().map(|e| e.phase.clone()).collect();
    assert_eq!(
        phases,
        vec![
            ChatStreamPhase::Chunk { delta: "echo: ".into() },
            ChatStreamPhase::Chunk { delta: "hello ".into() },
            ChatStreamPhase::Chunk { delta: "there".into() },
            ChatStreamPhase::End { full: "echo: hello there".into() },
        ]
    );
    assert!(events.iter().all(|e| e.message_id.as_deref() == Some("m-1")));
    assert!(events.iter().all(|e| e.event_type == "system.chat.stream"));

    let transcript = responder.last_transcript().unwrap();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].role, ChatRole::System);
    assert_eq!(transcript[0].content, dispatcher.config().chat_system_prompt);
    assert_eq!(transcript[1].role, ChatRole::User);
    assert_eq!(transcript[1].content, "hello there");
}

#[tokio::test]
async fn test_history_is_replayed_in_order() {
    let (dispatcher, responder) = chat_dispatcher();
    let emitter = RecordingEmitter::new();

    dispatcher.dispatch(chat("c1", "first"), None, Some(&emitter)).await;
    dispatcher.dispatch(chat("c1", "second"), None, Some(&emitter)).await;

    let transcript = responder.last_transcript().unwrap();
    let contents: Vec<_> = transcript.iter().map(|m| (m.role, m.content.as_str())).collect();
    assert_eq!(
        contents[1..],
        [
            (ChatRole::User, "first"),
            (ChatRole::Assistant, "echo: first"),
            (ChatRole::User, "second"),
        ]
    );
}

#[tokio::test]
async fn test_reset_clears_history() {
    let (dispatcher, responder) = chat_dispatcher();
    let emitter = RecordingEmitter::new();

    dispatcher.dispatch(chat("c1", "one"), None, Some(&emitter)).await;
    dispatcher.dispatch(chat("c2", "other"), None, Some(&emitter)).await;
    emitter.clear();

    let outcome = dispatcher
        .dispatch(chat("c1", RESET_TOKEN).with_id("r-9"), None, Some(&emitter))
        .await;
    assert!(outcome.response.is_none());

    let events = emitter.events();
    assert_eq!(events.len(), 1);
    let reset = emitter.chat_events("c1");
    assert_eq!(reset[0].phase, ChatStreamPhase::End { full: RESET_ACK.into() });
    assert_eq!(reset[0].message_id.as_deref(), Some("r-9"));
    assert_eq!(responder.calls(), 2);

    assert!(dispatcher.conversations().history("c1").await.is_empty());
    assert_eq!(dispatcher.conversations().history("c2").await.len(), 1);

    dispatcher.dispatch(chat("c1", "again"), None, Some(&emitter)).await;
    assert_eq!(responder.last_transcript().unwrap().len(), 2);
}

#[tokio::test]
async fn test_history_keeps_last_ten_turns() {
    let (dispatcher, responder) = chat_dispatcher();
    let emitter = RecordingEmitter::new();

    for n in 0..11 {
        dispatcher
            .dispatch(chat("c1", &format!("m{}", n)), None, Some(&emitter))
            .await;
    }

    let history = dispatcher.conversations().history("c1").await;
    assert_eq!(history.len(), 10);
    assert_eq!(history[0].user, "m1");
    assert_eq!(history[9].user, "m10");
    assert_eq!(history[9].assistant, "echo: m10");

    // the eleventh turn still saw the full window of ten earlier turns
    assert_eq!(responder.last_transcript().unwrap().len(), 1 + 10 * 2 + 1);
}

#[tokio::test]
async fn test_empty_message_is_ignored() {
    let (dispatcher, responder) = chat_dispatcher();
    let emitter = RecordingEmitter::new();

    let outcome = dispatcher.dispatch(chat("c1", "   "), None, Some(&emitter)).await;
    assert!(outcome.response.is_none());
    assert!(emitter.events().is_empty());
    assert_eq!(responder.calls(), 0);
    assert!(dispatcher.conversations().history("c1").await.is_empty());
}

#[tokio::test]
async fn test_default_conversation_id() {
    let (dispatcher, _responder) = chat_dispatcher();
    let emitter = RecordingEmitter::new();

    dispatcher
        .dispatch(
            DispatchRequest::new("system.chat.stream").with_param("message", "hi"),
            None,
            Some(&emitter),
        )
        .await;
    assert_eq!(emitter.chat_events("default").len(), 2);
}

#[tokio::test]
async fn test_request_id_recorded_on_session() {
    let (dispatcher, _responder) = chat_dispatcher();
    let emitter = RecordingEmitter::new();

    let outcome = dispatcher
        .dispatch(
            chat("c1", "hi").with_id("m-3"),
            Some(SessionContext::new("ws-1")),
            Some(&emitter),
        )
        .await;
    assert_eq!(outcome.session.unwrap().request_id.as_deref(), Some("m-3"));
}

#[tokio::test]
async fn test_capability_unavailable() {
    let runtime: Arc<dyn WorkspaceRuntime> = Arc::new(fixtures::runtime());
    let dispatcher = Dispatcher::with_defaults(runtime, DispatchConfig::default()).unwrap();
    let emitter = RecordingEmitter::new();

    let outcome = dispatcher.dispatch(chat("c1", "hi"), None, Some(&emitter)).await;
    let response = outcome.response.unwrap();
    assert!(!response.ok);
    assert_eq!(response.code, Some(ErrorCode::CapabilityUnavailable));
    assert_eq!(response.error.as_deref(), Some("SystemAgent not available"));
    assert!(emitter.events().is_empty());
    assert!(dispatcher.conversations().history("c1").await.is_empty());
}

#[tokio::test]
async fn test_every_fallback_route_resolves() {
    for route in [
        ResponderRoute::Agent,
        ResponderRoute::ServiceAgent,
        ResponderRoute::ServiceNamed,
    ] {
        let responder = Arc::new(MockResponder::fixed("ok"));
        let runtime = fixtures::runtime().with_responders(MockResponders::new(route, responder.clone()));
        let runtime: Arc<dyn WorkspaceRuntime> = Arc::new(runtime);
        let dispatcher = Dispatcher::with_defaults(runtime, DispatchConfig::default()).unwrap();
        let emitter = RecordingEmitter::new();

        let outcome = dispatcher.dispatch(chat("c1", "hi"), None, Some(&emitter)).await;
        assert!(outcome.response.is_none(), "route {:?} failed", route);
        assert_eq!(responder.calls(), 1);
    }

    let responder = Arc::new(MockResponder::fixed("ok"));
    let runtime = MockRuntime::new().with_responders(MockResponders::new(ResponderRoute::Nowhere, responder));
    let runtime: Arc<dyn WorkspaceRuntime> = Arc::new(runtime);
    let dispatcher = Dispatcher::with_defaults(runtime, DispatchConfig::default()).unwrap();
    let emitter = RecordingEmitter::new();
    let outcome = dispatcher.dispatch(chat("c1", "hi"), None, Some(&emitter)).await;
    assert_eq!(
        outcome.response.unwrap().code,
        Some(ErrorCode::CapabilityUnavailable)
    );
}

#[tokio::test]
async fn test_responder_failure_is_execution_error() {
    let responder = Arc::new(MockResponder::failing("model offline"));
    let runtime = fixtures::runtime().with_responders(MockResponders::new(ResponderRoute::Agent, responder));
    let runtime: Arc<dyn WorkspaceRuntime> = Arc::new(runtime);
    let dispatcher = Dispatcher::with_defaults(runtime, DispatchConfig::default()).unwrap();
    let emitter = RecordingEmitter::new();

    let outcome = dispatcher.dispatch(chat("c1", "hi"), None, Some(&emitter)).await;
    let response = outcome.response.unwrap();
    assert_eq!(response.code, Some(ErrorCode::ExecutionFailed));
    let details = response.details.unwrap();
    assert_eq!(details["agent"], "system-agent");
    assert_eq!(details["exception_type"], "ResponderError");
    assert_eq!(details["exception_message"], "Responder failed: model offline");
    assert!(dispatcher.conversations().history("c1").await.is_empty());
}

fn gated_dispatcher() -> (Dispatcher, Arc<MockResponder>) {
    let responder = Arc::new(MockResponder::gated());
    let runtime = fixtures::runtime()
        .with_responders(MockResponders::new(ResponderRoute::Agent, Arc::clone(&responder)));
    let runtime: Arc<dyn WorkspaceRuntime> = Arc::new(runtime);
    let dispatcher = Dispatcher::with_defaults(runtime, DispatchConfig::default()).unwrap();
    (dispatcher, responder)
}

async fn wait_for_calls(responder: &MockResponder, calls: usize) {
    while responder.calls() < calls {
        tokio::task::yield_now().await;
    }
}

async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_concurrent_turns_on_one_conversation_are_serialized() {
    let (dispatcher, responder) = gated_dispatcher();
    let emitter = RecordingEmitter::new();

    let (a, b, ()) = tokio::join!(
        dispatcher.dispatch(chat("c1", "left"), None, Some(&emitter)),
        dispatcher.dispatch(chat("c1", "right"), None, Some(&emitter)),
        async {
            wait_for_calls(&responder, 1).await;
            settle().await;
            // the second turn is parked on the conversation lock
            assert_eq!(responder.calls(), 1);
            assert!(emitter.events().is_empty());
            responder.open(1);
            wait_for_calls(&responder, 2).await;
            responder.open(1);
        },
    );
    assert!(a.response.is_none());
    assert!(b.response.is_none());

    let history = dispatcher.conversations().history("c1").await;
    assert_eq!(history.len(), 2);
    let sizes: Vec<_> = responder.transcripts().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![2, 4]);
    assert_eq!(responder.transcripts()[1][1].content, history[0].user);
}

#[tokio::test]
async fn test_different_conversations_do_not_contend() {
    let (dispatcher, responder) = gated_dispatcher();
    let emitter = RecordingEmitter::new();

    let (a, b, ()) = tokio::join!(
        dispatcher.dispatch(chat("c1", "left"), None, Some(&emitter)),
        dispatcher.dispatch(chat("c2", "right"), None, Some(&emitter)),
        async {
            wait_for_calls(&responder, 2).await;
            responder.open(2);
        },
    );
    assert!(a.response.is_none());
    assert!(b.response.is_none());
    assert_eq!(emitter.chat_events("c1").len(), 2);
    assert_eq!(emitter.chat_events("c2").len(), 2);
}

#[tokio::test]
async fn test_turn_after_reset_is_kept_while_earlier_turn_in_flight() {
    let (dispatcher, responder) = gated_dispatcher();
    let emitter = RecordingEmitter::new();

    let (a, reset, b, ()) = tokio::join!(
        dispatcher.dispatch(chat("c1", "a"), None, Some(&emitter)),
        dispatcher.dispatch(chat("c1", RESET_TOKEN), None, Some(&emitter)),
        dispatcher.dispatch(chat("c1", "b"), None, Some(&emitter)),
        async {
            wait_for_calls(&responder, 1).await;
            settle().await;
            responder.open(1);
            wait_for_calls(&responder, 2).await;
            responder.open(1);
        },
    );
    assert!(a.response.is_none());
    assert!(reset.response.is_none());
    assert!(b.response.is_none());

    // the reset ran between the two turns
    assert_eq!(responder.transcripts()[1].len(), 2);
    let phases: Vec<_> = emitter
        .chat_events("c1")
        .into_iter()
        .filter(|e| e.is_end())
        .map(|e| e.phase)
        .collect();
    assert_eq!(
        phases,
        vec![
            ChatStreamPhase::End { full: "echo: a".into() },
            ChatStreamPhase::End { full: RESET_ACK.into() },
            ChatStreamPhase::End { full: "echo: b".into() },
        ]
    );

    let history = dispatcher.conversations().history("c1").await;
    assert_eq!(
        history,
        vec![ChatTurn {
            user: "b".into(),
            assistant: "echo: b".into(),
        }]
    );
}
