//! Property-based tests for dispatch routing and chat history

use ice_api::{DispatchConfig, DispatchRequest, Dispatcher, WorkspaceRuntime};
use ice_ipc::ErrorCode;
use ice_test_utils::fixtures;
use ice_test_utils::generators::{arb_action_name, arb_chat_message, arb_conversation_id};
use ice_test_utils::RecordingEmitter;
use proptest::prelude::*;
use std::future::Future;
use std::sync::Arc;

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

fn dispatcher(config: DispatchConfig) -> Dispatcher {
    let (runtime, _responder) = fixtures::chat_runtime();
    let runtime: Arc<dyn WorkspaceRuntime> = Arc::new(runtime);
    Dispatcher::with_defaults(runtime, config).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Unregistered names always fail the same way and emit nothing.
    #[test]
    fn prop_unknown_action_rejected(name in arb_action_name()) {
        let dispatcher = dispatcher(DispatchConfig::default());
        prop_assume!(!dispatcher.registry().contains(&name));
        let emitter = RecordingEmitter::new();

        let outcome = block_on(dispatcher.dispatch(
            DispatchRequest::new(name.clone()).with_workspace("ws-1"),
            None,
            Some(&emitter),
        ));
        let response = outcome.response.unwrap();
        prop_assert!(!response.ok);
        prop_assert_eq!(response.code, Some(ErrorCode::ActionNotFound));
        prop_assert_eq!(response.error, Some(format!("Unknown action: {}", name)));
        prop_assert!(emitter.events().is_empty());
        prop_assert!(outcome.session.is_none());
    }

    /// History never exceeds the configured capacity and keeps the newest turns.
    #[test]
    fn prop_history_bounded(
        capacity in 1usize..6,
        messages in prop::collection::vec(arb_chat_message(), 1..15),
        conversation_id in arb_conversation_id(),
    ) {
        let dispatcher = dispatcher(DispatchConfig::default().with_chat_history_capacity(capacity));
        let emitter = RecordingEmitter::new();

        let history = block_on(async {
            for message in &messages {
                let request = DispatchRequest::new("system.chat.stream")
                    .with_param("conversation_id", conversation_id.as_str())
                    .with_param("message", message.as_str());
                dispatcher.dispatch(request, None, Some(&emitter)).await;
            }
            dispatcher.conversations().history(&conversation_id).await
        });

        prop_assert_eq!(history.len(), messages.len().min(capacity));
        let newest: Vec<_> = messages[messages.len() - history.len()..].to_vec();
        let kept: Vec<_> = history.iter().map(|turn| turn.user.clone()).collect();
        prop_assert_eq!(kept, newest);
    }

    /// The chunk deltas of a turn concatenate to its end event.
    #[test]
    fn prop_chunks_concat_to_full(
        message in arb_chat_message(),
        conversation_id in arb_conversation_id(),
    ) {
        let dispatcher = dispatcher(DispatchConfig::default());
        let emitter = RecordingEmitter::new();

        block_on(dispatcher.dispatch(
            DispatchRequest::new("system.chat.stream")
                .with_param("conversation_id", conversation_id.as_str())
                .with_param("message", message.as_str()),
            None,
            Some(&emitter),
        ));

        let events = emitter.chat_events(&conversation_id);
        let (end, chunks) = events.split_last().unwrap();
        prop_assert!(end.is_end());
        let joined: String = chunks
            .iter()
            .map(|e| match &e.phase {
                ice_ipc::ChatStreamPhase::Chunk { delta } => delta.clone(),
                ice_ipc::ChatStreamPhase::End { .. } => String::new(),
            })
            .collect();
        prop_assert_eq!(end.phase.clone(), ice_ipc::ChatStreamPhase::End { full: joined.clone() });
        prop_assert_eq!(joined, format!("echo: {}", message));
    }
}
