//! ICE Test Utilities
//!
//! Centralized test infrastructure for the ICE workspace:
//! - Mock runtime, responders and emitters for dispatcher tests
//! - Proptest generators for contract types
//! - Fixtures for common scenarios

pub use ice_api::{
    ChatMessage, ChatResponder, ChatRole, EmitError, EventEmitter, NewWorkspace, ResponderError,
    ResponderProvider, RuntimeError, SessionContext, SystemService, WorkspaceInfo,
    WorkspaceRuntime, SYSTEM_AGENT,
};
pub use ice_core::{
    ActionDomain, ActionKind, ActionSpec, JsonMap, ParameterSpec, PrimitiveType, ValueConstraint,
    WorkspaceId,
};
pub use ice_ipc::{ChatStreamEvent, ChatStreamPhase, LifecycleEvent, OutboundEvent};

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::Semaphore;

// ============================================================================
// MOCK RESPONDERS
// ============================================================================

#[derive(Debug, Clone)]
enum Reply {
    Echo,
    Fixed(String),
    Fail(String),
}

/// Scripted conversational agent that records every transcript it sees.
#[derive(Debug)]
pub struct MockResponder {
    reply: Reply,
    transcripts: Mutex<Vec<Vec<ChatMessage>>>,
    /// When set, every call waits for one permit before replying.
    gate: Option<Semaphore>,
}

impl MockResponder {
    /// Replies `echo: <message>`.
    pub fn echo() -> Self {
        Self::with_reply(Reply::Echo)
    }

    /// Always replies `text`.
    pub fn fixed(text: impl Into<String>) -> Self {
        Self::with_reply(Reply::Fixed(text.into()))
    }

    /// Always fails with `ResponderError::Failed(message)`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_reply(Reply::Fail(message.into()))
    }

    /// Replies `echo: <message>`, but only after `open` lets the call through.
    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::echo()
        }
    }

    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            transcripts: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Let `calls` waiting (or future) calls of a gated responder reply.
    pub fn open(&self, calls: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(calls);
        }
    }

    /// Transcripts received, in call order.
    pub fn transcripts(&self) -> Vec<Vec<ChatMessage>> {
        self.transcripts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.transcripts.lock().unwrap().len()
    }

    pub fn last_transcript(&self) -> Option<Vec<ChatMessage>> {
        self.transcripts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ChatResponder for MockResponder {
    async fn chat(&self, transcript: &[ChatMessage], user_message: &str) -> Result<String, ResponderError> {
        self.transcripts.lock().unwrap().push(transcript.to_vec());
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| ResponderError::Unavailable(e.to_string()))?
                .forget();
        }
        match &self.reply {
            Reply::Echo => Ok(format!("echo: {}", user_message)),
            Reply::Fixed(text) => Ok(text.clone()),
            Reply::Fail(message) => Err(ResponderError::Failed(message.clone())),
        }
    }
}

/// Where a `MockResponders` exposes its responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponderRoute {
    /// `agent("system-agent")` on the provider
    Agent,
    /// `system_service().system_agent()`
    ServiceAgent,
    /// `system_service().agent("system-agent")`
    ServiceNamed,
    /// Nothing resolves
    Nowhere,
}

struct MockSystemService {
    route: ResponderRoute,
    responder: Arc<MockResponder>,
}

impl SystemService for MockSystemService {
    fn system_agent(&self) -> Option<Arc<dyn ChatResponder>> {
        (self.route == ResponderRoute::ServiceAgent)
            .then(|| Arc::clone(&self.responder) as Arc<dyn ChatResponder>)
    }

    fn agent(&self, name: &str) -> Option<Arc<dyn ChatResponder>> {
        (self.route == ResponderRoute::ServiceNamed && name == SYSTEM_AGENT)
            .then(|| Arc::clone(&self.responder) as Arc<dyn ChatResponder>)
    }
}

/// Responder provider exposing one `MockResponder` through a chosen route.
pub struct MockResponders {
    route: ResponderRoute,
    responder: Arc<MockResponder>,
}

impl MockResponders {
    pub fn new(route: ResponderRoute, responder: Arc<MockResponder>) -> Self {
        Self { route, responder }
    }

    pub fn responder(&self) -> &Arc<MockResponder> {
        &self.responder
    }
}

impl ResponderProvider for MockResponders {
    fn agent(&self, name: &str) -> Option<Arc<dyn ChatResponder>> {
        (self.route == ResponderRoute::Agent && name == SYSTEM_AGENT)
            .then(|| Arc::clone(&self.responder) as Arc<dyn ChatResponder>)
    }

    fn system_service(&self) -> Option<Arc<dyn SystemService>> {
        match self.route {
            ResponderRoute::ServiceAgent | ResponderRoute::ServiceNamed => {
                let service = MockSystemService {
                    route: self.route,
                    responder: Arc::clone(&self.responder),
                };
                Some(Arc::new(service) as Arc<dyn SystemService>)
            }
            ResponderRoute::Agent | ResponderRoute::Nowhere => None,
        }
    }
}

// ============================================================================
// MOCK RUNTIME
// ============================================================================

/// In-memory workspace runtime.
pub struct MockRuntime {
    workspaces: DashMap<WorkspaceId, WorkspaceInfo>,
    current: RwLock<Option<WorkspaceId>>,
    activations: AtomicUsize,
    fail_activation: AtomicBool,
    deactivated: Mutex<Vec<WorkspaceId>>,
    deleted: Mutex<Vec<(WorkspaceId, bool)>>,
    responders: Option<MockResponders>,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self {
            workspaces: DashMap::new(),
            current: RwLock::new(None),
            activations: AtomicUsize::new(0),
            fail_activation: AtomicBool::new(false),
            deactivated: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            responders: None,
        }
    }

    pub fn with_workspace(self, info: WorkspaceInfo) -> Self {
        self.workspaces.insert(info.id.clone(), info);
        self
    }

    pub fn with_current(self, workspace_id: impl Into<WorkspaceId>) -> Self {
        *self.current.write().unwrap() = Some(workspace_id.into());
        self
    }

    pub fn with_responders(mut self, responders: MockResponders) -> Self {
        self.responders = Some(responders);
        self
    }

    /// Make every activation fail with a backend error.
    pub fn fail_activations(&self) {
        self.fail_activation.store(true, Ordering::SeqCst);
    }

    pub fn activations(&self) -> usize {
        self.activations.load(Ordering::SeqCst)
    }

    pub fn deactivated(&self) -> Vec<WorkspaceId> {
        self.deactivated.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<(WorkspaceId, bool)> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn contains(&self, workspace_id: &str) -> bool {
        self.workspaces.contains_key(workspace_id)
    }
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkspaceRuntime for MockRuntime {
    fn current_workspace_id(&self) -> Option<WorkspaceId> {
        self.current.read().unwrap().clone()
    }

    async fn activate_workspace(&self, workspace_id: &str) -> Result<SessionContext, RuntimeError> {
        if self.fail_activation.load(Ordering::SeqCst) {
            return Err(RuntimeError::Backend("activation disabled".to_string()));
        }
        if !self.workspaces.contains_key(workspace_id) {
            return Err(RuntimeError::WorkspaceNotFound(workspace_id.to_string()));
        }
        let n = self.activations.fetch_add(1, Ordering::SeqCst) + 1;
        *self.current.write().unwrap() = Some(workspace_id.to_string());
        Ok(SessionContext::new(workspace_id).with_context_id(format!("ctx-{}-{}", workspace_id, n)))
    }

    fn get_workspace(&self, workspace_id: &str) -> Result<WorkspaceInfo, RuntimeError> {
        self.workspaces
            .get(workspace_id)
            .map(|ws| ws.clone())
            .ok_or_else(|| RuntimeError::WorkspaceNotFound(workspace_id.to_string()))
    }

    fn list_workspaces(&self) -> Result<Vec<WorkspaceInfo>, RuntimeError> {
        let mut list: Vec<_> = self.workspaces.iter().map(|ws| ws.clone()).collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(list)
    }

    /// The workspace id is the requested name.
    async fn create_workspace(&self, request: NewWorkspace) -> Result<WorkspaceInfo, RuntimeError> {
        if self.workspaces.contains_key(&request.name) {
            return Err(RuntimeError::WorkspaceExists(request.name));
        }
        let info = WorkspaceInfo::new(
            request.name.clone(),
            request.name.clone(),
            format!("/tmp/ice/{}", request.name),
        )
        .with_type(request.workspace_type)
        .with_backends(["fs"]);
        self.workspaces.insert(info.id.clone(), info.clone());
        Ok(info)
    }

    async fn deactivate_workspace(&self, workspace_id: &str) -> Result<(), RuntimeError> {
        let mut current = self.current.write().unwrap();
        if current.as_deref() == Some(workspace_id) {
            *current = None;
        }
        self.deactivated.lock().unwrap().push(workspace_id.to_string());
        Ok(())
    }

    async fn delete_workspace(&self, workspace_id: &str, delete_from_disk: bool) -> Result<(), RuntimeError> {
        if self.workspaces.remove(workspace_id).is_none() {
            return Err(RuntimeError::WorkspaceNotFound(workspace_id.to_string()));
        }
        self.deleted
            .lock()
            .unwrap()
            .push((workspace_id.to_string(), delete_from_disk));
        Ok(())
    }

    fn responders(&self) -> Option<&dyn ResponderProvider> {
        self.responders.as_ref().map(|r| r as &dyn ResponderProvider)
    }
}

// ============================================================================
// MOCK EMITTERS
// ============================================================================

/// Emitter that records every event.
#[derive(Debug, Default)]
pub struct RecordingEmitter {
    events: Mutex<Vec<OutboundEvent>>,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<OutboundEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Chat events of one conversation, in emission order.
    pub fn chat_events(&self, conversation_id: &str) -> Vec<ChatStreamEvent> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                OutboundEvent::Chat(chat) if chat.conversation_id == conversation_id => Some(chat),
                _ => None,
            })
            .collect()
    }

    pub fn lifecycle_events(&self) -> Vec<LifecycleEvent> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                OutboundEvent::Lifecycle(event) => Some(event),
                OutboundEvent::Chat(_) => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

#[async_trait]
impl EventEmitter for RecordingEmitter {
    async fn emit(&self, event: OutboundEvent) -> Result<(), EmitError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// Emitter whose every delivery fails.
#[derive(Debug, Default)]
pub struct FailingEmitter {
    attempts: AtomicUsize,
}

impl FailingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventEmitter for FailingEmitter {
    async fn emit(&self, _event: OutboundEvent) -> Result<(), EmitError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(EmitError::Closed)
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating ICE contract types.

    use super::*;
    use proptest::prelude::*;

    // === Enum Generators ===

    pub fn arb_domain() -> impl Strategy<Value = ActionDomain> {
        prop::sample::select(ActionDomain::ALL.to_vec())
    }

    pub fn arb_kind() -> impl Strategy<Value = ActionKind> {
        prop::sample::select(ActionKind::ALL.to_vec())
    }

    pub fn arb_primitive() -> impl Strategy<Value = PrimitiveType> {
        prop::sample::select(PrimitiveType::ALL.to_vec())
    }

    // === Identifier Generators ===

    /// Dotted action name with two or three segments.
    pub fn arb_action_name() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z][a-z0-9_]{0,7}", 2..=3).prop_map(|segments| segments.join("."))
    }

    pub fn arb_conversation_id() -> impl Strategy<Value = String> {
        "[a-z0-9]{1,8}"
    }

    /// Chat message with no leading or trailing whitespace.
    pub fn arb_chat_message() -> impl Strategy<Value = String> {
        "[a-z]{1,6}( [a-z]{1,6}){0,5}"
    }

    // === Struct Generators ===

    pub fn arb_param_spec(name: String) -> impl Strategy<Value = ParameterSpec> {
        (arb_primitive(), any::<bool>()).prop_map(move |(primitive, required)| {
            let param = ParameterSpec::new(name.clone(), primitive);
            if required {
                param.required()
            } else {
                param
            }
        })
    }

    /// Action with up to five uniquely named parameters.
    pub fn arb_action_spec() -> impl Strategy<Value = ActionSpec> {
        (arb_action_name(), arb_domain(), arb_kind(), 0usize..=5)
            .prop_flat_map(|(name, domain, kind, n)| {
                let params: Vec<_> = (0..n).map(|i| arb_param_spec(format!("p{}", i))).collect();
                (Just(name), Just(domain), Just(kind), params)
            })
            .prop_map(|(name, domain, kind, params)| {
                params
                    .into_iter()
                    .fold(ActionSpec::new(name, domain, kind), ActionSpec::with_param)
            })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common dispatcher scenarios.

    use super::*;
    use serde_json::json;

    /// Workspace `id` rooted at `/tmp/ice/<id>` with kg enabled.
    pub fn workspace(id: &str) -> WorkspaceInfo {
        WorkspaceInfo::new(id, format!("Workspace {}", id), format!("/tmp/ice/{}", id))
            .with_type("multi_agent")
            .with_ai_config(json!({"kg": {"enabled": true}, "rag": {"enabled": false}}))
    }

    /// Runtime holding `ws-1` and `ws-2`, nothing active, no responders.
    pub fn runtime() -> MockRuntime {
        MockRuntime::new()
            .with_workspace(workspace("ws-1"))
            .with_workspace(workspace("ws-2"))
    }

    /// `runtime()` plus an echoing system agent reachable by name.
    pub fn chat_runtime() -> (MockRuntime, Arc<MockResponder>) {
        let responder = Arc::new(MockResponder::echo());
        let runtime = runtime().with_responders(MockResponders::new(
            ResponderRoute::Agent,
            Arc::clone(&responder),
        ));
        (runtime, responder)
    }

    /// Two `log-agent` actions: one analysis, one query.
    pub fn log_agent_actions() -> Vec<ActionSpec> {
        vec![
            ActionSpec::new("logs.scan", ActionDomain::Logs, ActionKind::Analysis).with_owner("log-agent"),
            ActionSpec::new("logs.tail", ActionDomain::Logs, ActionKind::Query).with_owner("log-agent"),
        ]
    }

    pub fn params(value: serde_json::Value) -> JsonMap {
        match value {
            serde_json::Value::Object(map) => map,
            _ => JsonMap::new(),
        }
    }
}
