//! Dispatch engine
//!
//! Turns an inbound request into exactly one outcome. Every request walks
//! the same steps, each of which may end it early:
//!
//! 1. streaming intercept for `system.chat.stream`
//! 2. handler lookup
//! 3. workspace resolution and activation
//! 4. panel-context propagation
//! 5. optional contract validation
//! 6. handler execution (panics are caught)
//! 7. post-action lifecycle events
//!
//! The dispatcher never returns an error or unwinds into its caller: every
//! failure becomes `{ok: false, error, code}`.

use crate::chat::{stream_chat, ChatRequest, ConversationStore, CHAT_STREAM_ACTION, DEFAULT_CONVERSATION};
use crate::config::DispatchConfig;
use crate::context::SessionContext;
use crate::emitter::EventEmitter;
use crate::handlers::builtin_registry;
use crate::registry::{HandlerRegistry, Invocation, RegistryError};
use crate::runtime::{RuntimeError, WorkspaceRuntime};
use futures_util::FutureExt;
use ice_catalog::Catalog;
use ice_core::{ActionName, ActionResult, JsonMap, RequestId, ResultStatus, WorkspaceId};
use ice_ipc::{ActionRequest, ActionResponse, ApiError, ErrorCode, LifecycleEvent};
use ice_schema::validate_params;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

// ============================================================================
// REQUEST / RESPONSE
// ============================================================================

/// Minimal request shape `{action|method, params, id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchRequest {
    #[serde(default, alias = "method")]
    pub action: ActionName,
    /// `null` is read as an empty map.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub params: JsonMap,
    /// Caller correlation id; numeric ids are kept as their decimal text.
    #[serde(default, deserialize_with = "id_as_string")]
    pub id: Option<RequestId>,
    #[serde(default)]
    pub workspace_id: Option<WorkspaceId>,
    #[serde(default)]
    pub panel_context: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<JsonMap, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<JsonMap>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn id_as_string<'de, D>(deserializer: D) -> Result<Option<RequestId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

impl DispatchRequest {
    pub fn new(action: impl Into<ActionName>) -> Self {
        Self {
            action: action.into(),
            ..Self::default()
        }
    }

    pub fn with_params(mut self, params: JsonMap) -> Self {
        self.params = params;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<RequestId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_workspace(mut self, workspace_id: impl Into<WorkspaceId>) -> Self {
        self.workspace_id = Some(workspace_id.into());
        self
    }

    pub fn with_panel_context(mut self, panel: impl Into<String>) -> Self {
        self.panel_context = Some(panel.into());
        self
    }

    fn param_str(&self, name: &str) -> Option<&str> {
        self.params
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Top-level response keys a handler payload must not contain.
pub const RESERVED_PAYLOAD_KEYS: [&str; 5] = ["ok", "error", "code", "details", "warnings"];

fn reserved_key(payload: &JsonMap) -> Option<&'static str> {
    RESERVED_PAYLOAD_KEYS
        .into_iter()
        .find(|key| payload.contains_key(*key))
}

/// Response shape `{ok: true, ...payload}` or `{ok: false, error, code}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// Post-action events that could not be delivered.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(flatten)]
    pub payload: JsonMap,
}

impl DispatchResponse {
    pub fn success(payload: JsonMap) -> Self {
        Self {
            ok: true,
            error: None,
            code: None,
            details: None,
            warnings: Vec::new(),
            payload,
        }
    }

    pub fn failure(err: &ApiError) -> Self {
        Self {
            ok: false,
            error: Some(err.message.clone()),
            code: Some(err.code),
            details: err.details.clone(),
            warnings: Vec::new(),
            payload: JsonMap::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    /// Coded error of a failed response.
    pub fn api_error(&self) -> Option<ApiError> {
        if self.ok {
            return None;
        }
        let mut err = ApiError::new(
            self.code.unwrap_or(ErrorCode::Generic),
            self.error.clone().unwrap_or_default(),
        );
        err.details = self.details.clone();
        Some(err)
    }
}

/// Result of one dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    /// `None` for successful streams: the events are the output.
    pub response: Option<DispatchResponse>,
    /// Session after the request (possibly newly activated).
    pub session: Option<SessionContext>,
}

/// Result of one envelope dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeOutcome {
    pub response: ActionResponse,
    pub session: Option<SessionContext>,
}

// ============================================================================
// DISPATCHER
// ============================================================================

pub struct Dispatcher {
    registry: HandlerRegistry,
    runtime: Arc<dyn WorkspaceRuntime>,
    config: DispatchConfig,
    catalog: Option<Arc<Catalog>>,
    conversations: ConversationStore,
}

impl Dispatcher {
    pub fn new(registry: HandlerRegistry, runtime: Arc<dyn WorkspaceRuntime>, config: DispatchConfig) -> Self {
        let conversations = ConversationStore::new(config.chat_history_capacity);
        Self {
            registry,
            runtime,
            config,
            catalog: None,
            conversations,
        }
    }

    /// Dispatcher over the built-in handlers and the default catalog.
    pub fn with_defaults(runtime: Arc<dyn WorkspaceRuntime>, config: DispatchConfig) -> Result<Self, RegistryError> {
        let catalog = Arc::new(Catalog::with_defaults()?);
        let registry = builtin_registry(&config, Some(Arc::clone(&catalog)))?;
        Ok(Self::new(registry, runtime, config).with_catalog(catalog))
    }

    /// Attach a catalog, used for parameter validation.
    pub fn with_catalog(mut self, catalog: Arc<Catalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_deref()
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    /// Dispatch one request.
    ///
    /// `session` is the caller's current session, if any; the outcome carries
    /// the session to use for the next request.
    pub async fn dispatch(
        &self,
        request: DispatchRequest,
        session: Option<SessionContext>,
        emitter: Option<&dyn EventEmitter>,
    ) -> DispatchOutcome {
        let mut session = session;
        debug!(action = %request.action, request_id = ?request.id, "Dispatch request");
        let response = self.run(&request, &mut session, emitter).await;
        DispatchOutcome { response, session }
    }

    async fn run(
        &self,
        request: &DispatchRequest,
        session: &mut Option<SessionContext>,
        emitter: Option<&dyn EventEmitter>,
    ) -> Option<DispatchResponse> {
        let action = request.action.as_str();

        // 1. Streaming intercept
        if action == CHAT_STREAM_ACTION {
            return self.run_chat(request, session, emitter).await;
        }

        // 2. Lookup
        let Some(handler) = self.registry.get(action) else {
            error!(action, "Unknown action requested");
            return Some(DispatchResponse::failure(&ApiError::action_not_found(action)));
        };

        // 3. Workspace resolution
        let workspace_id = request
            .workspace_id
            .clone()
            .filter(|id| !id.is_empty())
            .or_else(|| request.param_str("workspace_id").map(str::to_string))
            .or_else(|| self.runtime.current_workspace_id().filter(|id| !id.is_empty()));

        if !self.config.is_workspace_exempt(action) {
            let Some(wid) = workspace_id.as_deref() else {
                return Some(DispatchResponse::failure(&ApiError::missing_workspace(action)));
            };
            let bound = session.as_ref().is_some_and(|ctx| ctx.is_bound_to(wid));
            if !bound {
                match self.runtime.activate_workspace(wid).await {
                    Ok(ctx) => *session = Some(ctx),
                    Err(e) => {
                        error!(workspace_id = wid, error = %e, "Workspace activation failed");
                        return Some(DispatchResponse::failure(&activation_error(wid)));
                    }
                }
            }
        }

        // 4. Panel context
        let panel = request
            .panel_context
            .as_deref()
            .filter(|p| !p.is_empty())
            .or_else(|| request.param_str("panel_context"));
        if let (Some(panel), Some(ctx)) = (panel, session.as_mut()) {
            ctx.set_panel_context(panel);
        }

        // 5. Contract validation
        if self.config.validate_params {
            if let Some(spec) = self.catalog.as_deref().and_then(|c| c.get_action(action)) {
                if let Err(err) = validate_params(spec, &request.params).ensure_valid(action) {
                    return Some(DispatchResponse::failure(&err));
                }
            }
        }

        // 6. Execution
        let invocation = Invocation {
            action: request.action.clone(),
            params: request.params.clone(),
            runtime: Arc::clone(&self.runtime),
            workspace_id: workspace_id.clone(),
            request_id: request.id.clone(),
        };
        let result = match AssertUnwindSafe(handler.call(invocation)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(action, workspace_id = ?workspace_id, panic = %message, "Action handler panicked");
                Err(ApiError::internal(message))
            }
        };

        let payload = match result {
            Ok(payload) => payload,
            Err(err) => {
                error!(action, workspace_id = ?workspace_id, error = %err, "Action execution failed");
                return Some(DispatchResponse::failure(&err));
            }
        };
        if let Some(key) = reserved_key(&payload) {
            error!(action, key, "Handler payload uses a reserved response key");
            return Some(DispatchResponse::failure(&ApiError::internal(format!(
                "Handler payload uses reserved key '{}'",
                key
            ))));
        }

        // 7. Post-action events
        let mut response = DispatchResponse::success(payload);
        if let Some(emitter) = emitter {
            response.warnings = self
                .emit_post_action_events(action, &response.payload, emitter, workspace_id.as_deref())
                .await;
        }
        Some(response)
    }

    async fn run_chat(
        &self,
        request: &DispatchRequest,
        session: &mut Option<SessionContext>,
        emitter: Option<&dyn EventEmitter>,
    ) -> Option<DispatchResponse> {
        let Some(emitter) = emitter else {
            return Some(DispatchResponse::failure(&ApiError::new(
                ErrorCode::CapabilityUnavailable,
                "Streaming requires emit_event",
            )));
        };

        if let (Some(ctx), Some(id)) = (session.as_mut(), request.id.as_deref()) {
            ctx.set_request_id(id);
        }

        let chat = ChatRequest {
            conversation_id: request
                .param_str("conversation_id")
                .unwrap_or(DEFAULT_CONVERSATION)
                .to_string(),
            message: request.param_str("message").unwrap_or_default().to_string(),
            request_id: request.id.clone(),
        };
        let conversation_id = chat.conversation_id.clone();

        let turn = stream_chat(
            &self.conversations,
            &self.config.chat_system_prompt,
            self.runtime.responders(),
            emitter,
            chat,
        );
        let result = match AssertUnwindSafe(turn).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(ApiError::internal(panic_message(panic.as_ref()))),
        };

        match result {
            Ok(()) => None,
            Err(err) => {
                error!(conversation_id = %conversation_id, error = %err, "Chat stream failed");
                Some(DispatchResponse::failure(&err))
            }
        }
    }

    /// Emit the standard lifecycle events; returns one warning per event
    /// that could not be delivered.
    async fn emit_post_action_events(
        &self,
        action: &str,
        payload: &JsonMap,
        emitter: &dyn EventEmitter,
        fallback_workspace_id: Option<&str>,
    ) -> Vec<String> {
        let mut warnings = Vec::new();
        let result_wid = ["workspace_id", "workspace"]
            .iter()
            .find_map(|key| payload.get(*key).and_then(Value::as_str).filter(|s| !s.is_empty()));

        if matches!(action, "workspace.create" | "workspace.load") {
            if let Some(wid) = result_wid {
                match self.runtime.get_workspace(wid) {
                    Ok(ws) => {
                        let event = LifecycleEvent::WorkspaceLoaded {
                            workspace: ws.snapshot(),
                        };
                        info!(workspace_id = wid, "EVENT workspace.loaded emitted");
                        if let Err(e) = emitter.emit(event.into()).await {
                            warn!(workspace_id = wid, error = %e, "Failed to emit workspace.loaded");
                            warnings.push(format!("workspace.loaded not delivered: {}", e));
                        }
                    }
                    Err(e) => {
                        debug!(workspace_id = wid, error = %e, "Skipping workspace.loaded");
                    }
                }
            }
        }

        if matches!(action, "workspace.create" | "workspace.delete") {
            let workspace_id = result_wid.or(fallback_workspace_id).map(str::to_string);
            let event = LifecycleEvent::WorkspaceListUpdated { workspace_id };
            if let Err(e) = emitter.emit(event.into()).await {
                warn!(action, error = %e, "Failed to emit workspace.list.updated");
                warnings.push(format!("workspace.list.updated not delivered: {}", e));
            }
        }

        warnings
    }

    // ========================================================================
    // ENVELOPE DISPATCH
    // ========================================================================

    /// Dispatch a rich `ActionRequest` and answer with an `ActionResponse`.
    ///
    /// The request becomes a logical `ActionCall` whose context comes from the
    /// header, so the header's workspace id takes precedence over
    /// `params.workspace_id`. The outcome becomes an `ActionResult`; outcomes
    /// with undelivered events are reported as `partial`.
    pub async fn dispatch_envelope(
        &self,
        request: ActionRequest,
        session: Option<SessionContext>,
        emitter: Option<&dyn EventEmitter>,
    ) -> EnvelopeOutcome {
        let started = Instant::now();
        let call = request.to_call();
        let inner = DispatchRequest {
            action: call.name.clone(),
            params: call.params.clone(),
            id: call.request_id.clone(),
            workspace_id: call.context.workspace_id.clone(),
            panel_context: call.context.panel_context.clone(),
        };

        let outcome = self.dispatch(inner, session, emitter).await;
        let mut result = action_result(&call.name, outcome.response);
        result
            .metrics
            .insert("duration_ms".to_string(), json!(started.elapsed().as_millis() as u64));
        debug!(action = %call.name, source = %call.context.source, status = result.status.as_str(), "Envelope dispatched");

        EnvelopeOutcome {
            response: ActionResponse::from_result(&request, result.with_context(call.context)),
            session: outcome.session,
        }
    }
}

/// Logical result of one dispatch. A missing response is a successful stream.
fn action_result(action: &str, response: Option<DispatchResponse>) -> ActionResult {
    let Some(response) = response else {
        return ActionResult::success(action, Value::Null);
    };
    if !response.ok {
        let err = response
            .api_error()
            .unwrap_or_else(|| ApiError::from_code(ErrorCode::Generic));
        let mut result = ActionResult::success(action, Value::Null);
        result.push_error(err.to_action_error());
        return result;
    }

    let data = Value::Object(response.payload);
    if response.warnings.is_empty() {
        return ActionResult::success(action, data);
    }
    let mut result = ActionResult::with_status(action, ResultStatus::Partial, data);
    for warning in response.warnings {
        result.push_error(ApiError::generic(warning).to_action_error());
    }
    result
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("catalog", &self.catalog.as_ref().map(|c| c.len()))
            .finish()
    }
}

/// Every activation failure is reported as an unknown workspace.
fn activation_error(workspace_id: &str) -> ApiError {
    ApiError::workspace_not_found(
        workspace_id,
        RuntimeError::WorkspaceNotFound(workspace_id.to_string()),
    )
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("Handler panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("Handler panicked: {}", s)
    } else {
        "Handler panicked".to_string()
    }
}
