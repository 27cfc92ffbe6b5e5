//! ICE API - Dispatch Engine
//!
//! Routes requests from any surface (GUI, CLI, IDE, agents) to action
//! handlers:
//! - `Dispatcher`: lookup, workspace resolution, execution, lifecycle events
//! - `chat`: the streaming conversation sub-protocol
//! - `handlers`: built-in workspace, docs and introspection handlers
//! - `introspection`: serializable catalog snapshots
//!
//! Hosts supply a `WorkspaceRuntime` and, per request, an `EventEmitter`.

pub mod chat;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod emitter;
pub mod handlers;
pub mod introspection;
pub mod registry;
pub mod responder;
pub mod runtime;
pub mod telemetry;

pub use chat::{
    split_chunks, stream_chat, ChatRequest, ChatTurn, ConversationStore, CHAT_STREAM_ACTION,
    DEFAULT_CONVERSATION, RESET_ACK, RESET_TOKEN,
};
pub use config::{DispatchConfig, BUILTIN_WORKSPACE_EXEMPT};
pub use context::SessionContext;
pub use dispatcher::{
    DispatchOutcome, DispatchRequest, DispatchResponse, Dispatcher, EnvelopeOutcome,
    RESERVED_PAYLOAD_KEYS,
};
pub use emitter::{BroadcastEmitter, EmitError, EventEmitter};
pub use handlers::{builtin_registry, register_builtin_handlers, DocsEntry, DocsLibrary};
pub use introspection::{
    describe_action, describe_agent, describe_catalog, ActionDescription, AgentDescription,
    CatalogSnapshot,
};
pub use registry::{handler_fn, sync_handler, ActionHandler, HandlerRegistry, Invocation, RegistryError};
pub use responder::{
    resolve_system_responder, ChatMessage, ChatResponder, ChatRole, ResponderError,
    ResponderProvider, SystemService, SYSTEM_AGENT,
};
pub use runtime::{NewWorkspace, RuntimeError, WorkspaceInfo, WorkspaceRuntime};
pub use telemetry::{init_tracing, TelemetryConfig};
