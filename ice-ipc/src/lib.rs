//! ICE IPC - Envelopes and Error Taxonomy
//!
//! Transport-neutral message shapes shared by every ICE surface:
//! - `MessageHeader` / `ActionRequest` / `ActionResponse` / `EventMessage`
//! - `OutboundEvent`: chat stream chunks and workspace lifecycle events
//! - `ApiError` / `ErrorCode`: the coded error vocabulary

pub mod error;
pub mod event;
pub mod message;

pub use error::{ApiError, ApiResult, ErrorCode};
pub use event::{
    ChatStreamEvent, ChatStreamPhase, LifecycleEvent, OutboundEvent, WorkspaceFeatures,
    WorkspaceSnapshot, CHAT_STREAM_EVENT_TYPE,
};
pub use message::{ActionRequest, ActionResponse, EventHeader, EventMessage, MessageHeader};
