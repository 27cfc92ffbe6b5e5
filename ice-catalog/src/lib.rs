//! ICE Catalog - Catalog Assembler
//!
//! Groups action contracts and derives agent contracts from ownership:
//! - `defaults`: the built-in action set
//! - `agents`: deterministic agent derivation
//! - `Catalog`: validated container with lookup helpers

pub mod agents;
pub mod catalog;
pub mod defaults;
pub mod error;

pub use agents::{build_agents_from_actions, default_agent_description};
pub use catalog::Catalog;
pub use defaults::{action_names, build_default_actions};
pub use error::{CatalogError, CatalogResult};
