//! Backend adapters for the relay.
//!
//! Each backend turns the inbound conversation into its native payload,
//! hands it to a connector and drains the resulting fragment channel
//! through the core consumer. Transports live behind the connector traits.

pub mod backend;
pub mod connector;
pub mod coze;
pub mod echo;
pub mod image;
pub mod kind;
pub mod lmsys;
pub mod role;
pub mod tiktoken;
pub mod toolcall;

pub use backend::{BackendRegistry, ChatBackend};
pub use connector::{CozeConnector, CozeMessage, LmsysConnector};
pub use coze::CozeBackend;
pub use kind::{BackendKind, BackendTarget};
pub use lmsys::LmsysBackend;
pub use role::{RoleTemplate, is_claude};
pub use tiktoken::TiktokenEstimator;
pub use toolcall::extract_tool_messages;
