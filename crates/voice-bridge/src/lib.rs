//! Voice-session bridge
//!
//! Connects a remote voice agent to the rendered page. The agent's commands
//! arrive through up to five redundant channels of the session transport
//! (data messages, raw payloads, participant metadata, transcripts and a
//! metadata poll); the bridge folds them into one inbound stream, drops
//! duplicates, and hands each command to the navigation dispatcher or the
//! action executor. Results and page summaries flow back over the same
//! transport.
//!
//! Hosts plug in through [`ports`]; [`memory`] provides in-process adapters
//! used by the CLI replay command and the tests.

pub mod codec;
pub mod content;
pub mod dedup;
pub mod errors;
pub mod memory;
pub mod model;
pub mod multiplexer;
pub mod navigation;
pub mod policy;
pub mod ports;
pub mod routes;
pub mod session;

pub use content::{snapshot, PageContentReporter, PageContentSnapshot, SnapshotLimits};
pub use errors::{BridgeError, BridgeResult};
pub use model::*;
pub use multiplexer::Multiplexer;
pub use navigation::NavigationDispatcher;
pub use policy::BridgePolicy;
pub use ports::BridgePorts;
pub use routes::RouteTable;
pub use session::{SessionScope, VoiceBridge};
