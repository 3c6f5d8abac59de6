//! # Cross-script messaging
//!
//! In-process publish/subscribe used by scripts to signal each other. The
//! module is split the same way the concerns are:
//!
//! ```text
//! messages/
//! ├── bus.rs          - channel-filtered broadcast bus and session identity
//! └── point_index.rs  - the "Hifi-Point-Index" message contract
//! ```
//!
//! The actual cross-process transport a deployment would use is host-owned
//! and out of scope here; this bus is the seam everything in this process
//! talks through.

pub mod bus;
pub mod point_index;

pub use bus::{ChannelMessage, MessageBus, SessionId, Subscription};
pub use point_index::{decode_point_index, MessageError, PointIndexMessage, POINT_INDEX_CHANNEL};
