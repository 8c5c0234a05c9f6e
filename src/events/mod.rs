//! Live playback control channel
//!
//! A registry of per-viewer bounded queues. Publishing fans one serialized
//! message out to every registered viewer without waiting on any of them;
//! each viewer drains its own queue from its own stream task.

mod hub;
mod message;
mod stream;

pub use hub::{BroadcastHub, PublishReport, Subscription};
pub use message::{ControlCommand, EventMessage, EventType};
pub use stream::{frame_stream, Frame};
