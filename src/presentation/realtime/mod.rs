//! Realtime Layer
//!
//! WebSocket presence and messaging hub.
//!
//! One persistent connection per client, authenticated by a bearer token on
//! the first frame. The hub tracks which users are reachable, announces
//! presence changes, and routes message/typing/read events. Delivery is
//! at-most-one-hop: events to unreachable recipients are dropped, never
//! queued. Message content durability is a store write that happens
//! independently of delivery.

pub mod events;
pub mod handler;
pub mod hub;
pub mod router;

pub use events::{ClientEvent, ServerEvent};
pub use handler::realtime_handler;
pub use hub::{ConnectionId, Hub};
pub use router::ChatRouter;
