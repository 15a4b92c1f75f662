//! Framed transport (C2) and readiness multiplexer (C3) for the chat relay.
//!
//! Sockets are registered with `mio` (non-blocking under the hood) but
//! [`framing::send_all`]/[`framing::recv_frame`] retry across `WouldBlock`
//! rather than surfacing it, so from the dispatcher's point of view a
//! readable connection behaves like a blocking one — matching the source
//! protocol's assumption (spec-carried: a slow peer may stall the single
//! dispatcher thread, which is an accepted limitation, not a bug).

mod error;
pub mod framing;
mod multiplexer;
mod reader;

pub use error::NetError;
pub use multiplexer::{Handle, Multiplexer, Ready};
pub use reader::{FrameReader, RxOutcome};
