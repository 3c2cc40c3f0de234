//! Join stream lifecycle
//!
//! One [`StreamSession`] per connected client, moving through
//! `Connecting → Joined → Streaming → Closing → Closed`.

pub mod sink;
pub mod state;
pub mod stream;

pub use sink::{MessageSink, TransportError};
pub use state::{CloseReason, StreamPhase, StreamState};
pub use stream::StreamSession;
