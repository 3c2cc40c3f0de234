//! Stream state machine
//!
//! Tracks one join stream from connection to teardown.

use std::time::{Duration, Instant};

use crate::registry::{ConnectionId, RoomId, UserId};

use super::sink::TransportError;

/// Stream lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    /// Identity known, not yet in the room
    Connecting,
    /// Subscriber registered with the room
    Joined,
    /// Pumping the mailbox into the transport
    Streaming,
    /// Leaving the room
    Closing,
    /// Terminal
    Closed,
}

/// Why a stream ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Client went away or the caller cancelled the stream
    Cancelled,
    /// Writing to the outbound transport failed
    Transport(TransportError),
    /// The room dropped this subscriber
    Evicted,
}

/// Complete stream state
#[derive(Debug)]
pub struct StreamState {
    /// Target room
    pub room_id: RoomId,

    /// Owning user
    pub user_id: UserId,

    /// Current phase
    pub phase: StreamPhase,

    /// Connection ID, assigned on join
    pub connection_id: Option<ConnectionId>,

    /// Stream start time
    pub connected_at: Instant,

    /// Time when the join completed
    pub joined_at: Option<Instant>,

    /// Messages written to the transport
    pub delivered: u64,

    /// Messages lost to mailbox overflow
    pub dropped: u64,

    /// First reason the stream started closing
    pub close_reason: Option<CloseReason>,
}

impl StreamState {
    /// Create a new stream state
    pub fn new(room_id: RoomId, user_id: UserId) -> Self {
        Self {
            room_id,
            user_id,
            phase: StreamPhase::Connecting,
            connection_id: None,
            connected_at: Instant::now(),
            joined_at: None,
            delivered: 0,
            dropped: 0,
            close_reason: None,
        }
    }

    /// Record a completed join
    pub fn on_joined(&mut self, connection_id: ConnectionId) {
        if self.phase == StreamPhase::Connecting {
            self.phase = StreamPhase::Joined;
            self.connection_id = Some(connection_id);
            self.joined_at = Some(Instant::now());
        }
    }

    /// Start delivering
    pub fn start_streaming(&mut self) {
        if self.phase == StreamPhase::Joined {
            self.phase = StreamPhase::Streaming;
        }
    }

    /// Count one message written to the transport
    pub fn on_delivered(&mut self) {
        self.delivered += 1;
    }

    /// Start closing
    ///
    /// Only the first reason is kept. Returns `false` if the stream was
    /// already closing or closed.
    pub fn begin_close(&mut self, reason: CloseReason) -> bool {
        match self.phase {
            StreamPhase::Closing | StreamPhase::Closed => false,
            _ => {
                self.phase = StreamPhase::Closing;
                self.close_reason = Some(reason);
                true
            }
        }
    }

    /// Finish closing
    pub fn on_closed(&mut self) {
        if self.phase == StreamPhase::Closing {
            self.phase = StreamPhase::Closed;
        }
    }

    /// Check if the stream is delivering
    pub fn is_streaming(&self) -> bool {
        self.phase == StreamPhase::Streaming
    }

    pub fn is_closed(&self) -> bool {
        self.phase == StreamPhase::Closed
    }

    /// Get stream duration
    pub fn duration(&self) -> Duration {
        self.connected_at.elapsed()
    }
}
