//! Room state types
//!
//! A room is a named broadcast domain: the members currently joined and one
//! subscriber per live connection. All of it sits behind the room's own
//! lock, which is only ever held for in-memory bookkeeping and never while
//! a mailbox or a transport is being waited on.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::auth::AuthContext;

use super::error::RegistryError;
use super::mailbox::{mailbox, Mailbox, MailboxSender};
use super::member::Member;
use super::message::{ChatMessage, ConnectionId, RoomId, UserId};

/// Delivery handle for one live connection, kept by the room
#[derive(Debug)]
pub struct Subscriber {
    /// Connection ID
    pub id: ConnectionId,
    /// Member this connection belongs to
    pub member_id: UserId,
    sender: MailboxSender,
}

/// Connection-side result of a successful join
#[derive(Debug)]
pub struct Subscription {
    pub room_id: RoomId,
    pub connection_id: ConnectionId,
    /// Member record as of the join
    pub member: Member,
    /// Receiving end of this connection's mailbox
    pub mailbox: Mailbox,
}

/// Outcome of removing a subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub member_id: UserId,
    /// Whether this was the member's last connection
    pub member_removed: bool,
    pub remaining_subscribers: usize,
}

/// Statistics for a room
#[derive(Debug, Clone)]
pub struct RoomStats {
    pub room_id: RoomId,
    pub member_count: usize,
    pub subscriber_count: usize,
    /// Time since the room was created
    pub age: Duration,
}

#[derive(Debug, Default)]
struct RoomState {
    members: HashMap<UserId, Member>,
    /// Join order
    subscribers: Vec<Subscriber>,
}

/// A single room
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    state: Mutex<RoomState>,
    mailbox_capacity: usize,
    created_at: Instant,
}

impl Room {
    /// Create an empty room
    pub(super) fn new(id: RoomId, mailbox_capacity: usize) -> Self {
        Self {
            id,
            state: Mutex::new(RoomState::default()),
            mailbox_capacity,
            created_at: Instant::now(),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Register a new connection for the caller
    ///
    /// The member entry is created on the user's first join and refreshed on
    /// later ones; `joined_at` keeps its original value.
    pub fn join(&self, auth: &AuthContext) -> Subscription {
        let (sender, mailbox) = mailbox(self.mailbox_capacity);
        let connection_id = ConnectionId::next();

        let mut state = self.state.lock();

        let member = match state.members.entry(auth.user_id.clone()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().display_name = auth.display_name.clone();
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                let member = entry
                    .insert(Member::new(auth.user_id.clone(), auth.display_name.clone()))
                    .clone();
                tracing::info!(room = %self.id, user = %member.id, "Member joined");
                member
            }
        };

        state.subscribers.push(Subscriber {
            id: connection_id,
            member_id: member.id.clone(),
            sender,
        });

        tracing::debug!(
            room = %self.id,
            connection = %connection_id,
            user = %member.id,
            subscribers = state.subscribers.len(),
            "Subscriber added"
        );

        Subscription {
            room_id: self.id.clone(),
            connection_id,
            member,
            mailbox,
        }
    }

    /// Remove a connection
    ///
    /// The member goes with its last connection. Returns `None` if the
    /// connection was already removed.
    pub fn leave(&self, connection_id: ConnectionId) -> Option<Departure> {
        let mut state = self.state.lock();

        let pos = state.subscribers.iter().position(|s| s.id == connection_id)?;
        let subscriber = state.subscribers.remove(pos);

        let member_removed = !state
            .subscribers
            .iter()
            .any(|s| s.member_id == subscriber.member_id);

        if member_removed {
            if state.members.remove(&subscriber.member_id).is_some() {
                tracing::info!(room = %self.id, user = %subscriber.member_id, "Member left");
            } else {
                tracing::error!(
                    room = %self.id,
                    connection = %connection_id,
                    user = %subscriber.member_id,
                    "Subscriber had no member entry"
                );
            }
        }

        tracing::debug!(
            room = %self.id,
            connection = %connection_id,
            subscribers = state.subscribers.len(),
            "Subscriber removed"
        );

        Some(Departure {
            member_id: subscriber.member_id,
            member_removed,
            remaining_subscribers: state.subscribers.len(),
        })
    }

    /// Fan a message out to every current subscriber
    ///
    /// Mailboxes are filled while the room lock is held, so two broadcasts
    /// reach every subscriber in the order they took the lock. `push` never
    /// waits: a full mailbox drops its oldest entry instead of failing the
    /// broadcast. Returns how many mailboxes took the message.
    pub fn broadcast(
        &self,
        message: Arc<ChatMessage>,
        sender: &UserId,
    ) -> Result<usize, RegistryError> {
        let state = self.state.lock();

        if !state.members.contains_key(sender) {
            return Err(RegistryError::NotAMember {
                room: self.id.clone(),
                user: sender.clone(),
            });
        }

        let mut delivered = 0;
        for s in &state.subscribers {
            if !state.members.contains_key(&s.member_id) {
                tracing::error!(
                    room = %self.id,
                    connection = %s.id,
                    user = %s.member_id,
                    "Subscriber had no member entry"
                );
            }

            if s.sender.push(Arc::clone(&message)) {
                delivered += 1;
            } else {
                // Connection task is gone and its teardown has not run yet
                tracing::debug!(
                    room = %self.id,
                    connection = %s.id,
                    "Skipping closed mailbox"
                );
            }
        }
        let subscribers = state.subscribers.len();
        drop(state);

        tracing::debug!(
            room = %self.id,
            message = %message.id,
            recipients = delivered,
            subscribers = subscribers,
            "Message fanned out"
        );

        Ok(delivered)
    }

    /// Look up a current member
    pub fn member(&self, user_id: &UserId) -> Option<Member> {
        self.state.lock().members.get(user_id).cloned()
    }

    /// Snapshot of the current members
    pub fn members(&self) -> Vec<Member> {
        self.state.lock().members.values().cloned().collect()
    }

    pub fn member_count(&self) -> usize {
        self.state.lock().members.len()
    }

    /// Connection IDs of the current subscribers, in join order
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.state.lock().subscribers.iter().map(|s| s.id).collect()
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }

    /// Check if the room has no subscribers
    pub fn is_empty(&self) -> bool {
        self.state.lock().subscribers.is_empty()
    }

    pub fn stats(&self) -> RoomStats {
        let state = self.state.lock();
        RoomStats {
            room_id: self.id.clone(),
            member_count: state.members.len(),
            subscriber_count: state.subscribers.len(),
            age: self.created_at.elapsed(),
        }
    }

    /// Verify the membership bookkeeping
    ///
    /// Every subscriber must belong to a member, every member must have at
    /// least one subscriber, and subscriber IDs must be unique.
    pub fn check_invariants(&self) -> Result<(), RegistryError> {
        let state = self.state.lock();

        let mut seen = HashSet::with_capacity(state.subscribers.len());
        for s in &state.subscribers {
            if !seen.insert(s.id) {
                return Err(self.violation(format!("duplicate subscriber {}", s.id)));
            }
            if !state.members.contains_key(&s.member_id) {
                return Err(self.violation(format!(
                    "subscriber {} owned by missing member {}",
                    s.id, s.member_id
                )));
            }
        }

        for id in state.members.keys() {
            if !state.subscribers.iter().any(|s| &s.member_id == id) {
                return Err(self.violation(format!("member {} has no subscribers", id)));
            }
        }

        Ok(())
    }

    fn violation(&self, detail: String) -> RegistryError {
        tracing::error!(room = %self.id, detail = %detail, "Room invariant violated");
        RegistryError::InvariantViolation(format!("room {}: {}", self.id, detail))
    }
}
