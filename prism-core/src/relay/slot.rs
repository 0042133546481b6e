//! Single-occupancy connection slots.
//!
//! The relay serves exactly one producer and one viewer at a time. A
//! [`RoleSlot`] tracks the current occupant of one of those roles.
//! Claiming an occupied slot displaces the previous occupant: its
//! cancellation token fires, its session winds down, and its socket
//! closes. Release is keyed by claim id so a displaced session tearing
//! itself down can never evict its replacement.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::envelope::Envelope;
use crate::network::ConnectionSender;

/// Outcome of a non-blocking push to the slot occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPush {
    /// Queued on the occupant's connection.
    Sent,
    /// No occupant; the envelope was discarded.
    Empty,
    /// The occupant's queue is full; the envelope was dropped.
    Dropped,
    /// The occupant's connection is gone; the slot has been cleared.
    Closed,
}

#[derive(Debug)]
pub struct RoleSlot {
    role: &'static str,
    next_id: AtomicU64,
    occupant: Mutex<Option<Occupant>>,
}

#[derive(Debug)]
struct Occupant {
    id: u64,
    sender: ConnectionSender,
    cancel: CancellationToken,
}

impl RoleSlot {
    pub fn new(role: &'static str) -> Self {
        Self {
            role,
            next_id: AtomicU64::new(1),
            occupant: Mutex::new(None),
        }
    }

    /// Install a new occupant, displacing and cancelling any current
    /// one. Returns the claim id needed to release the slot.
    pub async fn claim(&self, sender: ConnectionSender, cancel: CancellationToken) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let displaced = {
            let mut slot = self.occupant.lock().await;
            slot.replace(Occupant { id, sender, cancel })
        };
        if let Some(previous) = displaced {
            info!("new {} connection displaces the current one", self.role);
            previous.cancel.cancel();
        }
        id
    }

    /// Clear the slot if the claim identified by `id` still owns it.
    /// Returns false when the slot has already moved on.
    pub async fn release(&self, id: u64) -> bool {
        let mut slot = self.occupant.lock().await;
        if slot.as_ref().is_some_and(|occupant| occupant.id == id) {
            *slot = None;
            return true;
        }
        false
    }

    pub async fn is_occupied(&self) -> bool {
        self.occupant.lock().await.is_some()
    }

    /// Push an envelope to the occupant without blocking the caller.
    ///
    /// A closed occupant is evicted on the spot and its token
    /// cancelled, so one dead viewer costs exactly one push.
    pub async fn push(&self, envelope: Envelope) -> SlotPush {
        let mut slot = self.occupant.lock().await;
        let Some(occupant) = slot.as_ref() else {
            return SlotPush::Empty;
        };
        match occupant.sender.try_send(envelope) {
            Ok(()) => SlotPush::Sent,
            Err(TrySendError::Full(_)) => {
                debug!("{} queue full, envelope dropped", self.role);
                SlotPush::Dropped
            }
            Err(TrySendError::Closed(_)) => {
                if let Some(dead) = slot.take() {
                    dead.cancel.cancel();
                }
                info!("{} connection lost, slot cleared", self.role);
                SlotPush::Closed
            }
        }
    }
}
