//! Stale-response detection for overlapping cart requests.
//!
//! Every network-bound store operation takes a [`Ticket`] before its first
//! request. When the response lands, the store asks the sequencer whether
//! it may still be applied.
//!
//! Every response the store installs carries the whole cart, including the
//! line-level mutations (`update_quantity` re-fetches, `remove_item` returns
//! the remaining cart). A response for one line therefore also describes
//! every other line, so a single ordering covers them all: a response
//! applies only if its ticket is newer than every ticket applied so far.
//! Older responses are discarded instead of overwriting newer state with an
//! older server view.

/// Monotonic sequence number attached to one store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    /// Get the raw sequence number.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Issues tickets and tracks the newest applied one.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    issued: u64,
    applied: u64,
}

impl RequestSequencer {
    /// Create a sequencer with nothing issued.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next ticket.
    pub const fn issue(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    /// Record `ticket` as applied if no newer ticket has been.
    ///
    /// Returns `false` when the response must be discarded.
    pub const fn try_apply(&mut self, ticket: Ticket) -> bool {
        if ticket.0 <= self.applied {
            return false;
        }
        self.applied = ticket.0;
        true
    }
}
