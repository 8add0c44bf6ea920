use std::collections::HashMap;

/// Handle for one like click, passed back with the server's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeTicket {
    pub post_id: i64,
    /// Liked state the click asked for
    pub liked: bool,
    seq: u64,
}

/// What happened to the list when a like response arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikeOutcome {
    /// Server counter adopted
    Confirmed { likes_count: i64 },
    /// Optimistic change undone; carries the error shown to the user
    RolledBack(String),
    /// A later click or a reset owns this post now
    Superseded,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct PendingLike {
    seq: u64,
    pub(crate) was_liked: bool,
    pub(crate) previous_count: i64,
}

/// Like clicks whose request has not come back yet.
///
/// Only the most recent click per post is tracked; earlier responses for the
/// same post are recognised as superseded and ignored.
#[derive(Debug, Default)]
pub struct LikeOverlay {
    pending: HashMap<i64, PendingLike>,
    next_seq: u64,
}

impl LikeOverlay {
    pub(crate) fn record(&mut self, post_id: i64, was_liked: bool, previous_count: i64) -> LikeTicket {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.pending.insert(
            post_id,
            PendingLike {
                seq,
                was_liked,
                previous_count,
            },
        );
        LikeTicket {
            post_id,
            liked: !was_liked,
            seq,
        }
    }

    /// Remove and return the pending entry if `ticket` is still the latest click.
    pub(crate) fn settle(&mut self, ticket: &LikeTicket) -> Option<PendingLike> {
        match self.pending.get(&ticket.post_id) {
            Some(pending) if pending.seq == ticket.seq => self.pending.remove(&ticket.post_id),
            _ => None,
        }
    }

    /// Latest unanswered click on `post_id`.
    pub(crate) fn pending(&self, post_id: i64) -> Option<&PendingLike> {
        self.pending.get(&post_id)
    }

    pub fn is_pending(&self, post_id: i64) -> bool {
        self.pending.contains_key(&post_id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.pending.clear();
    }
}
