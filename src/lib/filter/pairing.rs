//! Mate-pair coordination.
//!
//! Every record offered to the [`PairingCoordinator`] gets the next input sequence
//! number. Records decided per record are released at once. Under a template-level
//! filter a first mate that passes is kept at once and leaves only its name behind, so
//! its partner is kept too. A first mate that fails is held with its decision until its
//! partner arrives; the two are then kept if either mate passed. While a mate is held
//! its sequence number is a gap in the [`ReorderBuffer`], so later records wait behind
//! it and output stays in input order.

use ahash::AHashMap;

use crate::errors::Result;
use crate::filter::record::AlignmentRecord;
use crate::filter::{FilterDecision, Pairing, ReadFilter};
use crate::reorder_buffer::ReorderBuffer;

/// A record leaving the coordinator, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Released<R> {
    Kept(R),
    Dropped,
}

/// A first mate waiting for its partner.
#[derive(Debug)]
enum PendingMate<R> {
    /// Already kept and released; the partner is kept as well.
    Kept,
    /// Failed on its own and held at `seq` until the partner decides for both.
    Held { seq: u64, record: R },
}

/// Applies a [`ReadFilter`] to a record stream, keeping mates consistent.
#[derive(Debug)]
pub struct PairingCoordinator<R> {
    pending: AHashMap<Vec<u8>, PendingMate<R>>,
    released: ReorderBuffer<Released<R>>,
    next_seq: u64,
}

impl<R> Default for PairingCoordinator<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> PairingCoordinator<R> {
    #[must_use]
    pub fn new() -> Self {
        Self { pending: AHashMap::new(), released: ReorderBuffer::new(), next_seq: 0 }
    }

    /// Number of first mates waiting for their partner, released or not.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Next released record, or `None` if the next one in input order is still pending.
    pub fn pop_ready(&mut self) -> Option<Released<R>> {
        self.released.try_pop_next()
    }

    /// Resolves every pending mate on its own decision and returns how many there were.
    ///
    /// After this, [`pop_ready`](Self::pop_ready) yields every remaining record.
    pub fn finish(&mut self) -> u64 {
        let orphans = self.pending.len() as u64;
        for (_, mate) in self.pending.drain() {
            if let PendingMate::Held { seq, record } = mate {
                Self::release(&mut self.released, seq, record, false);
            }
        }
        orphans
    }

    fn release(released: &mut ReorderBuffer<Released<R>>, seq: u64, record: R, keep: bool) {
        let item = if keep { Released::Kept(record) } else { Released::Dropped };
        released.insert(seq, item);
    }
}

impl<R: AlignmentRecord> PairingCoordinator<R> {
    /// Decides `record` with `filter` and queues it for release.
    ///
    /// Returns [`FilterDecision::Defer`] for a failing first mate held for its partner.
    /// A passing first mate is released at once as [`FilterDecision::Keep`]. When the
    /// partner arrives the returned decision applies to both mates.
    ///
    /// # Errors
    ///
    /// Returns the filter's error; the record is not queued.
    pub fn push(&mut self, filter: &mut ReadFilter<R>, record: R) -> Result<FilterDecision> {
        let keep = filter.decide(&record)?;
        let seq = self.next_seq;
        self.next_seq += 1;

        let template_name = match filter.pairing(&record) {
            Pairing::Template => record.read_name().map(<[u8]>::to_vec),
            Pairing::PerRecord => None,
        };
        let Some(name) = template_name else {
            Self::release(&mut self.released, seq, record, keep);
            return Ok(decision(keep));
        };

        match self.pending.remove(&name) {
            Some(PendingMate::Kept) => {
                Self::release(&mut self.released, seq, record, true);
                Ok(FilterDecision::Keep)
            }
            Some(PendingMate::Held { seq: mate_seq, record: mate }) => {
                Self::release(&mut self.released, mate_seq, mate, keep);
                Self::release(&mut self.released, seq, record, keep);
                Ok(decision(keep))
            }
            None if keep => {
                self.pending.insert(name, PendingMate::Kept);
                Self::release(&mut self.released, seq, record, true);
                Ok(FilterDecision::Keep)
            }
            None => {
                self.pending.insert(name, PendingMate::Held { seq, record });
                Ok(FilterDecision::Defer)
            }
        }
    }
}

fn decision(keep: bool) -> FilterDecision {
    if keep { FilterDecision::Keep } else { FilterDecision::Drop }
}
