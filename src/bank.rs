// Particle banking for secondaries produced during collisions.
//
// Each worker keeps a thread-local bank for the history it is tracking; the
// driver merges/splices per-thread banks after the fact, so the ordering
// operations here are the only place ordering guarantees exist.

use std::collections::VecDeque;

use crate::particle::ParticleState;
use crate::reaction::{NuclearReactionKind, ReactionKind};

/// Destination for secondaries produced by a reaction law.
///
/// `push_with_reaction` defaults to a plain push; specialized banks override
/// it to filter on the producing reaction (see [`FissionBank`]).
pub trait SecondaryBank {
    fn push(&mut self, state: ParticleState);

    fn push_with_reaction(&mut self, state: ParticleState, _reaction: ReactionKind) {
        self.push(state);
    }
}

/// FIFO queue of pending particle states.
///
/// Pushing transfers ownership of the state to the bank; popping transfers it
/// back to the caller. Popping or peeking an empty bank is a precondition
/// violation and panics: it indicates a driver bug, not a recoverable
/// condition.
#[derive(Debug, Default, Clone)]
pub struct ParticleBank {
    queue: VecDeque<ParticleState>,
}

impl ParticleBank {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Next state to be popped.
    pub fn top(&self) -> &ParticleState {
        self.queue.front().expect("top() called on an empty particle bank")
    }

    /// Remove and return the next state.
    pub fn pop(&mut self) -> ParticleState {
        self.queue.pop_front().expect("pop() called on an empty particle bank")
    }

    /// True if the bank is sorted under `cmp` (front to back).
    pub fn is_sorted_by<F>(&self, mut cmp: F) -> bool
    where
        F: FnMut(&ParticleState, &ParticleState) -> std::cmp::Ordering,
    {
        let mut iter = self.queue.iter();
        if let Some(mut prev) = iter.next() {
            for next in iter {
                if cmp(prev, next) == std::cmp::Ordering::Greater {
                    return false;
                }
                prev = next;
            }
        }
        true
    }

    /// Stable sort under `cmp`.
    pub fn sort_by<F>(&mut self, cmp: F)
    where
        F: FnMut(&ParticleState, &ParticleState) -> std::cmp::Ordering,
    {
        self.queue.make_contiguous().sort_by(cmp);
    }

    /// Stable merge of `other` into `self` under `cmp`. Both banks must
    /// already be sorted under `cmp` (checked); `other` is left empty.
    pub fn merge<F>(&mut self, other: &mut ParticleBank, mut cmp: F)
    where
        F: FnMut(&ParticleState, &ParticleState) -> std::cmp::Ordering,
    {
        assert!(
            self.is_sorted_by(&mut cmp),
            "merge() requires the destination bank to be sorted"
        );
        assert!(
            other.is_sorted_by(&mut cmp),
            "merge() requires the source bank to be sorted"
        );

        let mut merged = VecDeque::with_capacity(self.len() + other.len());
        loop {
            match (self.queue.front(), other.queue.front()) {
                (Some(a), Some(b)) => {
                    // <= keeps the merge stable: ties favor the destination
                    if cmp(a, b) != std::cmp::Ordering::Greater {
                        merged.push_back(self.queue.pop_front().unwrap());
                    } else {
                        merged.push_back(other.queue.pop_front().unwrap());
                    }
                }
                (Some(_), None) => merged.push_back(self.queue.pop_front().unwrap()),
                (None, Some(_)) => merged.push_back(other.queue.pop_front().unwrap()),
                (None, None) => break,
            }
        }
        self.queue = merged;
    }

    /// Append all of `other` in its original order; `other` is left empty.
    pub fn splice(&mut self, other: &mut ParticleBank) {
        self.queue.append(&mut other.queue);
    }
}

impl SecondaryBank for ParticleBank {
    fn push(&mut self, state: ParticleState) {
        self.queue.push_back(state);
    }
}

/// Bank that keeps only fission-produced states; every other push is dropped.
/// Used to collect fission sites separately from the transport secondaries.
#[derive(Debug, Default)]
pub struct FissionBank {
    inner: ParticleBank,
}

impl FissionBank {
    pub fn new() -> Self {
        Self {
            inner: ParticleBank::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn pop(&mut self) -> ParticleState {
        self.inner.pop()
    }

    /// Drain the collected sites into an ordinary bank.
    pub fn into_bank(self) -> ParticleBank {
        self.inner
    }
}

impl SecondaryBank for FissionBank {
    fn push(&mut self, _state: ParticleState) {
        // Direct pushes carry no reaction code and cannot be classified.
    }

    fn push_with_reaction(&mut self, state: ParticleState, reaction: ReactionKind) {
        if reaction == ReactionKind::Nuclear(NuclearReactionKind::Fission) {
            self.inner.push(state);
        }
    }
}
