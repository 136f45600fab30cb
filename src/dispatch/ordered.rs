use log::{debug, warn};
use std::collections::{BTreeMap, VecDeque};

use super::{Block, BlockSource};
use crate::error::{Error, Result};

/// Yields the items of pulled blocks in sequence-number order, whatever
/// order the blocks arrive in.
///
/// Out-of-order blocks are held until every lower sequence number has been
/// yielded. Iteration ends when the sentinel becomes the next expected block;
/// a sentinel that arrives early is held like any other block. A sequence
/// number that never arrives makes `next` wait on the source indefinitely.
pub struct OrderedReceiver<T, S> {
    source: S,
    next_expected: u64,
    pending: BTreeMap<u64, Block<T>>,
    ready: VecDeque<T>,
    max_pending: usize,
    finished: bool,
}

impl<T, S> OrderedReceiver<T, S>
where
    S: BlockSource<Block<T>>,
{
    pub fn new(source: S) -> Self {
        Self {
            source,
            next_expected: 0,
            pending: BTreeMap::new(),
            ready: VecDeque::new(),
            max_pending: 0,
            finished: false,
        }
    }

    pub fn next_expected(&self) -> u64 {
        self.next_expected
    }

    /// Blocks currently held back waiting for a predecessor
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Largest number of blocks ever held back at once
    pub fn max_pending(&self) -> usize {
        self.max_pending
    }

    fn accept(&mut self, block: Block<T>) {
        self.next_expected += 1;
        match block {
            Block::Data { items, .. } => self.ready.extend(items),
            Block::Sentinel { sequence } => {
                if !self.pending.is_empty() {
                    warn!(
                        "Sentinel {} consumed with {} blocks still held",
                        sequence,
                        self.pending.len()
                    );
                }
                self.finished = true;
            }
        }
    }

    fn receive(&mut self, block: Block<T>) -> Result<()> {
        let sequence = block.sequence();
        if sequence < self.next_expected || self.pending.contains_key(&sequence) {
            return Err(Error::DuplicateSequence(sequence));
        }
        if sequence == self.next_expected {
            self.accept(block);
        } else {
            debug!(
                "Holding block {} while waiting for block {}",
                sequence, self.next_expected
            );
            self.pending.insert(sequence, block);
            self.max_pending = self.max_pending.max(self.pending.len());
        }
        Ok(())
    }
}

impl<T, S> Iterator for OrderedReceiver<T, S>
where
    S: BlockSource<Block<T>>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.ready.pop_front() {
                return Some(Ok(item));
            }
            if self.finished {
                return None;
            }
            if let Some(block) = self.pending.remove(&self.next_expected) {
                self.accept(block);
                continue;
            }

            let received = self.source.pull().and_then(|block| self.receive(block));
            if let Err(e) = received {
                self.finished = true;
                return Some(Err(e));
            }
        }
    }
}
