use log::debug;

use super::{Block, BlockSink};
use crate::error::{Error, Result};

/// Buffers items into fixed-size blocks and pushes them with contiguous
/// sequence numbers starting at 0.
pub struct BlockProducer<T, S> {
    sink: S,
    batch_size: usize,
    pending: Vec<T>,
    next_sequence: u64,
    items_pushed: u64,
}

impl<T, S> BlockProducer<T, S>
where
    S: BlockSink<Block<T>>,
{
    pub fn new(sink: S, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::InvalidConfig("batch size must be at least 1".into()));
        }
        Ok(Self {
            sink,
            batch_size,
            pending: Vec::with_capacity(batch_size),
            next_sequence: 0,
            items_pushed: 0,
        })
    }

    /// Add one item; blocks on a full queue when this completes a block
    pub fn push(&mut self, item: T) -> Result<()> {
        self.pending.push(item);
        self.items_pushed += 1;
        if self.pending.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    pub fn push_all<I>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        for item in items {
            self.push(item)?;
        }
        Ok(())
    }

    /// Number of the next block to be pushed
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    pub fn items_pushed(&self) -> u64 {
        self.items_pushed
    }

    /// Push any partial block, then the sentinel. Returns the sentinel's
    /// sequence number.
    pub fn shutdown(mut self) -> Result<u64> {
        self.flush()?;
        let sequence = self.next_sequence;
        self.sink.push(Block::Sentinel { sequence })?;
        debug!(
            "Producer shut down after {} items in {} blocks",
            self.items_pushed, sequence
        );
        Ok(sequence)
    }

    fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let items = std::mem::replace(&mut self.pending, Vec::with_capacity(self.batch_size));
        let sequence = self.next_sequence;
        self.sink.push(Block::Data { sequence, items })?;
        self.next_sequence += 1;
        Ok(())
    }
}
