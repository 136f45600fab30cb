use crossbeam_channel::{bounded, Receiver, Sender};
use crate::error::{Error, Result};

/// Sending half of an ordered channel. `push` blocks while the channel is full.
pub trait BlockSink<T>: Send {
    fn push(&self, item: T) -> Result<()>;
}

/// Receiving half of an ordered channel. `pull` blocks while the channel is empty.
pub trait BlockSource<T>: Send {
    fn pull(&self) -> Result<T>;
}

/// Bounded in-process channel with a cloneable sending and receiving half.
///
/// Once every sender is dropped, `pull` drains what is left and then fails
/// with `Disconnected`; the same holds for `push` once every receiver is gone.
pub fn memory_queue<T: Send>(capacity: usize) -> (MemorySink<T>, MemorySource<T>) {
    let (tx, rx) = bounded(capacity);
    (MemorySink { tx }, MemorySource { rx })
}

pub struct MemorySink<T> {
    tx: Sender<T>,
}

pub struct MemorySource<T> {
    rx: Receiver<T>,
}

impl<T> Clone for MemorySink<T> {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone() }
    }
}

impl<T> Clone for MemorySource<T> {
    fn clone(&self) -> Self {
        Self { rx: self.rx.clone() }
    }
}

impl<T> MemorySource<T> {
    /// Blocks currently waiting in the channel
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl<T: Send> BlockSink<T> for MemorySink<T> {
    fn push(&self, item: T) -> Result<()> {
        self.tx.send(item).map_err(|_| Error::Disconnected)
    }
}

impl<T: Send> BlockSource<T> for MemorySource<T> {
    fn pull(&self) -> Result<T> {
        self.rx.recv().map_err(|_| Error::Disconnected)
    }
}
