//! Block-chunked producer/consumer with order reconstruction.
//!
//! The ordering logic only sees the `BlockSink`/`BlockSource` traits, so the
//! in-memory and wire transports behave the same.

pub mod block;
pub mod ordered;
pub mod producer;
pub mod queue;
pub mod wire;

pub use block::Block;
pub use ordered::OrderedReceiver;
pub use producer::BlockProducer;
pub use queue::{memory_queue, BlockSink, BlockSource, MemorySink, MemorySource};
pub use wire::{WireSink, WireSource};
