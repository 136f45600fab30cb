use serde::{Deserialize, Serialize};

/// Sequence-numbered unit of transfer across the dispatch boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Block<T> {
    Data { sequence: u64, items: Vec<T> },

    /// No further data follows; numbered one past the last data block
    Sentinel { sequence: u64 },
}

impl<T> Block<T> {
    pub fn sequence(&self) -> u64 {
        match self {
            Block::Data { sequence, .. } | Block::Sentinel { sequence } => *sequence,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, Block::Sentinel { .. })
    }

    pub fn len(&self) -> usize {
        match self {
            Block::Data { items, .. } => items.len(),
            Block::Sentinel { .. } => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
