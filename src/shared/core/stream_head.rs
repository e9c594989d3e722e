use serde::{Deserialize, Serialize};

/// Versioned cursor of a stream. Version 0 means the stream is empty or does not exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamHead {
    pub version: u64,
}

impl StreamHead {
    pub const EMPTY: StreamHead = StreamHead { version: 0 };

    pub fn new(version: u64) -> Self {
        Self { version }
    }

    pub fn advanced_by(self, count: usize) -> Self {
        Self {
            version: self.version + count as u64,
        }
    }
}
