use std::fmt;

/// What disagreed at one ledger position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainBreakKind {
    /// The stored snapshot digest does not match the stored snapshot.
    SnapshotHashMismatch { expected: String, actual: String },
    /// The stored previous-link does not match the recomputed chain.
    PrevLinkMismatch { expected: String, actual: String },
    /// The stored chain hash does not match the recomputed chain.
    ChainHashMismatch { expected: String, actual: String },
    /// The event has no chain columns although chaining is enabled.
    MissingChain,
}

/// A ledger event that failed verification. Positions are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainBreak {
    pub position: usize,
    pub kind: ChainBreakKind,
}

impl fmt::Display for ChainBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ChainBreakKind::SnapshotHashMismatch { expected, actual } => write!(
                f,
                "event {}: snapshot hash is '{actual}', snapshot digests to '{expected}'",
                self.position
            ),
            ChainBreakKind::PrevLinkMismatch { expected, actual } => write!(
                f,
                "event {}: previous chain hash is '{actual}', expected '{expected}'",
                self.position
            ),
            ChainBreakKind::ChainHashMismatch { expected, actual } => write!(
                f,
                "event {}: chain hash is '{actual}', expected '{expected}'",
                self.position
            ),
            ChainBreakKind::MissingChain => write!(
                f,
                "event {}: chain columns are missing while chaining is enabled",
                self.position
            ),
        }
    }
}

/// Result of recomputing the ledger from genesis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainReport {
    pub events_checked: usize,
    pub chained_events: usize,
    pub breaks: Vec<ChainBreak>,
}

impl ChainReport {
    pub fn is_intact(&self) -> bool {
        self.breaks.is_empty()
    }

    /// Position of the earliest event that failed, if any.
    pub fn first_break(&self) -> Option<usize> {
        self.breaks.first().map(|b| b.position)
    }
}
