use std::fmt;

/// Identifies one render pass of one document.
///
/// Generations are minted in increasing order by the batch tracker; a report
/// carrying an older generation belongs to a superseded pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Generation(u64);

impl Generation {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Why a reference resolved to a failure placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FailureKind {
    /// The network collaborator could not deliver bytes.
    Network,
    /// Bytes arrived (or were cached) but are not a decodable image.
    Decode,
    /// The host abandoned interest before the fetch finished.
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureKind::Network => "network",
            FailureKind::Decode => "decode",
            FailureKind::Cancelled => "cancelled",
        })
    }
}

/// Terminal state of one reference within one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// `fetched` is true when the bytes came from the network this pass.
    Succeeded { fetched: bool },
    Failed(FailureKind),
}

/// Fired once per generation, after every expected reference reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatchComplete {
    pub generation: Generation,
    pub expected: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// References that were not on disk when the pass started and arrived
    /// over the network.
    pub fetched: usize,
}

impl BatchComplete {
    /// A pass that fetched nothing already showed everything it could; a
    /// re-render would look identical.
    pub fn needs_rerender(&self) -> bool {
        self.fetched > 0
    }
}
