//! Per-folder status values reported by the daemon.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::EventError;

/// Completion percentage of a folder on a device, always within `[0, 100]`.
#[derive(Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Completion(f64);

impl Completion {
    /// Nothing obtained yet.
    pub const EMPTY: Completion = Completion(0.0);

    /// Fully synchronized. Also the assumed value for anything not yet reported.
    pub const FULL: Completion = Completion(100.0);

    /// Build a completion from a daemon-reported value, clamping it into range.
    ///
    /// Returns `None` for NaN and infinities, which cannot be clamped meaningfully.
    pub fn clamped(value: f64) -> Option<Self> {
        if value.is_finite() {
            Some(Self(value.clamp(Self::EMPTY.0, Self::FULL.0)))
        } else {
            None
        }
    }

    /// The percentage as a float.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Whether the folder is fully synchronized.
    pub fn is_complete(&self) -> bool {
        self.0 >= Self::FULL.0
    }
}

impl Default for Completion {
    fn default() -> Self {
        Self::FULL
    }
}

impl TryFrom<f64> for Completion {
    type Error = EventError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::clamped(value).ok_or(EventError::InvalidCompletion(value))
    }
}

impl From<Completion> for f64 {
    fn from(value: Completion) -> f64 {
        value.0
    }
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Completion({})", self.0)
    }
}

/// Coarse status of a folder.
///
/// Parses from and renders to the daemon's lowercase tags. Tags the model
/// does not know are kept verbatim in [`FolderState::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FolderState {
    /// Nothing to do.
    Idle,
    /// Hashing local changes.
    Scanning,
    /// Queued for a scan.
    ScanWaiting,
    /// Working out what to pull.
    SyncPreparing,
    /// Pulling changes from peers.
    Syncing,
    /// Cleaning up versions or temporary files.
    Cleaning,
    /// Stopped on an error.
    Error,
    /// The daemon does not know the state.
    Unknown,
    /// Any other tag, kept verbatim.
    Other(String),
}

impl FolderState {
    /// The daemon tag for this state.
    pub fn as_str(&self) -> &str {
        match self {
            FolderState::Idle => "idle",
            FolderState::Scanning => "scanning",
            FolderState::ScanWaiting => "scan-waiting",
            FolderState::SyncPreparing => "sync-preparing",
            FolderState::Syncing => "syncing",
            FolderState::Cleaning => "cleaning",
            FolderState::Error => "error",
            FolderState::Unknown => "unknown",
            FolderState::Other(tag) => tag,
        }
    }

    /// Whether the folder is actively doing work.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            FolderState::Scanning
                | FolderState::SyncPreparing
                | FolderState::Syncing
                | FolderState::Cleaning
        )
    }
}

impl From<&str> for FolderState {
    fn from(tag: &str) -> Self {
        match tag {
            "idle" => FolderState::Idle,
            "scanning" => FolderState::Scanning,
            "scan-waiting" => FolderState::ScanWaiting,
            "sync-preparing" => FolderState::SyncPreparing,
            "syncing" => FolderState::Syncing,
            "cleaning" => FolderState::Cleaning,
            "error" => FolderState::Error,
            "unknown" => FolderState::Unknown,
            other => FolderState::Other(other.to_string()),
        }
    }
}

impl From<String> for FolderState {
    fn from(tag: String) -> Self {
        FolderState::from(tag.as_str())
    }
}

impl From<FolderState> for String {
    fn from(state: FolderState) -> String {
        match state {
            FolderState::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for FolderState {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(FolderState::from(s))
    }
}

impl fmt::Display for FolderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
