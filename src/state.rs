//! State machine types and validation for stackwm.
//!
//! Client lifecycle:
//!
//! ```text
//!                  MapRequest (unknown window)
//!   ┌───────────┐ ─────────────────────────────► ┌────────┐
//!   │ Unmanaged │                                │ Framed │ ◄── MapRequest (known): re-show
//!   └───────────┘ ◄───────────────────────────── └───┬────┘
//!                  DestroyNotify                     │ close binding
//!                  (entry removed, frame destroyed)  ▼
//!                                           close requested, still Framed
//!                                           until DestroyNotify arrives
//! ```
//!
//! Focus is `None` only while no client is framed.

use serde::{Deserialize, Serialize};

/// State violations that can be detected
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StateViolation {
    pub kind: ViolationKind,
    pub description: String,
}

impl StateViolation {
    pub fn new(kind: ViolationKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }
}

/// Types of state violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Two entries share an application window
    DuplicateWindow,
    /// Two entries share a frame
    DuplicateFrame,
    /// Entries unreachable from the head, or a cycle
    BrokenLinks,
    /// Focus points at a removed client
    InvalidFocus,
    /// Focus is empty while clients exist
    MissingFocus,
    /// Master count outside 1..=max(1, clients)
    MastersOutOfBounds,
}

/// State transition events that can be traced
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum StateTransition {
    /// Window was framed and added to the registry
    ClientManaged { window: u32, frame: u32 },
    /// Window was removed from the registry
    ClientUnmanaged { window: u32, reason: UnmanageReason },
    /// Focus changed to a different window
    FocusChanged { from: Option<u32>, to: Option<u32> },
    /// Master count changed
    MastersChanged { from: usize, to: usize },
    /// The close binding asked a client to go away
    CloseRequested { window: u32, polite: bool },
}

/// Reason a window was unmanaged
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmanageReason {
    /// Client destroyed the window
    ClientDestroyed,
}
