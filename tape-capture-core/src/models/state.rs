use super::error::CaptureError;

/// Capture session state machine.
///
/// State transitions:
/// ```text
/// idle → recording ↔ paused
///            ↓         ↓
///        finalizing ───┴→ succeeded / failed
///
/// recording / paused → skipped
/// any non-terminal   → cancelled
/// any active         → failed (system)
/// ```
#[derive(Debug, Clone)]
pub enum SessionState {
    Idle,
    Recording { duration_secs: f64 },
    Paused { duration_secs: f64 },
    Finalizing,
    Succeeded { duration_secs: f64 },
    Failed(CaptureError),
    Skipped,
    Cancelled,
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording { .. })
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused { .. })
    }

    /// Recording or paused: hardware is held and a tape file is open.
    pub fn is_active(&self) -> bool {
        self.is_recording() || self.is_paused()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded { .. } | Self::Failed(_) | Self::Skipped | Self::Cancelled
        )
    }

    /// Returns the elapsed duration if the state tracks it.
    pub fn duration(&self) -> Option<f64> {
        match self {
            Self::Recording { duration_secs }
            | Self::Paused { duration_secs }
            | Self::Succeeded { duration_secs } => Some(*duration_secs),
            _ => None,
        }
    }

    /// Short lowercase name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording { .. } => "recording",
            Self::Paused { .. } => "paused",
            Self::Finalizing => "finalizing",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed(_) => "failed",
            Self::Skipped => "skipped",
            Self::Cancelled => "cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!SessionState::Idle.is_terminal());
        assert!(!SessionState::Recording { duration_secs: 1.0 }.is_terminal());
        assert!(!SessionState::Finalizing.is_terminal());
        assert!(SessionState::Succeeded { duration_secs: 21.0 }.is_terminal());
        assert!(SessionState::Failed(CaptureError::TooShort).is_terminal());
        assert!(SessionState::Skipped.is_terminal());
        assert!(SessionState::Cancelled.is_terminal());
    }

    #[test]
    fn duration_tracked_while_active() {
        assert_eq!(SessionState::Paused { duration_secs: 10.0 }.duration(), Some(10.0));
        assert!(SessionState::Paused { duration_secs: 10.0 }.is_active());
        assert_eq!(SessionState::Idle.duration(), None);
        assert_eq!(SessionState::Skipped.duration(), None);
    }
}
