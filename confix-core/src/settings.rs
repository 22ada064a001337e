//! Clap-free settings for the resolve pipeline and solve sessions.

use confix_edit::ApplyOptions;
use serde::Deserialize;

/// What a session does when a solve is requested while another is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusyPolicy {
    /// Cancel the running solve and queue the new one behind it.
    #[default]
    CancelPrevious,
    /// Refuse the new request with `SessionError::Busy`.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveSettings {
    /// Log candidate diagnoses at info level instead of debug.
    pub verbose: bool,

    /// Persist the model after a successful apply.
    pub persist: bool,

    /// Write passes per apply attempt; `None` allows one per pending write.
    pub max_passes: Option<usize>,

    pub on_busy: BusyPolicy,
}

impl Default for ResolveSettings {
    fn default() -> Self {
        Self {
            verbose: false,
            persist: true,
            max_passes: None,
            on_busy: BusyPolicy::default(),
        }
    }
}

impl ResolveSettings {
    pub fn apply_options(&self) -> ApplyOptions {
        ApplyOptions {
            max_passes: self.max_passes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_persist_and_cancel_previous() {
        let s = ResolveSettings::default();
        assert!(s.persist);
        assert!(!s.verbose);
        assert_eq!(s.on_busy, BusyPolicy::CancelPrevious);
        assert_eq!(s.apply_options().max_passes, None);
    }
}
