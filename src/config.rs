//! Reconciler configuration.
//!
//! One config per mounted root, fixed at [`create_container_with_config`].
//!
//! [`create_container_with_config`]: crate::reconciler::create_container_with_config

/// Default bound on `perform_unit_of_work` calls in a single render.
pub const DEFAULT_MAX_WORK_UNITS: usize = 100_000;

/// Per-root reconciler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Maximum units of work one render may take before it is abandoned.
    pub max_work_units: usize,
    /// Log each commit summary at `info` instead of `debug`.
    pub log_commits: bool,
}

impl ReconcilerConfig {
    /// Default configuration.
    pub const fn new() -> Self {
        Self {
            max_work_units: DEFAULT_MAX_WORK_UNITS,
            log_commits: false,
        }
    }

    /// Set the work unit bound.
    pub const fn with_max_work_units(mut self, limit: usize) -> Self {
        self.max_work_units = limit;
        self
    }

    /// Enable or disable info-level commit summaries.
    pub const fn with_log_commits(mut self, enabled: bool) -> Self {
        self.log_commits = enabled;
        self
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self::new()
    }
}
