//! Exit-code discipline shared between the runner and the CLI.

/// The runner's exit code for a single script run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Every step succeeded.
    Success,
    /// A step failed: resolution failed, the action failed, or an assertion
    /// failed.
    StepFailure,
    /// A timeout or infrastructure error (browser launch, disk, vault).
    Infrastructure,
    /// Reserved for a script skipped by batch-bail semantics.
    Skipped,
}

impl ExitCode {
    /// The process exit code a script run reports: `0` success, `1` step
    /// failure, `2` infrastructure failure, `-1` skipped.
    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::StepFailure => 1,
            Self::Infrastructure => 2,
            Self::Skipped => -1,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(value: ExitCode) -> Self {
        value.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_spec() {
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(ExitCode::StepFailure.code(), 1);
        assert_eq!(ExitCode::Infrastructure.code(), 2);
        assert_eq!(ExitCode::Skipped.code(), -1);
    }
}
