//! Issue reporting capability
//!
//! The rule engine never stores issues itself; it hands each one to an injected
//! [`IssueReporter`]. Reporting is best effort: a failing reporter is logged and
//! the remaining issues are still delivered.

use crate::Result;
use crate::app::models::{QualityIssue, Severity};
use tracing::{info, warn};

/// Receives quality issues one at a time, in emission order
pub trait IssueReporter: Send {
    fn report(&mut self, issue: &QualityIssue) -> Result<()>;
}

/// Counts of issues delivered to, and rejected by, a reporter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOutcome {
    pub delivered: usize,
    pub failed: usize,
}

impl ReportOutcome {
    pub fn total(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Writes each issue to the tracing log
///
/// High severity issues are logged at warn level; everything else at info.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl IssueReporter for TracingReporter {
    fn report(&mut self, issue: &QualityIssue) -> Result<()> {
        let record_id = issue.record_id.as_deref().unwrap_or("-");
        match issue.severity {
            Severity::High => warn!(
                issue_type = %issue.issue_type,
                record_id,
                "LOGGED: {} - {}",
                issue.severity,
                issue.issue_description
            ),
            Severity::Medium | Severity::Low => info!(
                issue_type = %issue.issue_type,
                record_id,
                "LOGGED: {} - {}",
                issue.severity,
                issue.issue_description
            ),
        }
        Ok(())
    }
}

/// Delivers every issue to each reporter in turn
///
/// All reporters see the issue even if an earlier one fails; the first failure
/// is returned.
impl IssueReporter for Vec<Box<dyn IssueReporter>> {
    fn report(&mut self, issue: &QualityIssue) -> Result<()> {
        let mut first_error = None;
        for reporter in self.iter_mut() {
            if let Err(e) = reporter.report(issue) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
