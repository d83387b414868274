//! CI check summary for a pull request.
//!
//! `gh pr checks` prints one line per check. On a terminal each line starts
//! with a status symbol, otherwise it is tab separated with the state word in
//! the second column. Both forms are understood. Anything unrecognised counts
//! as pending, so an unknown state can delay a green verdict but never hide a
//! check.

use std::fmt;

use crate::{
    error::{Result, ShelpError},
    host::HostClient,
    vcs::VcsClient,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckResult {
    Passed,
    Failed,
    Pending,
}

impl CheckResult {
    pub fn classify(line: &str) -> Self {
        let columns: Vec<&str> = line.split('\t').collect();
        if let [_, state, ..] = columns.as_slice()
            && let Some(result) = Self::from_state(state)
        {
            return result;
        }

        let mut chars = line.trim_start().chars();
        match (chars.next(), chars.next()) {
            (Some(symbol), next) if next.is_none_or(char::is_whitespace) => {
                Self::from_symbol(symbol).unwrap_or(Self::Pending)
            }
            _ => Self::Pending,
        }
    }

    fn from_state(state: &str) -> Option<Self> {
        match state.trim().to_lowercase().as_str() {
            "pass" | "skipping" => Some(Self::Passed),
            "fail" | "cancel" => Some(Self::Failed),
            "pending" => Some(Self::Pending),
            _ => None,
        }
    }

    fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '✓' | '✔' => Some(Self::Passed),
            'X' | '✗' | '✘' | '×' => Some(Self::Failed),
            '*' | '-' => Some(Self::Pending),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pending: usize,
    /// Output lines of the failed checks.
    pub failures: Vec<String>,
}

impl CheckSummary {
    pub fn from_output(output: &str) -> Self {
        let mut summary = Self::default();
        for line in output.lines().filter(|l| !l.trim().is_empty()) {
            summary.add(line);
        }
        summary
    }

    fn add(&mut self, line: &str) {
        self.total += 1;
        match CheckResult::classify(line) {
            CheckResult::Passed => self.passed += 1,
            CheckResult::Failed => {
                self.failed += 1;
                self.failures.push(line.trim().to_string());
            }
            CheckResult::Pending => self.pending += 1,
        }
    }

    pub fn verdict(&self) -> Verdict {
        if self.total == 0 {
            Verdict::NoChecks
        } else if self.failed > 0 {
            Verdict::Failed
        } else if self.pending > 0 {
            Verdict::Pending
        } else {
            Verdict::AllPassed
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    NoChecks,
    AllPassed,
    Failed,
    Pending,
}

impl fmt::Display for CheckSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.verdict() {
            Verdict::NoChecks => write!(f, "ℹ️ No checks reported"),
            Verdict::AllPassed => write!(f, "✅ All {} checks passed", self.total),
            Verdict::Pending => write!(f, "⏳ {} of {} checks pending", self.pending, self.total),
            Verdict::Failed => {
                write!(f, "❌ {} of {} checks failed", self.failed, self.total)?;
                for failure in &self.failures {
                    write!(f, "\n   {failure}")?;
                }
                Ok(())
            }
        }
    }
}

/// Pull request of the current branch.
pub fn resolve_pr(
    host: &dyn HostClient,
    vcs: &dyn VcsClient,
    repo: Option<&str>,
) -> Result<u64> {
    let branch = vcs.current_branch()?.unwrap_or_else(|| "HEAD".to_string());
    host.pr_for_branch(&branch, repo)?
        .ok_or(ShelpError::UnresolvedPullRequest { branch })
}

/// Query the checks of `pr` and summarize them.
///
/// `gh pr checks` exits non-zero whenever a check failed or is still
/// running, so the exit status alone does not mean the query failed. It only
/// counts as a failure when no check line came back.
pub fn fetch_summary(host: &dyn HostClient, pr: u64, repo: Option<&str>) -> Result<CheckSummary> {
    let report = host.pr_checks(pr, repo)?;
    let summary = CheckSummary::from_output(&report.stdout);
    if report.success || summary.total > 0 {
        return Ok(summary);
    }
    if report.stderr.to_lowercase().contains("no checks reported") {
        return Ok(summary);
    }
    let detail = if report.stderr.is_empty() {
        format!("`gh pr checks {pr}` failed without output")
    } else {
        report.stderr
    };
    Err(ShelpError::StatusQueryFailed(detail))
}
