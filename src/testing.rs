//! In-memory stand-ins for git, gh, mysql and the terminal.
//!
//! Fakes that take part in the same scenario share one [`CallLog`], so tests
//! can assert on the order of side effects across tools.

use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet},
    rc::Rc,
};

use crate::{
    db::DbClient,
    error::{Result, ShelpError},
    host::{ChecksReport, HostClient},
    prompt::Prompter,
    vcs::VcsClient,
};

pub type CallLog = Rc<RefCell<Vec<String>>>;

#[derive(Debug, Default)]
struct FakeRepo {
    current: Option<String>,
    branches: BTreeSet<String>,
    dirty: bool,
    /// `remote/branch` -> (ahead, behind)
    remote_branches: BTreeMap<String, (u32, u32)>,
    unmerged: BTreeSet<String>,
    diverged: bool,
}

#[derive(Debug, Default)]
pub struct FakeVcs {
    repo: RefCell<FakeRepo>,
    log: CallLog,
}

impl FakeVcs {
    pub fn on_branch(branch: &str) -> Self {
        let vcs = Self::default();
        {
            let mut repo = vcs.repo.borrow_mut();
            repo.current = Some(branch.to_string());
            repo.branches.insert(branch.to_string());
        }
        vcs
    }

    pub fn detached() -> Self {
        Self::default()
    }

    pub fn with_branches(self, branches: &[&str]) -> Self {
        self.repo
            .borrow_mut()
            .branches
            .extend(branches.iter().map(|b| (*b).to_string()));
        self
    }

    /// `branch` exists on `origin`, with the given local ahead/behind counts.
    pub fn tracked(self, branch: &str, ahead: u32, behind: u32) -> Self {
        self.repo
            .borrow_mut()
            .remote_branches
            .insert(format!("origin/{branch}"), (ahead, behind));
        self
    }

    pub fn dirty(self) -> Self {
        self.repo.borrow_mut().dirty = true;
        self
    }

    pub fn unmerged(self, branch: &str) -> Self {
        self.repo.borrow_mut().unmerged.insert(branch.to_string());
        self
    }

    pub fn diverged(self) -> Self {
        self.repo.borrow_mut().diverged = true;
        self
    }

    pub fn log(&self) -> CallLog {
        Rc::clone(&self.log)
    }

    /// Mutating calls, in order.
    pub fn calls(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    pub fn checked_out(&self) -> Option<String> {
        self.repo.borrow().current.clone()
    }

    pub fn has_branch(&self, branch: &str) -> bool {
        self.repo.borrow().branches.contains(branch)
    }

    fn record(&self, call: String) {
        self.log.borrow_mut().push(call);
    }
}

impl VcsClient for FakeVcs {
    fn current_branch(&self) -> Result<Option<String>> {
        Ok(self.checked_out())
    }

    fn is_dirty(&self) -> Result<bool> {
        Ok(self.repo.borrow().dirty)
    }

    fn branch_exists(&self, branch: &str) -> Result<bool> {
        Ok(self.has_branch(branch))
    }

    fn ahead_behind(&self, remote: &str, branch: &str) -> Result<Option<(u32, u32)>> {
        Ok(self
            .repo
            .borrow()
            .remote_branches
            .get(&format!("{remote}/{branch}"))
            .copied())
    }

    fn switch(&self, branch: &str) -> Result<()> {
        self.record(format!("switch {branch}"));
        let mut repo = self.repo.borrow_mut();
        if !repo.branches.contains(branch) {
            return Err(ShelpError::command_failed(
                format!("git switch {branch}"),
                format!("fatal: invalid reference: {branch}"),
            ));
        }
        repo.current = Some(branch.to_string());
        Ok(())
    }

    fn delete_branch(&self, branch: &str) -> Result<()> {
        self.record(format!("delete {branch}"));
        let mut repo = self.repo.borrow_mut();
        if repo.current.as_deref() == Some(branch) {
            return Err(ShelpError::BranchDeleteRefused {
                branch: branch.to_string(),
                detail: format!("error: cannot delete branch '{branch}' used by worktree"),
            });
        }
        if repo.unmerged.contains(branch) {
            return Err(ShelpError::BranchDeleteRefused {
                branch: branch.to_string(),
                detail: format!("error: the branch '{branch}' is not fully merged"),
            });
        }
        repo.branches.remove(branch);
        Ok(())
    }

    fn pull_ff_only(&self) -> Result<()> {
        self.record("pull --ff-only".to_string());
        let mut repo = self.repo.borrow_mut();
        let branch = repo.current.clone().unwrap_or_else(|| "HEAD".to_string());
        if repo.diverged {
            return Err(ShelpError::FastForwardImpossible {
                branch,
                detail: "fatal: Not possible to fast-forward, aborting.".to_string(),
            });
        }
        if let Some(counts) = repo.remote_branches.get_mut(&format!("origin/{branch}")) {
            counts.1 = 0;
        }
        Ok(())
    }

    fn push(&self, remote: &str, branch: &str) -> Result<()> {
        self.record(format!("push {remote} {branch}"));
        let mut repo = self.repo.borrow_mut();
        let counts = repo
            .remote_branches
            .entry(format!("{remote}/{branch}"))
            .or_insert((0, 0));
        counts.0 = 0;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FakeHost {
    prs: BTreeMap<String, u64>,
    checks: Option<ChecksReport>,
    query_error: Option<String>,
    log: CallLog,
}

impl FakeHost {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    pub fn with_pr(mut self, branch: &str, number: u64) -> Self {
        self.prs.insert(branch.to_string(), number);
        self
    }

    /// `gh pr checks` output; the exit status follows gh: non-zero when any
    /// check failed or is pending.
    pub fn with_checks(mut self, stdout: &str) -> Self {
        let settled = stdout
            .lines()
            .all(|line| !line.contains("\tfail") && !line.contains("\tpending"));
        self.checks = Some(ChecksReport {
            stdout: stdout.to_string(),
            stderr: String::new(),
            success: settled,
        });
        self
    }

    /// `gh` fails before printing any check.
    pub fn failing(mut self, stderr: &str) -> Self {
        self.checks = Some(ChecksReport {
            stdout: String::new(),
            stderr: stderr.to_string(),
            success: false,
        });
        self.query_error = Some(stderr.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

impl HostClient for FakeHost {
    fn pr_for_branch(&self, branch: &str, repo: Option<&str>) -> Result<Option<u64>> {
        self.log.borrow_mut().push(match repo {
            Some(repo) => format!("pr view {branch} --repo {repo}"),
            None => format!("pr view {branch}"),
        });
        if let Some(err) = &self.query_error {
            return Err(ShelpError::StatusQueryFailed(err.clone()));
        }
        Ok(self.prs.get(branch).copied())
    }

    fn pr_checks(&self, pr: u64, repo: Option<&str>) -> Result<ChecksReport> {
        self.log.borrow_mut().push(match repo {
            Some(repo) => format!("pr checks {pr} --repo {repo}"),
            None => format!("pr checks {pr}"),
        });
        Ok(self.checks.clone().unwrap_or(ChecksReport {
            stdout: String::new(),
            stderr: String::new(),
            success: true,
        }))
    }

    fn create_pr_web(&self) -> Result<()> {
        self.log.borrow_mut().push("pr create --web".to_string());
        Ok(())
    }
}

#[derive(Debug)]
pub struct FakePrompter {
    answer: bool,
    asked: RefCell<Vec<String>>,
}

impl FakePrompter {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            asked: RefCell::new(Vec::new()),
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }
}

impl Prompter for FakePrompter {
    fn confirm(&self, message: &str) -> Result<bool> {
        self.asked.borrow_mut().push(message.to_string());
        Ok(self.answer)
    }
}

/// Understands just the statements `make-db` sends.
#[derive(Debug, Default)]
pub struct FakeDb {
    databases: RefCell<BTreeSet<String>>,
    executed: RefCell<Vec<String>>,
}

impl FakeDb {
    pub fn databases(&self) -> Vec<String> {
        self.databases.borrow().iter().cloned().collect()
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.borrow().clone()
    }
}

impl DbClient for FakeDb {
    fn execute(&self, sql: &str) -> Result<()> {
        self.executed.borrow_mut().push(sql.to_string());
        let mut databases = self.databases.borrow_mut();
        for statement in sql.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            if let Some(name) = statement.strip_prefix("DROP DATABASE IF EXISTS ") {
                databases.remove(name.trim_matches('`'));
            } else if let Some(name) = statement.strip_prefix("CREATE DATABASE ") {
                let name = name.trim_matches('`');
                if !databases.insert(name.to_string()) {
                    return Err(ShelpError::command_failed(
                        "mysql",
                        format!("ERROR 1007 (HY000): Can't create database '{name}'; database exists"),
                    ));
                }
            } else {
                return Err(ShelpError::command_failed(
                    "mysql",
                    format!("unsupported statement: {statement}"),
                ));
            }
        }
        Ok(())
    }
}
