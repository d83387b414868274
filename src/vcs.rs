//! Version-control access.
//!
//! [`VcsClient`] is the seam between the helpers and `git`. [`GitCli`] is the
//! real implementation. Queries whose exit status is the answer run through a
//! silent [`Cmd`], text queries through [`git_cmd::git_in_dir`]. Commands that
//! change the working copy go through [`Cmd`] so their output is shown.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};

use crate::{
    cmd::{Cmd, CmdOutput},
    error::{Result, ShelpError},
};

pub trait VcsClient {
    /// `None` when HEAD is detached.
    fn current_branch(&self) -> Result<Option<String>>;
    fn is_dirty(&self) -> Result<bool>;
    fn branch_exists(&self, branch: &str) -> Result<bool>;
    /// Commits `(ahead, behind)` of `branch` relative to `remote/branch`, or
    /// `None` if the remote has no such branch.
    fn ahead_behind(&self, remote: &str, branch: &str) -> Result<Option<(u32, u32)>>;
    fn switch(&self, branch: &str) -> Result<()>;
    /// Non-forced delete: git refuses if the branch has unmerged work.
    fn delete_branch(&self, branch: &str) -> Result<()>;
    fn pull_ff_only(&self) -> Result<()>;
    fn push(&self, remote: &str, branch: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsStatus {
    pub branch: Option<String>,
    pub dirty: bool,
    pub ahead: u32,
    pub behind: u32,
    /// Whether `remote/branch` exists.
    pub tracked: bool,
}

impl VcsStatus {
    pub fn has_unpushed_commits(&self) -> bool {
        self.branch.is_some() && (!self.tracked || self.ahead > 0)
    }
}

impl fmt::Display for VcsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.branch {
            Some(branch) => write!(f, "🌿 {branch}")?,
            None => write!(f, "🌿 (detached HEAD)")?,
        }
        write!(f, " | {}", if self.dirty { "dirty" } else { "clean" })?;
        if self.branch.is_some() {
            if self.tracked {
                write!(f, " | ↑{} ↓{}", self.ahead, self.behind)?;
            } else {
                write!(f, " | not on remote")?;
            }
        }
        Ok(())
    }
}

/// Read branch, cleanliness and ahead/behind counts in one go.
pub fn probe(vcs: &dyn VcsClient, remote: &str) -> Result<VcsStatus> {
    let branch = vcs.current_branch()?;
    let dirty = vcs.is_dirty()?;
    let counts = match &branch {
        Some(branch) => vcs.ahead_behind(remote, branch)?,
        None => None,
    };
    let status = VcsStatus {
        branch,
        dirty,
        ahead: counts.map_or(0, |(ahead, _)| ahead),
        behind: counts.map_or(0, |(_, behind)| behind),
        tracked: counts.is_some(),
    };
    tracing::debug!(?status, "probed repository");
    Ok(status)
}

#[derive(Debug)]
pub struct GitCli {
    dir: Utf8PathBuf,
}

impl GitCli {
    /// Only checks that `dir` is inside a work tree. Detached HEADs, unborn
    /// branches and missing upstreams are all valid here.
    pub fn open(dir: &Utf8Path) -> Result<Self> {
        let git = Self {
            dir: dir.to_path_buf(),
        };
        let output = git.query(&["rev-parse", "--git-dir"])?;
        if !output.status().success() {
            tracing::debug!("{dir} is not a repository: {}", output.failure_detail());
            return Err(ShelpError::NotARepository {
                path: dir.to_path_buf(),
            });
        }
        Ok(git)
    }

    fn git(&self, args: &[&str]) -> Result<String> {
        tracing::debug!("🔎 git {}", args.join(" "));
        git_cmd::git_in_dir(&self.dir, args)
            .map(|out| out.trim().to_string())
            .map_err(|e| {
                ShelpError::command_failed(format!("git {}", args.join(" ")), format!("{e:#}"))
            })
    }

    /// Runs a query whose exit status carries the answer. Nothing is printed.
    fn query(&self, args: &[&str]) -> Result<CmdOutput> {
        Cmd::new("git", args)
            .with_current_dir(&self.dir)
            .hide_stdout()
            .hide_stderr()
            .run()
    }

    fn run(&self, args: &[&str]) -> Result<CmdOutput> {
        Cmd::new("git", args).with_current_dir(&self.dir).run()
    }

    /// `show-ref --verify --quiet` exits 1 for a missing ref. Any other
    /// failure means git could not answer.
    fn ref_exists(&self, reference: &str) -> Result<bool> {
        let args = ["show-ref", "--verify", "--quiet", reference];
        let output = self.query(&args)?;
        match output.status().code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(ShelpError::command_failed(
                format!("git {}", args.join(" ")),
                output.failure_detail(),
            )),
        }
    }
}

impl VcsClient for GitCli {
    fn current_branch(&self) -> Result<Option<String>> {
        // Exits 1 on a detached HEAD, prints the name even for an unborn branch.
        let args = ["symbolic-ref", "--quiet", "--short", "HEAD"];
        let output = self.query(&args)?;
        match output.status().code() {
            Some(0) => Ok(Some(output.stdout().to_string())),
            Some(1) => Ok(None),
            _ => Err(ShelpError::command_failed(
                format!("git {}", args.join(" ")),
                output.failure_detail(),
            )),
        }
    }

    fn is_dirty(&self) -> Result<bool> {
        let status = self.git(&["status", "--porcelain"])?;
        Ok(!status.is_empty())
    }

    fn branch_exists(&self, branch: &str) -> Result<bool> {
        self.ref_exists(&format!("refs/heads/{branch}"))
    }

    fn ahead_behind(&self, remote: &str, branch: &str) -> Result<Option<(u32, u32)>> {
        let remote_ref = format!("refs/remotes/{remote}/{branch}");
        if !self.ref_exists(&remote_ref)? || !self.branch_exists(branch)? {
            return Ok(None);
        }
        let counts = self.git(&[
            "rev-list",
            "--left-right",
            "--count",
            &format!("refs/heads/{branch}...{remote_ref}"),
        ])?;
        parse_left_right_counts(&counts).map(Some)
    }

    fn switch(&self, branch: &str) -> Result<()> {
        let output = self.run(&["switch", branch])?;
        if output.status().success() {
            Ok(())
        } else {
            Err(ShelpError::command_failed(
                format!("git switch {branch}"),
                output.failure_detail(),
            ))
        }
    }

    fn delete_branch(&self, branch: &str) -> Result<()> {
        let output = self.run(&["branch", "-d", branch])?;
        if output.status().success() {
            Ok(())
        } else {
            Err(ShelpError::BranchDeleteRefused {
                branch: branch.to_string(),
                detail: output.failure_detail().to_string(),
            })
        }
    }

    fn pull_ff_only(&self) -> Result<()> {
        let output = self.run(&["pull", "--ff-only"])?;
        if output.status().success() {
            return Ok(());
        }
        let detail = output.failure_detail().to_string();
        if is_fast_forward_refusal(&detail) {
            let branch = self.current_branch()?.unwrap_or_else(|| "HEAD".to_string());
            Err(ShelpError::FastForwardImpossible { branch, detail })
        } else {
            Err(ShelpError::command_failed("git pull --ff-only", detail))
        }
    }

    fn push(&self, remote: &str, branch: &str) -> Result<()> {
        let output = self.run(&["push", "--set-upstream", remote, branch])?;
        if output.status().success() {
            Ok(())
        } else {
            Err(ShelpError::command_failed(
                format!("git push --set-upstream {remote} {branch}"),
                output.failure_detail(),
            ))
        }
    }
}

/// Parse the `<left>\t<right>` output of `git rev-list --left-right --count`.
fn parse_left_right_counts(output: &str) -> Result<(u32, u32)> {
    let invalid = || {
        ShelpError::command_failed(
            "git rev-list --left-right --count",
            format!("unexpected output: {output:?}"),
        )
    };
    let mut parts = output.split_whitespace();
    let ahead = parts.next().and_then(|n| n.parse().ok()).ok_or_else(invalid)?;
    let behind = parts.next().and_then(|n| n.parse().ok()).ok_or_else(invalid)?;
    Ok((ahead, behind))
}

fn is_fast_forward_refusal(stderr: &str) -> bool {
    let stderr = stderr.to_lowercase();
    stderr.contains("not possible to fast-forward") || stderr.contains("diverging branches")
}
