//! Hosting platform access through the GitHub CLI.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

use crate::{
    cmd::Cmd,
    error::{Result, ShelpError},
};

pub trait HostClient {
    /// Number of the pull request whose head is `branch`, if there is one.
    fn pr_for_branch(&self, branch: &str, repo: Option<&str>) -> Result<Option<u64>>;
    fn pr_checks(&self, pr: u64, repo: Option<&str>) -> Result<ChecksReport>;
    /// Open the pull-request creation page for the current branch.
    fn create_pr_web(&self) -> Result<()>;
}

/// Raw result of a checks query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksReport {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrTarget {
    pub number: u64,
    /// `OWNER/REPO`, known when the target was given as a URL.
    pub repo: Option<String>,
}

impl PrTarget {
    /// Accepts `42`, `#42` or a github.com pull-request URL.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if let Ok(number) = digits.parse::<u64>() {
            return Ok(Self { number, repo: None });
        }
        parse_github_pr_url(trimmed)
    }
}

/// `[https://][www.]github.com/OWNER/REPO/pull/NUMBER[/...]`, query and
/// fragment ignored.
fn parse_github_pr_url(input: &str) -> Result<PrTarget> {
    let invalid = || ShelpError::InvalidPrTarget(input.to_string());

    let without_scheme = ["https://", "http://"]
        .iter()
        .find_map(|scheme| input.strip_prefix(*scheme))
        .unwrap_or(input);
    let location = without_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let (host, path) = location.split_once('/').ok_or_else(invalid)?;
    if !matches!(host, "github.com" | "www.github.com") {
        return Err(invalid());
    }

    let mut segments = path.split('/').filter(|segment| !segment.is_empty());
    match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(owner), Some(name), Some("pull"), Some(number)) => Ok(PrTarget {
            number: number.parse().map_err(|_| invalid())?,
            repo: Some(format!("{owner}/{name}")),
        }),
        _ => Err(invalid()),
    }
}

#[derive(Debug, Deserialize)]
struct PrView {
    number: u64,
}

#[derive(Debug)]
pub struct GhCli {
    dir: Utf8PathBuf,
}

impl GhCli {
    pub fn new(dir: &Utf8Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    fn gh<'a>(&self, args: impl IntoIterator<Item = &'a str>, repo: Option<&'a str>) -> Cmd {
        let mut args: Vec<&str> = args.into_iter().collect();
        if let Some(repo) = repo {
            args.extend(["--repo", repo]);
        }
        let mut cmd = Cmd::new("gh", args);
        cmd.with_current_dir(&self.dir);
        cmd
    }
}

impl HostClient for GhCli {
    fn pr_for_branch(&self, branch: &str, repo: Option<&str>) -> Result<Option<u64>> {
        let output = self
            .gh(["pr", "view", branch, "--json", "number"], repo)
            .hide_stdout()
            .hide_stderr()
            .run()?;
        if !output.status().success() {
            let detail = output.failure_detail();
            if detail.to_lowercase().contains("no pull requests found") {
                return Ok(None);
            }
            return Err(ShelpError::StatusQueryFailed(detail.to_string()));
        }
        let view: PrView = serde_json::from_str(output.stdout()).map_err(|e| {
            ShelpError::StatusQueryFailed(format!("unexpected `gh pr view` output: {e}"))
        })?;
        Ok(Some(view.number))
    }

    fn pr_checks(&self, pr: u64, repo: Option<&str>) -> Result<ChecksReport> {
        let pr = pr.to_string();
        let output = self
            .gh(["pr", "checks", pr.as_str()], repo)
            .hide_stdout()
            .hide_stderr()
            .run()?;
        Ok(ChecksReport {
            stdout: output.stdout().to_string(),
            stderr: output.stderr().to_string(),
            success: output.status().success(),
        })
    }

    fn create_pr_web(&self) -> Result<()> {
        self.gh(["pr", "create", "--web"], None)
            .with_title("🌐 gh pr create --web")
            .run_checked()?;
        Ok(())
    }
}
