use crate::{
    error::{Result, ShelpError},
    host::HostClient,
    prompt::Prompter,
    vcs::{self, VcsClient},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenPrOutcome {
    pub branch: String,
    pub pushed: bool,
}

/// Push the current branch if it has unpushed commits, then open the
/// pull-request creation page. A dirty tree needs explicit confirmation.
pub fn open_pr(
    vcs: &dyn VcsClient,
    host: &dyn HostClient,
    prompter: &dyn Prompter,
    remote: &str,
) -> Result<OpenPrOutcome> {
    let status = vcs::probe(vcs, remote)?;
    let Some(branch) = status.branch.clone() else {
        return Err(ShelpError::DetachedHead);
    };

    if status.dirty {
        println!("⚠️ {branch} has uncommitted changes");
        if !prompter.confirm("Open a pull request anyway?")? {
            return Err(ShelpError::UserAborted);
        }
    }

    let pushed = status.has_unpushed_commits();
    if pushed {
        vcs.push(remote, &branch)?;
    } else {
        println!("ℹ️ {branch} is already pushed to {remote}");
    }

    host.create_pr_web()?;
    Ok(OpenPrOutcome { branch, pushed })
}
