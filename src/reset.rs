use crate::{
    error::{Result, ShelpError},
    vcs::VcsClient,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetOutcome {
    pub primary: String,
    /// Branch that was checked out before the reset. `None` if HEAD was detached.
    pub previous: Option<String>,
    pub deleted: Option<String>,
}

/// First candidate that exists as a local branch.
pub fn select_primary_branch(vcs: &dyn VcsClient, candidates: &[String]) -> Result<String> {
    for candidate in candidates {
        if vcs.branch_exists(candidate)? {
            return Ok(candidate.clone());
        }
    }
    Err(ShelpError::NoPrimaryBranchFound {
        candidates: candidates.to_vec(),
    })
}

/// Switch to the primary branch, delete the branch we came from and
/// fast-forward.
///
/// The primary branch is resolved before anything is touched, so a failed
/// lookup leaves the working copy as it was. The previous branch is deleted
/// with a non-forced delete and never when it is itself a primary-branch name.
pub fn origin_reset(vcs: &dyn VcsClient, candidates: &[String]) -> Result<ResetOutcome> {
    let previous = vcs.current_branch()?;
    let primary = select_primary_branch(vcs, candidates)?;

    if previous.as_deref() == Some(primary.as_str()) {
        println!("ℹ️ Already on {primary}");
    } else {
        vcs.switch(&primary)?;
    }

    let deleted = match &previous {
        Some(branch) if branch != &primary && !candidates.contains(branch) => {
            vcs.delete_branch(branch)?;
            Some(branch.clone())
        }
        _ => None,
    };

    vcs.pull_ff_only()?;

    Ok(ResetOutcome {
        primary,
        previous,
        deleted,
    })
}
