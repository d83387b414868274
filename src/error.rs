use camino::Utf8PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShelpError>;

#[derive(Debug, Error)]
pub enum ShelpError {
    #[error("Not a git repository: {path}")]
    NotARepository { path: Utf8PathBuf },

    #[error("No primary branch found (tried {})", .candidates.join(", "))]
    NoPrimaryBranchFound { candidates: Vec<String> },

    #[error("Cannot fast-forward '{branch}': {detail}")]
    FastForwardImpossible { branch: String, detail: String },

    #[error("Refusing to delete branch '{branch}': {detail}")]
    BranchDeleteRefused { branch: String, detail: String },

    #[error("HEAD is detached, check out a branch first")]
    DetachedHead,

    #[error("Aborted by user")]
    UserAborted,

    #[error("Prompt interrupted")]
    Interrupted,

    #[error("Cannot ask for confirmation ({0}), pass --yes to skip the prompt")]
    PromptUnavailable(String),

    #[error("No pull request found for branch '{branch}'")]
    UnresolvedPullRequest { branch: String },

    #[error("Invalid pull request reference: {0}")]
    InvalidPrTarget(String),

    #[error("Failed to query check status: {0}")]
    StatusQueryFailed(String),

    #[error("Missing required argument <{0}>")]
    MissingRequiredArgument(&'static str),

    #[error("Invalid database name '{0}': use letters, digits, '_' or '$' (max 64)")]
    InvalidDatabaseName(String),

    #[error("`{program}` not found in PATH")]
    ToolNotFound { program: String },

    #[error("`{command}` failed: {detail}")]
    CommandFailed { command: String, detail: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShelpError {
    pub fn command_failed(command: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            detail: detail.into(),
        }
    }

    /// Exit status reported to the invoking shell.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::MissingRequiredArgument(_)
            | Self::InvalidDatabaseName(_)
            | Self::InvalidPrTarget(_) => 2,
            Self::Interrupted => 130,
            _ => 1,
        }
    }
}
