use camino::Utf8PathBuf;

#[derive(clap::Parser, Debug)]
#[command(about, version, author)]
pub struct CliArgs {
    /// Show debug logs, including the git queries that run silently
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Repository to operate on (defaults to the current directory)
    #[arg(short = 'C', long, global = true, value_name = "PATH")]
    pub repo_dir: Option<Utf8PathBuf>,

    /// Remote to compare against and push to (overrides the config file)
    #[arg(long, global = true, value_name = "NAME")]
    pub remote: Option<String>,

    /// Config file (defaults to $SHELP_CONFIG or ~/.config/shelp/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Switch to the primary branch, delete the previous branch and fast-forward pull
    OriginReset,
    /// Push unpushed commits and open a pull request preview in the browser
    OpenPr {
        /// Continue without asking when the working tree is dirty
        #[arg(short, long)]
        yes: bool,
    },
    /// Summarize the CI checks of a pull request
    Checks {
        /// PR number or URL (defaults to the PR of the current branch)
        pr: Option<String>,
        /// Repository as OWNER/REPO (defaults to the current repository)
        repo: Option<String>,
    },
    /// Drop and re-create a local MySQL database
    MakeDb {
        /// Database name
        name: Option<String>,
    },
    /// Show branch, working tree state and ahead/behind counts
    Status,
}
