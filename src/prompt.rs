use inquire::InquireError;

use crate::error::{Result, ShelpError};

pub trait Prompter {
    /// Ask a yes/no question. Blocks until the user answers.
    fn confirm(&self, message: &str) -> Result<bool>;
}

#[derive(Debug, Default)]
pub struct InquirePrompter;

impl Prompter for InquirePrompter {
    fn confirm(&self, message: &str) -> Result<bool> {
        match inquire::Confirm::new(message).with_default(false).prompt() {
            Ok(answer) => Ok(answer),
            Err(InquireError::OperationCanceled) => Ok(false),
            Err(InquireError::OperationInterrupted) => Err(ShelpError::Interrupted),
            Err(InquireError::IO(e)) => Err(ShelpError::Io(e)),
            Err(e) => Err(ShelpError::PromptUnavailable(e.to_string())),
        }
    }
}

/// Answers every question the same way. Used for `--yes`.
#[derive(Debug)]
pub struct AssumeYes;

impl Prompter for AssumeYes {
    fn confirm(&self, message: &str) -> Result<bool> {
        tracing::info!("{message} yes (--yes)");
        Ok(true)
    }
}
