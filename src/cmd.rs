use std::{
    collections::BTreeMap,
    io::{BufRead as _, BufReader},
    process::{Command, ExitStatus, Stdio},
    sync::mpsc,
    thread,
};

use camino::Utf8PathBuf;
use secrecy::{ExposeSecret, SecretString};

use crate::error::{Result, ShelpError};

#[derive(Debug)]
pub struct CmdOutput {
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

impl CmdOutput {
    pub fn status(&self) -> &ExitStatus {
        &self.status
    }

    pub fn stdout(&self) -> &str {
        self.stdout.trim()
    }

    pub fn stderr(&self) -> &str {
        self.stderr.trim()
    }

    /// Stderr if the command wrote any, stdout otherwise.
    pub fn failure_detail(&self) -> &str {
        if self.stderr().is_empty() {
            self.stdout()
        } else {
            self.stderr()
        }
    }
}

#[derive(Debug)]
pub struct Cmd {
    name: String,
    env_vars: BTreeMap<String, SecretString>,
    args: Vec<String>,
    current_dir: Option<Utf8PathBuf>,
    hide_stdout: bool,
    hide_stderr: bool,
    title: Option<String>,
}

impl Cmd {
    pub fn new<I, S>(cmd_name: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args
            .into_iter()
            .map(|arg| arg.as_ref().to_string())
            .collect();
        Self {
            name: cmd_name.to_string(),
            args,
            current_dir: None,
            hide_stdout: false,
            hide_stderr: false,
            env_vars: BTreeMap::new(),
            title: None,
        }
    }

    /// Values are passed to the child process but never printed.
    pub fn with_env_var(&mut self, key: impl Into<String>, value: SecretString) -> &mut Self {
        self.env_vars.insert(key.into(), value);
        self
    }

    pub fn with_current_dir(&mut self, dir: impl Into<Utf8PathBuf>) -> &mut Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn hide_stdout(&mut self) -> &mut Self {
        self.hide_stdout = true;
        self
    }

    pub fn hide_stderr(&mut self) -> &mut Self {
        self.hide_stderr = true;
        self
    }

    pub fn with_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = Some(title.into());
        self
    }

    pub fn command_line(&self) -> String {
        format!("{} {}", self.name, self.args.join(" "))
    }

    fn build_command_description(&self) -> String {
        let mut description = self
            .title
            .clone()
            .unwrap_or_else(|| format!("🚀 {}", self.command_line()));
        if let Some(dir) = &self.current_dir {
            description.push_str(&format!(" 👉 {dir}"));
        }
        description
    }

    fn configure_command(&self) -> Command {
        let mut command = Command::new(&self.name);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        for (key, value) in &self.env_vars {
            command.env(key, value.expose_secret());
        }
        command
    }

    fn spawn_output_reader<R: std::io::Read + Send + 'static>(
        reader: R,
        tx: mpsc::Sender<(String, bool)>,
        is_stdout: bool,
    ) {
        thread::spawn(move || {
            let reader = BufReader::new(reader);
            for line in reader.lines().map_while(std::result::Result::ok) {
                if tx.send((line, is_stdout)).is_err() {
                    break;
                }
            }
        });
    }

    fn collect_output(&self, rx: mpsc::Receiver<(String, bool)>) -> (String, String) {
        let mut output_stdout = String::new();
        let mut output_stderr = String::new();

        for (line, is_stdout) in rx {
            if is_stdout {
                if !self.hide_stdout {
                    println!("{line}");
                }
                output_stdout.push_str(&line);
                output_stdout.push('\n');
            } else {
                if !self.hide_stderr {
                    eprintln!("{line}");
                }
                output_stderr.push_str(&line);
                output_stderr.push('\n');
            }
        }
        (output_stdout, output_stderr)
    }

    /// Runs the command to completion. A non-zero exit status is not an
    /// error here; callers inspect [`CmdOutput::status`].
    pub fn run(&self) -> Result<CmdOutput> {
        let description = self.build_command_description();
        if self.hide_stdout {
            tracing::debug!("{description}");
        } else {
            println!("{description}");
        }

        let mut child = self
            .configure_command()
            .args(&self.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ShelpError::ToolNotFound {
                    program: self.name.clone(),
                },
                _ => ShelpError::Io(e),
            })?;

        let (tx, rx) = mpsc::channel();
        if let Some(stdout) = child.stdout.take() {
            Self::spawn_output_reader(stdout, tx.clone(), true);
        }
        if let Some(stderr) = child.stderr.take() {
            Self::spawn_output_reader(stderr, tx.clone(), false);
        }
        // The readers hold the only senders left; the loop in
        // `collect_output` ends once both pipes are closed.
        drop(tx);

        let (stdout, stderr) = self.collect_output(rx);
        let status = child.wait()?;
        tracing::debug!(command = %self.command_line(), %status, "command finished");

        Ok(CmdOutput {
            status,
            stdout,
            stderr,
        })
    }

    /// Like [`Cmd::run`], but a non-zero exit status becomes
    /// [`ShelpError::CommandFailed`].
    pub fn run_checked(&self) -> Result<CmdOutput> {
        let output = self.run()?;
        if output.status().success() {
            Ok(output)
        } else {
            Err(ShelpError::command_failed(
                self.command_line(),
                output.failure_detail(),
            ))
        }
    }
}
