// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// External command descriptions and the runner that executes them.
///
/// Every tool the tasks orchestrate (package manager, site generator,
/// validators) is invoked through [`CommandRunner`], which keeps the task
/// logic testable without spawning processes.
use std::{fmt, fs::File, future::Future, path::PathBuf, process::Stdio};

use tracing::info;

use crate::error::{self, Error};

/// Program name plus arguments, environment overrides and an optional file
/// receiving standard output.
///
/// # Example
///
/// ```
/// use formulae_tasks::ExternalCommand;
///
/// let command = ExternalCommand::new("brew",)
///     .args(["formula-analytics", "--days-ago=30", "--json", "--install"],)
///     .stdout_to("_data/analytics/install/30d.json",);
/// assert_eq!(
///     command.to_string(),
///     "brew formula-analytics --days-ago=30 --json --install > _data/analytics/install/30d.json"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct ExternalCommand
{
    program: String,
    args:    Vec<String,>,
    envs:    Vec<(String, String,),>,
    stdout:  Option<PathBuf,>,
}

impl ExternalCommand
{
    /// Starts a command invoking `program` with no arguments.
    pub fn new(program: impl Into<String,>,) -> Self
    {
        Self {
            program: program.into(), args: Vec::new(), envs: Vec::new(), stdout: None,
        }
    }

    /// Builds a command from an argv vector whose first element is the
    /// program.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when `argv` is empty.
    pub fn from_argv(argv: &[String],) -> Result<Self, Error,>
    {
        let (program, args,) =
            argv.split_first().ok_or_else(|| Error::validation("command line must not be empty",),)?;
        Ok(Self::new(program.clone(),).args(args.iter().cloned(),),)
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<String,>,) -> Self
    {
        self.args.push(arg.into(),);
        self
    }

    /// Appends several arguments.
    pub fn args<I, A,>(mut self, args: I,) -> Self
    where
        I: IntoIterator<Item = A,>,
        A: Into<String,>,
    {
        self.args.extend(args.into_iter().map(Into::into,),);
        self
    }

    /// Sets an environment variable for the child process only.
    pub fn env(mut self, key: impl Into<String,>, value: impl Into<String,>,) -> Self
    {
        self.envs.push((key.into(), value.into(),),);
        self
    }

    /// Redirects standard output into `path`, truncating it.
    pub fn stdout_to(mut self, path: impl Into<PathBuf,>,) -> Self
    {
        self.stdout = Some(path.into(),);
        self
    }

    /// Executable to spawn.
    pub fn program(&self,) -> &str
    {
        &self.program
    }

    /// Arguments passed after the program.
    pub fn arguments(&self,) -> &[String]
    {
        &self.args
    }

    /// Environment overrides for the child process.
    pub fn envs(&self,) -> &[(String, String,)]
    {
        &self.envs
    }

    /// File receiving standard output, if redirected.
    pub fn stdout(&self,) -> Option<&PathBuf,>
    {
        self.stdout.as_ref()
    }

    /// Whether `arg` appears verbatim among the arguments.
    pub fn has_arg(&self, arg: &str,) -> bool
    {
        self.args.iter().any(|candidate| candidate == arg,)
    }
}

impl fmt::Display for ExternalCommand
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        f.write_str(&self.program,)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        if let Some(path,) = &self.stdout {
            write!(f, " > {}", path.display())?;
        }
        Ok((),)
    }
}

/// Executes external commands to completion.
pub trait CommandRunner
{
    /// Runs `command` and resolves once the process has exited.
    ///
    /// Implementations report a non-zero exit through
    /// [`Error::CommandFailed`].
    fn run(&self, command: &ExternalCommand,) -> impl Future<Output = Result<(), Error,>,>;
}

impl<T,> CommandRunner for &T
where
    T: CommandRunner + ?Sized,
{
    fn run(&self, command: &ExternalCommand,) -> impl Future<Output = Result<(), Error,>,>
    {
        (**self).run(command,)
    }
}

/// [`CommandRunner`] spawning real processes in the current directory.
///
/// Standard input and error are inherited; standard output is inherited
/// unless the command redirects it.
#[derive(Debug, Default, Clone, Copy,)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner
{
    async fn run(&self, command: &ExternalCommand,) -> Result<(), Error,>
    {
        info!("{}", command);

        let mut process = tokio::process::Command::new(&command.program,);
        process
            .args(&command.args,)
            .envs(command.envs.iter().map(|(key, value,)| (key.as_str(), value.as_str(),),),)
            .stdin(Stdio::inherit(),)
            .stderr(Stdio::inherit(),);

        match &command.stdout {
            Some(path,) => {
                let file = File::create(path,).map_err(|source| error::io_error(path, source,),)?;
                process.stdout(Stdio::from(file,),);
            }
            None => {
                process.stdout(Stdio::inherit(),);
            }
        }

        let status = process.status().await.map_err(|source| Error::Spawn {
            program: command.program.clone(),
            source,
        },)?;

        if !status.success() {
            return Err(Error::CommandFailed {
                program: command.to_string(),
                code:    status.code(),
                status:  status.to_string(),
            },);
        }

        Ok((),)
    }
}

#[cfg(test)]
pub(crate) mod testing
{
    use std::{
        cell::{Cell, RefCell},
        fs,
    };

    use super::{CommandRunner, ExternalCommand};
    use crate::error::{self, Error};

    /// Payload written to redirected stdout by [`ScriptedRunner`].
    pub(crate) const STUB_OUTPUT: &str = "{\"total_items\":0}\n";

    /// Runner that records every command and fails a scripted number of
    /// times before succeeding.
    #[derive(Debug, Default,)]
    pub(crate) struct ScriptedRunner
    {
        failures: Cell<usize,>,
        commands: RefCell<Vec<ExternalCommand,>,>,
    }

    impl ScriptedRunner
    {
        pub(crate) fn succeeding() -> Self
        {
            Self::default()
        }

        pub(crate) fn failing_first(failures: usize,) -> Self
        {
            let runner = Self::default();
            runner.failures.set(failures,);
            runner
        }

        pub(crate) fn fail_next(&self, failures: usize,)
        {
            self.failures.set(failures,);
        }

        pub(crate) fn attempts(&self,) -> usize
        {
            self.commands.borrow().len()
        }

        pub(crate) fn commands(&self,) -> Vec<ExternalCommand,>
        {
            self.commands.borrow().clone()
        }

        pub(crate) fn command_lines(&self,) -> Vec<String,>
        {
            self.commands.borrow().iter().map(ToString::to_string,).collect()
        }
    }

    impl CommandRunner for ScriptedRunner
    {
        async fn run(&self, command: &ExternalCommand,) -> Result<(), Error,>
        {
            self.commands.borrow_mut().push(command.clone(),);

            let remaining = self.failures.get();
            if remaining > 0 {
                self.failures.set(remaining - 1,);
                return Err(Error::CommandFailed {
                    program: command.to_string(),
                    code:    Some(1,),
                    status:  "exit status: 1".to_owned(),
                },);
            }

            if let Some(path,) = command.stdout() {
                fs::write(path, STUB_OUTPUT,).map_err(|source| error::io_error(path, source,),)?;
            }
            Ok((),)
        }
    }
}
