//! Command-line interface for the site task runner.
//!
//! Tasks are named positionally, optionally with bracketed arguments
//! (`analytics[linux]`), and run in order after their dependencies.

use std::{env, path::PathBuf, process};

use clap::{ArgAction, Parser};
use formulae_tasks::{
    DEFAULT_TASK, Error, Invocation, ProcessRunner, RetryingExecutor, Settings, TaskExecutor, TaskGraph,
    TokioSleeper,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Command line interface for generating, building and validating the site.
#[derive(Debug, Parser,)]
#[command(name = "formulae-tasks", version, about = "Generate, build and validate the formulae site")]
struct Cli
{
    /// Tasks to run, e.g. `formulae`, `analytics[linux]`, `test`.
    #[arg(value_name = "TASK")]
    tasks: Vec<String,>,

    /// Settings file overriding the default tool invocations.
    #[arg(long = "config", value_name = "PATH", env = "FORMULAE_TASKS_CONFIG")]
    config: Option<PathBuf,>,

    /// Directory to run in instead of the current one.
    #[arg(short = 'C', long = "root", value_name = "DIR")]
    root: Option<PathBuf,>,

    /// List the available tasks and exit.
    #[arg(short = 'T', long = "list", action = ArgAction::SetTrue)]
    list: bool,

    /// Re-run the named tasks even if they already ran in this invocation.
    #[arg(long = "force", action = ArgAction::SetTrue)]
    force: bool,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short = 'v', long = "verbose", action = ArgAction::SetTrue)]
    verbose: bool,
}

impl Cli
{
    /// Parsed invocations, falling back to the default task.
    fn invocations(&self,) -> Result<Vec<Invocation,>, Error,>
    {
        if self.tasks.is_empty() {
            return Ok(vec![Invocation::new(DEFAULT_TASK,)],);
        }
        self.tasks.iter().map(|task| task.parse(),).collect()
    }
}

/// Entry point that reports errors and sets the appropriate exit status.
#[tokio::main]
async fn main()
{
    let cli = Cli::parse();
    init_tracing(cli.verbose,);

    if let Err(error,) = run(cli,).await {
        eprintln!("{error}");
        process::exit(error.exit_code(),);
    }
}

fn init_tracing(verbose: bool,)
{
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level,),);
    tracing_subscriber::fmt().with_env_filter(filter,).with_target(false,).init();
}

/// Executes the requested tasks.
///
/// # Errors
///
/// Propagates settings, parsing and task failures.
async fn run(cli: Cli,) -> Result<(), Error,>
{
    if let Some(root,) = &cli.root {
        env::set_current_dir(root,).map_err(|source| formulae_tasks::io_error(root, source,),)?;
    }

    let settings = Settings::load(cli.config.as_deref(),)?;
    let graph = TaskGraph::standard()?;

    if cli.list {
        print!("{}", graph.describe());
        return Ok((),);
    }

    let invocations = cli.invocations()?;
    let executor = RetryingExecutor::new(ProcessRunner, TokioSleeper, settings.retry,);
    let mut tasks = TaskExecutor::new(&settings, &graph, executor,);

    for invocation in &invocations {
        tasks.invoke(invocation, cli.force,).await?;
    }

    debug!("Analytics retries used: {}", tasks.budget().used());
    Ok((),)
}
