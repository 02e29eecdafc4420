// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Named tasks, their dependency graph and the executor running them.
///
/// The task table is static. [`TaskGraph`] validates it once (unknown
/// dependencies and cycles are rejected) and [`TaskExecutor`] runs tasks in
/// dependency order, each at most once unless a re-run is forced.
use std::{
    collections::{HashMap, HashSet},
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use petgraph::{algo::toposort, graphmap::DiGraphMap};
use regex::Regex;
use tracing::{debug, info};

use crate::{
    analytics::{AnalyticsGenerator, Os},
    cleanup::{CleanupRegistry, CleanupScope},
    command::{CommandRunner, ExternalCommand},
    config::Settings,
    credentials,
    error::Error,
    lint,
    retry::{RetryBudget, RetryingExecutor, Sleeper},
};

/// Task run when none is named.
pub const DEFAULT_TASK: TaskName = TaskName::FormulaAndAnalytics;

/// Every task known to the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,)]
pub enum TaskName
{
    Formulae,
    Cask,
    Analytics,
    ApiSamples,
    FormulaAndAnalytics,
    CaskAndAnalytics,
    LinuxAnalytics,
    AllAnalytics,
    Build,
    Serve,
    HtmlProofer,
    Jsonlint,
    Test,
    Clean,
    Clobber,
}

impl TaskName
{
    /// Every task, in declaration order.
    pub const ALL: [Self; 15] = [
        Self::Formulae,
        Self::Cask,
        Self::Analytics,
        Self::ApiSamples,
        Self::FormulaAndAnalytics,
        Self::CaskAndAnalytics,
        Self::LinuxAnalytics,
        Self::AllAnalytics,
        Self::Build,
        Self::Serve,
        Self::HtmlProofer,
        Self::Jsonlint,
        Self::Test,
        Self::Clean,
        Self::Clobber,
    ];

    /// Name used on the command line.
    pub fn as_str(&self,) -> &'static str
    {
        match self {
            Self::Formulae => "formulae",
            Self::Cask => "cask",
            Self::Analytics => "analytics",
            Self::ApiSamples => "api_samples",
            Self::FormulaAndAnalytics => "formula_and_analytics",
            Self::CaskAndAnalytics => "cask_and_analytics",
            Self::LinuxAnalytics => "linux_analytics",
            Self::AllAnalytics => "all_analytics",
            Self::Build => "build",
            Self::Serve => "serve",
            Self::HtmlProofer => "html_proofer",
            Self::Jsonlint => "jsonlint",
            Self::Test => "test",
            Self::Clean => "clean",
            Self::Clobber => "clobber",
        }
    }
}

impl fmt::Display for TaskName
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        f.write_str(self.as_str(),)
    }
}

impl FromStr for TaskName
{
    type Err = Error;

    fn from_str(value: &str,) -> Result<Self, Self::Err,>
    {
        Self::ALL.into_iter().find(|task| task.as_str() == value,).ok_or_else(|| Error::UnknownTask {
            name: value.to_owned(),
        },)
    }
}

/// Static declaration of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub struct TaskSpec
{
    pub name:         TaskName,
    pub description:  &'static str,
    /// Tasks invoked first, in order.
    pub dependencies: &'static [TaskName],
    /// Names of the bracketed arguments the task accepts.
    pub parameters:   &'static [&'static str],
}

const fn spec(
    name: TaskName,
    description: &'static str,
    dependencies: &'static [TaskName],
    parameters: &'static [&'static str],
) -> TaskSpec
{
    TaskSpec {
        name,
        description,
        dependencies,
        parameters,
    }
}

/// The task table.
pub const TASKS: [TaskSpec; 15] = [
    spec(TaskName::Formulae, "Dump formulae data", &[], &[],),
    spec(TaskName::Cask, "Dump cask data", &[], &[],),
    spec(TaskName::Analytics, "Dump analytics data", &[], &["os"],),
    spec(TaskName::ApiSamples, "Generate API samples", &[], &[],),
    spec(
        TaskName::FormulaAndAnalytics,
        "Dump formulae and analytics data",
        &[TaskName::Formulae, TaskName::Analytics],
        &[],
    ),
    spec(
        TaskName::CaskAndAnalytics,
        "Dump cask and analytics data",
        &[TaskName::Cask, TaskName::Analytics],
        &[],
    ),
    spec(TaskName::LinuxAnalytics, "Dump Linux analytics data", &[], &[],),
    spec(TaskName::AllAnalytics, "Dump macOS and Linux analytics data", &[TaskName::Analytics], &[],),
    spec(TaskName::Build, "Build the static site", &[], &[],),
    spec(TaskName::Serve, "Serve the static site locally", &[], &[],),
    spec(TaskName::HtmlProofer, "Run HTML proofer to validate the HTML output", &[TaskName::Build], &[],),
    spec(TaskName::Jsonlint, "Run JSONLint to validate the JSON output", &[TaskName::Build], &[],),
    spec(TaskName::Test, "Run HTML proofer and JSONLint", &[TaskName::HtmlProofer, TaskName::Jsonlint], &[],),
    spec(TaskName::Clean, "Remove site build output", &[], &[],),
    spec(TaskName::Clobber, "Remove all generated files", &[], &[],),
];

/// A task name plus its bracketed arguments, as typed on the command line.
///
/// ```
/// use formulae_tasks::{Invocation, Os, TaskName};
///
/// let invocation: Invocation = "analytics[linux]".parse().expect("valid invocation",);
/// assert_eq!(invocation.task, TaskName::Analytics);
/// assert_eq!(invocation.os().expect("valid os",), Os::Linux);
/// ```
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct Invocation
{
    pub task: TaskName,
    pub args: Vec<String,>,
}

impl Invocation
{
    /// Invocation of `task` without arguments.
    pub fn new(task: TaskName,) -> Self
    {
        Self {
            task, args: Vec::new(),
        }
    }

    /// OS named by the first argument, defaulting to [`Os::Mac`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an unsupported OS.
    pub fn os(&self,) -> Result<Os, Error,>
    {
        self.args.first().map_or(Ok(Os::default(),), |os| os.parse(),)
    }
}

impl FromStr for Invocation
{
    type Err = Error;

    fn from_str(value: &str,) -> Result<Self, Self::Err,>
    {
        let pattern = Regex::new(r"^(?P<name>[A-Za-z0-9_:-]+)(?:\[(?P<args>[^\]]*)\])?$",)
            .map_err(|e| Error::validation(format!("invalid invocation pattern: {e}"),),)?;
        let captures = pattern
            .captures(value.trim(),)
            .ok_or_else(|| Error::validation(format!("malformed task invocation '{value}'"),),)?;

        let task: TaskName = captures["name"].parse()?;
        let args: Vec<String,> = captures
            .name("args",)
            .map(|args| {
                args.as_str().split(',',).map(str::trim,).filter(|arg| !arg.is_empty(),).map(str::to_owned,).collect()
            },)
            .unwrap_or_default();

        Ok(Self {
            task,
            args,
        },)
    }
}

impl fmt::Display for Invocation
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        if self.args.is_empty() {
            write!(f, "{}", self.task)
        } else {
            write!(f, "{}[{}]", self.task, self.args.join(",",))
        }
    }
}

/// Validated dependency graph over a task table.
#[derive(Debug, Clone,)]
pub struct TaskGraph
{
    specs: HashMap<TaskName, TaskSpec,>,
    graph: DiGraphMap<TaskName, (),>,
}

impl TaskGraph
{
    /// Graph over [`TASKS`].
    ///
    /// # Errors
    ///
    /// Same as [`TaskGraph::new`].
    pub fn standard() -> Result<Self, Error,>
    {
        Self::new(&TASKS,)
    }

    /// Builds the graph, with an edge from every task to each dependency.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTask`] when a dependency is not declared and
    /// [`Error::DependencyCycle`] when the dependencies form a cycle.
    pub fn new(specs: &[TaskSpec],) -> Result<Self, Error,>
    {
        let mut graph = DiGraphMap::new();
        for spec in specs {
            graph.add_node(spec.name,);
        }
        for spec in specs {
            for dependency in spec.dependencies {
                if !graph.contains_node(*dependency,) {
                    return Err(Error::UnknownTask {
                        name: dependency.to_string(),
                    },);
                }
                graph.add_edge(spec.name, *dependency, (),);
            }
        }

        toposort(&graph, None,).map_err(|cycle| Error::DependencyCycle {
            task: cycle.node_id().to_string(),
        },)?;

        Ok(Self {
            specs: specs.iter().map(|spec| (spec.name, *spec,),).collect(),
            graph,
        },)
    }

    /// Declaration of `task`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTask`] when `task` is not part of the graph.
    pub fn spec(&self, task: TaskName,) -> Result<&TaskSpec, Error,>
    {
        self.specs.get(&task,).ok_or_else(|| Error::UnknownTask {
            name: task.to_string(),
        },)
    }

    /// Order in which invoking `task` visits tasks: each dependency before
    /// its dependents, every task once, `task` last.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTask`] when `task` is not part of the graph.
    pub fn plan(&self, task: TaskName,) -> Result<Vec<TaskName,>, Error,>
    {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        self.visit(task, &mut visited, &mut order,)?;
        Ok(order,)
    }

    fn visit(
        &self,
        task: TaskName,
        visited: &mut HashSet<TaskName,>,
        order: &mut Vec<TaskName,>,
    ) -> Result<(), Error,>
    {
        if !visited.insert(task,) {
            return Ok((),);
        }
        for dependency in self.spec(task,)?.dependencies {
            self.visit(*dependency, visited, order,)?;
        }
        order.push(task,);
        Ok((),)
    }

    /// One line per task, in table order, shaped like `name  # description`.
    pub fn describe(&self,) -> String
    {
        let mut specs: Vec<&TaskSpec,> = self.specs.values().collect();
        specs.sort_by_key(|spec| spec.name,);

        let width = specs.iter().map(|spec| task_label(spec,).len(),).max().unwrap_or_default();

        specs
            .iter()
            .map(|spec| format!("{:<width$}  # {}\n", task_label(spec,), spec.description),)
            .collect()
    }
}

fn task_label(spec: &TaskSpec,) -> String
{
    if spec.parameters.is_empty() {
        spec.name.to_string()
    } else {
        format!("{}[{}]", spec.name, spec.parameters.join(",",))
    }
}

/// Execution state of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub enum TaskState
{
    Pending,
    Invoked,
}

/// Runs tasks of a [`TaskGraph`].
///
/// The executor owns the state shared by one run: which tasks were invoked,
/// the retry budget, and whether the analytics tooling was already prepared.
#[derive(Debug,)]
pub struct TaskExecutor<'a, R, S,>
{
    settings:           &'a Settings,
    graph:              &'a TaskGraph,
    executor:           RetryingExecutor<R, S,>,
    cleanup:            CleanupRegistry,
    root:               PathBuf,
    home:               Option<PathBuf,>,
    states:             HashMap<TaskName, TaskState,>,
    budget:             RetryBudget,
    analytics_prepared: bool,
}

impl<'a, R, S,> TaskExecutor<'a, R, S,>
where
    R: CommandRunner,
    S: Sleeper,
{
    /// Executor rooted at the current directory.
    pub fn new(settings: &'a Settings, graph: &'a TaskGraph, executor: RetryingExecutor<R, S,>,) -> Self
    {
        Self {
            settings,
            graph,
            executor,
            cleanup: CleanupRegistry::standard(settings,),
            root: PathBuf::from(".",),
            home: None,
            states: HashMap::new(),
            budget: RetryBudget::default(),
            analytics_prepared: false,
        }
    }

    /// Resolves cleanup patterns below `root`.
    pub fn with_root(mut self, root: impl Into<PathBuf,>,) -> Self
    {
        self.root = root.into();
        self
    }

    /// Installs analytics credentials into `home` instead of the user's home.
    pub fn with_home(mut self, home: impl Into<PathBuf,>,) -> Self
    {
        self.home = Some(home.into(),);
        self
    }

    /// Whether `task` already ran in this run.
    pub fn state(&self, task: TaskName,) -> TaskState
    {
        self.states.get(&task,).copied().unwrap_or(TaskState::Pending,)
    }

    /// Retries spent so far in this run.
    pub fn budget(&self,) -> RetryBudget
    {
        self.budget
    }

    /// Runner executing every command.
    pub fn runner(&self,) -> &R
    {
        self.executor.runner()
    }

    /// Invokes the task named by `invocation` after its dependencies.
    ///
    /// Tasks already invoked are skipped; `force` re-runs the named task
    /// itself, but not its dependencies.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when arguments are passed to a task that
    /// takes none and propagates the first failing task's error.
    pub async fn invoke(&mut self, invocation: &Invocation, force: bool,) -> Result<(), Error,>
    {
        let spec = self.graph.spec(invocation.task,)?;
        if invocation.args.len() > spec.parameters.len() {
            return Err(Error::validation(format!(
                "task '{}' accepts {} argument(s), got {}",
                invocation.task,
                spec.parameters.len(),
                invocation.args.len()
            ),),);
        }

        for task in self.graph.plan(invocation.task,)? {
            let target = task == invocation.task;
            if self.state(task,) == TaskState::Invoked && !(target && force) {
                debug!("Task '{}' already invoked", task);
                continue;
            }

            self.states.insert(task, TaskState::Invoked,);
            if target {
                self.run_action(invocation,).await?;
            } else {
                self.run_action(&Invocation::new(task,),).await?;
            }
        }

        Ok((),)
    }

    async fn run_action(&mut self, invocation: &Invocation,) -> Result<(), Error,>
    {
        info!("Running task '{}'", invocation);
        let settings = self.settings;

        match invocation.task {
            TaskName::Formulae => self.run_command(&settings.formulae_command,).await,
            TaskName::Cask => self.run_command(&settings.cask_command,).await,
            TaskName::Analytics => self.analytics(invocation.os()?,).await,
            TaskName::ApiSamples => self.run_command(&settings.api_samples_command,).await,
            TaskName::LinuxAnalytics | TaskName::AllAnalytics => self.reinvoke_analytics(Os::Linux,).await,
            TaskName::Build => self.run_command(&settings.build_command,).await,
            TaskName::Serve => self.run_command(&settings.serve_command,).await,
            TaskName::HtmlProofer => self.run_command(&settings.html_proofer_argv(),).await,
            TaskName::Jsonlint => lint::check_json(&self.root.join(&settings.site_dir,),).map(drop,),
            TaskName::Clean => self.remove(CleanupScope::Clean,),
            TaskName::Clobber => self.remove(CleanupScope::Clobber,),
            TaskName::FormulaAndAnalytics | TaskName::CaskAndAnalytics | TaskName::Test => Ok((),),
        }
    }

    async fn run_command(&self, argv: &[String],) -> Result<(), Error,>
    {
        let command = ExternalCommand::from_argv(argv,)?;
        self.executor.runner().run(&command,).await
    }

    /// Runs analytics for `os` regardless of whether it already ran.
    async fn reinvoke_analytics(&mut self, os: Os,) -> Result<(), Error,>
    {
        self.states.insert(TaskName::Analytics, TaskState::Invoked,);
        self.analytics(os,).await
    }

    async fn analytics(&mut self, os: Os,) -> Result<(), Error,>
    {
        if !self.analytics_prepared {
            let home = match &self.home {
                Some(home,) => home.clone(),
                None => credentials::home_directory()?,
            };
            credentials::prepare_analytics(self.settings, self.executor.runner(), &home,).await?;
            self.analytics_prepared = true;
        }

        AnalyticsGenerator::new(self.settings, &self.executor,).generate(os, &mut self.budget,).await?;
        Ok((),)
    }

    fn remove(&self, scope: CleanupScope,) -> Result<(), Error,>
    {
        for path in self.cleanup.remove(&self.root, scope,)? {
            info!("rm -rf {}", display_relative(&path, &self.root,));
        }
        Ok((),)
    }
}

fn display_relative(path: &Path, root: &Path,) -> String
{
    path.strip_prefix(root,).unwrap_or(path,).display().to_string()
}

#[cfg(test)]
mod tests
{
    use std::fs;

    use tempfile::{TempDir, tempdir};

    use super::*;
    use crate::{
        command::testing::ScriptedRunner,
        retry::{RetryPolicy, tests::RecordingSleeper},
    };

    struct Fixture
    {
        temp:     TempDir,
        settings: Settings,
        graph:    TaskGraph,
        runner:   ScriptedRunner,
    }

    impl Fixture
    {
        fn new() -> Self
        {
            Self::with_runner(ScriptedRunner::succeeding(),)
        }

        fn with_runner(runner: ScriptedRunner,) -> Self
        {
            let temp = tempdir().expect("failed to create tempdir",);
            let settings = Settings {
                data_root: temp.path().join("_data",),
                api_root: temp.path().join("api",),
                site_dir: temp.path().join("_site",),
                credentials_file: temp.path().join(".homebrew_analytics.json",),
                ..Settings::default()
            };
            Self {
                temp,
                settings,
                graph: TaskGraph::standard().expect("standard graph is valid",),
                runner,
            }
        }

        fn executor(&self,) -> TaskExecutor<'_, &ScriptedRunner, RecordingSleeper,>
        {
            let executor =
                RetryingExecutor::new(&self.runner, RecordingSleeper::default(), RetryPolicy::default(),);
            TaskExecutor::new(&self.settings, &self.graph, executor,)
                .with_root(self.temp.path(),)
                .with_home(self.temp.path().join("home",),)
        }

        fn count(&self, needle: &str,) -> usize
        {
            self.runner.command_lines().iter().filter(|line| line.contains(needle,),).count()
        }
    }

    fn invocation(value: &str,) -> Invocation
    {
        value.parse().expect("valid invocation",)
    }

    #[test]
    fn task_names_round_trip_through_display()
    {
        for task in TaskName::ALL {
            assert_eq!(task.to_string().parse::<TaskName>().expect("known task"), task);
        }
        assert!(matches!("deploy".parse::<TaskName>(), Err(Error::UnknownTask { .. })));
    }

    #[test]
    fn invocation_parses_bracketed_arguments()
    {
        let parsed = invocation("analytics[ linux ]",);
        assert_eq!(parsed.task, TaskName::Analytics);
        assert_eq!(parsed.args, vec!["linux".to_owned()]);
        assert_eq!(parsed.to_string(), "analytics[linux]");

        assert!(invocation("analytics[]").args.is_empty());
        assert_eq!(invocation("analytics",).os().expect("default os",), Os::Mac);
        assert!(invocation("analytics[windows]").os().is_err());
        assert!("analytics[linux".parse::<Invocation>().is_err());
        assert!(matches!("site[x]".parse::<Invocation>(), Err(Error::UnknownTask { .. })));
    }

    #[test]
    fn standard_table_covers_every_task()
    {
        let graph = TaskGraph::standard().expect("standard graph is valid",);
        for task in TaskName::ALL {
            assert_eq!(graph.spec(task,).expect("declared").name, task);
        }
    }

    #[test]
    fn plan_orders_dependencies_first_and_once()
    {
        let graph = TaskGraph::standard().expect("standard graph is valid",);
        assert_eq!(graph.plan(TaskName::Test,).expect("plan"), vec![
            TaskName::Build,
            TaskName::HtmlProofer,
            TaskName::Jsonlint,
            TaskName::Test
        ]);
        assert_eq!(graph.plan(TaskName::FormulaAndAnalytics,).expect("plan"), vec![
            TaskName::Formulae,
            TaskName::Analytics,
            TaskName::FormulaAndAnalytics
        ]);
    }

    #[test]
    fn cycles_are_rejected()
    {
        const CYCLIC: [TaskSpec; 2] = [
            spec(TaskName::Build, "build", &[TaskName::Test], &[],),
            spec(TaskName::Test, "test", &[TaskName::Build], &[],),
        ];
        assert!(matches!(TaskGraph::new(&CYCLIC), Err(Error::DependencyCycle { .. })));
    }

    #[test]
    fn undeclared_dependencies_are_rejected()
    {
        const DANGLING: [TaskSpec; 1] = [spec(TaskName::Test, "test", &[TaskName::Build], &[],)];
        match TaskGraph::new(&DANGLING,) {
            Err(Error::UnknownTask {
                name,
            },) => assert_eq!(name, "build"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn describe_lists_parameters()
    {
        let listing = TaskGraph::standard().expect("standard graph is valid",).describe();
        assert_eq!(listing.lines().count(), TaskName::ALL.len());
        assert!(listing.lines().any(|line| line.starts_with("analytics[os]") && line.ends_with("# Dump analytics data")));
    }

    #[tokio::test]
    async fn default_task_dumps_formulae_then_mac_analytics()
    {
        let fixture = Fixture::new();
        let mut executor = fixture.executor();

        executor.invoke(&Invocation::new(DEFAULT_TASK,), false,).await.expect("default task",);

        let lines = fixture.runner.command_lines();
        assert_eq!(lines[0], "brew ruby script/generate.rb");
        assert_eq!(lines[1], "brew tap homebrew/formula-analytics");
        assert_eq!(lines[2], "brew formula-analytics --setup");
        assert_eq!(lines.len(), 3 + 25);
        assert_eq!(fixture.count("--linux",), 0);
        assert_eq!(executor.state(TaskName::Analytics,), TaskState::Invoked);
        assert_eq!(executor.state(TaskName::Cask,), TaskState::Pending);
    }

    #[tokio::test]
    async fn invoked_tasks_run_once_unless_forced()
    {
        let fixture = Fixture::new();
        let mut executor = fixture.executor();
        let formulae = Invocation::new(TaskName::Formulae,);

        executor.invoke(&formulae, false,).await.expect("first run",);
        executor.invoke(&formulae, false,).await.expect("second run",);
        assert_eq!(fixture.runner.attempts(), 1);

        executor.invoke(&formulae, true,).await.expect("forced run",);
        assert_eq!(fixture.runner.attempts(), 2);
    }

    #[tokio::test]
    async fn all_analytics_runs_both_systems_with_one_setup()
    {
        let fixture = Fixture::new();
        let mut executor = fixture.executor();

        executor.invoke(&Invocation::new(TaskName::AllAnalytics,), false,).await.expect("all analytics",);

        assert_eq!(fixture.count("--setup",), 1);
        assert_eq!(fixture.count("--days-ago=",), 25 + 16);
        assert_eq!(fixture.count("--linux",), 16);
        assert!(fixture.temp.path().join("api/analytics-linux/install/365d.json").exists());
        assert!(fixture.temp.path().join("api/analytics/os-version/90d.json").exists());
    }

    #[tokio::test]
    async fn linux_analytics_bypasses_the_invoked_guard()
    {
        let fixture = Fixture::new();
        let mut executor = fixture.executor();

        executor.invoke(&invocation("analytics"), false,).await.expect("mac analytics",);
        executor.invoke(&invocation("linux_analytics"), false,).await.expect("linux analytics",);
        executor.invoke(&invocation("analytics[linux]"), false,).await.expect("guarded analytics",);

        assert_eq!(fixture.count("--linux",), 16);
        assert_eq!(fixture.count("--days-ago=",), 25 + 16);
    }

    #[tokio::test]
    async fn test_task_builds_once_and_lints()
    {
        let fixture = Fixture::new();
        let site = fixture.settings.site_dir.clone();
        fs::create_dir_all(&site,).expect("failed to create site",);
        fs::write(site.join("formula.json",), "[]",).expect("failed to write json",);
        let mut executor = fixture.executor();

        executor.invoke(&Invocation::new(TaskName::Test,), false,).await.expect("test task",);

        assert_eq!(fixture.runner.command_lines(), vec![
            "bundle exec jekyll build".to_owned(),
            format!("bundle exec htmlproofer {} --parallel {{\"in_processes\":4}}", site.display())
        ]);
    }

    #[tokio::test]
    async fn standalone_tasks_run_their_configured_command()
    {
        let cases = [
            (TaskName::ApiSamples, "./script/generate-api-samples.rb",),
            (TaskName::Build, "bundle exec jekyll build",),
            (TaskName::Serve, "bundle exec jekyll serve",),
            (TaskName::Formulae, "brew ruby script/generate.rb",),
            (TaskName::Cask, "brew ruby script/generate-cask.rb",),
        ];

        for (task, expected,) in cases {
            let fixture = Fixture::new();
            let mut executor = fixture.executor();

            executor.invoke(&Invocation::new(task,), false,).await.expect("task should run",);

            assert_eq!(fixture.runner.command_lines(), vec![expected.to_owned()], "task {task}");
            assert_eq!(executor.state(task,), TaskState::Invoked);
        }
    }

    #[tokio::test]
    async fn jsonlint_failure_aborts_with_count()
    {
        let fixture = Fixture::new();
        let site = fixture.settings.site_dir.clone();
        fs::create_dir_all(&site,).expect("failed to create site",);
        fs::write(site.join("broken.json",), "{",).expect("failed to write json",);
        let mut executor = fixture.executor();

        let result = executor.invoke(&Invocation::new(TaskName::Test,), false,).await;

        assert!(matches!(result, Err(Error::JsonLint { errors: 1 })));
        assert_eq!(executor.state(TaskName::Test,), TaskState::Pending);
    }

    #[tokio::test]
    async fn failing_dependency_stops_dependents()
    {
        let fixture = Fixture::with_runner(ScriptedRunner::failing_first(1,),);
        let mut executor = fixture.executor();

        let result = executor.invoke(&Invocation::new(TaskName::CaskAndAnalytics,), false,).await;

        assert!(matches!(result, Err(Error::CommandFailed { .. })));
        assert_eq!(fixture.runner.command_lines(), vec!["brew ruby script/generate-cask.rb".to_owned()]);
        assert_eq!(executor.state(TaskName::Analytics,), TaskState::Pending);
    }

    #[tokio::test]
    async fn arguments_are_rejected_for_parameterless_tasks()
    {
        let fixture = Fixture::new();
        let mut executor = fixture.executor();

        let result = executor.invoke(&invocation("formulae[linux]"), false,).await;

        assert!(matches!(result, Err(Error::Validation { .. })));
        assert_eq!(fixture.runner.attempts(), 0);
    }

    #[tokio::test]
    async fn clobber_removes_generated_analytics()
    {
        let fixture = Fixture::new();
        let mut executor = fixture.executor();
        executor.invoke(&invocation("analytics[linux]"), false,).await.expect("analytics",);
        assert!(fixture.temp.path().join("_data/analytics-linux").exists());

        executor.invoke(&Invocation::new(TaskName::Clobber,), false,).await.expect("clobber",);

        assert!(!fixture.temp.path().join("_data/analytics-linux").exists());
        assert!(!fixture.temp.path().join("api/analytics-linux").exists());
    }
}
