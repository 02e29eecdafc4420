// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Analytics matrix generation.
///
/// Every combination of category and day window for one operating system is
/// an [`AnalyticsCell`]. Each cell is queried through the retrying executor
/// into a JSON data file and paired with an API file carrying front matter
/// for the site generator.
use std::{
    collections::BTreeMap,
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::Serialize;
use tracing::{debug, info};

use crate::{
    command::{CommandRunner, ExternalCommand},
    config::Settings,
    error::{self, Error},
    retry::{RetryBudget, RetryingExecutor, Sleeper},
};

/// Day windows queried for every category.
pub const DAY_WINDOWS: [u32; 3] = [30, 90, 365];
/// Layout declared in the front matter of every API file.
pub const ANALYTICS_LAYOUT: &str = "analytics_json";
/// Only window generated for core-scoped build errors.
const BUILD_ERROR_WINDOW: u32 = 30;
const BUILD_ERROR: &str = "build-error";
const CORE_TAP: &str = "homebrew-core";
const CASK_TAP: &str = "homebrew-cask";

/// Operating system whose analytics are queried.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash,)]
pub enum Os
{
    #[default]
    Mac,
    Linux,
}

impl Os
{
    /// Name accepted as the `analytics` task argument.
    pub fn as_str(&self,) -> &'static str
    {
        match self {
            Self::Mac => "mac",
            Self::Linux => "linux",
        }
    }

    /// Flag selecting this OS in the analytics query, if any.
    pub fn flag(&self,) -> Option<&'static str,>
    {
        match self {
            Self::Mac => None,
            Self::Linux => Some("--linux",),
        }
    }

    /// Directory below the data and API roots holding this OS's files.
    pub fn directory_name(&self,) -> &'static str
    {
        match self {
            Self::Mac => "analytics",
            Self::Linux => "analytics-linux",
        }
    }
}

impl fmt::Display for Os
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        f.write_str(self.as_str(),)
    }
}

impl FromStr for Os
{
    type Err = Error;

    fn from_str(value: &str,) -> Result<Self, Self::Err,>
    {
        match value.trim() {
            "mac" | "macos" => Ok(Self::Mac,),
            "linux" => Ok(Self::Linux,),
            other => Err(Error::validation(format!("unsupported os '{other}', expected mac or linux"),),),
        }
    }
}

/// How a category is requested from the analytics tool.
///
/// The two variants map to mutually exclusive flag forms, so a single query
/// can never carry both.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub enum Query
{
    /// Per-category JSON listing.
    Json
    {
        name: &'static str,
    },
    /// One request covering every formula of a core tap.
    AllCoreFormulae
    {
        name:        &'static str,
        data_source: &'static str,
    },
}

impl Query
{
    /// Flag fragment passed after the day window.
    pub fn flags(&self,) -> [String; 2]
    {
        match self {
            Self::Json {
                name,
            } => ["--json".to_owned(), format!("--{name}"),],
            Self::AllCoreFormulae {
                name, ..
            } => ["--all-core-formulae-json".to_owned(), format!("--{name}"),],
        }
    }
}

/// Analytics categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash,)]
pub enum Category
{
    BuildError,
    Install,
    InstallOnRequest,
    CoreBuildError,
    CoreInstall,
    CoreInstallOnRequest,
    CaskInstall,
    CoreCaskInstall,
    OsVersion,
}

impl Category
{
    /// Categories available on every OS.
    pub const BASE: [Self; 6] = [
        Self::BuildError,
        Self::Install,
        Self::InstallOnRequest,
        Self::CoreBuildError,
        Self::CoreInstall,
        Self::CoreInstallOnRequest,
    ];
    /// Categories only reported for macOS.
    pub const MAC_ONLY: [Self; 3] = [Self::CaskInstall, Self::CoreCaskInstall, Self::OsVersion];

    /// Ordered categories queried for `os`.
    pub fn for_os(os: Os,) -> Vec<Self,>
    {
        let mut categories = Self::BASE.to_vec();
        if os == Os::Mac {
            categories.extend(Self::MAC_ONLY,);
        }
        categories
    }

    /// Identifier of the category, as listed in the task descriptions.
    pub fn key(&self,) -> &'static str
    {
        match self {
            Self::BuildError => "build-error",
            Self::Install => "install",
            Self::InstallOnRequest => "install-on-request",
            Self::CoreBuildError => "core-build-error",
            Self::CoreInstall => "core-install",
            Self::CoreInstallOnRequest => "core-install-on-request",
            Self::CaskInstall => "cask-install",
            Self::CoreCaskInstall => "core-cask-install",
            Self::OsVersion => "os-version",
        }
    }

    /// Flag form used to request this category.
    pub fn query(&self,) -> Query
    {
        match self {
            Self::CoreBuildError => Query::AllCoreFormulae {
                name: BUILD_ERROR, data_source: CORE_TAP,
            },
            Self::CoreInstall => Query::AllCoreFormulae {
                name: "install", data_source: CORE_TAP,
            },
            Self::CoreInstallOnRequest => Query::AllCoreFormulae {
                name: "install-on-request", data_source: CORE_TAP,
            },
            Self::CoreCaskInstall => Query::AllCoreFormulae {
                name: "cask-install", data_source: CASK_TAP,
            },
            other => Query::Json {
                name: other.key(),
            },
        }
    }

    /// Name used in paths and front matter.
    pub fn name(&self,) -> &'static str
    {
        match self.query() {
            Query::Json {
                name,
            }
            | Query::AllCoreFormulae {
                name, ..
            } => name,
        }
    }

    /// Tap the data is scoped to, for the all-core-formulae categories.
    pub fn data_source(&self,) -> Option<&'static str,>
    {
        match self.query() {
            Query::Json {
                ..
            } => None,
            Query::AllCoreFormulae {
                data_source, ..
            } => Some(data_source,),
        }
    }

    /// Directory holding this category's files below `root`.
    pub fn directory(&self, root: &Path, os: Os,) -> PathBuf
    {
        let directory = root.join(os.directory_name(),).join(self.name(),);
        match self.data_source() {
            Some(source,) => directory.join(source,),
            None => directory,
        }
    }
}

impl fmt::Display for Category
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        f.write_str(self.key(),)
    }
}

/// One (category, day window, OS) combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash,)]
pub struct AnalyticsCell
{
    pub category: Category,
    pub days:     u32,
    pub os:       Os,
}

impl AnalyticsCell
{
    /// Core-scoped build errors are only generated for the 30 day window.
    pub fn is_excluded(&self,) -> bool
    {
        self.days != BUILD_ERROR_WINDOW
            && self.category.name() == BUILD_ERROR
            && self.category.data_source().is_some()
    }

    fn file_name(&self,) -> String
    {
        format!("{}d.json", self.days)
    }

    /// Data file receiving the analytics tool output.
    pub fn data_path(&self, settings: &Settings,) -> PathBuf
    {
        self.category.directory(&settings.data_root, self.os,).join(self.file_name(),)
    }

    /// API file wrapping the data file in front matter.
    pub fn api_path(&self, settings: &Settings,) -> PathBuf
    {
        self.category.directory(&settings.api_root, self.os,).join(self.file_name(),)
    }

    /// Query writing this cell's data file.
    pub fn command(&self, settings: &Settings,) -> ExternalCommand
    {
        ExternalCommand::new(&settings.package_manager,)
            .arg(&settings.analytics_command,)
            .args(self.os.flag(),)
            .arg(format!("--days-ago={}", self.days),)
            .args(self.category.query().flags(),)
            .env(&settings.no_auto_update_env, "1",)
            .stdout_to(self.data_path(settings,),)
    }
}

/// Every cell generated for `os`, in generation order.
pub fn cells(os: Os,) -> Vec<AnalyticsCell,>
{
    Category::for_os(os,)
        .into_iter()
        .flat_map(|category| {
            DAY_WINDOWS.into_iter().map(move |days| AnalyticsCell {
                category,
                days,
                os,
            },)
        },)
        .filter(|cell| !cell.is_excluded(),)
        .collect()
}

#[derive(Serialize,)]
struct FrontMatter<'a,>
{
    layout:   &'a str,
    category: &'a str,
    #[serde(flatten)]
    sources:  BTreeMap<&'a str, bool,>,
}

/// Renders the API file for `category`: front matter followed by
/// `placeholder`.
///
/// # Errors
///
/// Returns [`Error::FrontMatter`] when the header cannot be serialized.
///
/// # Example
///
/// ```
/// use formulae_tasks::{Category, front_matter};
///
/// let rendered = front_matter(Category::CoreInstall, "{{ content }}",).expect("renders",);
/// assert_eq!(
///     rendered,
///     "---\nlayout: analytics_json\ncategory: install\nhomebrew-core: true\n---\n{{ content }}\n"
/// );
/// ```
pub fn front_matter(category: Category, placeholder: &str,) -> Result<String, Error,>
{
    let header = FrontMatter {
        layout:   ANALYTICS_LAYOUT,
        category: category.name(),
        sources:  category.data_source().map(|source| (source, true,),).into_iter().collect(),
    };
    let yaml = serde_yaml::to_string(&header,).map_err(|source| Error::FrontMatter {
        source,
    },)?;

    Ok(format!("---\n{yaml}---\n{placeholder}\n"),)
}

/// Files produced by one [`AnalyticsGenerator::generate`] run.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct GenerationReport
{
    pub os:    Os,
    /// Cells generated, in order.
    pub cells: Vec<AnalyticsCell,>,
    /// Cells skipped by [`AnalyticsCell::is_excluded`].
    pub skipped: usize,
}

/// Drives the analytics matrix for one OS.
#[derive(Debug,)]
pub struct AnalyticsGenerator<'a, R, S,>
{
    settings: &'a Settings,
    executor: &'a RetryingExecutor<R, S,>,
}

impl<'a, R, S,> AnalyticsGenerator<'a, R, S,>
where
    R: CommandRunner,
    S: Sleeper,
{
    /// Generator querying through `executor` with the paths of `settings`.
    pub fn new(settings: &'a Settings, executor: &'a RetryingExecutor<R, S,>,) -> Self
    {
        Self {
            settings,
            executor,
        }
    }

    /// Queries every cell for `os` and writes its data and API files.
    ///
    /// Retries are charged to `budget`, which the caller keeps for the whole
    /// run.
    ///
    /// # Errors
    ///
    /// Stops at the first cell whose query still fails once the budget is
    /// spent; files written by earlier cells are left in place.
    pub async fn generate(&self, os: Os, budget: &mut RetryBudget,) -> Result<GenerationReport, Error,>
    {
        let mut report = GenerationReport {
            os,
            cells: Vec::new(),
            skipped: 0,
        };

        for category in Category::for_os(os,) {
            for root in [&self.settings.data_root, &self.settings.api_root] {
                let directory = category.directory(root, os,);
                fs::create_dir_all(&directory,)
                    .map_err(|source| error::io_error(&directory, source,),)?;
            }

            let header = front_matter(category, &self.settings.content_placeholder,)?;

            for days in DAY_WINDOWS {
                let cell = AnalyticsCell {
                    category,
                    days,
                    os,
                };
                if cell.is_excluded() {
                    debug!("Skipping {} for {} days", category, days);
                    report.skipped += 1;
                    continue;
                }

                self.executor.execute(&cell.command(self.settings,), budget,).await?;

                let api_path = cell.api_path(self.settings,);
                fs::write(&api_path, &header,).map_err(|source| error::io_error(&api_path, source,),)?;
                report.cells.push(cell,);
            }
        }

        info!(
            "Generated {} analytics files for {} ({} retries used)",
            report.cells.len(),
            os,
            budget.used()
        );
        Ok(report,)
    }
}
