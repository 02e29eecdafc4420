//! Settings document describing the external tools and directories used by
//! the site tasks.
//!
//! The settings are loaded once at startup and passed by reference to every
//! component that needs them. Every field has a default matching the layout
//! of the documentation site, so an absent settings file is equivalent to an
//! empty one.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{self, Error},
    retry::RetryPolicy,
};

/// Settings file consulted when no explicit path is supplied.
pub const DEFAULT_CONFIG_FILE: &str = "formulae-tasks.yaml";
/// Command argument standing for [`Settings::site_dir`].
pub const SITE_DIR_PLACEHOLDER: &str = "{site_dir}";

/// Immutable configuration shared by all tasks.
///
/// # Examples
///
/// ```
/// use formulae_tasks::Settings;
///
/// let yaml = r#"
/// package_manager: /opt/homebrew/bin/brew
/// retry:
///   max_retries: 1
/// "#;
/// let settings: Settings = serde_yaml::from_str(yaml,).expect("valid settings",);
/// assert_eq!(settings.package_manager, "/opt/homebrew/bin/brew");
/// assert_eq!(settings.retry.max_retries, 1);
/// assert_eq!(settings.analytics_command, "formula-analytics");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize,)]
#[serde(default, deny_unknown_fields)]
pub struct Settings
{
    /// Package manager executable used for every analytics invocation.
    pub package_manager:     String,
    /// Package manager subcommand that queries the analytics database.
    pub analytics_command:   String,
    /// Tap providing [`Settings::analytics_command`].
    pub analytics_tap:       String,
    /// Environment variable that disables the package manager auto-update.
    pub no_auto_update_env:  String,
    /// Repository-relative credentials file, mirrored into the home directory.
    pub credentials_file:    PathBuf,
    /// Root of the data files consumed by the site generator.
    pub data_root:           PathBuf,
    /// Root of the published API files.
    pub api_root:            PathBuf,
    /// Output directory of the site generator.
    pub site_dir:            PathBuf,
    /// Body written after the front matter of every API file.
    pub content_placeholder: String,
    /// Generator dumping formulae metadata.
    pub formulae_command:    Vec<String,>,
    /// Generator dumping cask metadata.
    pub cask_command:        Vec<String,>,
    /// Generator producing the API sample payloads.
    pub api_samples_command: Vec<String,>,
    /// Site generator build entry point.
    pub build_command:       Vec<String,>,
    /// Site generator development server entry point.
    pub serve_command:       Vec<String,>,
    /// HTML validator run over [`Settings::site_dir`]; arguments equal to
    /// [`SITE_DIR_PLACEHOLDER`] are replaced by it.
    pub html_proofer_command: Vec<String,>,
    /// Retry policy applied to analytics queries.
    pub retry:               RetryPolicy,
}

impl Default for Settings
{
    fn default() -> Self
    {
        Self {
            package_manager:      "brew".to_owned(),
            analytics_command:    "formula-analytics".to_owned(),
            analytics_tap:        "homebrew/formula-analytics".to_owned(),
            no_auto_update_env:   "HOMEBREW_NO_AUTO_UPDATE".to_owned(),
            credentials_file:     PathBuf::from(".homebrew_analytics.json",),
            data_root:            PathBuf::from("_data",),
            api_root:             PathBuf::from("api",),
            site_dir:             PathBuf::from("_site",),
            content_placeholder:  "{{ content }}".to_owned(),
            formulae_command:     argv(&["brew", "ruby", "script/generate.rb"],),
            cask_command:         argv(&["brew", "ruby", "script/generate-cask.rb"],),
            api_samples_command:  argv(&["./script/generate-api-samples.rb"],),
            build_command:        argv(&["bundle", "exec", "jekyll", "build"],),
            serve_command:        argv(&["bundle", "exec", "jekyll", "serve"],),
            html_proofer_command: argv(&[
                "bundle",
                "exec",
                "htmlproofer",
                SITE_DIR_PLACEHOLDER,
                "--parallel",
                r#"{"in_processes":4}"#,
            ],),
            retry:                RetryPolicy::default(),
        }
    }
}

impl Settings
{
    /// Loads settings from `path`, or from [`DEFAULT_CONFIG_FILE`] when no
    /// path is given.
    ///
    /// A missing default file yields [`Settings::default`]; a missing explicit
    /// file is an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read, [`Error::Config`]
    /// when it is not a valid settings document and [`Error::Validation`] when
    /// a value violates the invariants checked by [`Settings::validate`].
    pub fn load(path: Option<&Path,>,) -> Result<Self, Error,>
    {
        let (path, required,) = match path {
            Some(path,) => (path, true,),
            None => (Path::new(DEFAULT_CONFIG_FILE,), false,),
        };

        let contents = match fs::read_to_string(path,) {
            Ok(contents,) => contents,
            Err(source,) if !required && source.kind() == ErrorKind::NotFound => {
                debug!("No settings file at {}, using defaults", path.display());
                return Ok(Self::default(),);
            }
            Err(source,) => return Err(error::io_error(path, source,),),
        };

        debug!("Loaded settings from {}", path.display());
        Self::parse(&contents,)
    }

    /// Parses and validates a settings document.
    ///
    /// # Errors
    ///
    /// Same as [`Settings::load`] minus the I/O failures.
    pub fn parse(contents: &str,) -> Result<Self, Error,>
    {
        // An empty document deserializes to unit, not to a mapping.
        let settings: Self =
            if contents.trim().is_empty() { Self::default() } else { serde_yaml::from_str(contents,)? };
        settings.validate()?;
        Ok(settings,)
    }

    /// Checks invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first offending field.
    pub fn validate(&self,) -> Result<(), Error,>
    {
        if self.package_manager.trim().is_empty() {
            return Err(Error::validation("package_manager must not be empty",),);
        }
        if self.analytics_command.trim().is_empty() {
            return Err(Error::validation("analytics_command must not be empty",),);
        }

        let commands = [
            ("formulae_command", &self.formulae_command,),
            ("cask_command", &self.cask_command,),
            ("api_samples_command", &self.api_samples_command,),
            ("build_command", &self.build_command,),
            ("serve_command", &self.serve_command,),
            ("html_proofer_command", &self.html_proofer_command,),
        ];
        for (field, command,) in commands {
            if command.first().is_none_or(|program| program.trim().is_empty(),) {
                return Err(Error::validation(format!("{field} must name a program"),),);
            }
        }

        self.retry.validate()
    }
}

impl Settings
{
    /// [`Settings::html_proofer_command`] with the site directory filled in.
    pub fn html_proofer_argv(&self,) -> Vec<String,>
    {
        let site_dir = self.site_dir.display().to_string();
        self.html_proofer_command
            .iter()
            .map(|arg| if arg == SITE_DIR_PLACEHOLDER { site_dir.clone() } else { arg.clone() },)
            .collect()
    }
}

fn argv(parts: &[&str],) -> Vec<String,>
{
    parts.iter().map(|part| (*part).to_owned(),).collect()
}
