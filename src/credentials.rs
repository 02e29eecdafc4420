// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// One-time preparation of the analytics tooling.
///
/// The analytics tool reads its credentials from the home directory, so the
/// repository copy is mirrored there when missing. The tap providing the
/// tool is then installed and its own setup is run.
use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{info, warn};

use crate::{
    command::{CommandRunner, ExternalCommand},
    config::Settings,
    error::{self, Error},
};

/// Result of [`install_credentials`].
#[derive(Debug, Clone, PartialEq, Eq,)]
pub enum CredentialsOutcome
{
    /// The credentials were copied to the contained path.
    Installed(PathBuf,),
    /// The home directory already held credentials; nothing was touched.
    AlreadyPresent(PathBuf,),
    /// Neither copy exists; the analytics tool will prompt or fail on its own.
    SourceMissing(PathBuf,),
}

/// Resolves the current user's home directory.
///
/// # Errors
///
/// Returns [`Error::Validation`] when the platform reports no home directory.
pub fn home_directory() -> Result<PathBuf, Error,>
{
    dirs::home_dir().ok_or_else(|| Error::validation("unable to determine the home directory",),)
}

/// Copies the repository credentials file into `home` unless a copy already
/// exists there.
///
/// # Errors
///
/// Returns [`Error::Validation`] when the configured credentials path has no
/// file name and [`Error::Io`] when the copy fails.
pub fn install_credentials(settings: &Settings, home: &Path,) -> Result<CredentialsOutcome, Error,>
{
    let source = settings.credentials_file.as_path();
    let file_name = source.file_name().ok_or_else(|| {
        Error::validation(format!("credentials_file {} has no file name", source.display()),)
    },)?;
    let destination = home.join(file_name,);

    if destination.exists() {
        return Ok(CredentialsOutcome::AlreadyPresent(destination,),);
    }

    if !source.is_file() {
        warn!(
            "No analytics credentials at {} or {}",
            source.display(),
            destination.display()
        );
        return Ok(CredentialsOutcome::SourceMissing(destination,),);
    }

    fs::copy(source, &destination,).map_err(|e| error::io_error(&destination, e,),)?;
    info!("Installed analytics credentials to {}", destination.display());
    Ok(CredentialsOutcome::Installed(destination,),)
}

/// Commands installing the analytics tap and running the tool's setup.
pub fn setup_commands(settings: &Settings,) -> [ExternalCommand; 2]
{
    let base = || {
        ExternalCommand::new(&settings.package_manager,).env(&settings.no_auto_update_env, "1",)
    };
    [
        base().args(["tap", settings.analytics_tap.as_str()],),
        base().args([settings.analytics_command.as_str(), "--setup"],),
    ]
}

/// Installs credentials into `home` and runs [`setup_commands`].
///
/// # Errors
///
/// Propagates failures of [`install_credentials`] and of either command.
pub async fn prepare_analytics<R,>(settings: &Settings, runner: &R, home: &Path,) -> Result<(), Error,>
where
    R: CommandRunner,
{
    install_credentials(settings, home,)?;
    for command in setup_commands(settings,) {
        runner.run(&command,).await?;
    }
    Ok((),)
}
