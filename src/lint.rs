// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// JSON validation of the built site.
///
/// Every `*.json` file below the site directory must parse as JSON without
/// any object repeating a key. Failures are collected rather than reported one at a time so the summary shows all
/// of them at once.
use std::{
    collections::HashSet,
    fmt, fs,
    path::{Path, PathBuf},
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use tracing::{debug, info};

use crate::error::{self, Error};

/// A file that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct LintFailure
{
    pub path:    PathBuf,
    /// Parser error.
    pub message: String,
}

/// Outcome of [`lint_json`].
#[derive(Debug, Clone, Default, PartialEq, Eq,)]
pub struct LintReport
{
    /// Number of files inspected.
    pub checked:  usize,
    pub failures: Vec<LintFailure,>,
}

impl LintReport
{
    /// Whether every file passed.
    pub fn is_clean(&self,) -> bool
    {
        self.failures.is_empty()
    }
}

/// JSON document validated for syntax and key uniqueness, discarding its
/// contents.
struct StrictJson;

impl<'de,> Deserialize<'de,> for StrictJson
{
    fn deserialize<D,>(deserializer: D,) -> Result<Self, D::Error,>
    where
        D: Deserializer<'de,>,
    {
        deserializer.deserialize_any(StrictJsonVisitor,)
    }
}

struct StrictJsonVisitor;

impl<'de,> Visitor<'de,> for StrictJsonVisitor
{
    type Value = StrictJson;

    fn expecting(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        f.write_str("a JSON value",)
    }

    fn visit_bool<E,>(self, _: bool,) -> Result<StrictJson, E,>
    where
        E: de::Error,
    {
        Ok(StrictJson,)
    }

    fn visit_i64<E,>(self, _: i64,) -> Result<StrictJson, E,>
    where
        E: de::Error,
    {
        Ok(StrictJson,)
    }

    fn visit_u64<E,>(self, _: u64,) -> Result<StrictJson, E,>
    where
        E: de::Error,
    {
        Ok(StrictJson,)
    }

    fn visit_f64<E,>(self, _: f64,) -> Result<StrictJson, E,>
    where
        E: de::Error,
    {
        Ok(StrictJson,)
    }

    fn visit_str<E,>(self, _: &str,) -> Result<StrictJson, E,>
    where
        E: de::Error,
    {
        Ok(StrictJson,)
    }

    fn visit_unit<E,>(self,) -> Result<StrictJson, E,>
    where
        E: de::Error,
    {
        Ok(StrictJson,)
    }

    fn visit_seq<A,>(self, mut seq: A,) -> Result<StrictJson, A::Error,>
    where
        A: SeqAccess<'de,>,
    {
        while seq.next_element::<StrictJson,>()?.is_some() {}
        Ok(StrictJson,)
    }

    fn visit_map<A,>(self, mut map: A,) -> Result<StrictJson, A::Error,>
    where
        A: MapAccess<'de,>,
    {
        let mut keys = HashSet::new();
        while let Some(key,) = map.next_key::<String,>()? {
            if !keys.insert(key.clone(),) {
                return Err(de::Error::custom(format!("duplicate key \"{key}\""),),);
            }
            map.next_value::<StrictJson,>()?;
        }
        Ok(StrictJson,)
    }
}

/// Parses `contents` as a single JSON document whose objects have unique keys.
fn validate_json(contents: &[u8],) -> Result<(), serde_json::Error,>
{
    serde_json::from_slice::<StrictJson,>(contents,).map(drop,)
}

/// Lists the JSON files below `site_dir`, sorted.
///
/// # Errors
///
/// Returns [`Error::Validation`] when `site_dir` cannot form a glob pattern.
pub fn json_files(site_dir: &Path,) -> Result<Vec<PathBuf,>, Error,>
{
    let pattern = site_dir.join("**",).join("*.json",);
    let entries = glob::glob(&pattern.to_string_lossy(),).map_err(|e| {
        Error::validation(format!("invalid site directory {}: {e}", site_dir.display()),)
    },)?;

    let mut files: Vec<PathBuf,> = entries.filter_map(Result::ok,).filter(|path| path.is_file(),).collect();
    files.sort();
    Ok(files,)
}

/// Parses every JSON file below `site_dir`.
///
/// # Errors
///
/// Returns [`Error::Io`] when a file cannot be read; parse failures are
/// reported in the returned [`LintReport`].
pub fn lint_json(site_dir: &Path,) -> Result<LintReport, Error,>
{
    let files = json_files(site_dir,)?;
    info!("Running JSONLint on {} files...", files.len());

    let pb = ProgressBar::new(files.len() as u64,);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.yellow} [{elapsed_precise}] {bar:40} {pos}/{len} {msg}",)
            .unwrap_or_else(|_| ProgressStyle::default_bar(),),
    );

    let mut report = LintReport::default();
    for path in files {
        pb.set_message(path.display().to_string(),);
        let contents = fs::read(&path,).map_err(|source| error::io_error(&path, source,),)?;
        if let Err(error,) = validate_json(&contents,) {
            debug!("{} is not valid JSON: {}", path.display(), error);
            report.failures.push(LintFailure {
                path,
                message: error.to_string(),
            },);
        }
        report.checked += 1;
        pb.inc(1,);
    }

    pb.finish_and_clear();
    Ok(report,)
}

/// Runs [`lint_json`] and turns failures into an error after printing them.
///
/// # Errors
///
/// Returns [`Error::JsonLint`] carrying the failure count when any file is
/// invalid.
pub fn check_json(site_dir: &Path,) -> Result<LintReport, Error,>
{
    let report = lint_json(site_dir,)?;

    if report.is_clean() {
        info!("JSONLint finished and found no errors.");
        return Ok(report,);
    }

    for failure in &report.failures {
        eprintln!("{}: {}", failure.path.display(), failure.message);
    }
    Err(Error::JsonLint {
        errors: report.failures.len(),
    },)
}

#[cfg(test)]
mod tests
{
    use tempfile::tempdir;

    use super::*;

    fn write(root: &Path, relative: &str, contents: &str,)
    {
        let path = root.join(relative,);
        if let Some(parent,) = path.parent() {
            fs::create_dir_all(parent,).expect("failed to create parent",);
        }
        fs::write(path, contents,).expect("failed to write file",);
    }

    #[test]
    fn nested_files_are_discovered()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        write(temp.path(), "api/formula.json", "[]",);
        write(temp.path(), "api/analytics/install/30d.json", "{}",);
        write(temp.path(), "index.html", "<html></html>",);

        let files = json_files(temp.path(),).expect("valid pattern",);
        assert_eq!(files, vec![
            temp.path().join("api/analytics/install/30d.json"),
            temp.path().join("api/formula.json")
        ]);
    }

    #[test]
    fn clean_site_passes()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        write(temp.path(), "api/formula.json", "[{\"name\":\"wget\"}]",);

        let report = check_json(temp.path(),).expect("valid site",);
        assert_eq!(report.checked, 1);
        assert!(report.is_clean());
    }

    #[test]
    fn invalid_files_are_counted()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        write(temp.path(), "api/good.json", "{}",);
        write(temp.path(), "api/bad.json", "{\"name\": }",);
        write(temp.path(), "api/analytics/install/30d.json", "---\nlayout: analytics_json\n",);

        let report = lint_json(temp.path(),).expect("lint should run",);
        assert_eq!(report.checked, 3);
        assert_eq!(report.failures.len(), 2);

        let error = check_json(temp.path(),).expect_err("invalid site",);
        match error {
            Error::JsonLint {
                errors,
            } => assert_eq!(errors, 2),
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn duplicate_keys_are_failures()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        write(temp.path(), "api/formula/wget.json", "{\"name\":\"wget\",\"name\":\"curl\"}",);
        write(temp.path(), "api/nested.json", "[{\"a\":{\"b\":1,\"b\":2}}]",);
        write(temp.path(), "api/siblings.json", "[{\"a\":1},{\"a\":2}]",);
        write(temp.path(), "api/empty.json", "",);

        let report = lint_json(temp.path(),).expect("lint should run",);
        assert_eq!(report.checked, 4);
        let failed: Vec<_,> = report.failures.iter().map(|failure| failure.path.clone(),).collect();
        assert_eq!(failed, vec![
            temp.path().join("api/empty.json"),
            temp.path().join("api/formula/wget.json"),
            temp.path().join("api/nested.json")
        ]);
        assert!(report.failures[1].message.contains("duplicate key \"name\""));
    }

    #[test]
    fn missing_site_has_nothing_to_check()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let report = lint_json(&temp.path().join("_site",),).expect("lint should run",);
        assert_eq!(report.checked, 0);
    }
}
