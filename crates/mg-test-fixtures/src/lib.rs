use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use walkdir::WalkDir;

pub const TESTCASE_FILE: &str = "testcase.json";

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid testcase {path}: {source}")]
    Invalid {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

pub fn demos_root() -> PathBuf {
    workspace_root().join("demos")
}

pub fn demo_dir(name: &str) -> PathBuf {
    demos_root().join(name)
}

pub fn demo_path(name: &str, file: &str) -> PathBuf {
    demo_dir(name).join(file)
}

/// Shared material table used by every demo.
pub fn demo_materials() -> PathBuf {
    demos_root().join("materials.json")
}

/// Expected outcome of rendering one demo.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum Expectation {
    #[serde(rename = "OK")]
    Ok {
        width: u32,
        height: u32,
        #[serde(default, rename = "scriptOutput")]
        script_output: Vec<String>,
    },
    #[serde(rename = "ERROR")]
    Error {
        #[serde(rename = "errorCode")]
        error_code: String,
        #[serde(default, rename = "messageContains")]
        message_contains: Option<String>,
    },
}

/// `testcase.json` of a demo directory. Relative paths in `args` resolve
/// against the demo directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoCase {
    #[serde(skip)]
    pub name: String,
    #[serde(skip)]
    pub dir: PathBuf,
    pub input: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub expect: Expectation,
}

impl DemoCase {
    pub fn input_path(&self) -> PathBuf {
        self.dir.join(&self.input)
    }
}

pub fn load_case(dir: &Path) -> Result<DemoCase, FixtureError> {
    let path = dir.join(TESTCASE_FILE);
    let text = fs::read_to_string(&path).map_err(|source| FixtureError::Read {
        path: path.clone(),
        source,
    })?;
    let mut case: DemoCase =
        serde_json::from_str(&text).map_err(|source| FixtureError::Invalid { path, source })?;
    case.name = dir
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    case.dir = dir.to_path_buf();
    Ok(case)
}

/// Every demo directory carrying a testcase, sorted by name.
pub fn discover_cases() -> Result<Vec<DemoCase>, FixtureError> {
    let mut dirs = WalkDir::new(demos_root())
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.into_path())
        .filter(|dir| dir.join(TESTCASE_FILE).is_file())
        .collect::<Vec<_>>();
    dirs.sort();
    dirs.iter().map(|dir| load_case(dir)).collect()
}
