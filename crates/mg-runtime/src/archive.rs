use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use mg_core::MapGenError;
use regex::Regex;
use walkdir::WalkDir;

/// Entry pattern of script files picked up as system scripts.
pub const SYSTEM_SCRIPT_PATTERN: &str = "*.c";

/// Read-only container of named text entries.
pub trait Archive {
    fn name(&self) -> &str;

    /// Entry names matching a `*`/`?` wildcard, case-insensitively, in name order.
    fn find_entries(&self, pattern: &str) -> Result<Vec<String>, MapGenError>;

    fn read_entry_as_text(&self, name: &str) -> Result<String, MapGenError>;
}

/// Opens archives by path. Injected into the generator so lookups can be
/// observed in tests.
pub trait ArchiveOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn Archive>, MapGenError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FsArchiveOpener;

impl ArchiveOpener for FsArchiveOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn Archive>, MapGenError> {
        Ok(Box::new(DirectoryArchive::open(path)?))
    }
}

pub fn wildcard_regex(pattern: &str) -> Result<Regex, MapGenError> {
    let mut expression = String::from("(?i)^");
    for ch in pattern.chars() {
        match ch {
            '*' => expression.push_str(".*"),
            '?' => expression.push('.'),
            other => expression.push_str(&regex::escape(&other.to_string())),
        }
    }
    expression.push('$');
    Regex::new(&expression).map_err(|error| {
        MapGenError::new(
            "ARCHIVE_PATTERN",
            format!("Invalid entry pattern '{}': {}", pattern, error),
        )
    })
}

fn missing_entry(name: &str) -> MapGenError {
    MapGenError::new(
        "ARCHIVE_ENTRY_MISSING",
        format!("Failed to load '{}': No such file", name),
    )
}

/// A plain directory seen as an archive. Only files directly inside it are
/// entries.
#[derive(Debug, Clone)]
pub struct DirectoryArchive {
    root: PathBuf,
    name: String,
    entries: Vec<String>,
}

impl DirectoryArchive {
    pub fn open(path: &Path) -> Result<Self, MapGenError> {
        let open_error = |reason: String| {
            MapGenError::new(
                "ARCHIVE_OPEN",
                format!("Failed to open directory '{}': {}", path.display(), reason),
            )
        };
        if !path.is_dir() {
            let reason = if path.exists() {
                "Not a directory".to_string()
            } else {
                "No such file or directory".to_string()
            };
            return Err(open_error(reason));
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(path).min_depth(1).max_depth(1).follow_links(true) {
            let entry = entry.map_err(|error| open_error(error.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            entries.push(entry.file_name().to_string_lossy().to_string());
        }
        entries.sort();

        Ok(Self {
            root: path.to_path_buf(),
            name: path.display().to_string(),
            entries,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Archive for DirectoryArchive {
    fn name(&self) -> &str {
        &self.name
    }

    fn find_entries(&self, pattern: &str) -> Result<Vec<String>, MapGenError> {
        let regex = wildcard_regex(pattern)?;
        Ok(self
            .entries
            .iter()
            .filter(|entry| regex.is_match(entry))
            .cloned()
            .collect())
    }

    fn read_entry_as_text(&self, name: &str) -> Result<String, MapGenError> {
        let Some(entry) = self
            .entries
            .iter()
            .find(|entry| entry.eq_ignore_ascii_case(name))
        else {
            return Err(missing_entry(name));
        };
        let path = self.root.join(entry);
        fs::read_to_string(&path).map_err(|error| {
            MapGenError::new(
                "ARCHIVE_READ",
                format!("Failed to read '{}': {}", path.display(), error),
            )
        })
    }
}

/// Archive held in memory, for embedded script packs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    name: String,
    entries: BTreeMap<String, String>,
}

impl MemoryArchive {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn with_entry(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(name, text);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.entries.insert(name.into(), text.into());
    }
}

impl Archive for MemoryArchive {
    fn name(&self) -> &str {
        &self.name
    }

    fn find_entries(&self, pattern: &str) -> Result<Vec<String>, MapGenError> {
        let regex = wildcard_regex(pattern)?;
        Ok(self
            .entries
            .keys()
            .filter(|entry| regex.is_match(entry))
            .cloned()
            .collect())
    }

    fn read_entry_as_text(&self, name: &str) -> Result<String, MapGenError> {
        self.entries
            .iter()
            .find(|(entry, _)| entry.eq_ignore_ascii_case(name))
            .map(|(_, text)| text.clone())
            .ok_or_else(|| missing_entry(name))
    }
}
