//! Test discovery: the directory scanner and the test unit registry.
//!
//! The scanner recursively walks a root directory and, for every source
//! file opted into testing via the inline `/* TDD */` marker, executes the
//! test unit registered under the file's stem. Dependency subtrees (any
//! path containing a `vendor` segment) are never entered, unreadable
//! entries are skipped silently, and each eligible file is executed at most
//! once per scan.
//!
//! A compiled program cannot load source files at runtime, so execution
//! goes through an explicit registration step: each test unit registers a
//! named `fn() -> Result<(), Fatal>` with the process-wide registry at
//! startup, and the scanner dispatches an eligible file to the unit
//! registered under its stem.

use std::collections::{HashMap, HashSet};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::WalkDir;

use crate::cli::output::OutputSink;
use crate::errors::Fatal;

/// The extension a candidate file must carry, compared case-insensitively.
pub const SOURCE_EXTENSION: &str = "rs";

/// Any path component containing this segment marks an excluded subtree.
const EXCLUDED_SEGMENT: &str = "vendor";

/// The opt-in marker: a block comment containing the literal token `TDD`,
/// whitespace tolerant, anywhere in the file.
static MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\*\s*TDD\s*\*/").expect("marker pattern is valid"));

// ============================================================================
// Test unit registry
// ============================================================================

/// The run function of one registered test unit.
pub type TestFn = fn() -> Result<(), Fatal>;

static UNITS: Lazy<RwLock<HashMap<String, TestFn>>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Registers a test unit under a name (the stem of the source file that
/// opts it in). Append-only: the first registration of a name wins.
pub fn register_unit(name: &str, run: TestFn) {
    let mut units = UNITS.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    units.entry(name.to_string()).or_insert(run);
}

/// Looks up the unit registered under a name.
pub fn registered_unit(name: &str) -> Option<TestFn> {
    let units = UNITS.read().unwrap_or_else(|poisoned| poisoned.into_inner());
    units.get(name).copied()
}

// ============================================================================
// Candidate predicates
// ============================================================================

/// Returns true if the given path has the source extension, compared
/// case-insensitively.
fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION))
}

/// Returns true if any component of the path contains the excluded
/// dependency-directory segment, case-insensitively. Such subtrees are
/// pruned before descent.
fn is_excluded(path: &Path) -> bool {
    path.components().any(|component| {
        component
            .as_os_str()
            .to_string_lossy()
            .to_ascii_lowercase()
            .contains(EXCLUDED_SEGMENT)
    })
}

/// Returns true if the file content carries the opt-in marker.
fn has_marker(contents: &str) -> bool {
    MARKER.is_match(contents)
}

// ============================================================================
// Scanner
// ============================================================================

/// Walks a directory tree and runs the test unit of every eligible file.
///
/// The root is canonicalized once at construction and is immutable for the
/// scanner's lifetime. Eligible files are reported (path relative to the
/// root) before execution; execution is idempotent per canonical path and
/// per unit name, so a file reachable twice runs once.
#[derive(Debug)]
pub struct Scanner {
    root: PathBuf,
    executed_paths: HashSet<PathBuf>,
    executed_units: HashSet<String>,
}

impl Scanner {
    /// Resolves the scan root. A path that does not resolve to an existing,
    /// readable location is fatal.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, Fatal> {
        let given = root.as_ref();
        let root = fs::canonicalize(given).map_err(|source| Fatal::InvalidRoot {
            path: given.display().to_string(),
            source,
        })?;
        Ok(Self {
            root,
            executed_paths: HashSet::new(),
            executed_units: HashSet::new(),
        })
    }

    /// The resolved scan root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walks the tree, reporting and executing eligible files. Returns the
    /// number of units executed. The first fatal error aborts the scan.
    pub fn run(&mut self, sink: &mut dyn OutputSink) -> Result<usize, Fatal> {
        let mut executed = 0;

        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| !is_excluded(entry.path()));

        for entry in walker {
            // Unreadable entries are skipped silently.
            let Ok(entry) = entry else { continue };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if !has_source_extension(path) {
                continue;
            }
            let Ok(contents) = fs::read_to_string(path) else {
                continue;
            };
            if !has_marker(&contents) {
                continue;
            }
            if self.visit_eligible(path, sink)? {
                executed += 1;
            }
        }

        Ok(executed)
    }

    /// Reports an eligible file and executes its unit unless this file (by
    /// canonical path) or its unit (by name) already ran in this scan.
    fn visit_eligible(&mut self, path: &Path, sink: &mut dyn OutputSink) -> Result<bool, Fatal> {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        sink.emit(&format!("Testing: '{}'", relative.display()));

        let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if !self.executed_paths.insert(canonical) {
            return Ok(false);
        }

        let Some(stem) = path.file_stem().and_then(OsStr::to_str) else {
            return Ok(false);
        };
        if !self.executed_units.insert(stem.to_string()) {
            return Ok(false);
        }

        match registered_unit(stem) {
            Some(run) => {
                run()?;
                Ok(true)
            }
            // A marked file with no registered unit is the analog of
            // including a file whose top level does nothing.
            None => Ok(false),
        }
    }
}
