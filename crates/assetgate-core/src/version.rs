//! # Version File
//!
//! Reads the package version from a declarative file. The file is parsed,
//! never executed. Accepted forms, first match wins:
//!
//! ```text
//! __version__ = "0.1.3"                       # or `version = '0.1.3'`
//! version_info = (0, 1, 3, 'beta', 2)         # -> 0.1.3b2
//! 0.1.3                                       # bare, the only content
//! ```
//!
//! A computed `__version__` (the usual widget template derives it from
//! `version_info`) falls through to the tuple.

use crate::error::GateError;
use std::path::Path;

/// Read and parse `path`.
pub fn read_version(path: &Path) -> Result<String, GateError> {
    let text = std::fs::read_to_string(path).map_err(|e| GateError::io("read", path, e))?;
    parse_version(&text).map_err(|reason| GateError::VersionParse {
        path: path.to_path_buf(),
        reason,
    })
}

/// Extract a version string from file contents.
pub fn parse_version(text: &str) -> Result<String, String> {
    let lines: Vec<&str> = text
        .lines()
        .map(strip_comment)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    // A computed `__version__` is reported only when nothing else matches.
    let mut computed = None;
    for line in &lines {
        if let Some(rhs) = assignment(line, &["__version__", "version"]) {
            match unquote(rhs) {
                Some(value) => return non_empty(value),
                None => {
                    computed.get_or_insert_with(|| format!("expected a quoted string in `{line}`"));
                }
            }
        }
    }

    for line in &lines {
        if let Some(rhs) = assignment(line, &["version_info"]) {
            return from_version_info(rhs);
        }
    }

    if let Some(reason) = computed {
        return Err(reason);
    }
    match lines.as_slice() {
        [single] if !single.contains('=') => non_empty(unquote(single).unwrap_or(*single)),
        [] => Err("file is empty".to_string()),
        _ => Err("no `__version__` or `version_info` assignment".to_string()),
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    }
}

/// Right-hand side of `name = value` for one of `names`.
fn assignment<'a>(line: &'a str, names: &[&str]) -> Option<&'a str> {
    let (lhs, rhs) = line.split_once('=')?;
    let lhs = lhs.trim();
    names.contains(&lhs).then(|| rhs.trim())
}

fn unquote(value: &str) -> Option<&str> {
    let value = value.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = value.strip_prefix(quote).and_then(|v| v.strip_suffix(quote)) {
            return Some(inner);
        }
    }
    None
}

fn non_empty(value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        Err("version is empty".to_string())
    } else if value.chars().any(char::is_whitespace) {
        Err(format!("version `{value}` contains whitespace"))
    } else {
        Ok(value.to_string())
    }
}

/// `(major, minor, patch[, release[, serial]])`.
fn from_version_info(rhs: &str) -> Result<String, String> {
    let inner = rhs
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .ok_or_else(|| format!("expected a tuple, found `{rhs}`"))?;
    let parts: Vec<&str> = inner
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let [major, minor, patch, rest @ ..] = parts.as_slice() else {
        return Err("version_info needs at least major, minor and patch".to_string());
    };
    let number = |p: &str| {
        p.parse::<u64>()
            .map_err(|_| format!("`{p}` is not a version number"))
    };
    let mut version = format!("{}.{}.{}", number(*major)?, number(*minor)?, number(*patch)?);

    match rest {
        [] => {}
        [release, tail @ ..] => {
            let release = unquote(release).unwrap_or(*release);
            let marker = match release {
                "final" => None,
                "alpha" => Some("a"),
                "beta" => Some("b"),
                "candidate" => Some("rc"),
                other => return Err(format!("unknown release level `{other}`")),
            };
            if let Some(marker) = marker {
                let serial = match tail {
                    [] => 0,
                    [serial, ..] => number(*serial)?,
                };
                version.push_str(&format!("{marker}{serial}"));
            }
        }
    }
    Ok(version)
}

// =============================================================================
// TESTS
// =============================================================================
