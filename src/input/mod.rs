//! URL list discovery and parsing
//!
//! Input is a folder of newline-delimited `*.txt` files. Each non-blank,
//! whitespace-trimmed line is one URL. The file stem names the source the
//! list came from and is reused for the report name.

use crate::{InputError, InputResult};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// One input file and the URLs it contains
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlList {
    /// File name including extension (e.g. `example.com.txt`)
    pub name: String,

    /// File name without the `.txt` extension
    pub stem: String,

    /// Full path to the file
    pub path: PathBuf,

    /// URLs in file order, blank lines removed
    pub urls: Vec<String>,
}

/// URL lists found in an input folder
#[derive(Debug, Default)]
pub struct Discovered {
    /// Readable lists, sorted by file name
    pub lists: Vec<UrlList>,

    /// Files that matched but could not be read
    pub unreadable: Vec<InputError>,
}

/// Reads every `*.txt` file in `folder`, sorted by file name
///
/// A file that cannot be read is logged and set aside in
/// [`Discovered::unreadable`]; the other lists are still returned.
///
/// # Returns
///
/// * `Ok(Discovered)` - One list per readable file (possibly with no URLs)
/// * `Err(InputError::MissingFolder)` - `folder` does not exist
/// * `Err(InputError::NoUrlFiles)` - `folder` has no `*.txt` files
/// * `Err(InputError::Read)` - The folder or every matching file was unreadable
pub fn read_url_lists(folder: &Path) -> InputResult<Discovered> {
    if !folder.is_dir() {
        return Err(InputError::MissingFolder(folder.to_path_buf()));
    }

    let entries = fs::read_dir(folder).map_err(|source| InputError::Read {
        path: folder.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| InputError::Read {
            path: folder.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && is_url_file(&path) {
            paths.push(path);
        }
    }

    if paths.is_empty() {
        return Err(InputError::NoUrlFiles(folder.to_path_buf()));
    }

    paths.sort();
    let mut discovered = Discovered::default();
    for path in &paths {
        match read_url_list(path) {
            Ok(list) => discovered.lists.push(list),
            Err(e) => {
                tracing::warn!("Skipping unreadable file: {}", e);
                discovered.unreadable.push(e);
            }
        }
    }

    if discovered.lists.is_empty() && !discovered.unreadable.is_empty() {
        return Err(discovered.unreadable.remove(0));
    }

    Ok(discovered)
}

/// Reads a single URL list file
pub fn read_url_list(path: &Path) -> InputResult<UrlList> {
    let bytes = fs::read(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let content = String::from_utf8_lossy(&bytes);

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.strip_suffix(".txt").unwrap_or(&name).to_string();
    let urls = parse_url_list(&content);

    let malformed = count_malformed(&urls);
    if malformed > 0 {
        tracing::warn!(
            "{} of {} lines in {} are not absolute URLs; they will be reported as errors",
            malformed,
            urls.len(),
            name
        );
    }

    Ok(UrlList {
        name,
        stem,
        path: path.to_path_buf(),
        urls,
    })
}

/// Splits file content into URLs
///
/// Lines are trimmed and blank lines dropped. Nothing else is altered:
/// duplicates and malformed entries are kept so every line gets a report row.
pub fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Counts entries that do not parse as absolute URLs
pub fn count_malformed(urls: &[String]) -> usize {
    urls.iter().filter(|u| Url::parse(u).is_err()).count()
}

fn is_url_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(".txt"))
        .unwrap_or(false)
}
