//! Library folder scanner.
//!
//! Walks user-configured movie folders, extracts a title and release year
//! from each video filename, and builds an index the browse layer can use
//! to treat on-disk movies as already owned.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Video file extensions to consider.
const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "mov", "wmv", "m4v", "webm"];

/// A movie file found on disk.
#[derive(Debug, Clone)]
pub struct LocalMovie {
    pub title: String,
    pub normalized_title: String,
    pub year: Option<u16>,
    pub path: PathBuf,
}

/// Scan folders (recursively) for movie files.
///
/// Folders that do not exist are skipped with a warning rather than
/// failing the whole scan.
pub fn scan_folders(folders: &[String]) -> Vec<LocalMovie> {
    let mut movies = Vec::new();

    for folder in folders {
        let folder_path = Path::new(folder);
        if !folder_path.is_dir() {
            tracing::warn!(path = %folder, "Library folder does not exist, skipping");
            continue;
        }

        tracing::info!(path = %folder, "Scanning library folder");

        for entry in WalkDir::new(folder_path)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_lowercase());
            let is_video = ext
                .as_deref()
                .map(|e| VIDEO_EXTENSIONS.contains(&e))
                .unwrap_or(false);
            if !is_video {
                continue;
            }

            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            let (title, year) = extract_title_year(file_name);
            if title.is_empty() {
                continue;
            }

            movies.push(LocalMovie {
                normalized_title: normalize_title(&title),
                title,
                year,
                path: path.to_path_buf(),
            });
        }
    }

    tracing::info!(found = movies.len(), "Library scan complete");
    movies
}

/// Index of locally-owned movies keyed by normalized title.
#[derive(Debug, Default)]
pub struct LibraryIndex {
    titles: HashMap<String, Vec<Option<u16>>>,
}

impl LibraryIndex {
    /// Scan the given folders and build the index.
    pub fn build(folders: &[String]) -> Self {
        let mut titles: HashMap<String, Vec<Option<u16>>> = HashMap::new();
        for movie in scan_folders(folders) {
            titles.entry(movie.normalized_title).or_default().push(movie.year);
        }
        Self { titles }
    }

    /// Whether a movie with this title (and year, when both sides know it)
    /// exists on disk.
    pub fn is_owned(&self, title: &str, year: Option<u16>) -> bool {
        match self.titles.get(&normalize_title(title)) {
            None => false,
            Some(years) => {
                year.is_none() || years.iter().any(|y| y.is_none() || *y == year)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

/// Extract a movie title and release year from a filename.
///
/// Handles the common release-name shapes:
/// - `Movie Name (2020).mkv` / `Movie Name [2020].mkv`
/// - `Movie.Name.2020.1080p.BluRay.mkv`
/// - `Movie Name 2020.mkv`
///
/// When no year is found the cleaned-up stem is returned as the title.
pub fn extract_title_year(filename: &str) -> (String, Option<u16>) {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);

    if let Some((title, year)) = bracketed_year(stem) {
        return (title, Some(year));
    }
    if let Some((title, year)) = dotted_year(stem) {
        return (title, Some(year));
    }
    if let Some((title, year)) = standalone_year(stem) {
        return (title, Some(year));
    }

    (clean_separators(stem), None)
}

/// Normalize a title for comparison: lowercase, strip punctuation, collapse
/// whitespace.
pub fn normalize_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A 4-digit token in the range a movie release year could plausibly be.
fn plausible_year(s: &str) -> Option<u16> {
    if s.len() != 4 || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let year: u16 = s.parse().ok()?;
    (1900..=2099).contains(&year).then_some(year)
}

/// `Movie Name (2020)` / `Movie Name [2020]`.
fn bracketed_year(stem: &str) -> Option<(String, u16)> {
    let chars: Vec<char> = stem.chars().collect();
    for i in 0..chars.len() {
        let close = match chars[i] {
            '(' => ')',
            '[' => ']',
            _ => continue,
        };
        if i + 5 >= chars.len() || chars[i + 5] != close {
            continue;
        }
        let candidate: String = chars[i + 1..i + 5].iter().collect();
        let Some(year) = plausible_year(&candidate) else {
            continue;
        };
        let title = clean_separators(&chars[..i].iter().collect::<String>());
        if !title.is_empty() {
            return Some((title, year));
        }
    }
    None
}

/// `Movie.Name.2020.1080p` — year is a dotted token with more tokens after it.
fn dotted_year(stem: &str) -> Option<(String, u16)> {
    let tokens: Vec<&str> = stem.split('.').collect();
    for i in 1..tokens.len().saturating_sub(1) {
        if let Some(year) = plausible_year(tokens[i]) {
            let title = tokens[..i].join(" ").trim().to_string();
            if !title.is_empty() {
                return Some((title, year));
            }
        }
    }
    None
}

/// `Movie Name 2020` — year as a standalone word after the title.
fn standalone_year(stem: &str) -> Option<(String, u16)> {
    let words: Vec<&str> = stem.split_whitespace().collect();
    for i in 1..words.len() {
        if let Some(year) = plausible_year(words[i]) {
            let title = words[..i].join(" ");
            return Some((title, year));
        }
    }
    None
}

/// Replace dot/underscore separators with spaces and collapse whitespace.
fn clean_separators(s: &str) -> String {
    s.replace(['.', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parenthesized_year() {
        let (title, year) = extract_title_year("The Matrix (1999).mkv");
        assert_eq!(title, "The Matrix");
        assert_eq!(year, Some(1999));
    }

    #[test]
    fn test_bracketed_year() {
        let (title, year) = extract_title_year("Inception [2010].mp4");
        assert_eq!(title, "Inception");
        assert_eq!(year, Some(2010));
    }

    #[test]
    fn test_dotted_release_name() {
        let (title, year) = extract_title_year("Movie.Name.2020.1080p.BluRay.mkv");
        assert_eq!(title, "Movie Name");
        assert_eq!(year, Some(2020));
    }

    #[test]
    fn test_standalone_year() {
        let (title, year) = extract_title_year("Movie Name 2020.avi");
        assert_eq!(title, "Movie Name");
        assert_eq!(year, Some(2020));
    }

    #[test]
    fn test_no_year() {
        let (title, year) = extract_title_year("Some_Movie.File.mkv");
        assert_eq!(title, "Some Movie File");
        assert_eq!(year, None);
    }

    #[test]
    fn test_resolution_is_not_a_year() {
        // 1080 is not a plausible release year.
        let (title, year) = extract_title_year("Short Clip 1080.mkv");
        assert_eq!(title, "Short Clip 1080");
        assert_eq!(year, None);
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("The  Matrix: Reloaded!"), "the matrix reloaded");
        assert_eq!(normalize_title("WALL·E"), "wall e");
    }

    #[test]
    fn test_scan_skips_non_video() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("readme.txt"), "hello").unwrap();
        std::fs::write(dir.path().join("The Matrix (1999).mkv"), "x").unwrap();

        let movies = scan_folders(&[dir.path().to_string_lossy().to_string()]);
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].title, "The Matrix");
        assert_eq!(movies[0].year, Some(1999));
    }

    #[test]
    fn test_scan_missing_folder() {
        let movies = scan_folders(&["/nonexistent/popcorn-test".to_string()]);
        assert!(movies.is_empty());
    }

    #[test]
    fn test_library_index_owned() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("The Matrix (1999).mkv"), "x").unwrap();
        std::fs::write(dir.path().join("Unknown_Film.mkv"), "x").unwrap();

        let index = LibraryIndex::build(&[dir.path().to_string_lossy().to_string()]);
        assert_eq!(index.len(), 2);
        assert!(index.is_owned("The Matrix", Some(1999)));
        assert!(index.is_owned("the matrix", None));
        assert!(!index.is_owned("The Matrix", Some(2003)));
        // A local file with no detectable year matches any year.
        assert!(index.is_owned("Unknown Film", Some(2001)));
        assert!(!index.is_owned("Other Movie", None));
    }
}
