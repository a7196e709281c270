/// Raw document loading for course-notes folders.
///
/// Reads every `.txt`, `.md`, and `.pdf` file directly under a notes
/// directory and returns one cleaned text string per file. PDF text comes
/// out of `lopdf` page by page and gets a light scrub for slide-deck
/// artifacts before chunking.
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{info, warn};

/// Lines that are nothing but a page marker ("Page 12", "12 / 40", "- 3 -").
static PAGE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^\s*(page\s+\d+|\d+\s*/\s*\d+|-\s*\d+\s*-)\s*$").unwrap()
});

/// Three or more consecutive newlines.
static EXCESS_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Load all supported note files under `dir`, one text string per file.
///
/// Non-recursive: course notes live flat inside their course folder.
/// Unreadable files are logged and skipped rather than failing the whole
/// load.
pub fn load_texts<P: AsRef<Path>>(dir: P) -> Result<Vec<String>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read notes directory: {}", dir.display()))?;

    let mut texts = Vec::new();
    let mut paths: Vec<_> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    paths.sort();

    for path in paths {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let loaded = match ext.as_str() {
            "txt" | "md" => fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display())),
            "pdf" => pdf_to_text(&path),
            _ => continue,
        };

        match loaded {
            Ok(text) if !text.trim().is_empty() => texts.push(text),
            Ok(_) => warn!("skipping empty file: {}", path.display()),
            Err(e) => warn!("skipping unreadable file {}: {e:#}", path.display()),
        }
    }

    info!("loaded {} note files from {}", texts.len(), dir.display());
    Ok(texts)
}

/// Extract text from a PDF, concatenating pages with blank lines.
pub fn pdf_to_text(path: &Path) -> Result<String> {
    let doc = lopdf::Document::load(path)
        .with_context(|| format!("failed to open PDF {}", path.display()))?;

    let mut pages = Vec::new();
    for page_num in doc.get_pages().keys() {
        match doc.extract_text(&[*page_num]) {
            Ok(text) => pages.push(text),
            Err(e) => warn!("page {page_num} of {} unreadable: {e}", path.display()),
        }
    }

    Ok(clean_pdf_text(&pages.join("\n\n")))
}

/// Scrub extracted PDF text: drop page markers, collapse newline runs.
pub fn clean_pdf_text(text: &str) -> String {
    let text = PAGE_MARKER.replace_all(text, "");
    let text = EXCESS_NEWLINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_txt_and_md() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), "text notes").unwrap();
        fs::write(temp.path().join("b.md"), "# markdown notes").unwrap();
        fs::write(temp.path().join("c.docx"), "ignored format").unwrap();

        let texts = load_texts(temp.path()).unwrap();
        assert_eq!(texts.len(), 2);
        assert!(texts.contains(&"text notes".to_string()));
        assert!(texts.contains(&"# markdown notes".to_string()));
    }

    #[test]
    fn test_load_skips_empty_files() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("empty.txt"), "   \n\n  ").unwrap();
        fs::write(temp.path().join("real.txt"), "content").unwrap();

        let texts = load_texts(temp.path()).unwrap();
        assert_eq!(texts, vec!["content"]);
    }

    #[test]
    fn test_load_missing_directory_is_error() {
        let temp = tempdir().unwrap();
        let missing = temp.path().join("does-not-exist");
        assert!(load_texts(&missing).is_err());
    }

    #[test]
    fn test_load_skips_subdirectories() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("nested")).unwrap();
        fs::write(temp.path().join("nested").join("deep.txt"), "hidden").unwrap();
        fs::write(temp.path().join("top.txt"), "visible").unwrap();

        let texts = load_texts(temp.path()).unwrap();
        assert_eq!(texts, vec!["visible"]);
    }

    #[test]
    fn test_clean_pdf_text_page_markers() {
        let raw = "Graph algorithms\nPage 12\nShortest paths";
        let cleaned = clean_pdf_text(raw);
        assert!(!cleaned.contains("Page 12"));
        assert!(cleaned.contains("Graph algorithms"));
        assert!(cleaned.contains("Shortest paths"));
    }

    #[test]
    fn test_clean_pdf_text_collapses_newlines() {
        let raw = "part one\n\n\n\n\npart two";
        assert_eq!(clean_pdf_text(raw), "part one\n\npart two");
    }
}
