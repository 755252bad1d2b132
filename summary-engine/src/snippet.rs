//! Method source extraction by line range.

use std::path::Path;

use tracing::warn;

/// Reads lines `first_line..=last_line` (1-based, inclusive) from a source
/// file. Returns `None` — after logging — when the file is missing, the
/// path is not absolute, or the range does not fit the file; a single bad
/// method must not stop a pass.
pub fn extract_snippet(file_path: &str, first_line: i64, last_line: i64) -> Option<String> {
    let path = Path::new(file_path);
    if !path.is_absolute() || !path.exists() {
        warn!(file_path, "source file not found or path is not absolute");
        return None;
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(file_path, error = %e, "failed to read source file");
            return None;
        }
    };
    let lines: Vec<&str> = content.split_inclusive('\n').collect();

    if first_line < 1 || last_line < first_line || last_line as usize > lines.len() {
        warn!(
            file_path,
            first_line,
            last_line,
            file_lines = lines.len(),
            "invalid line range for method"
        );
        return None;
    }

    let start = (first_line - 1) as usize;
    let end = last_line as usize;
    Some(lines[start..end].concat())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn source_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn extracts_inclusive_range() {
        let file = source_file("line1\nline2\nline3\nline4\n");
        let path = file.path().to_str().unwrap();
        assert_eq!(extract_snippet(path, 2, 3), Some("line2\nline3\n".to_string()));
        assert_eq!(extract_snippet(path, 1, 1), Some("line1\n".to_string()));
    }

    #[test]
    fn whole_file() {
        let file = source_file("a\nb\n");
        let path = file.path().to_str().unwrap();
        assert_eq!(extract_snippet(path, 1, 2), Some("a\nb\n".to_string()));
    }

    #[test]
    fn rejects_bad_ranges() {
        let file = source_file("one\ntwo\n");
        let path = file.path().to_str().unwrap();
        assert_eq!(extract_snippet(path, 0, 1), None);
        assert_eq!(extract_snippet(path, 2, 1), None);
        assert_eq!(extract_snippet(path, 1, 99), None);
    }

    #[test]
    fn missing_file_is_none() {
        assert_eq!(extract_snippet("/definitely/not/here.java", 1, 2), None);
    }
}
