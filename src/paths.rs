//! Label sanitization and destination filenames.
//!
//! A message's caption text becomes its local filename. The sanitized,
//! truncated form is also the key the dedup index matches on, so both sides
//! must derive it identically.

/// Maximum length of a sanitized label, in characters.
pub const LABEL_MAX_CHARS: usize = 20;

/// Label used for messages with no caption text.
pub const FALLBACK_LABEL: &str = "video";

/// Extension of every file this tool writes (and indexes).
pub const VIDEO_SUFFIX: &str = ".mp4";

/// Derive a filename-safe label from caption text.
///
/// Strips characters invalid on common filesystems (`/ \ * ? : " < > |`),
/// turns newlines into spaces, drops carriage returns, and truncates to
/// [`LABEL_MAX_CHARS`] characters. Empty text falls back to
/// [`FALLBACK_LABEL`]. Total: never fails, always deterministic.
pub fn sanitize_label(text: &str) -> String {
    let source = if text.is_empty() { FALLBACK_LABEL } else { text };
    source
        .chars()
        .filter(|c| {
            !matches!(
                c,
                '/' | '\\' | '*' | '?' | ':' | '"' | '<' | '>' | '|' | '\r'
            )
        })
        .map(|c| if c == '\n' { ' ' } else { c })
        .take(LABEL_MAX_CHARS)
        .collect()
}

/// Filename for a label: `<label>.mp4`.
pub fn video_filename(label: &str) -> String {
    let mut name = String::with_capacity(label.len() + VIDEO_SUFFIX.len());
    name.push_str(label);
    name.push_str(VIDEO_SUFFIX);
    name
}

/// Insert a size-based suffix before the extension.
///
/// `"clip.mp4"` with size `12345` becomes `"clip-12345.mp4"`. Used when two
/// different videos share a label: the second gets a distinct name instead
/// of overwriting the first.
pub fn add_size_suffix(filename: &str, size: u64) -> String {
    use std::fmt::Write;
    match filename.rfind('.') {
        Some(dot) => {
            let (stem, ext) = filename.split_at(dot);
            let mut result = String::with_capacity(stem.len() + 1 + 20 + ext.len());
            result.push_str(stem);
            result.push('-');
            let _ = write!(result, "{}", size);
            result.push_str(ext);
            result
        }
        None => format!("{}-{}", filename, size),
    }
}

/// Sibling `.part` temp path for an in-flight download.
pub fn part_path(dest: &std::path::Path) -> std::path::PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.push_str(".part");
    dest.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_invalid_chars() {
        assert_eq!(sanitize_label("a/b\\c*d?e:f\"g<h>i|j"), "abcdefghij");
        assert_eq!(sanitize_label("normal caption"), "normal caption");
    }

    #[test]
    fn test_sanitize_newlines() {
        assert_eq!(sanitize_label("line one\nline two"), "line one line two");
        assert_eq!(sanitize_label("a\r\nb"), "a b");
        assert_eq!(sanitize_label("a\rb"), "ab");
    }

    #[test]
    fn test_sanitize_truncates_to_twenty_chars() {
        let long = "abcdefghijklmnopqrstuvwxyz";
        let label = sanitize_label(long);
        assert_eq!(label.chars().count(), LABEL_MAX_CHARS);
        assert_eq!(label, "abcdefghijklmnopqrst");
    }

    #[test]
    fn test_sanitize_truncates_chars_not_bytes() {
        // 25 multi-byte chars in, 20 out
        let long = "日".repeat(25);
        assert_eq!(sanitize_label(&long).chars().count(), LABEL_MAX_CHARS);
    }

    #[test]
    fn test_sanitize_empty_falls_back() {
        assert_eq!(sanitize_label(""), FALLBACK_LABEL);
    }

    #[test]
    fn test_sanitize_strips_before_truncating() {
        // Invalid chars don't count toward the 20-char limit
        let text = "??????????abcdefghijklmnop";
        assert_eq!(sanitize_label(text), "abcdefghijklmnop");
    }

    #[test]
    fn test_video_filename() {
        assert_eq!(video_filename("holiday clip"), "holiday clip.mp4");
        assert_eq!(video_filename(""), ".mp4");
    }

    #[test]
    fn test_add_size_suffix() {
        assert_eq!(add_size_suffix("clip.mp4", 12345), "clip-12345.mp4");
        assert_eq!(add_size_suffix("noext", 7), "noext-7");
        assert_eq!(add_size_suffix("a.b.mp4", 1), "a.b-1.mp4");
    }

    #[test]
    fn test_part_path() {
        use std::path::Path;
        assert_eq!(
            part_path(Path::new("/tmp/videos/clip.mp4")),
            Path::new("/tmp/videos/clip.mp4.part")
        );
    }
}
