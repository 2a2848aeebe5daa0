//! Output file names
//!
//! Usernames are reduced to a portable file stem: ASCII alphanumerics,
//! `-`, `_` and `.` survive; everything else becomes `_`. Existing files
//! are never replaced: a numbered sibling is picked instead.

use std::path::{Path, PathBuf};

/// Longest stem taken from a username
const MAX_STEM_CHARS: usize = 64;

/// Reduce `raw` to a safe file stem, or `None` if nothing usable remains
pub fn sanitize_stem(raw: &str) -> Option<String> {
    let mut stem = String::with_capacity(raw.len());
    for ch in raw.trim().chars() {
        let mapped = if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
            ch
        } else {
            '_'
        };
        if mapped == '_' && stem.ends_with('_') {
            continue;
        }
        stem.push(mapped);
    }

    let stem: String = stem
        .trim_matches(|c| c == '_' || c == '.')
        .chars()
        .take(MAX_STEM_CHARS)
        .collect();
    let stem = stem.trim_end_matches(|c| c == '_' || c == '.');

    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

/// `<prefix>-<username or fallback>.pdf`
pub fn single_filename(prefix: &str, username: &str, fallback: &str) -> String {
    let stem = sanitize_stem(username).unwrap_or_else(|| fallback.to_string());
    format!("{}-{}.pdf", prefix, stem)
}

/// `<prefix>-<page tag>-<timestamp>.pdf`
pub fn batch_filename(prefix: &str, page_tag: &str, timestamp_ms: i64) -> String {
    format!("{}-{}-{}.pdf", prefix, page_tag, timestamp_ms)
}

/// First free path for `filename` in `dir`: the name itself, then
/// `<stem>-1.<ext>`, `<stem>-2.<ext>` and so on
pub fn unused_path(dir: &Path, filename: &str) -> PathBuf {
    let first = dir.join(filename);
    if !first.exists() {
        return first;
    }

    let (stem, ext) = match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (filename, None),
    };
    (1u32..)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{}-{}.{}", stem, n, ext)),
            None => dir.join(format!("{}-{}", stem, n)),
        })
        .find(|path| !path.exists())
        .unwrap_or(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_username() {
        assert_eq!(single_filename("etiqueta", "jeandsds", "credencial"), "etiqueta-jeandsds.pdf");
    }

    #[test]
    fn test_fallback() {
        assert_eq!(single_filename("etiqueta", "", "credencial"), "etiqueta-credencial.pdf");
        assert_eq!(single_filename("etiqueta", "///", "credencial"), "etiqueta-credencial.pdf");
        assert_eq!(single_filename("etiqueta", "..", "credencial"), "etiqueta-credencial.pdf");
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_stem("john doe").as_deref(), Some("john_doe"));
        assert_eq!(sanitize_stem("../../etc/passwd").as_deref(), Some("etc_passwd"));
        assert_eq!(sanitize_stem("josé@corp.com").as_deref(), Some("jos_corp.com"));
        assert_eq!(sanitize_stem("a  \t b").as_deref(), Some("a_b"));
        assert_eq!(sanitize_stem("C:\\Users\\x").as_deref(), Some("C_Users_x"));
    }

    #[test]
    fn test_sanitize_caps_length() {
        let long = "a".repeat(200);
        assert_eq!(sanitize_stem(&long).map(|s| s.len()), Some(64));
    }

    #[test]
    fn test_batch_filename() {
        assert_eq!(
            batch_filename("lote-etiquetas", "10x10", 1_700_000_000_000),
            "lote-etiquetas-10x10-1700000000000.pdf"
        );
    }

    #[test]
    fn test_unused_path_numbers_existing_files() {
        let dir = std::env::temp_dir().join(format!("names-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        assert_eq!(unused_path(&dir, "etiqueta-alice.pdf"), dir.join("etiqueta-alice.pdf"));
        std::fs::write(dir.join("etiqueta-alice.pdf"), b"first").unwrap();
        assert_eq!(unused_path(&dir, "etiqueta-alice.pdf"), dir.join("etiqueta-alice-1.pdf"));
        std::fs::write(dir.join("etiqueta-alice-1.pdf"), b"second").unwrap();
        assert_eq!(unused_path(&dir, "etiqueta-alice.pdf"), dir.join("etiqueta-alice-2.pdf"));

        std::fs::write(dir.join("README"), b"").unwrap();
        assert_eq!(unused_path(&dir, "README"), dir.join("README-1"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
