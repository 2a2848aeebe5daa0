//! Caption wrapping
//!
//! Breaks a value into lines at any character boundary so long tokens
//! (passwords, e-mail style usernames) never overflow the label, and
//! truncates with an ellipsis once the line budget is used.

const ELLIPSIS: char = '…';

/// Wrap `text` into at most `max_lines` lines no wider than `max_width`.
///
/// `measure` returns the rendered width of a string. Control characters are
/// shown as spaces. A line always holds at least one character, so a glyph
/// wider than `max_width` still makes progress.
pub fn wrap_break_all<F>(text: &str, max_width: f32, max_lines: usize, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    if max_lines == 0 {
        return Vec::new();
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        let ch = if ch.is_control() { ' ' } else { ch };
        current.push(ch);
        if current.chars().count() > 1 && measure(&current) > max_width {
            current.pop();
            lines.push(std::mem::take(&mut current));
            current.push(ch);
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }

    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            *last = with_ellipsis(last, max_width, &measure);
        }
    }

    lines
}

/// Append an ellipsis, dropping trailing characters until it fits
fn with_ellipsis<F>(line: &str, max_width: f32, measure: &F) -> String
where
    F: Fn(&str) -> f32,
{
    let mut chars: Vec<char> = line.chars().collect();
    loop {
        let candidate: String = chars.iter().chain(std::iter::once(&ELLIPSIS)).collect();
        if chars.is_empty() || measure(&candidate) <= max_width {
            return candidate;
        }
        chars.pop();
    }
}
