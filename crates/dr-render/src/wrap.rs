//! Line breaking for banner text.

use crate::engine::TextEngine;

/// Greedy word wrap at roughly `width` characters.
///
/// Explicit newlines always break. A word longer than `width` is kept whole
/// on its own line; [`fit_line`] deals with it afterwards. Blank paragraphs
/// produce empty lines.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0usize;
        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            if current_len == 0 {
                current.push_str(word);
                current_len = word_len;
            } else if current_len + 1 + word_len <= width {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + word_len;
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_len = word_len;
            }
        }
        lines.push(current);
    }

    lines
}

/// Drop trailing characters from `line` until it measures at most
/// `max_width` pixels.
pub fn fit_line(engine: &mut dyn TextEngine, line: &str, max_width: f32) -> String {
    let mut fitted = line.to_string();
    while !fitted.is_empty() && engine.measure(&fitted) > max_width {
        fitted.pop();
    }
    let fitted = fitted.trim_end().to_string();
    if fitted.len() < line.trim_end().len() {
        tracing::debug!("trimmed banner line {line:?} to {fitted:?}");
    }
    fitted
}

/// Wrap `text` and fit every resulting line within `max_width` pixels.
pub fn layout_lines(
    engine: &mut dyn TextEngine,
    text: &str,
    wrap_width: usize,
    max_width: f32,
) -> Vec<String> {
    wrap_text(text, wrap_width)
        .iter()
        .map(|line| fit_line(engine, line, max_width))
        .collect()
}
