use crate::foundation::error::CardResult;

/// Pixel-width measurement seam used by the wrapping algorithm.
///
/// Implemented by [`crate::text::engine::FontMeasure`] over a loaded
/// font; anything that can price a string in pixels works.
pub trait MeasureText {
    fn text_width(&mut self, text: &str) -> CardResult<f32>;
}

/// Greedily wrap `text` so no line's measured width exceeds
/// `max_width`, inserting `\n` separators.
///
/// Chunks are runs of non-whitespace (words) and runs of whitespace.
/// A single chunk wider than the whole budget becomes its own line
/// unchanged, which guarantees termination. A purely-whitespace chunk
/// that overflows is dropped rather than pushed to the next line.
/// Finished lines are stripped of leading/trailing whitespace.
///
/// Pure and deterministic for a given measurer.
pub fn wrap_text(
    measure: &mut dyn MeasureText,
    text: &str,
    max_width: f32,
) -> CardResult<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    let mut line_width = 0.0f32;

    for chunk in split_chunks(text) {
        let width = measure.text_width(chunk)?;

        if line_width + width > max_width {
            if line.is_empty() {
                // An oversized word becomes its own line; oversized
                // whitespace is dropped outright.
                if !chunk.chars().all(char::is_whitespace) {
                    lines.push(chunk.to_string());
                }
                line_width = 0.0;
                continue;
            }
            lines.push(std::mem::take(&mut line));
            if chunk.chars().all(char::is_whitespace) {
                line_width = 0.0;
            } else {
                line.push_str(chunk);
                line_width = width;
            }
        } else {
            line.push_str(chunk);
            line_width += width;
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }

    Ok(lines
        .iter()
        .map(|l| l.trim())
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Split into alternating word and whitespace runs, preserving every
/// character.
fn split_chunks(text: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;
    while let Some(first) = rest.chars().next() {
        let in_whitespace = first.is_whitespace();
        let end = rest
            .find(|c: char| c.is_whitespace() != in_whitespace)
            .unwrap_or(rest.len());
        chunks.push(&rest[..end]);
        rest = &rest[end..];
    }
    chunks
}
