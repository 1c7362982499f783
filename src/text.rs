//! Text layout: greedy word wrap and textbox line placement.
//!
//! Measuring is delegated to the caller so the same code serves the browser
//! canvas (`measureText`) and tests (fixed-width fonts).

#[cfg(test)]
#[path = "text_test.rs"]
mod text_test;

use crate::consts::{DEFAULT_FONT_SIZE, LINE_HEIGHT_RATIO, TEXTBOX_PADDING};
use crate::geometry::Point;
use crate::scene::Element;

/// One positioned line of textbox content, in pixel space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    /// Top-left corner of the line box.
    pub origin: Point,
}

/// Wrapped and clipped content of a textbox at a given zoom.
#[derive(Debug, Clone, PartialEq)]
pub struct TextboxLayout {
    /// Font size in pixels.
    pub font_size: f64,
    pub line_height: f64,
    pub lines: Vec<TextLine>,
    /// Lines dropped because they did not fit the box height.
    pub truncated: usize,
}

/// Wrap `text` into lines no wider than `max_width`.
///
/// Words are packed greedily; explicit newlines always break. A word wider
/// than `max_width` is split into fragments that fit. A single character
/// wider than `max_width` cannot be placed anywhere and is skipped.
pub fn wrap_text<F>(measure: F, text: &str, max_width: f64) -> Vec<String>
where
    F: Fn(&str) -> f64,
{
    let mut out = Vec::new();
    for raw_line in text.lines() {
        let words: Vec<&str> = raw_line.split_whitespace().collect();
        if words.is_empty() {
            out.push(String::new());
            continue;
        }

        let mut current = String::new();
        for word in words {
            if !current.is_empty() {
                let candidate = format!("{current} {word}");
                if measure(&candidate) <= max_width {
                    current = candidate;
                    continue;
                }
                out.push(std::mem::take(&mut current));
            }

            if measure(word) <= max_width {
                current = word.to_owned();
            } else {
                let mut fragments = break_long_word(&measure, word, max_width);
                if let Some(last) = fragments.pop() {
                    out.extend(fragments);
                    current = last;
                }
            }
        }
        if !current.is_empty() {
            out.push(current);
        }
    }
    out
}

fn break_long_word<F>(measure: &F, word: &str, max_width: f64) -> Vec<String>
where
    F: Fn(&str) -> f64,
{
    let mut fragments = Vec::new();
    let mut current = String::new();
    for ch in word.chars() {
        let mut candidate = current.clone();
        candidate.push(ch);
        if measure(&candidate) <= max_width {
            current = candidate;
            continue;
        }
        if current.is_empty() {
            continue;
        }
        fragments.push(std::mem::take(&mut current));
        let single = ch.to_string();
        if measure(&single) <= max_width {
            current = single;
        }
    }
    if !current.is_empty() {
        fragments.push(current);
    }
    fragments
}

/// Font size in pixels for a textbox at `zoom`.
#[must_use]
pub fn textbox_font_size(element: &Element, zoom: f64) -> f64 {
    element
        .font_size
        .filter(|s| s.is_finite() && *s > 0.0)
        .unwrap_or(DEFAULT_FONT_SIZE)
        * zoom
}

/// Lay out a textbox's text top-aligned and left-aligned inside its padded
/// box, in pixel space. `measure` must measure at [`textbox_font_size`].
///
/// Lines that would cross the bottom padding are dropped, not scrolled.
pub fn layout_textbox<F>(measure: F, element: &Element, zoom: f64) -> TextboxLayout
where
    F: Fn(&str) -> f64,
{
    let font_size = textbox_font_size(element, zoom);
    let line_height = font_size * LINE_HEIGHT_RATIO;
    let width = element.width * zoom;
    let height = element.height * zoom;
    let padding = TEXTBOX_PADDING * zoom;

    let left = element.x * zoom - width / 2.0 + padding;
    let top = element.y * zoom - height / 2.0 + padding;
    let bottom = element.y * zoom + height / 2.0 - padding;

    let wrapped = wrap_text(measure, element.text(), width - padding * 2.0);
    let total = wrapped.len();

    let mut lines = Vec::with_capacity(total);
    let mut y = top;
    for text in wrapped {
        if y + line_height > bottom {
            break;
        }
        lines.push(TextLine { text, origin: Point::new(left, y) });
        y += line_height;
    }

    let truncated = total - lines.len();
    TextboxLayout { font_size, line_height, lines, truncated }
}
