//! Terminal renderer for the in-memory host.
//!
//! Flattens a [`MemoryHost`] subtree into a [`Frame`]: one line per text
//! node, indented by element depth, styled from the `bold`, `italic`,
//! `underline` and `fg` attributes of its ancestors. Only lines that differ
//! from the previous frame are written.

use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Attribute, Color, ContentStyle, PrintStyledContent, StyledContent},
    terminal::{Clear, ClearType},
};

use crate::types::PropValue;

use super::memory::{HostId, HostNodeKind, MemoryHost};

// =============================================================================
// Frame
// =============================================================================

/// One rendered line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameLine {
    pub indent: usize,
    pub text: String,
    pub style: ContentStyle,
}

impl FrameLine {
    /// Line text with indentation applied.
    pub fn padded(&self) -> String {
        format!("{}{}", "  ".repeat(self.indent), self.text)
    }

    fn styled(&self) -> StyledContent<String> {
        self.style.apply(self.padded())
    }
}

/// A fully resolved screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    lines: Vec<FrameLine>,
}

impl Frame {
    /// Build a frame from a host subtree.
    pub fn from_host(host: &MemoryHost, root: HostId) -> Self {
        let mut frame = Self::default();
        collect(host, root, 0, ContentStyle::new(), &mut frame.lines);
        frame
    }

    /// Lines in top-to-bottom order.
    pub fn lines(&self) -> &[FrameLine] {
        &self.lines
    }

    /// Unstyled text of the frame, one line per row.
    pub fn plain_text(&self) -> String {
        self.lines
            .iter()
            .map(FrameLine::padded)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn collect(host: &MemoryHost, id: HostId, depth: usize, style: ContentStyle, out: &mut Vec<FrameLine>) {
    match host.kind(id) {
        Some(HostNodeKind::Text(text)) => out.push(FrameLine {
            indent: depth,
            text: text.clone(),
            style,
        }),
        Some(HostNodeKind::Element { attributes, .. }) => {
            let mut style = style;
            if attributes.get("bold").is_some_and(PropValue::is_truthy) {
                style.attributes.set(Attribute::Bold);
            }
            if attributes.get("italic").is_some_and(PropValue::is_truthy) {
                style.attributes.set(Attribute::Italic);
            }
            if attributes.get("underline").is_some_and(PropValue::is_truthy) {
                style.attributes.set(Attribute::Underlined);
            }
            if let Some(color) = attributes.get("fg").and_then(PropValue::as_str).and_then(parse_color) {
                style.foreground_color = Some(color);
            }
            for child in host.children(id) {
                collect(host, *child, depth + 1, style, out);
            }
        }
        Some(HostNodeKind::Container) => {
            for child in host.children(id) {
                collect(host, *child, depth, style, out);
            }
        }
        None => {}
    }
}

fn parse_color(name: &str) -> Option<Color> {
    let color = match name.to_ascii_lowercase().as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "grey" | "gray" => Color::Grey,
        "dark_grey" | "dark_gray" => Color::DarkGrey,
        _ => return None,
    };
    Some(color)
}

// =============================================================================
// Renderer
// =============================================================================

/// Line-diffing terminal renderer.
///
/// Keeps the previous frame; the next render only rewrites rows whose
/// content or style changed, and clears rows the new frame no longer has.
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    previous: Option<Frame>,
}

impl TerminalRenderer {
    /// Create a renderer with no previous frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Render a host subtree, returning the number of rows written.
    pub fn render<W: Write>(&mut self, out: &mut W, host: &MemoryHost, root: HostId) -> io::Result<usize> {
        let frame = Frame::from_host(host, root);
        self.render_frame(out, frame)
    }

    /// Render a prepared frame, returning the number of rows written.
    pub fn render_frame<W: Write>(&mut self, out: &mut W, frame: Frame) -> io::Result<usize> {
        let mut written = 0;
        let previous = self.previous.as_ref().map_or(&[][..], |f| f.lines());

        for (row, line) in frame.lines().iter().enumerate() {
            if previous.get(row) == Some(line) {
                continue;
            }
            queue!(
                out,
                MoveTo(0, row_u16(row)),
                Clear(ClearType::CurrentLine),
                PrintStyledContent(line.styled())
            )?;
            written += 1;
        }

        for row in frame.lines().len()..previous.len() {
            queue!(out, MoveTo(0, row_u16(row)), Clear(ClearType::CurrentLine))?;
            written += 1;
        }

        out.flush()?;
        self.previous = Some(frame);
        Ok(written)
    }

    /// Forget the previous frame; the next render rewrites every row.
    pub fn invalidate(&mut self) {
        self.previous = None;
    }

    /// Check if there is a previous frame to diff against.
    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }
}

fn row_u16(row: usize) -> u16 {
    u16::try_from(row).unwrap_or(u16::MAX)
}

// =============================================================================
// Tests
// =============================================================================
