//! Page numbering

use lopdf::Document;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::layout::{Anchor, Size};
use crate::pdf::draw::{stamp_text, Rgb, TextStamp};
use crate::pdf::font::{text_width, use_helvetica_font};
use crate::pdf::page::page_box;

/// Distance from the page edge, in points
pub const DEFAULT_MARGIN: f32 = 30.0;

/// Options for adding page numbers
#[derive(Debug, Clone)]
pub struct PageNumberOptions {
    /// Template with `n` (page number) and `total` (page count) tokens
    pub format: String,
    /// Number printed on the first page
    pub start_from: i64,
    pub position: Anchor,
    pub font_size: f32,
    pub margin: f32,
}

impl Default for PageNumberOptions {
    fn default() -> Self {
        Self {
            format: "n".to_string(),
            start_from: 1,
            position: Anchor::BottomCenter,
            font_size: 12.0,
            margin: DEFAULT_MARGIN,
        }
    }
}

/// Substitute the page tokens in a template
///
/// `n` and `total` are replaced only where they stand as whole words, so
/// `"Page n of total"` becomes `"Page 5 of 10"` while `"Seite n von total"`
/// leaves the `n` inside `von` alone.
pub fn format_page_label(template: &str, number: i64, total: usize) -> String {
    let mut label = String::with_capacity(template.len() + 8);
    let mut word = String::new();

    let flush = |word: &mut String, label: &mut String| {
        match word.as_str() {
            "n" => label.push_str(&number.to_string()),
            "total" => label.push_str(&total.to_string()),
            _ => label.push_str(word),
        }
        word.clear();
    };

    for c in template.chars() {
        if c.is_alphanumeric() || c == '_' {
            word.push(c);
        } else {
            flush(&mut word, &mut label);
            label.push(c);
        }
    }
    flush(&mut word, &mut label);

    label
}

/// Draw a page number on every page of the document
#[instrument(skip(doc, options), fields(format = %options.format, start = options.start_from))]
pub fn add_page_numbers(doc: &mut Document, options: &PageNumberOptions) -> Result<()> {
    let pages: Vec<_> = doc.get_pages().into_values().collect();
    let total = pages.len();
    let font_id = use_helvetica_font(doc);

    for (index, page_id) in pages.into_iter().enumerate() {
        let number = options.start_from + index as i64;
        let label = format_page_label(&options.format, number, total);

        let content = Size::new(text_width(&label, options.font_size), options.font_size);
        let positions = page_box(doc, page_id).placements(options.position, content, options.margin, options.margin);

        let stamp = TextStamp {
            text: &label,
            font_size: options.font_size,
            color: Rgb::BLACK,
            opacity: 1.0,
            rotation_degrees: 0.0,
        };
        stamp_text(doc, page_id, font_id, &stamp, &positions)?;
        debug!(page = index + 1, label = %label, "numbered page");
    }

    Ok(())
}
