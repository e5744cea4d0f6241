//! Stamping text and images onto existing pages
//!
//! These are the drawing primitives the tools share: a stamp is positioned
//! in page space, optionally rotated and made translucent, and appended on
//! top of the page's existing content.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, StringFormat};

use crate::error::Result;
use crate::pdf::font::encode_win_ansi;
use crate::pdf::page::{add_page_resource, overlay_content};

/// RGB colour with components in 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0.0, g: 0.0, b: 0.0 };

    /// Parse `#rrggbb` (the leading `#` is optional)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .ok()
                .map(|v| v as f32 / 255.0)
        };
        Some(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }
}

/// A piece of text placed on a page
#[derive(Debug, Clone)]
pub struct TextStamp<'a> {
    pub text: &'a str,
    pub font_size: f32,
    pub color: Rgb,
    /// 0.0 (invisible) to 1.0 (opaque)
    pub opacity: f32,
    /// Counter-clockwise, about the text origin
    pub rotation_degrees: f32,
}

/// An image XObject placed on a page
#[derive(Debug, Clone, Copy)]
pub struct ImageStamp {
    pub image_id: ObjectId,
    pub width: f32,
    pub height: f32,
    pub opacity: f32,
}

/// Resources a stamp needs on the page it is drawn on
struct StampResources {
    graphics_state: Option<String>,
}

/// Draw text at each of `positions` (baseline origin of the text)
pub fn stamp_text(
    doc: &mut Document,
    page_id: ObjectId,
    font_id: ObjectId,
    stamp: &TextStamp<'_>,
    positions: &[(f32, f32)],
) -> Result<()> {
    if positions.is_empty() {
        return Ok(());
    }

    let font_name = add_page_resource(doc, page_id, "Font", "FTool", font_id)?;
    let resources = register_opacity(doc, page_id, stamp.opacity)?;

    let (sin, cos) = stamp.rotation_degrees.to_radians().sin_cos();
    let encoded = encode_win_ansi(stamp.text);

    let mut operations = Vec::new();
    for &(x, y) in positions {
        operations.push(Operation::new("q", vec![]));
        if let Some(gs) = &resources.graphics_state {
            operations.push(Operation::new("gs", vec![Object::Name(gs.as_bytes().to_vec())]));
        }
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![Object::Name(font_name.as_bytes().to_vec()), stamp.font_size.into()],
        ));
        operations.push(Operation::new(
            "rg",
            vec![stamp.color.r.into(), stamp.color.g.into(), stamp.color.b.into()],
        ));
        operations.push(Operation::new(
            "Tm",
            vec![cos.into(), sin.into(), (-sin).into(), cos.into(), x.into(), y.into()],
        ));
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(encoded.clone(), StringFormat::Literal)],
        ));
        operations.push(Operation::new("ET", vec![]));
        operations.push(Operation::new("Q", vec![]));
    }

    let content = Content { operations }.encode()?;
    overlay_content(doc, page_id, content)
}

/// Draw an image with its lower-left corner at each of `positions`
pub fn stamp_image(
    doc: &mut Document,
    page_id: ObjectId,
    stamp: &ImageStamp,
    positions: &[(f32, f32)],
) -> Result<()> {
    if positions.is_empty() {
        return Ok(());
    }

    let image_name = add_page_resource(doc, page_id, "XObject", "ImTool", stamp.image_id)?;
    let resources = register_opacity(doc, page_id, stamp.opacity)?;

    let mut operations = Vec::new();
    for &(x, y) in positions {
        operations.push(Operation::new("q", vec![]));
        if let Some(gs) = &resources.graphics_state {
            operations.push(Operation::new("gs", vec![Object::Name(gs.as_bytes().to_vec())]));
        }
        operations.push(Operation::new(
            "cm",
            vec![
                stamp.width.into(),
                0.into(),
                0.into(),
                stamp.height.into(),
                x.into(),
                y.into(),
            ],
        ));
        operations.push(Operation::new(
            "Do",
            vec![Object::Name(image_name.as_bytes().to_vec())],
        ));
        operations.push(Operation::new("Q", vec![]));
    }

    let content = Content { operations }.encode()?;
    overlay_content(doc, page_id, content)
}

/// Add an ExtGState for translucent drawing; opaque stamps need none
fn register_opacity(doc: &mut Document, page_id: ObjectId, opacity: f32) -> Result<StampResources> {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity >= 1.0 {
        return Ok(StampResources { graphics_state: None });
    }

    let state_id = doc.add_object(dictionary! {
        "Type" => "ExtGState",
        "CA" => opacity,
        "ca" => opacity,
    });
    let name = add_page_resource(doc, page_id, "ExtGState", "GSTool", state_id)?;
    Ok(StampResources { graphics_state: Some(name) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::create::create_labelled_document;
    use crate::pdf::font::use_helvetica_font;

    fn page_content(doc: &Document, page_id: ObjectId) -> String {
        String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned()
    }

    #[test]
    fn test_hex_colors() {
        assert_eq!(Rgb::from_hex("#000000"), Some(Rgb::BLACK));
        let red = Rgb::from_hex("ff0000").unwrap();
        assert_eq!(red.r, 1.0);
        assert_eq!(red.g, 0.0);
        assert!(Rgb::from_hex("#ff00").is_none());
        assert!(Rgb::from_hex("#gg0000").is_none());
    }

    #[test]
    fn test_stamp_text_once_per_position() {
        let mut doc = create_labelled_document("S", 1, crate::layout::Size::letter());
        let page_id = *doc.get_pages().values().next().unwrap();
        let font_id = use_helvetica_font(&mut doc);

        let stamp = TextStamp {
            text: "DRAFT",
            font_size: 40.0,
            color: Rgb::BLACK,
            opacity: 0.5,
            rotation_degrees: 45.0,
        };
        stamp_text(&mut doc, page_id, font_id, &stamp, &[(0.0, 0.0), (100.0, 100.0)]).unwrap();

        let content = page_content(&doc, page_id);
        assert_eq!(content.matches("(DRAFT) Tj").count(), 2);
        assert!(content.contains(" gs"));
    }

    #[test]
    fn test_opaque_stamp_skips_graphics_state() {
        let mut doc = create_labelled_document("S", 1, crate::layout::Size::letter());
        let page_id = *doc.get_pages().values().next().unwrap();
        let font_id = use_helvetica_font(&mut doc);

        let stamp = TextStamp {
            text: "1",
            font_size: 12.0,
            color: Rgb::BLACK,
            opacity: 1.0,
            rotation_degrees: 0.0,
        };
        stamp_text(&mut doc, page_id, font_id, &stamp, &[(30.0, 30.0)]).unwrap();

        let content = page_content(&doc, page_id);
        assert!(!content.contains(" gs"));
    }
}
