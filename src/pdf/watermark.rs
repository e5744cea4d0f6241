//! Text and image watermarks

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, ImageReader};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, info, instrument};

use crate::error::{Error, Result};
use crate::layout::{Anchor, Size};
use crate::pdf::draw::{stamp_image, stamp_text, ImageStamp, Rgb, TextStamp};
use crate::pdf::font::{text_width, use_helvetica_font};
use crate::pdf::page::page_box;

/// Distance from the page edge for corner placements, in points
pub const DEFAULT_MARGIN: f32 = 50.0;
/// Extra space between tiled text watermarks
pub const DEFAULT_TEXT_GAP: f32 = 100.0;
/// Extra space between tiled image watermarks
pub const DEFAULT_IMAGE_GAP: f32 = 50.0;

/// Options for a text watermark
#[derive(Debug, Clone)]
pub struct TextWatermarkOptions {
    pub text: String,
    pub font_size: f32,
    pub color: Rgb,
    /// Percent, 0 to 100
    pub opacity: u8,
    /// Degrees, counter-clockwise
    pub rotation: f32,
    pub position: Anchor,
    pub margin: f32,
    pub tile_gap: f32,
}

impl Default for TextWatermarkOptions {
    fn default() -> Self {
        Self {
            text: "CONFIDENTIAL".to_string(),
            font_size: 50.0,
            color: Rgb { r: 0.5, g: 0.5, b: 0.5 },
            opacity: 30,
            rotation: 45.0,
            position: Anchor::Center,
            margin: DEFAULT_MARGIN,
            tile_gap: DEFAULT_TEXT_GAP,
        }
    }
}

/// Options for an image watermark
#[derive(Debug, Clone)]
pub struct ImageWatermarkOptions {
    /// Percent of the image's pixel size
    pub scale: u16,
    /// Percent, 0 to 100
    pub opacity: u8,
    pub position: Anchor,
    pub margin: f32,
    pub tile_gap: f32,
}

impl Default for ImageWatermarkOptions {
    fn default() -> Self {
        Self {
            scale: 50,
            opacity: 30,
            position: Anchor::Center,
            margin: DEFAULT_MARGIN,
            tile_gap: DEFAULT_IMAGE_GAP,
        }
    }
}

/// An image embedded in a document as an XObject
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedImage {
    pub id: ObjectId,
    pub width: u32,
    pub height: u32,
}

/// Draw a text watermark on every page
#[instrument(skip(doc, options), fields(text = %options.text, position = %options.position))]
pub fn add_text_watermark(doc: &mut Document, options: &TextWatermarkOptions) -> Result<()> {
    let font_id = use_helvetica_font(doc);
    let content = Size::new(text_width(&options.text, options.font_size), options.font_size);
    let stamp = TextStamp {
        text: &options.text,
        font_size: options.font_size,
        color: options.color,
        opacity: f32::from(options.opacity.min(100)) / 100.0,
        rotation_degrees: options.rotation,
    };

    let pages: Vec<_> = doc.get_pages().into_values().collect();
    for page_id in pages {
        let positions = page_box(doc, page_id).placements(options.position, content, options.margin, options.tile_gap);
        debug!(instances = positions.len(), "stamping text watermark");
        stamp_text(doc, page_id, font_id, &stamp, &positions)?;
    }

    Ok(())
}

/// Draw an image watermark on every page
#[instrument(skip(doc, image, options), fields(position = %options.position))]
pub fn add_image_watermark(
    doc: &mut Document,
    image: EmbeddedImage,
    options: &ImageWatermarkOptions,
) -> Result<()> {
    let scale = f32::from(options.scale) / 100.0;
    let content = Size::new(image.width as f32 * scale, image.height as f32 * scale);
    let stamp = ImageStamp {
        image_id: image.id,
        width: content.width,
        height: content.height,
        opacity: f32::from(options.opacity.min(100)) / 100.0,
    };

    let pages: Vec<_> = doc.get_pages().into_values().collect();
    for page_id in pages {
        let positions = page_box(doc, page_id).placements(options.position, content, options.margin, options.tile_gap);
        debug!(instances = positions.len(), "stamping image watermark");
        stamp_image(doc, page_id, &stamp, &positions)?;
    }

    Ok(())
}

/// Embed a JPEG or PNG image
///
/// JPEG data is stored as-is with the DCT filter, described by its frame
/// header. PNG data is decoded, stored as flate-compressed RGB, and any
/// transparency becomes a soft mask.
pub fn embed_image(doc: &mut Document, bytes: &[u8]) -> Result<EmbeddedImage> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let format = reader.format();

    let image = match format {
        Some(ImageFormat::Jpeg) => embed_jpeg(doc, bytes)?,
        Some(ImageFormat::Png) => embed_png(doc, &reader.decode()?)?,
        other => {
            let name = other.map(|f| format!("{f:?}")).unwrap_or_else(|| "unknown format".to_string());
            return Err(Error::UnsupportedImage(name));
        }
    };

    info!(width = image.width, height = image.height, format = ?format, "embedded watermark image");
    Ok(image)
}

/// Frame parameters read from a JPEG's markers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct JpegHeader {
    width: u32,
    height: u32,
    components: u8,
    /// An Adobe APP14 segment is present; four-component data is then inverted
    adobe: bool,
}

/// Walk the marker segments up to the start of scan
fn read_jpeg_header(bytes: &[u8]) -> Option<JpegHeader> {
    if !bytes.starts_with(&[0xFF, 0xD8]) {
        return None;
    }

    let mut adobe = false;
    let mut pos = 2;
    loop {
        // Markers may be preceded by any number of 0xFF fill bytes
        while bytes.get(pos) == Some(&0xFF) && bytes.get(pos + 1) == Some(&0xFF) {
            pos += 1;
        }
        if bytes.get(pos) != Some(&0xFF) {
            return None;
        }
        let marker = *bytes.get(pos + 1)?;
        if matches!(marker, 0x01 | 0xD0..=0xD7) {
            pos += 2;
            continue;
        }
        if marker == 0xDA || marker == 0xD9 {
            return None;
        }

        let segment = bytes.get(pos + 2..)?;
        let length = u16::from_be_bytes([*segment.first()?, *segment.get(1)?]) as usize;
        let data = segment.get(2..length)?;

        match marker {
            0xEE if data.starts_with(b"Adobe") => adobe = true,
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                let height = u16::from_be_bytes([*data.get(1)?, *data.get(2)?]);
                let width = u16::from_be_bytes([*data.get(3)?, *data.get(4)?]);
                return Some(JpegHeader {
                    width: u32::from(width),
                    height: u32::from(height),
                    components: *data.get(5)?,
                    adobe,
                });
            }
            _ => {}
        }
        pos += 2 + length;
    }
}

/// Store JPEG data unchanged behind the DCT filter
fn embed_jpeg(doc: &mut Document, bytes: &[u8]) -> Result<EmbeddedImage> {
    let header = read_jpeg_header(bytes).ok_or_else(|| Error::UnsupportedImage("malformed JPEG".to_string()))?;
    if header.width == 0 || header.height == 0 {
        return Err(Error::UnsupportedImage("JPEG without dimensions".to_string()));
    }

    let color_space = match header.components {
        1 => "DeviceGray",
        3 => "DeviceRGB",
        4 => "DeviceCMYK",
        n => return Err(Error::UnsupportedImage(format!("JPEG with {n} colour components"))),
    };

    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => header.width as i64,
        "Height" => header.height as i64,
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8,
        "Filter" => "DCTDecode",
    };
    if header.components == 4 && header.adobe {
        let decode = [1, 0, 1, 0, 1, 0, 1, 0].into_iter().map(Object::Integer).collect();
        dict.set("Decode", Object::Array(decode));
    }
    debug!(components = header.components, adobe = header.adobe, "embedding JPEG");

    let id = doc.add_object(Stream::new(dict, bytes.to_vec()).with_compression(false));
    Ok(EmbeddedImage {
        id,
        width: header.width,
        height: header.height,
    })
}

/// Split decoded pixels into an RGB image plus an alpha soft mask
fn embed_png(doc: &mut Document, decoded: &DynamicImage) -> Result<EmbeddedImage> {
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    for pixel in rgba.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel.0[3]);
    }

    let mut image_dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
    };

    if alpha.iter().any(|&a| a < u8::MAX) {
        let mut mask = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            alpha,
        );
        mask.compress()?;
        let mask_id = doc.add_object(mask);
        image_dict.set("SMask", Object::Reference(mask_id));
    }

    let mut stream = Stream::new(image_dict, rgb);
    stream.compress()?;
    Ok(EmbeddedImage {
        id: doc.add_object(stream),
        width,
        height,
    })
}
