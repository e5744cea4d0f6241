//! Page placement calculations
//!
//! Everything here works in PDF points (1/72 inch) with the origin at the
//! bottom-left of the page, which is the coordinate system content streams
//! draw in.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Width and height in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// US Letter size (8.5" × 11")
    pub fn letter() -> Self {
        Self::new(612.0, 792.0)
    }

    /// A4 size (210mm × 297mm)
    pub fn a4() -> Self {
        Self::new(595.28, 841.89)
    }
}

/// Named placement position for stamped content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
    Center,
    /// Repeat the content over the whole page
    Tiled,
}

impl FromStr for Anchor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "top-left" => Ok(Self::TopLeft),
            "top-center" => Ok(Self::TopCenter),
            "top-right" => Ok(Self::TopRight),
            "bottom-left" => Ok(Self::BottomLeft),
            "bottom-center" => Ok(Self::BottomCenter),
            "bottom-right" => Ok(Self::BottomRight),
            "center" => Ok(Self::Center),
            "tile" | "tiled" => Ok(Self::Tiled),
            _ => Err(Error::General(format!(
                "Unknown position: {s}. Expected top-left, top-center, top-right, \
                 bottom-left, bottom-center, bottom-right, center or tile"
            ))),
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TopLeft => "top-left",
            Self::TopCenter => "top-center",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomCenter => "bottom-center",
            Self::BottomRight => "bottom-right",
            Self::Center => "center",
            Self::Tiled => "tile",
        };
        f.write_str(name)
    }
}

/// Compute the lower-left corner at which content of `content` size is drawn
///
/// Corners and edges sit `margin` points in from the page border; `Center`
/// ignores the margin. `Tiled` has no single position and returns the page
/// origin, use [`tile_positions`] instead.
pub fn compute_position(anchor: Anchor, page: Size, content: Size, margin: f32) -> (f32, f32) {
    let left = margin;
    let right = page.width - content.width - margin;
    let h_center = (page.width - content.width) / 2.0;
    let bottom = margin;
    let top = page.height - content.height - margin;
    let v_center = (page.height - content.height) / 2.0;

    match anchor {
        Anchor::TopLeft => (left, top),
        Anchor::TopCenter => (h_center, top),
        Anchor::TopRight => (right, top),
        Anchor::BottomLeft => (left, bottom),
        Anchor::BottomCenter => (h_center, bottom),
        Anchor::BottomRight => (right, bottom),
        Anchor::Center => (h_center, v_center),
        Anchor::Tiled => (0.0, 0.0),
    }
}

/// Grid spacing for tiled content
///
/// Each axis steps by the content size plus `gap`, but never less than a
/// third of the page, so a page holds at most three tiles per axis.
pub fn tile_spacing(page: Size, content: Size, gap: f32) -> (f32, f32) {
    let x = (content.width + gap).max(page.width / 3.0);
    let y = (content.height + gap).max(page.height / 3.0);
    (x, y)
}

/// Every lower-left corner of a tiled grid covering the page
///
/// The grid starts at the page origin; there are
/// `ceil(width / x_spacing) * ceil(height / y_spacing)` positions.
pub fn tile_positions(page: Size, content: Size, gap: f32) -> Vec<(f32, f32)> {
    let (x_spacing, y_spacing) = tile_spacing(page, content, gap);
    let columns = tile_count(page.width, x_spacing);
    let rows = tile_count(page.height, y_spacing);

    let mut positions = Vec::with_capacity(columns * rows);
    for column in 0..columns {
        for row in 0..rows {
            positions.push((column as f32 * x_spacing, row as f32 * y_spacing));
        }
    }
    positions
}

fn tile_count(extent: f32, spacing: f32) -> usize {
    if extent <= 0.0 || spacing <= 0.0 {
        return 0;
    }
    (extent / spacing).ceil() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_size() {
        let letter = Size::letter();
        assert_eq!(letter.width, 612.0);
        assert_eq!(letter.height, 792.0);
    }

    #[test]
    fn test_corner_positions() {
        let page = Size::new(600.0, 800.0);
        let content = Size::new(100.0, 20.0);

        assert_eq!(compute_position(Anchor::BottomLeft, page, content, 30.0), (30.0, 30.0));
        assert_eq!(compute_position(Anchor::BottomRight, page, content, 30.0), (470.0, 30.0));
        assert_eq!(compute_position(Anchor::TopLeft, page, content, 30.0), (30.0, 750.0));
        assert_eq!(compute_position(Anchor::TopRight, page, content, 30.0), (470.0, 750.0));
    }

    #[test]
    fn test_centered_positions() {
        let page = Size::new(600.0, 800.0);
        let content = Size::new(100.0, 20.0);

        assert_eq!(compute_position(Anchor::Center, page, content, 50.0), (250.0, 390.0));
        assert_eq!(compute_position(Anchor::BottomCenter, page, content, 30.0), (250.0, 30.0));
        assert_eq!(compute_position(Anchor::TopCenter, page, content, 30.0), (250.0, 750.0));
    }

    #[test]
    fn test_tile_count_matches_grid() {
        let page = Size::letter();
        let content = Size::new(150.0, 40.0);
        let (sx, sy) = tile_spacing(page, content, 100.0);

        // Content width + gap dominates x (250), page third dominates y (264)
        assert_eq!(sx, 250.0);
        assert_eq!(sy, 264.0);

        let expected = (page.width / sx).ceil() as usize * (page.height / sy).ceil() as usize;
        let positions = tile_positions(page, content, 100.0);
        assert_eq!(positions.len(), expected);
        assert_eq!(positions.len(), 3 * 3);
        assert_eq!(positions[0], (0.0, 0.0));
        assert!(positions.iter().all(|&(x, y)| x < page.width && y < page.height));
    }

    #[test]
    fn test_large_content_tiles_once() {
        let page = Size::new(200.0, 200.0);
        let positions = tile_positions(page, Size::new(500.0, 500.0), 50.0);
        assert_eq!(positions, vec![(0.0, 0.0)]);
    }

    #[test]
    fn test_anchor_parse_round_trip() {
        for name in ["top-left", "top-center", "bottom-right", "center", "tile"] {
            let anchor: Anchor = name.parse().unwrap();
            assert_eq!(anchor.to_string(), name);
        }
        assert!("middle".parse::<Anchor>().is_err());
    }
}
