//! Tunable settings, loaded from an optional JSON file

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::pdf::encrypt::DEFAULT_MIN_PASSWORD_LENGTH;
use crate::pdf::{numbering, watermark};
use crate::preview::PREVIEW_SCALE;

/// Settings shared by every tool
///
/// Missing fields in a settings file take their default value, so a file
/// containing `{}` is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Where results are written
    pub output_dir: PathBuf,
    /// Render scale for previews
    pub preview_scale: f32,
    /// Distance of page numbers from the page edge, in points
    pub page_number_margin: f32,
    /// Distance of watermarks from the page edge, in points
    pub watermark_margin: f32,
    /// Extra space between tiled text watermarks
    pub text_tile_gap: f32,
    /// Extra space between tiled image watermarks
    pub image_tile_gap: f32,
    pub min_password_length: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            preview_scale: PREVIEW_SCALE,
            page_number_margin: numbering::DEFAULT_MARGIN,
            watermark_margin: watermark::DEFAULT_MARGIN,
            text_tile_gap: watermark::DEFAULT_TEXT_GAP,
            image_tile_gap: watermark::DEFAULT_IMAGE_GAP,
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
        }
    }
}

impl Settings {
    /// Parse settings from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        let settings: Settings =
            serde_json::from_str(text).map_err(|e| Error::General(format!("Invalid settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from a JSON file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading settings");
        let text = tokio::fs::read_to_string(path).await?;
        Self::from_json(&text)
    }

    fn validate(&self) -> Result<()> {
        if !self.preview_scale.is_finite() || self.preview_scale <= 0.0 {
            return Err(Error::General("preview_scale must be positive".to_string()));
        }
        let lengths = [
            ("page_number_margin", self.page_number_margin),
            ("watermark_margin", self.watermark_margin),
            ("text_tile_gap", self.text_tile_gap),
            ("image_tile_gap", self.image_tile_gap),
        ];
        for (field, value) in lengths {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::General(format!("{field} must be a non-negative number")));
            }
        }
        if self.min_password_length == 0 {
            return Err(Error::General("min_password_length must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.preview_scale, 1.5);
        assert_eq!(settings.page_number_margin, 30.0);
        assert_eq!(settings.watermark_margin, 50.0);
        assert_eq!(settings.text_tile_gap, 100.0);
        assert_eq!(settings.image_tile_gap, 50.0);
        assert_eq!(settings.min_password_length, 6);
    }

    #[test]
    fn test_empty_object_is_defaults() {
        assert_eq!(Settings::from_json("{}").unwrap(), Settings::default());
    }

    #[test]
    fn test_partial_override() {
        let settings = Settings::from_json(r#"{"min_password_length": 10, "output_dir": "out"}"#).unwrap();
        assert_eq!(settings.min_password_length, 10);
        assert_eq!(settings.output_dir, PathBuf::from("out"));
        assert_eq!(settings.watermark_margin, 50.0);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Settings::from_json(r#"{"preview_scale": 0}"#).is_err());
        assert!(Settings::from_json(r#"{"watermark_margin": -1}"#).is_err());
        assert!(Settings::from_json(r#"{"min_password_length": 0}"#).is_err());
        assert!(Settings::from_json(r#"{"colour": "red"}"#).is_err());
        assert!(Settings::from_json("not json").is_err());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        tokio::fs::write(&path, r#"{"preview_scale": 2.0}"#).await.unwrap();

        let settings = Settings::load(&path).await.unwrap();
        assert_eq!(settings.preview_scale, 2.0);
    }
}
