use crate::error::Result;
use crate::schema::text::FontName;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Translator settings
///
/// Every field has a default, so a config file only lists what it changes:
///
/// ```json
/// { "svgProxyUrl": "https://convert.example.com/raster", "embedImages": false }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslatorConfig {
    /// Second tier of the text font fallback
    pub default_font: FontName,
    /// Last tier of the text font fallback
    pub fallback_font: FontName,
    /// Conversion proxy turning SVG URLs into rasters, called as `<proxy>?url=<svg url>`
    pub svg_proxy_url: Option<String>,
    /// Inline image bytes as base64 on export
    pub embed_images: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            default_font: FontName::new("Inter", "Regular"),
            fallback_font: FontName::new("Roboto", "Regular"),
            svg_proxy_url: None,
            embed_images: true,
        }
    }
}

impl TranslatorConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TranslatorConfig::default();
        assert_eq!(config.default_font, FontName::new("Inter", "Regular"));
        assert_eq!(config.fallback_font, FontName::new("Roboto", "Regular"));
        assert!(config.svg_proxy_url.is_none());
        assert!(config.embed_images);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = TranslatorConfig::from_json(
            r#"{"svgProxyUrl": "https://proxy.test/raster", "embedImages": false}"#,
        )
        .unwrap();
        assert_eq!(config.svg_proxy_url.as_deref(), Some("https://proxy.test/raster"));
        assert!(!config.embed_images);
        assert_eq!(config.default_font, FontName::new("Inter", "Regular"));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(TranslatorConfig::from_json("{").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let result = TranslatorConfig::load(Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(crate::error::BridgeError::IoError(_))));
    }
}
