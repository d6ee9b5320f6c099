use std::path::Path;

use serde::{Deserialize, Serialize};

/// Size ceiling for a single uploaded image (5 MB)
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// A file as received from the client
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    /// Lower-cased extension from the file name, if any
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }
}

/// How a resized image fills its target box
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    /// Fill the box, cropping overflow
    #[default]
    Cover,
    /// Fit inside the box, padding with transparency
    Contain,
    /// Stretch to the exact box
    Fill,
    /// Fit inside the box without padding
    Inside,
    /// Cover the box without cropping
    Outside,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fit: FitMode,
    /// WebP quality, 0-100
    pub quality: f32,
    /// WebP encoder method, 0 (fast) to 6 (smallest)
    pub effort: u8,
    pub fallback_to_original: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            fit: FitMode::Cover,
            quality: 80.0,
            effort: 4,
            fallback_to_original: true,
        }
    }
}

impl ConvertOptions {
    pub fn resized(mut self, width: u32, height: u32, fit: FitMode) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self.fit = fit;
        self
    }
}

/// Output of a conversion attempt
#[derive(Debug, Clone)]
pub struct ConvertedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub extension: String,
    /// `false` when the original bytes were returned as a fallback
    pub converted: bool,
}
