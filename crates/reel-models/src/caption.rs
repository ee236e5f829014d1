//! Caption styling and overlay descriptions.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::frame::Rgb;

/// Side length of the degenerate overlay in pixels.
pub const DEGENERATE_OVERLAY_SIZE: u32 = 100;
/// Duration of the degenerate overlay in seconds.
pub const DEGENERATE_OVERLAY_DURATION: f64 = 0.1;

/// System font families tried after the configured font file.
pub const SYSTEM_FONT_FAMILIES: [&str; 4] = ["Arial Unicode MS", "Arial", "Courier New", "Verdana"];

/// Visual style for segment captions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionStyle {
    /// Font size in pixels
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    /// Maximum caption width in pixels before wrapping
    #[serde(default = "default_max_width")]
    pub max_width: u32,
    /// Text fill color (FFmpeg color name)
    #[serde(default = "default_text_color")]
    pub text_color: String,
    /// Outline color (FFmpeg color name)
    #[serde(default = "default_stroke_color")]
    pub stroke_color: String,
    /// Outline width in pixels
    #[serde(default = "default_stroke_width")]
    pub stroke_width: u32,
    /// Background plate opacity (0.0 - 1.0)
    #[serde(default = "default_plate_opacity")]
    pub plate_opacity: f32,
    /// Horizontal plate padding around the text box
    #[serde(default = "default_pad_x")]
    pub pad_x: u32,
    /// Vertical plate padding around the text box
    #[serde(default = "default_pad_y")]
    pub pad_y: u32,
    /// Extra spacing between lines
    #[serde(default)]
    pub line_spacing: u32,
    /// Distance between the plate and the bottom frame edge
    #[serde(default)]
    pub bottom_margin: u32,
}

fn default_font_size() -> u32 {
    70
}
fn default_max_width() -> u32 {
    1000
}
fn default_text_color() -> String {
    "white".to_string()
}
fn default_stroke_color() -> String {
    "black".to_string()
}
fn default_stroke_width() -> u32 {
    2
}
fn default_plate_opacity() -> f32 {
    0.6
}
fn default_pad_x() -> u32 {
    20
}
fn default_pad_y() -> u32 {
    10
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_size: default_font_size(),
            max_width: default_max_width(),
            text_color: default_text_color(),
            stroke_color: default_stroke_color(),
            stroke_width: default_stroke_width(),
            plate_opacity: default_plate_opacity(),
            pad_x: default_pad_x(),
            pad_y: default_pad_y(),
            line_spacing: 0,
            bottom_margin: 0,
        }
    }
}

/// One entry of the font fallback cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FontCandidate {
    /// Explicit font file on disk
    File(PathBuf),
    /// System font family resolved by fontconfig
    Family(String),
    /// Let the rendering backend pick its default font
    BackendDefault,
}

impl FontCandidate {
    /// Standard cascade: the font file (if given), common system families,
    /// then the backend default.
    pub fn cascade(font_file: Option<PathBuf>) -> Vec<FontCandidate> {
        let mut candidates = Vec::with_capacity(SYSTEM_FONT_FAMILIES.len() + 2);
        if let Some(path) = font_file {
            candidates.push(FontCandidate::File(path));
        }
        candidates.extend(
            SYSTEM_FONT_FAMILIES
                .iter()
                .map(|family| FontCandidate::Family((*family).to_string())),
        );
        candidates.push(FontCandidate::BackendDefault);
        candidates
    }
}

impl fmt::Display for FontCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontCandidate::File(path) => write!(f, "file:{}", path.display()),
            FontCandidate::Family(name) => write!(f, "family:{}", name),
            FontCandidate::BackendDefault => write!(f, "backend-default"),
        }
    }
}

/// What an overlay clip is drawn from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverlayKind {
    /// Transparent still with text and plate, anchored bottom-center
    Rendered { image: PathBuf },
    /// Opaque solid square used when no font could be rendered
    Degenerate { color: Rgb },
}

/// Caption overlay layered above a segment's video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayClip {
    pub kind: OverlayKind,
    pub width: u32,
    pub height: u32,
    /// Duration in seconds
    pub duration: f64,
}

impl OverlayClip {
    pub fn rendered(image: impl Into<PathBuf>, width: u32, height: u32, duration: f64) -> Self {
        Self {
            kind: OverlayKind::Rendered {
                image: image.into(),
            },
            width,
            height,
            duration,
        }
    }

    /// Minimal overlay that is always available.
    pub fn degenerate() -> Self {
        Self {
            kind: OverlayKind::Degenerate {
                color: Rgb::new(0, 0, 0),
            },
            width: DEGENERATE_OVERLAY_SIZE,
            height: DEGENERATE_OVERLAY_SIZE,
            duration: DEGENERATE_OVERLAY_DURATION,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self.kind, OverlayKind::Degenerate { .. })
    }
}
