//! Output frame geometry and the synthetic fallback palette.

use serde::{Deserialize, Serialize};

/// Default vertical short resolution.
pub const DEFAULT_WIDTH: u32 = 1080;
pub const DEFAULT_HEIGHT: u32 = 1920;

/// Colors used for synthetic clips, rotated by segment index.
pub const FALLBACK_COLORS: [Rgb; 3] = [
    Rgb::new(40, 40, 40), // dark gray
    Rgb::new(10, 20, 30), // dark blue
    Rgb::new(30, 10, 10), // dark red
];

/// Target frame dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl Default for FrameSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// FFmpeg `WxH` size notation.
    pub fn ffmpeg_size(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Palette entry for a segment index.
    pub fn fallback_for(index: usize) -> Self {
        FALLBACK_COLORS[index % FALLBACK_COLORS.len()]
    }

    /// FFmpeg color notation (`0xRRGGBB`).
    pub fn to_ffmpeg(&self) -> String {
        format!("0x{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}
