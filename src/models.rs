use image::RgbImage;
use std::fmt;
use time::OffsetDateTime;
use time::macros::format_description;

/// A single video frame: 8-bit, three channels, row-major.
pub type Frame = RgbImage;

/// Bounding box in the original frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn area(&self) -> u32 {
        self.width * self.height
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f32 / self.height as f32
    }

    /// Clamp the box so it lies entirely inside a `width` x `height` frame.
    /// Returns `None` when nothing of the box remains.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<BoundingBox> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let w = self.width.min(width - self.x);
        let h = self.height.min(height - self.y);
        if w == 0 || h == 0 {
            return None;
        }
        Some(BoundingBox { x: self.x, y: self.y, width: w, height: h })
    }
}

/// A cropped region believed to contain a license plate.
#[derive(Debug, Clone)]
pub struct PlateCandidate {
    pub image: RgbImage,
    pub bbox: BoundingBox,
}

impl PlateCandidate {
    /// Crop `bbox` out of `frame`. The box is clamped to the frame first.
    pub fn crop(frame: &Frame, bbox: BoundingBox) -> Option<Self> {
        let bbox = bbox.clamp_to(frame.width(), frame.height())?;
        let image = image::imageops::crop_imm(frame, bbox.x, bbox.y, bbox.width, bbox.height).to_image();
        Some(Self { image, bbox })
    }

    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }
}

/// One OCR hypothesis.
#[derive(Debug, Clone, PartialEq)]
pub struct PlateReading {
    pub raw_text: String,
    /// In `[0, 1]`
    pub confidence: f32,
}

impl PlateReading {
    pub fn new(raw_text: impl Into<String>, confidence: f32) -> Self {
        Self {
            raw_text: raw_text.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessStatus {
    Allow,
    Deny,
}

impl AccessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessStatus::Allow => "ALLOW",
            AccessStatus::Deny => "DENY",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "ALLOW" => Some(AccessStatus::Allow),
            "DENY" => Some(AccessStatus::Deny),
            _ => None,
        }
    }
}

impl fmt::Display for AccessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One access decision, as appended to the decision log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionRecord {
    pub timestamp: OffsetDateTime,
    pub plate: String,
    pub status: AccessStatus,
}

impl DecisionRecord {
    /// Timestamp in the log's `YYYY-MM-DD HH:MM:SS` form.
    pub fn formatted_timestamp(&self) -> String {
        format_timestamp(self.timestamp)
    }
}

pub fn format_timestamp(ts: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    // Formatting a fully-populated OffsetDateTime with this description cannot fail
    ts.format(format).unwrap_or_default()
}
