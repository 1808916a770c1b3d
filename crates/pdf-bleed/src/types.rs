use thiserror::Error;

#[derive(Error, Debug)]
pub enum BleedError {
    /// Input bytes could not be parsed as a document
    #[error("Failed to load document: {0}")]
    DocumentLoad(String),
    /// Document permissions block rendering
    #[error("This PDF is protected and cannot be processed. Please use a different file. ({0})")]
    ProtectedDocument(String),
    #[error("Page {page}: {detail}")]
    Geometry { page: usize, detail: String },
    #[error("Rasterisation failed for page {page}: {detail}")]
    Raster { page: usize, detail: String },
    /// Embedding or serialization of the output document failed
    #[error("Failed to compose output document: {0}")]
    Composition(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl BleedError {
    pub(crate) fn geometry(page_index: usize, detail: impl Into<String>) -> Self {
        BleedError::Geometry {
            page: page_index + 1,
            detail: detail.into(),
        }
    }

    pub(crate) fn raster(page_index: usize, detail: impl Into<String>) -> Self {
        BleedError::Raster {
            page: page_index + 1,
            detail: detail.into(),
        }
    }

    pub(crate) fn composition(err: impl std::fmt::Display) -> Self {
        BleedError::Composition(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BleedError>;

/// Page rotation, clockwise as displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rotation {
    #[default]
    None,
    Clockwise90,
    Clockwise180,
    Clockwise270,
}

impl Rotation {
    /// Normalize a `/Rotate` value. Returns `None` for non-multiples of 90.
    pub fn from_degrees(degrees: i64) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::None),
            90 => Some(Rotation::Clockwise90),
            180 => Some(Rotation::Clockwise180),
            270 => Some(Rotation::Clockwise270),
            _ => None,
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            Rotation::None => 0,
            Rotation::Clockwise90 => 90,
            Rotation::Clockwise180 => 180,
            Rotation::Clockwise270 => 270,
        }
    }

    /// True when width and height trade places on display
    pub fn is_quarter_turn(self) -> bool {
        matches!(self, Rotation::Clockwise90 | Rotation::Clockwise270)
    }
}

/// Axis-aligned rectangle in PDF user space (origin bottom-left, points)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PageBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from a PDF rectangle `[llx lly urx ury]`, whose corners may be
    /// given in any order.
    pub fn from_corners(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x: x0.min(x1),
            y: y0.min(y1),
            width: (x1 - x0).abs(),
            height: (y1 - y0).abs(),
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y + self.height
    }

    /// Overlap of two boxes; `None` when they do not overlap with positive area.
    pub fn intersect(&self, other: &PageBox) -> Option<PageBox> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.top().min(other.top());
        (x1 > x0 && y1 > y0).then(|| PageBox::from_corners(x0, y0, x1, y1))
    }
}

/// Which page box a trim rectangle was resolved from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoxKind {
    TrimBox,
    CropBox,
    MediaBox,
}

impl BoxKind {
    pub fn pdf_key(self) -> &'static [u8] {
        match self {
            BoxKind::TrimBox => b"TrimBox",
            BoxKind::CropBox => b"CropBox",
            BoxKind::MediaBox => b"MediaBox",
        }
    }
}

/// Line segment in output page space (points)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    pub start: (f64, f64),
    pub end: (f64, f64),
}
