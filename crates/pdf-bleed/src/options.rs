use crate::constants::*;
use crate::types::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How to treat a bleed wider than half of the rendered page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OverlapPolicy {
    /// Reflect overlapping source ranges as-is
    #[default]
    Allow,
    /// Fail with a geometry error instead of reflecting overlapping ranges
    Reject,
}

/// Bleed generation configuration
///
/// One immutable value is handed to every stage of the pipeline; nothing
/// reads the constants directly.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BleedOptions {
    /// Render resolution for the bleed raster
    pub dpi: u32,
    /// Bleed width in inches
    pub bleed_in: f32,
    /// Crop mark margin outside the bleed, in inches
    pub crop_margin_in: f32,
    /// Stroke weight of the crop marks in points
    pub crop_mark_weight_pt: f32,
    pub overlap_policy: OverlapPolicy,
}

impl Default for BleedOptions {
    fn default() -> Self {
        Self {
            dpi: DPI,
            bleed_in: BLEED_IN,
            crop_margin_in: CROP_MARGIN_IN,
            crop_mark_weight_pt: CROP_MARK_WEIGHT_PT,
            overlap_policy: OverlapPolicy::default(),
        }
    }
}

impl BleedOptions {
    /// Render scale relative to PDF user space (72 units per inch)
    pub fn scale(&self) -> f64 {
        self.dpi as f64 / POINTS_PER_INCH
    }

    /// Bleed width in raster pixels
    pub fn bleed_px(&self) -> u32 {
        (self.bleed_in as f64 * self.dpi as f64).round() as u32
    }

    pub fn bleed_pt(&self) -> f64 {
        in_to_pt(self.bleed_in as f64)
    }

    pub fn crop_margin_pt(&self) -> f64 {
        in_to_pt(self.crop_margin_in as f64)
    }

    /// Distance from the output page edge to the trim line, per side
    pub fn trim_inset_pt(&self) -> f64 {
        self.crop_margin_pt() + self.bleed_pt()
    }

    /// Load options from JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options: Self = serde_json::from_slice(&bytes)
            .map_err(|e| BleedError::Config(format!("Failed to parse config: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Save options to JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| BleedError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if self.dpi == 0 || self.dpi > MAX_DPI {
            return Err(BleedError::Config(format!(
                "DPI must be between 1 and {}, got {}",
                MAX_DPI, self.dpi
            )));
        }

        for (name, value) in [
            ("Bleed", self.bleed_in),
            ("Crop margin", self.crop_margin_in),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(BleedError::Config(format!(
                    "{} must be a non-negative length, got {}",
                    name, value
                )));
            }
        }

        if self.bleed_px() == 0 {
            return Err(BleedError::Config(format!(
                "Bleed of {}\" is less than one pixel at {} DPI",
                self.bleed_in, self.dpi
            )));
        }

        if !self.crop_mark_weight_pt.is_finite() || self.crop_mark_weight_pt <= 0.0 {
            return Err(BleedError::Config(format!(
                "Crop mark weight must be positive, got {}",
                self.crop_mark_weight_pt
            )));
        }

        Ok(())
    }
}
