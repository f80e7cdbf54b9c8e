//! Compression settings and their builder.

use derive_enum_all_values::AllValues;

/// Named quality levels matching the usual astcenc presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, AllValues)]
pub enum QualityPreset {
    /// Lowest effort, for previews.
    Fastest,
    /// Low effort.
    Fast,
    /// Balanced effort. The default.
    #[default]
    Medium,
    /// High effort.
    Thorough,
    /// Try everything the encoder knows.
    Exhaustive,
}

impl QualityPreset {
    /// The normalized quality score of this preset.
    pub const fn quality(self) -> f32 {
        match self {
            QualityPreset::Fastest => 0.0,
            QualityPreset::Fast => 0.1,
            QualityPreset::Medium => 0.6,
            QualityPreset::Thorough => 0.98,
            QualityPreset::Exhaustive => 1.0,
        }
    }

    /// Looks up a preset by its lowercase name, as used on command lines.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all_values()
            .iter()
            .copied()
            .find(|preset| preset.name() == name)
    }

    /// Lowercase name of the preset.
    pub const fn name(self) -> &'static str {
        match self {
            QualityPreset::Fastest => "fastest",
            QualityPreset::Fast => "fast",
            QualityPreset::Medium => "medium",
            QualityPreset::Thorough => "thorough",
            QualityPreset::Exhaustive => "exhaustive",
        }
    }
}

/// Parameters for one compression.
///
/// The values are passed to the codec as given; the codec reports unsupported
/// footprints and out of range qualities as [`AstcError::InvalidInput`].
///
/// [`AstcError::InvalidInput`]: crate::AstcError::InvalidInput
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionSettings {
    /// Width of the block footprint in texels.
    pub block_width: usize,
    /// Height of the block footprint in texels.
    pub block_height: usize,
    /// Encoder effort, from 0.0 (fastest) to 1.0 (best quality).
    pub quality: f32,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            block_width: 4,
            block_height: 4,
            quality: QualityPreset::default().quality(),
        }
    }
}

impl CompressionSettings {
    /// Starts a builder from the default settings.
    pub fn builder() -> CompressionSettingsBuilder {
        CompressionSettingsBuilder::new()
    }
}

/// Builder for [`CompressionSettings`].
///
/// # Examples
///
/// ```
/// use astc_encoder_api::{CompressionSettingsBuilder, QualityPreset};
///
/// let settings = CompressionSettingsBuilder::new()
///     .block_footprint(6, 6)
///     .preset(QualityPreset::Thorough)
///     .build();
/// assert_eq!((settings.block_width, settings.block_height), (6, 6));
/// assert_eq!(settings.quality, 0.98);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CompressionSettingsBuilder {
    settings: CompressionSettings,
}

impl CompressionSettingsBuilder {
    /// Creates a builder holding the default settings (4x4 blocks, medium quality).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the block footprint.
    pub fn block_footprint(mut self, block_width: usize, block_height: usize) -> Self {
        self.settings.block_width = block_width;
        self.settings.block_height = block_height;
        self
    }

    /// Sets the normalized quality score.
    pub fn quality(mut self, quality: f32) -> Self {
        self.settings.quality = quality;
        self
    }

    /// Sets the quality from a preset.
    pub fn preset(self, preset: QualityPreset) -> Self {
        self.quality(preset.quality())
    }

    /// Finishes the builder.
    pub fn build(self) -> CompressionSettings {
        self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults() {
        let settings = CompressionSettings::default();
        assert_eq!(settings.block_width, 4);
        assert_eq!(settings.block_height, 4);
        assert_eq!(settings.quality, 0.6);
        assert_eq!(CompressionSettings::builder().build(), settings);
    }

    #[rstest]
    #[case(QualityPreset::Fastest, 0.0)]
    #[case(QualityPreset::Fast, 0.1)]
    #[case(QualityPreset::Medium, 0.6)]
    #[case(QualityPreset::Thorough, 0.98)]
    #[case(QualityPreset::Exhaustive, 1.0)]
    fn preset_quality(#[case] preset: QualityPreset, #[case] quality: f32) {
        assert_eq!(preset.quality(), quality);
        assert_eq!(
            CompressionSettingsBuilder::new().preset(preset).build().quality,
            quality
        );
    }

    #[test]
    fn presets_are_ordered_by_effort() {
        let qualities: Vec<f32> = QualityPreset::all_values()
            .iter()
            .map(|preset| preset.quality())
            .collect();
        assert!(qualities.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn presets_round_trip_through_names() {
        for &preset in QualityPreset::all_values() {
            assert_eq!(QualityPreset::from_name(preset.name()), Some(preset));
        }
        assert_eq!(QualityPreset::from_name("ultra"), None);
    }

    #[test]
    fn later_calls_win() {
        let settings = CompressionSettingsBuilder::new()
            .preset(QualityPreset::Fast)
            .quality(0.3)
            .block_footprint(8, 5)
            .build();
        assert_eq!(settings.quality, 0.3);
        assert_eq!((settings.block_width, settings.block_height), (8, 5));
    }
}
