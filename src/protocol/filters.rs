use serde::{Deserialize, Serialize};

use crate::common::{ClientError, ClientResult};

/// Number of equalizer bands the node exposes (25 Hz up to 16 kHz).
pub const EQ_BAND_COUNT: u8 = 15;
pub const EQ_MIN_GAIN: f32 = -0.25;
pub const EQ_MAX_GAIN: f32 = 1.0;

macro_rules! define_filters {
    ($($field:ident : $type:ty => $name:expr),* $(,)?) => {
        /// All audio filters the node understands. Unset filters are left untouched.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct Filters {
            $(
                #[serde(skip_serializing_if = "Option::is_none")]
                pub $field: Option<$type>,
            )*
        }

        impl Filters {
            /// Get names of all supported filters in camelCase.
            pub fn names() -> Vec<String> {
                vec![
                    $($name.into()),*
                ]
            }

            /// Merge incoming partial filter update with existing state.
            pub fn merge_from(&mut self, incoming: Filters) {
                $(
                    if incoming.$field.is_some() {
                        self.$field = incoming.$field;
                    }
                )*
            }

            /// Returns true if every filter field is `None`.
            pub fn is_all_none(&self) -> bool {
                $(
                    self.$field.is_none() &&
                )* true
            }
        }
    };
}

define_filters! {
    volume: f32 => "volume",
    equalizer: Vec<EqBand> => "equalizer",
    karaoke: KaraokeFilter => "karaoke",
    timescale: TimescaleFilter => "timescale",
    tremolo: TremoloFilter => "tremolo",
    vibrato: VibratoFilter => "vibrato",
    rotation: RotationFilter => "rotation",
    distortion: DistortionFilter => "distortion",
    channel_mix: ChannelMixFilter => "channelMix",
    low_pass: LowPassFilter => "lowPass",
}

impl Filters {
    /// Validates the parts of the filter set with hard ranges.
    pub fn validate(&self) -> ClientResult<()> {
        if let Some(bands) = &self.equalizer {
            for band in bands {
                band.validate()?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EqBand {
    pub band: u8,
    pub gain: f32,
}

impl EqBand {
    pub fn new(band: u8, gain: f32) -> Self {
        Self { band, gain }
    }

    pub fn validate(&self) -> ClientResult<()> {
        let gain_ok = (EQ_MIN_GAIN..=EQ_MAX_GAIN).contains(&self.gain);
        if self.band >= EQ_BAND_COUNT || !gain_ok {
            return Err(ClientError::InvalidEqualizerBand {
                band: self.band,
                gain: self.gain,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KaraokeFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mono_level: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_band: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_width: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimescaleFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TremoloFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VibratoFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_hz: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistortionFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sin_offset: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sin_scale: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cos_offset: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cos_scale: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tan_offset: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tan_scale: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMixFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_to_left: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_to_right: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_to_left: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_to_right: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowPassFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smoothing: Option<f32>,
}
