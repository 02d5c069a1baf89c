//! Frequency band table
//!
//! Five fixed bands split the mix for solo listening. This is plain
//! frequency filtering, not source separation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dsp::{BiquadFilter, FilterType};
use crate::error::DissectError;

/// Identity of a frequency band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BandId {
    Low,
    LowMid,
    Mid,
    HighMid,
    High,
}

impl BandId {
    /// All bands, lowest first
    pub const ALL: [BandId; 5] = [
        BandId::Low,
        BandId::LowMid,
        BandId::Mid,
        BandId::HighMid,
        BandId::High,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BandId::Low => "low",
            BandId::LowMid => "low-mid",
            BandId::Mid => "mid",
            BandId::HighMid => "high-mid",
            BandId::High => "high",
        }
    }

    /// Position in [`BandId::ALL`] and [`BANDS`]
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn definition(&self) -> &'static Band {
        &BANDS[self.index()]
    }
}

impl fmt::Display for BandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BandId {
    type Err = DissectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BandId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| DissectError::UnknownBand { id: s.to_string() })
    }
}

/// A band definition
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Band {
    pub id: BandId,
    pub filter_type: FilterType,
    /// Cutoff or center frequency in Hz
    pub frequency: f32,
    pub q: f32,
    pub label: &'static str,
}

impl Band {
    /// Build this band's filter for a context sample rate
    pub fn build_filter(&self, sample_rate: u32) -> BiquadFilter {
        BiquadFilter::new(self.filter_type, self.frequency, self.q, sample_rate)
    }
}

/// The band table, in [`BandId::ALL`] order
pub const BANDS: [Band; 5] = [
    Band {
        id: BandId::Low,
        filter_type: FilterType::LowPass,
        frequency: 200.0,
        q: 1.0,
        label: "Lows (<200Hz)",
    },
    Band {
        id: BandId::LowMid,
        filter_type: FilterType::BandPass,
        frequency: 500.0,
        q: 1.5,
        label: "Low Mids (200-800Hz)",
    },
    Band {
        id: BandId::Mid,
        filter_type: FilterType::BandPass,
        frequency: 1500.0,
        q: 1.5,
        label: "Mids (800Hz-3kHz)",
    },
    Band {
        id: BandId::HighMid,
        filter_type: FilterType::BandPass,
        frequency: 5000.0,
        q: 1.5,
        label: "High Mids (3kHz-8kHz)",
    },
    Band {
        id: BandId::High,
        filter_type: FilterType::HighPass,
        frequency: 8000.0,
        q: 1.0,
        label: "Highs (>8kHz)",
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_table_order_matches_ids() {
        for (band, id) in BANDS.iter().zip(BandId::ALL) {
            assert_eq!(band.id, id);
            assert_eq!(id.definition().id, id);
        }
    }

    #[test_case("low", BandId::Low)]
    #[test_case("low-mid", BandId::LowMid)]
    #[test_case("mid", BandId::Mid)]
    #[test_case("high-mid", BandId::HighMid)]
    #[test_case("high", BandId::High)]
    fn test_parse_band_id(text: &str, expected: BandId) {
        assert_eq!(text.parse::<BandId>().unwrap(), expected);
        assert_eq!(expected.to_string(), text);
        assert_eq!(serde_json::to_string(&expected).unwrap(), format!("\"{}\"", text));
    }

    #[test]
    fn test_unknown_band_rejected() {
        let err = "sub-bass".parse::<BandId>().unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_BAND");
    }

    #[test]
    fn test_band_shapes() {
        assert_eq!(BandId::Low.definition().filter_type, FilterType::LowPass);
        assert_eq!(BandId::High.definition().filter_type, FilterType::HighPass);
        assert!(BANDS[1..4]
            .iter()
            .all(|b| b.filter_type == FilterType::BandPass && b.q == 1.5));
    }
}
