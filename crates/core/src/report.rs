use std::fmt;

use smallvec::SmallVec;

/// Which sample stream a recorded range belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelId {
    /// The single channel of a gray raw buffer.
    Value,
    R,
    G,
    B,
    A,
    Y,
    U,
    V,
}

impl ChannelId {
    /// Key printed in the per-file summary.
    pub const fn label(self) -> &'static str {
        match self {
            ChannelId::Value => "range",
            ChannelId::R => "R-range",
            ChannelId::G => "G-range",
            ChannelId::B => "B-range",
            ChannelId::A => "A-range",
            ChannelId::Y => "Y-range",
            ChannelId::U => "U-range",
            ChannelId::V => "V-range",
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChannelId::Value => "value",
            ChannelId::R => "R",
            ChannelId::G => "G",
            ChannelId::B => "B",
            ChannelId::A => "A",
            ChannelId::Y => "Y",
            ChannelId::U => "U",
            ChannelId::V => "V",
        })
    }
}

/// Closed min/max interval actually observed in one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelRange {
    pub min: f64,
    pub max: f64,
}

impl ChannelRange {
    /// Scans a sample stream. Returns `(0, 0)` for an empty stream.
    pub fn scan<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values {
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
        }
        if min > max {
            return Self { min: 0.0, max: 0.0 };
        }
        Self { min, max }
    }
}

impl fmt::Display for ChannelRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // f64 Display drops the trailing ".0", so integer bounds print as
        // plain integers.
        write!(f, "({}, {})", self.min, self.max)
    }
}

/// Non-fatal findings from a conversion.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReportWarning {
    /// A normalize target was given for a multi-channel source and skipped.
    NormalizeIgnored,
    /// Studio-swing samples fell outside the nominal bounds and were
    /// clipped to them.
    StudioClipped { channel: ChannelId, count: usize },
}

impl fmt::Display for ReportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportWarning::NormalizeIgnored => {
                f.write_str("normalize target ignored for multi-channel input")
            }
            ReportWarning::StudioClipped { channel, count } => {
                write!(f, "{count} {channel} samples outside studio range were clipped")
            }
        }
    }
}

/// What a conversion observed: the resolved geometry, the value range of
/// every channel it touched, and any non-fatal warnings.
///
/// Ranges are recorded per [`ChannelId`]; recording a channel twice keeps
/// the later range (an output-side YUV range replaces the input-side one).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorRangeReport {
    pub width: u32,
    pub height: u32,
    /// Bytes per stored row; `0` when the source had no row padding notion.
    pub stride: usize,
    /// Stored rows in the primary plane; `0` when not applicable.
    pub scanline: usize,
    pub channels: SmallVec<[(ChannelId, ChannelRange); 8]>,
    pub warnings: Vec<ReportWarning>,
}

impl ColorRangeReport {
    pub fn record(&mut self, id: ChannelId, range: ChannelRange) {
        if let Some(slot) = self.channels.iter_mut().find(|(c, _)| *c == id) {
            slot.1 = range;
        } else {
            self.channels.push((id, range));
        }
    }

    pub fn range(&self, id: ChannelId) -> Option<ChannelRange> {
        self.channels
            .iter()
            .find(|(c, _)| *c == id)
            .map(|(_, r)| *r)
    }

    pub fn warn(&mut self, warning: ReportWarning) {
        self.warnings.push(warning);
    }
}
