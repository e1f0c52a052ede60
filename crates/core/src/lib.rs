#![doc = include_str!("../README.md")]

pub mod format;
pub mod geometry;
pub mod grid;
pub mod report;

pub mod prelude {
    pub use crate::{
        format::{ColorSpec, ColorStandard, FormatDescriptor, PixelFormat, SampleDepth, SignalRange},
        geometry::{Geometry, GeometryError, GeometryOverrides, guess_width, resolve_geometry},
        grid::SampleGrid,
        report::{ChannelId, ChannelRange, ColorRangeReport, ReportWarning},
    };
}
