use crate::format::SampleDepth;

/// Decoded image samples: row-major, channel-interleaved `f64` values.
///
/// Every decode path lands here before color conversion and packing. The
/// grid remembers the storage depth its samples came from so encoders can
/// choose an output precision that matches the source.
///
/// # Example
/// ```rust
/// use repix_core::prelude::{SampleDepth, SampleGrid};
///
/// let grid = SampleGrid::new(2, 1, 3, SampleDepth::U8, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
/// assert_eq!(grid.pixel(1, 0), &[4.0, 5.0, 6.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SampleGrid {
    width: usize,
    height: usize,
    channels: usize,
    depth: SampleDepth,
    samples: Vec<f64>,
}

impl SampleGrid {
    pub fn new(
        width: usize,
        height: usize,
        channels: usize,
        depth: SampleDepth,
        samples: Vec<f64>,
    ) -> Self {
        debug_assert_eq!(samples.len(), width * height * channels);
        Self {
            width,
            height,
            channels,
            depth,
            samples,
        }
    }

    /// Zero-filled grid, written into channel by channel during unpacking.
    pub fn filled(width: usize, height: usize, channels: usize, depth: SampleDepth) -> Self {
        Self::new(width, height, channels, depth, vec![
            0.0;
            width * height * channels
        ])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn depth(&self) -> SampleDepth {
        self.depth
    }

    /// Interleaved samples per row.
    pub fn row_len(&self) -> usize {
        self.width * self.channels
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f64] {
        &mut self.samples
    }

    pub fn row(&self, y: usize) -> &[f64] {
        let len = self.row_len();
        &self.samples[y * len..(y + 1) * len]
    }

    pub fn pixel(&self, x: usize, y: usize) -> &[f64] {
        let at = (y * self.width + x) * self.channels;
        &self.samples[at..at + self.channels]
    }

    /// The samples of one channel in row-major order.
    pub fn channel_iter(&self, channel: usize) -> impl Iterator<Item = f64> + '_ {
        self.samples
            .iter()
            .skip(channel)
            .step_by(self.channels)
            .copied()
    }

    /// Replaces the samples, keeping the shape. Used when a whole-grid pass
    /// produces a new channel count.
    pub fn remap(self, channels: usize, depth: SampleDepth, samples: Vec<f64>) -> Self {
        Self::new(self.width, self.height, channels, depth, samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_and_pixels_index_interleaved_samples() {
        let samples: Vec<f64> = (0..24).map(f64::from).collect();
        let grid = SampleGrid::new(4, 2, 3, SampleDepth::U8, samples);
        assert_eq!(grid.row_len(), 12);
        assert_eq!(grid.row(1)[0], 12.0);
        assert_eq!(grid.pixel(3, 1), &[21.0, 22.0, 23.0]);
    }

    #[test]
    fn channel_iter_walks_one_plane() {
        let grid = SampleGrid::new(2, 2, 2, SampleDepth::U8, vec![
            1.0, 10.0, 2.0, 20.0, 3.0, 30.0, 4.0, 40.0,
        ]);
        let second: Vec<f64> = grid.channel_iter(1).collect();
        assert_eq!(second, vec![10.0, 20.0, 30.0, 40.0]);
    }
}
