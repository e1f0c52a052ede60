//! Scaling of single-channel sources onto the 8-bit working range.
//!
//! Multi-channel grids are left alone; a normalize request against one is
//! reported as a warning rather than an error.

use repix_core::prelude::*;

/// Records the observed range of a single-channel grid and rescales it.
///
/// With no target the samples are folded by their depth factor (a 16-bit
/// value of 4096 becomes 16). A positive target maps `0..=target` onto
/// `0..=255` and clips above it. A zero target auto-ranges against the
/// observed maximum.
pub fn apply(
    grid: &mut SampleGrid,
    target: Option<f64>,
    label: ChannelId,
    report: &mut ColorRangeReport,
) {
    if grid.channels() != 1 {
        if target.is_some() {
            report.warn(ReportWarning::NormalizeIgnored);
        }
        return;
    }
    let range = ChannelRange::scan(grid.samples().iter().copied());
    report.record(label, range);
    match target {
        Some(t) if t > 0.0 => scale_to(grid, t),
        Some(_) => {
            if range.max > 0.0 {
                scale_to(grid, range.max);
            } else {
                fixed_scale(grid);
            }
        }
        None => fixed_scale(grid),
    }
}

fn scale_to(grid: &mut SampleGrid, target: f64) {
    for v in grid.samples_mut() {
        *v = v.clamp(0.0, target) * 255.0 / target;
    }
}

fn fixed_scale(grid: &mut SampleGrid) {
    let factor = crate::depth_fold(grid.depth());
    if factor == 1.0 {
        return;
    }
    for v in grid.samples_mut() {
        *v *= factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(depth: SampleDepth, samples: Vec<f64>) -> SampleGrid {
        let n = samples.len();
        SampleGrid::new(n, 1, 1, depth, samples)
    }

    #[test]
    fn depth_fold_divides_sixteen_bit_values() {
        let mut grid = gray(SampleDepth::U16, vec![0.0, 4096.0]);
        let mut report = ColorRangeReport::default();
        apply(&mut grid, None, ChannelId::Value, &mut report);
        assert_eq!(grid.samples(), &[0.0, 16.0]);
        assert_eq!(
            report.range(ChannelId::Value).unwrap(),
            ChannelRange { min: 0.0, max: 4096.0 }
        );
    }

    #[test]
    fn explicit_target_maps_and_clips() {
        let mut grid = gray(SampleDepth::U8, vec![0.0, 50.0, 100.0, 200.0]);
        let mut report = ColorRangeReport::default();
        apply(&mut grid, Some(100.0), ChannelId::Value, &mut report);
        assert_eq!(grid.samples(), &[0.0, 127.5, 255.0, 255.0]);
    }

    #[test]
    fn zero_target_ranges_against_the_observed_maximum() {
        let mut grid = gray(SampleDepth::F32, vec![10.0, 20.0, 40.0]);
        let mut report = ColorRangeReport::default();
        apply(&mut grid, Some(0.0), ChannelId::Value, &mut report);
        assert_eq!(grid.samples(), &[63.75, 127.5, 255.0]);
    }

    #[test]
    fn zero_target_on_black_input_falls_back_to_depth_fold() {
        let mut grid = gray(SampleDepth::U16, vec![0.0, 0.0]);
        let mut report = ColorRangeReport::default();
        apply(&mut grid, Some(0.0), ChannelId::Value, &mut report);
        assert_eq!(grid.samples(), &[0.0, 0.0]);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn multi_channel_input_is_left_alone_with_a_warning() {
        let samples = vec![10.0, 20.0, 30.0];
        let mut grid = SampleGrid::new(1, 1, 3, SampleDepth::U8, samples.clone());
        let mut report = ColorRangeReport::default();
        apply(&mut grid, Some(100.0), ChannelId::Value, &mut report);
        assert_eq!(grid.samples(), samples.as_slice());
        assert_eq!(report.warnings, vec![ReportWarning::NormalizeIgnored]);
        assert!(report.channels.is_empty());
    }
}
