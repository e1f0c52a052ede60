//! YUV <-> RGB matrix passes over a sample grid.
//!
//! Both directions run per-pixel in `f64`, then round half away from zero
//! and clip to `0..=255`, so every grid leaving this module holds integral
//! 8-bit values. Coefficients cover bt601/bt709/bt2020 in full and studio
//! swing.

use rayon::prelude::*;
use repix_core::prelude::*;

/// Studio-swing legal bounds.
const LUMA_MIN: f64 = 16.0;
const LUMA_MAX: f64 = 235.0;
const CHROMA_MIN: f64 = 16.0;
const CHROMA_MAX: f64 = 240.0;
/// 255 / (235 - 16), spelled the way the tables are.
const LUMA_EXPAND: f64 = 1.16438356;

#[derive(Clone, Copy)]
struct ToRgb {
    r_cr: f64,
    g_cb: f64,
    g_cr: f64,
    b_cb: f64,
}

const fn to_rgb_coeffs(spec: ColorSpec) -> ToRgb {
    match (spec.standard, spec.range) {
        (ColorStandard::Bt601, SignalRange::Full) => ToRgb {
            r_cr: 1.402,
            g_cb: 0.34413629,
            g_cr: 0.71413629,
            b_cb: 1.772,
        },
        (ColorStandard::Bt709, SignalRange::Full) => ToRgb {
            r_cr: 1.5748,
            g_cb: 0.18732427,
            g_cr: 0.46812427,
            b_cb: 1.8556,
        },
        (ColorStandard::Bt2020, SignalRange::Full) => ToRgb {
            r_cr: 1.4746,
            g_cb: 0.16455313,
            g_cr: 0.57135313,
            b_cb: 1.8814,
        },
        (ColorStandard::Bt601, SignalRange::Studio) => ToRgb {
            r_cr: 1.59602679,
            g_cb: 0.39176229,
            g_cr: 0.81296765,
            b_cb: 2.01723214,
        },
        (ColorStandard::Bt709, SignalRange::Studio) => ToRgb {
            r_cr: 1.79274107,
            g_cb: 0.21324861,
            g_cr: 0.53290933,
            b_cb: 2.11240179,
        },
        (ColorStandard::Bt2020, SignalRange::Studio) => ToRgb {
            r_cr: 1.67867411,
            g_cb: 0.18732610,
            g_cr: 0.65042432,
            b_cb: 2.14177232,
        },
    }
}

#[derive(Clone, Copy)]
struct ToYuv {
    y_r: f64,
    y_g: f64,
    y_b: f64,
    cb_r: f64,
    cb_g: f64,
    cb_b: f64,
    cr_r: f64,
    cr_g: f64,
    cr_b: f64,
    y_offset: f64,
    c_offset: f64,
}

const fn to_yuv_coeffs(spec: ColorSpec) -> ToYuv {
    match (spec.standard, spec.range) {
        (ColorStandard::Bt601, SignalRange::Full) => ToYuv {
            y_r: 0.299,
            y_g: 0.587,
            y_b: 0.114,
            cb_r: -0.168736,
            cb_g: -0.331264,
            cb_b: 0.5,
            cr_r: 0.5,
            cr_g: -0.418688,
            cr_b: -0.081312,
            y_offset: 0.0,
            c_offset: 127.5,
        },
        (ColorStandard::Bt709, SignalRange::Full) => ToYuv {
            y_r: 0.2126,
            y_g: 0.7152,
            y_b: 0.0722,
            cb_r: -0.11457211,
            cb_g: -0.38542789,
            cb_b: 0.5,
            cr_r: 0.5,
            cr_g: -0.45415291,
            cr_b: -0.04584709,
            y_offset: 0.0,
            c_offset: 127.5,
        },
        (ColorStandard::Bt2020, SignalRange::Full) => ToYuv {
            y_r: 0.2627,
            y_g: 0.6780,
            y_b: 0.0593,
            cb_r: -0.13963006,
            cb_g: -0.36036994,
            cb_b: 0.5,
            cr_r: 0.5,
            cr_g: -0.45978570,
            cr_b: -0.04021430,
            y_offset: 0.0,
            c_offset: 127.5,
        },
        (ColorStandard::Bt601, SignalRange::Studio) => ToYuv {
            y_r: 0.25678824,
            y_g: 0.50412941,
            y_b: 0.09790588,
            cb_r: -0.14822300,
            cb_g: -0.29099269,
            cb_b: 0.43921569,
            cr_r: 0.43921569,
            cr_g: -0.36778867,
            cr_b: -0.07142701,
            y_offset: 16.0,
            c_offset: 128.0,
        },
        (ColorStandard::Bt709, SignalRange::Studio) => ToYuv {
            y_r: 0.18258588,
            y_g: 0.61423059,
            y_b: 0.06200706,
            cb_r: -0.10064373,
            cb_g: -0.33857195,
            cb_b: 0.43921569,
            cr_r: 0.43921569,
            cr_g: -0.39894216,
            cr_b: -0.04027352,
            y_offset: 16.0,
            c_offset: 128.0,
        },
        (ColorStandard::Bt2020, SignalRange::Studio) => ToYuv {
            y_r: 0.22561294,
            y_g: 0.58228235,
            y_b: 0.05092824,
            cb_r: -0.12265543,
            cb_g: -0.31656026,
            cb_b: 0.43921569,
            cr_r: 0.43921569,
            cr_g: -0.40389019,
            cr_b: -0.03532550,
            y_offset: 16.0,
            c_offset: 128.0,
        },
    }
}

#[inline(always)]
fn quantize(v: f64) -> f64 {
    v.round().clamp(0.0, 255.0)
}

/// Converts a 3-channel Y,U,V grid to R,G,B in place.
///
/// Studio-swing samples outside the legal bounds are clipped to them and
/// counted into the report as warnings; the conversion itself proceeds.
pub fn yuv_to_rgb(grid: &mut SampleGrid, spec: ColorSpec, report: &mut ColorRangeReport) {
    debug_assert_eq!(grid.channels(), 3);
    let studio = spec.range == SignalRange::Studio;
    if studio {
        count_studio_excursions(grid, report);
    }
    let c = to_rgb_coeffs(spec);
    let row_len = grid.row_len();
    grid.samples_mut()
        .par_chunks_mut(row_len)
        .for_each(|row| {
            for px in row.chunks_exact_mut(3) {
                let (y, cb, cr) = if studio {
                    (
                        (px[0].clamp(LUMA_MIN, LUMA_MAX) - LUMA_MIN) * LUMA_EXPAND,
                        px[1].clamp(CHROMA_MIN, CHROMA_MAX) - 128.0,
                        px[2].clamp(CHROMA_MIN, CHROMA_MAX) - 128.0,
                    )
                } else {
                    (px[0], px[1] - 127.5, px[2] - 127.5)
                };
                px[0] = quantize(y + c.r_cr * cr);
                px[1] = quantize(y - c.g_cb * cb - c.g_cr * cr);
                px[2] = quantize(y + c.b_cb * cb);
            }
        });
}

/// Converts a 3-channel R,G,B grid to Y,U,V in place.
///
/// The pre-quantization Y/U/V bounds are recorded into the report, so the
/// caller can see the signal the matrix actually produced.
pub fn rgb_to_yuv(grid: &mut SampleGrid, spec: ColorSpec, report: &mut ColorRangeReport) {
    debug_assert_eq!(grid.channels(), 3);
    let m = to_yuv_coeffs(spec);
    let row_len = grid.row_len();
    grid.samples_mut()
        .par_chunks_mut(row_len)
        .for_each(|row| {
            for px in row.chunks_exact_mut(3) {
                let (r, g, b) = (px[0], px[1], px[2]);
                px[0] = m.y_r * r + m.y_g * g + m.y_b * b + m.y_offset;
                px[1] = m.cb_r * r + m.cb_g * g + m.cb_b * b + m.c_offset;
                px[2] = m.cr_r * r + m.cr_g * g + m.cr_b * b + m.c_offset;
            }
        });
    crate::record_channels(
        grid,
        &[ChannelId::Y, ChannelId::U, ChannelId::V],
        report,
    );
    grid.samples_mut().par_iter_mut().for_each(|v| *v = quantize(*v));
}

fn count_studio_excursions(grid: &SampleGrid, report: &mut ColorRangeReport) {
    let luma = grid
        .channel_iter(0)
        .filter(|v| *v < LUMA_MIN || *v > LUMA_MAX)
        .count();
    if luma > 0 {
        report.warn(ReportWarning::StudioClipped {
            channel: ChannelId::Y,
            count: luma,
        });
    }
    for (c, id) in [(1, ChannelId::U), (2, ChannelId::V)] {
        let n = grid
            .channel_iter(c)
            .filter(|v| *v < CHROMA_MIN || *v > CHROMA_MAX)
            .count();
        if n > 0 {
            report.warn(ReportWarning::StudioClipped {
                channel: id,
                count: n,
            });
        }
    }
}
