//! CSV text in and out of a sample grid.
//!
//! The reader is a plain line splitter: comma cells, whitespace trimmed,
//! blank lines skipped. Values land in a 1-channel float grid, one row per
//! line. The writer mirrors the raw depth rules, with multi-channel pixels
//! as quoted tuple cells.

use repix_core::prelude::*;

use crate::ConvertError;

/// Parses CSV text into a single-channel grid.
///
/// `skip` drops leading lines before parsing (a header, typically). Errors
/// name the 1-based line they came from.
pub fn read(data: &[u8], skip: usize) -> Result<SampleGrid, ConvertError> {
    let text = std::str::from_utf8(data)
        .map_err(|_| ConvertError::Decode("csv input is not valid utf-8".into()))?;
    let mut width = 0;
    let mut height = 0;
    let mut samples = Vec::new();
    for (index, line) in text.lines().enumerate().skip(skip) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row_start = samples.len();
        for cell in line.split(',') {
            let value: f64 = cell.trim().parse().map_err(|e| {
                ConvertError::Decode(format!("csv row {}: {e}", index + 1))
            })?;
            samples.push(value);
        }
        let got = samples.len() - row_start;
        if height == 0 {
            width = got;
        } else if got != width {
            return Err(ConvertError::NonRectangularCsv {
                row: index + 1,
                expected: width,
                got,
            });
        }
        height += 1;
    }
    if height == 0 {
        return Err(ConvertError::Decode("csv input holds no rows".into()));
    }
    Ok(SampleGrid::new(width, height, 1, SampleDepth::F32, samples))
}

/// Renders the grid as CSV text, one line per pixel row.
///
/// Single-channel cells print at the grid's origin depth (a 16-bit source
/// prints its 16-bit values back); multi-channel pixels print as quoted
/// `"(r, g, b)"` tuples.
pub fn write(grid: &SampleGrid) -> String {
    let channels = grid.channels();
    let mut out = String::new();
    for row in grid.samples().chunks(grid.row_len()) {
        for (i, px) in row.chunks_exact(channels).enumerate() {
            if i > 0 {
                out.push(',');
            }
            if channels == 1 {
                push_scalar(&mut out, px[0], grid.depth());
            } else {
                push_tuple(&mut out, px);
            }
        }
        out.push('\n');
    }
    out
}

fn push_scalar(out: &mut String, v: f64, depth: SampleDepth) {
    match depth {
        SampleDepth::U8 => out.push_str(&(v.round() as i64).to_string()),
        SampleDepth::U16 => out.push_str(&((v * 256.0).round() as i64).to_string()),
        SampleDepth::U32 => out.push_str(&((v * 16_777_216.0).round() as i64).to_string()),
        SampleDepth::F32 => out.push_str(&(v / 255.0).to_string()),
    }
}

fn push_tuple(out: &mut String, px: &[f64]) {
    out.push_str("\"(");
    for (i, &v) in px.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&(v.round().clamp(0.0, 255.0) as u8).to_string());
    }
    out.push_str(")\"");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_rows_into_a_float_grid() {
        let grid = read(b"1, 2\n3, 4\n", 0).unwrap();
        assert_eq!((grid.width(), grid.height(), grid.channels()), (2, 2, 1));
        assert_eq!(grid.depth(), SampleDepth::F32);
        assert_eq!(grid.samples(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn skip_drops_a_header_line() {
        let grid = read(b"col_a,col_b\n1,2\n", 1).unwrap();
        assert_eq!(grid.samples(), &[1.0, 2.0]);
    }

    #[test]
    fn blank_lines_do_not_count_as_rows() {
        let grid = read(b"1,2\n\n3,4\n", 0).unwrap();
        assert_eq!(grid.height(), 2);
    }

    #[test]
    fn ragged_rows_name_the_offending_line() {
        let err = read(b"1,2\n3\n", 0).unwrap_err();
        assert_eq!(
            err,
            ConvertError::NonRectangularCsv {
                row: 2,
                expected: 2,
                got: 1,
            }
        );
    }

    #[test]
    fn non_numeric_cells_fail_with_the_line_number() {
        let err = read(b"1,2\n3,oops\n", 0).unwrap_err();
        assert!(matches!(err, ConvertError::Decode(msg) if msg.starts_with("csv row 2")));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(read(b"", 0), Err(ConvertError::Decode(_))));
        assert!(matches!(read(b"\n\n", 0), Err(ConvertError::Decode(_))));
    }

    #[test]
    fn writes_eight_bit_values_as_plain_integers() {
        let grid = SampleGrid::new(4, 1, 1, SampleDepth::U8, vec![0.0, 64.0, 128.0, 255.0]);
        assert_eq!(write(&grid), "0,64,128,255\n");
    }

    #[test]
    fn writes_folded_sixteen_bit_values_back_at_full_scale() {
        let grid = SampleGrid::new(2, 1, 1, SampleDepth::U16, vec![0.0, 16.0]);
        assert_eq!(write(&grid), "0,4096\n");
    }

    #[test]
    fn writes_float_values_on_the_unit_scale() {
        let grid = SampleGrid::new(2, 1, 1, SampleDepth::F32, vec![51.0, 255.0]);
        assert_eq!(write(&grid), "0.2,1\n");
    }

    #[test]
    fn writes_color_pixels_as_quoted_tuples() {
        let samples = vec![1.0, 2.0, 3.0, 10.0, 20.0, 30.0];
        let grid = SampleGrid::new(2, 1, 3, SampleDepth::U8, samples);
        assert_eq!(write(&grid), "\"(1, 2, 3)\",\"(10, 20, 30)\"\n");
    }
}
