//! The batch driver: file I/O, output naming and the overwrite prompt
//! wrapped around the pure conversion core.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use repix_codec::prelude::*;

use crate::Args;

/// Converts every input file in order.
///
/// A contradictory flag set aborts before any file is read. Per-file
/// failures log a warning and the batch continues. `confirm` decides
/// overwrites so callers without a terminal can inject an answer.
pub fn run(args: &Args, confirm: &mut impl FnMut(&Path) -> bool) -> Result<()> {
    let spec = conversion_spec(args);
    spec.validate()?;

    let target = args.path.clone().unwrap_or_else(|| PathBuf::from("."));
    ensure_target_dir(&target, args.files.len())?;

    for file in &args.files {
        match convert_file(file, &target, &spec, args, confirm) {
            Ok(()) => {}
            Err(e) => {
                if let Some(c) = e.downcast_ref::<ConvertError>()
                    && c.is_config()
                {
                    return Err(e);
                }
                tracing::warn!("skipping '{}': {e:#}", file.display());
            }
        }
    }
    Ok(())
}

fn conversion_spec(args: &Args) -> ConversionSpec {
    let mut spec = ConversionSpec::new(args.input_type, args.output_type);
    spec.geometry = GeometryOverrides {
        width: args.col,
        height: args.row,
        stride: args.stride,
        scanline: args.scanline,
    };
    spec.input_color = ColorSpec::new(args.input_color, args.input_range);
    spec.output_color = ColorSpec::new(args.output_color, args.output_range);
    spec.normalize = args.normalize;
    spec.skip = args.skip;
    spec
}

/// A target that is not yet a directory but clearly means one (several
/// inputs, or a trailing separator) is created up front; failure there is
/// fatal for the whole batch.
fn ensure_target_dir(target: &Path, file_count: usize) -> Result<()> {
    if target.is_dir() {
        return Ok(());
    }
    let spelled_as_dir = {
        let s = target.to_string_lossy();
        s.ends_with('/') || s.ends_with('\\')
    };
    if file_count > 1 || spelled_as_dir {
        fs::create_dir_all(target)
            .with_context(|| format!("failed creating output folder '{}'", target.display()))?;
    }
    Ok(())
}

fn convert_file(
    file: &Path,
    target: &Path,
    spec: &ConversionSpec,
    args: &Args,
    confirm: &mut impl FnMut(&Path) -> bool,
) -> Result<()> {
    let data = fs::read(file).with_context(|| format!("cannot read '{}'", file.display()))?;
    let (bytes, report) = convert_buffer(&data, spec)?;
    for warning in &report.warnings {
        tracing::warn!("'{}': {warning}", file.display());
    }

    let output = output_path(file, target, target.is_dir(), args.output_type, args.suffix.as_deref());
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        // Racing creations are harmless; a real failure surfaces on write.
        let _ = fs::create_dir_all(parent);
    }
    if output.exists() && !args.force && !is_stdout(&output) && !confirm(&output) {
        return Ok(());
    }
    if args.verbose {
        print_summary(file, &report, &output);
    }
    fs::write(&output, bytes).with_context(|| format!("cannot write '{}'", output.display()))?;
    Ok(())
}

/// Where the converted bytes go.
///
/// A directory target keeps the input's full file name (extension
/// included) and appends either the suffix verbatim or a dot plus the
/// output type's extension. Anything else is taken as the literal output
/// file.
fn output_path(
    input: &Path,
    target: &Path,
    target_is_dir: bool,
    output: PixelFormat,
    suffix: Option<&str>,
) -> PathBuf {
    if !target_is_dir {
        return target.to_path_buf();
    }
    let mut name = input
        .file_name()
        .unwrap_or(input.as_os_str())
        .to_os_string();
    match suffix {
        Some(s) => name.push(s),
        None => {
            name.push(".");
            name.push(output.extension());
        }
    }
    target.join(name)
}

fn is_stdout(path: &Path) -> bool {
    match (path.canonicalize(), Path::new("/dev/stdout").canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn print_summary(file: &Path, report: &ColorRangeReport, output: &Path) {
    match file.file_name() {
        Some(name) => println!("{}:", name.to_string_lossy()),
        None => println!("{}:", file.display()),
    }
    println!("\t{:<10}{}", "width:", report.width);
    println!("\t{:<10}{}", "height:", report.height);
    if report.stride > 0 {
        println!("\t{:<10}{}", "stride:", report.stride);
    }
    if report.scanline > 0 {
        println!("\t{:<10}{}", "scanline:", report.scanline);
    }
    for (id, range) in &report.channels {
        println!("\t{:<10}{range}", format!("{}:", id.label()));
    }
    println!("\t{:<10}{}", "output:", output.display());
}

/// Default overwrite prompt; empty answer means yes.
pub fn confirm_on_stdin(path: &Path) -> bool {
    print!("File '{}' already exists, overwrite? [Y/n] ", path.display());
    let _ = io::stdout().flush();
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).is_err() {
        return false;
    }
    let answer = line.trim();
    answer.is_empty() || answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_args(input: PixelFormat, output: PixelFormat, files: Vec<PathBuf>) -> Args {
        Args {
            path: None,
            col: None,
            row: None,
            stride: None,
            scanline: None,
            input_type: input,
            output_type: output,
            skip: 0,
            input_color: ColorStandard::Bt601,
            input_range: SignalRange::Full,
            output_color: ColorStandard::Bt601,
            output_range: SignalRange::Full,
            normalize: None,
            suffix: None,
            force: false,
            verbose: false,
            files,
        }
    }

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("repix-{tag}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn directory_target_appends_the_type_extension() {
        let out = output_path(
            Path::new("shots/frame.raw"),
            Path::new("out"),
            true,
            PixelFormat::Png,
            None,
        );
        assert_eq!(out, PathBuf::from("out/frame.raw.png"));
    }

    #[test]
    fn raw_targets_without_own_extension_get_bin() {
        let out = output_path(
            Path::new("frame.raw"),
            Path::new("out"),
            true,
            PixelFormat::Bgr,
            None,
        );
        assert_eq!(out, PathBuf::from("out/frame.raw.bin"));
    }

    #[test]
    fn suffix_replaces_the_extension_verbatim() {
        let out = output_path(
            Path::new("frame.raw"),
            Path::new("out"),
            true,
            PixelFormat::Png,
            Some("_small.png"),
        );
        assert_eq!(out, PathBuf::from("out/frame.raw_small.png"));
    }

    #[test]
    fn file_target_is_taken_literally() {
        let out = output_path(
            Path::new("frame.raw"),
            Path::new("result.png"),
            false,
            PixelFormat::Png,
            None,
        );
        assert_eq!(out, PathBuf::from("result.png"));
    }

    #[test]
    fn contradictory_flags_abort_before_any_io() {
        let mut args = test_args(
            PixelFormat::U8,
            PixelFormat::U8,
            vec![PathBuf::from("does-not-exist.raw")],
        );
        args.normalize = Some(-1.0);
        let err = run(&args, &mut |_| panic!("no prompt expected")).unwrap_err();
        assert!(err.to_string().contains("invalid conversion spec"));
    }

    #[test]
    fn missing_input_files_do_not_fail_the_batch() {
        let args = test_args(
            PixelFormat::U8,
            PixelFormat::U8,
            vec![PathBuf::from("does-not-exist.raw")],
        );
        assert!(run(&args, &mut |_| true).is_ok());
    }

    #[test]
    fn converts_into_a_directory_target() {
        let dir = scratch_dir("convert");
        let input = dir.join("gray.raw");
        fs::write(&input, [0u8, 10, 20, 30]).unwrap();

        let mut args = test_args(PixelFormat::U8, PixelFormat::Rgb, vec![input]);
        args.path = Some(dir.clone());
        args.col = Some(2);
        run(&args, &mut |_| panic!("no prompt expected")).unwrap();

        let out = fs::read(dir.join("gray.raw.bin")).unwrap();
        assert_eq!(out, [0, 0, 0, 10, 10, 10, 20, 20, 20, 30, 30, 30]);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn declined_overwrite_leaves_the_file_alone() {
        let dir = scratch_dir("decline");
        let input = dir.join("gray.raw");
        fs::write(&input, [1u8, 2, 3, 4]).unwrap();
        let existing = dir.join("gray.raw.bin");
        fs::write(&existing, b"keep me").unwrap();

        let mut args = test_args(PixelFormat::U8, PixelFormat::U8, vec![input]);
        args.path = Some(dir.clone());
        args.col = Some(2);
        let mut asked = 0;
        run(&args, &mut |_| {
            asked += 1;
            false
        })
        .unwrap();

        assert_eq!(asked, 1);
        assert_eq!(fs::read(&existing).unwrap(), b"keep me");
        let _ = fs::remove_dir_all(&dir);
    }
}
