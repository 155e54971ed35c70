//! Reads a source file, assembles it and writes the object tape (and
//! optionally the listing).
use std::ffi::OsStr;
use std::fs::{File, OpenOptions};
use std::io::{stdout, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{event, span, Level};

use super::engine::{assemble_source, Assembly};
use super::types::{AssemblerFailure, AssemblerOptions, LineNumber};

mod output;

#[cfg(test)]
mod tests;

pub use output::{bin_tape_frames, write_bin_tape};

/// Settings which affect what we write, but not what we assemble.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputOptions {
    /// Write a listing on standard output.
    pub list: bool,
}

/// The output file used when none is specified: the input file with
/// its extension replaced by `.bin`.
#[must_use]
pub fn default_output_path(input_file: &OsStr) -> PathBuf {
    Path::new(input_file).with_extension("bin")
}

/// Read the program text.  Bytes which are not valid UTF-8 become
/// U+FFFD; the scanner reports them like any other unexpected
/// character, so they only matter outside comments and strings.
fn read_source(input_file: &OsStr) -> Result<String, AssemblerFailure> {
    let input = OpenOptions::new()
        .read(true)
        .open(input_file)
        .map_err(|e| AssemblerFailure::IoErrorOnInput {
            filename: input_file.to_owned(),
            error: e,
            line_number: None,
        })?;
    let mut reader = BufReader::new(input);
    let mut source = String::new();
    let mut buf: Vec<u8> = Vec::new();
    let mut line_number: LineNumber = 0;
    loop {
        line_number = line_number.saturating_add(1);
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Err(e) => {
                return Err(AssemblerFailure::IoErrorOnInput {
                    filename: input_file.to_owned(),
                    error: e,
                    line_number: Some(line_number),
                });
            }
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf);
                let text = text.strip_suffix('\n').unwrap_or(&text);
                let text = text.strip_suffix('\r').unwrap_or(text);
                if text.contains(char::REPLACEMENT_CHARACTER) {
                    event!(Level::WARN, "line {line_number} is not valid UTF-8");
                }
                source.push_str(text);
                source.push('\n');
            }
        }
    }
    Ok(source)
}

fn write_listing(assembly: &Assembly) -> Result<(), AssemblerFailure> {
    let mut out = stdout().lock();
    write!(out, "{}", assembly.listing)
        .and_then(|()| out.flush())
        .map_err(|error| AssemblerFailure::IoErrorOnStdout { error })
}

/// Assemble `input_file`, writing a BIN format tape to `output_file`
/// (or to [`default_output_path`] if that is `None`).
///
/// The tape is written even if the program has errors; callers
/// should check [`Assembly::has_errors`].
///
/// # Errors
///
/// Only failures to read the input or write the output are errors.
pub fn assemble_file(
    input_file: &OsStr,
    output_file: Option<&Path>,
    options: &AssemblerOptions,
    output_options: OutputOptions,
) -> Result<Assembly, AssemblerFailure> {
    let output_path: PathBuf = match output_file {
        Some(path) => path.to_path_buf(),
        None => default_output_path(input_file),
    };
    let span = span!(Level::INFO, "assemble_file", input=?input_file, output=%output_path.display());
    let _enter = span.enter();

    let source = read_source(input_file)?;
    let lines = LineNumber::try_from(source.lines().count()).unwrap_or(LineNumber::MAX);
    event!(Level::DEBUG, "read {lines} lines");
    let assembly = assemble_source(&source, options);

    let file: File = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&output_path)
        .map_err(|error| AssemblerFailure::IoErrorOnOutput {
            filename: output_path.clone(),
            error,
        })?;
    let mut writer = BufWriter::new(file);
    write_bin_tape(&assembly.words, &mut writer, &output_path)?;
    event!(
        Level::INFO,
        "wrote {} words to {}",
        assembly.words.len(),
        output_path.display()
    );

    if output_options.list {
        write_listing(&assembly)?;
    }
    Ok(assembly)
}
