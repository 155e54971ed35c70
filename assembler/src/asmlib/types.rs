use std::error::Error;
use std::ffi::{OsStr, OsString};
use std::fmt::{self, Display, Formatter};
use std::io::Error as IoError;
use std::path::PathBuf;

use base::prelude::CpuVariant;

/// Source line numbers count from 1.
pub type LineNumber = u32;

/// Settings which affect the meaning of the program being assembled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblerOptions {
    /// The processor selected before the first line is read.  The
    /// program can still select an extension with `.HM6120` or
    /// `.IM6100` if this is [`CpuVariant::Pdp8`].
    pub cpu: CpuVariant,
}

/// A failure which stops the assembler.  Problems with the program
/// being assembled are not failures; they are reported as
/// diagnostics.
#[derive(Debug)]
pub enum AssemblerFailure {
    IoErrorOnStdout {
        error: IoError,
    },
    IoErrorOnInput {
        filename: OsString,
        error: IoError,
        line_number: Option<LineNumber>,
    },
    IoErrorOnOutput {
        filename: PathBuf,
        error: IoError,
    },
}

fn write_os_string(f: &mut Formatter<'_>, s: &OsStr) -> Result<(), fmt::Error> {
    match s.to_str() {
        Some(unicode_name) => f.write_str(unicode_name),
        None => write!(
            f,
            "{} (some non-Unicode characters changed to make it printable)",
            s.to_string_lossy(),
        ),
    }
}

impl Display for AssemblerFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            AssemblerFailure::IoErrorOnStdout { error } => {
                write!(f, "error writing on stdout: {error}")
            }
            AssemblerFailure::IoErrorOnInput {
                filename,
                error,
                line_number,
            } => {
                f.write_str("I/O error reading input file ")?;
                write_os_string(f, filename)?;
                if let Some(n) = line_number {
                    write!(f, " at line {n}")?;
                }
                write!(f, ": {error}")
            }
            AssemblerFailure::IoErrorOnOutput { filename, error } => {
                write!(
                    f,
                    "I/O error writing output file {}: {error}",
                    filename.display(),
                )
            }
        }
    }
}

impl Error for AssemblerFailure {}

#[test]
fn test_input_failure_display() {
    let failure = AssemblerFailure::IoErrorOnInput {
        filename: OsString::from("prog.pal"),
        error: IoError::new(std::io::ErrorKind::InvalidData, "stream did not contain valid UTF-8"),
        line_number: Some(12),
    };
    assert_eq!(
        failure.to_string(),
        "I/O error reading input file prog.pal at line 12: stream did not contain valid UTF-8"
    );
}
