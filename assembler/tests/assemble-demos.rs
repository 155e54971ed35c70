use std::fs;
use std::path::{Path, PathBuf};

use assembler::*;
use base::prelude::CpuVariant;

fn get_test_input_file_name(relative_to_manifest: &str) -> PathBuf {
    let mut location = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    location.push(relative_to_manifest);
    if location.exists() {
        location
    } else {
        panic!(
            "Cannot find input {relative_to_manifest}: {} does not exist",
            location.display()
        );
    }
}

fn get_temp_output_file_name() -> tempfile::TempPath {
    tempfile::Builder::new()
        .suffix(".bin")
        .tempfile()
        .expect("should be able to create a temporary file")
        .into_temp_path()
}

fn assemble_to(input: &Path, output: &Path) -> Assembly {
    assemble_file(
        input.as_os_str(),
        Some(output),
        &AssemblerOptions {
            cpu: CpuVariant::Pdp8,
        },
        OutputOptions::default(),
    )
    .unwrap_or_else(|e| panic!("failed to assemble {}: {e}", input.display()))
}

#[test]
fn hello_program_assembles_cleanly() {
    let input = get_test_input_file_name("../demos/hello.pal");
    let output = get_temp_output_file_name();
    let assembly = assemble_to(&input, &output);

    assert!(
        assembly.diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        assembly.diagnostics
    );
    assert_eq!(assembly.title.as_deref(), Some("HELLO"));
    let words: Vec<u16> = assembly.words.iter().map(|w| u16::from(w.word)).collect();
    assert_eq!(
        words,
        vec![
            0o7300, 0o1211, 0o3212, 0o1613, 0o4214, 0o2213, 0o2212, 0o5203, 0o7402, // main loop
            0o7773, 0o0000, 0o0222, // COUNT, TEMP, PTR
            0o0000, 0o6046, 0o6041, 0o5216, 0o7200, 0o5614, // TYPE
            0o0110, 0o0105, 0o0114, 0o0114, 0o0117, // MSG
        ]
    );
    assert_eq!(assembly.symbols.value("START").map(u16::from), Some(0o200));
    assert_eq!(assembly.symbols.value("MSG").map(u16::from), Some(0o222));
}

#[test]
fn hello_program_tape_matches_frames() {
    let input = get_test_input_file_name("../demos/hello.pal");
    let output = get_temp_output_file_name();
    let assembly = assemble_to(&input, &output);

    let tape = fs::read(&output).expect("should be able to read the tape");
    assert_eq!(tape, bin_tape_frames(&assembly.words));
    assert!(tape.starts_with(&[0o200; 16]));
    assert!(tape.ends_with(&[0o200; 16]));
    // Origin 0200, then the first word (CLA CLL).
    assert_eq!(&tape[16..20], &[0o102, 0o000, 0o73, 0o00]);
}

#[test]
fn tape_is_written_even_when_there_are_errors() {
    let dir = tempfile::tempdir().expect("should be able to create a temporary directory");
    let input = dir.path().join("broken.pal");
    fs::write(&input, "        TAD NOWHERE\n        CLA\n").expect("should write source");
    let output = dir.path().join("broken.bin");

    let assembly = assemble_to(&input, &output);
    assert!(assembly.has_errors());
    let tape = fs::read(&output).expect("tape should have been written");
    assert_eq!(tape, bin_tape_frames(&assembly.words));
}

#[test]
fn output_defaults_to_bin_extension() {
    let dir = tempfile::tempdir().expect("should be able to create a temporary directory");
    let input = dir.path().join("prog.pal");
    fs::write(&input, "START,  JMP START\n").expect("should write source");

    let assembly = assemble_file(
        input.as_os_str(),
        None,
        &AssemblerOptions::default(),
        OutputOptions::default(),
    )
    .expect("assembly should succeed");
    assert!(!assembly.has_errors());
    assert!(dir.path().join("prog.bin").exists());
}

#[test]
fn missing_input_is_a_failure() {
    let dir = tempfile::tempdir().expect("should be able to create a temporary directory");
    let input = dir.path().join("absent.pal");
    let output = dir.path().join("absent.bin");
    match assemble_file(
        input.as_os_str(),
        Some(&output),
        &AssemblerOptions::default(),
        OutputOptions::default(),
    ) {
        Err(AssemblerFailure::IoErrorOnInput { line_number, .. }) => {
            assert_eq!(line_number, None);
        }
        other => panic!("expected an input failure, got {other:?}"),
    }
    assert!(!output.exists());
}

#[test]
fn invalid_utf8_is_not_a_failure() {
    let dir = tempfile::tempdir().expect("should be able to create a temporary directory");
    let input = dir.path().join("latin1.pal");
    fs::write(&input, b"; caf\xe9\n        CLA\n        \xff\n").expect("should write source");
    let output = dir.path().join("latin1.bin");

    let assembly = assemble_to(&input, &output);
    // The bad byte in the comment is harmless; the one in the
    // program is reported on its line.
    let lines: Vec<u32> = assembly.diagnostics.iter().map(|d| d.line).collect();
    assert_eq!(lines, vec![3]);
    assert!(assembly.has_errors());
    assert_eq!(u16::from(assembly.words[0].word), 0o7200);
}
