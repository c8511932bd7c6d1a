mod common;

use common::{minimal_interpreter, path_str, write_file, StartupBlock};
use nix_ld::{
    arch,
    start::{auxiliary_vector::AT_BASE, ProcessImage},
    Error, ErrorKind, Handoff,
};

const KERNEL_BASE: usize = 0x7f00_0000_0000;

fn prepare(block: &mut StartupBlock) -> Result<Handoff<'static>, (ErrorKind, Error, String)> {
    let mut image = unsafe { ProcessImage::from_stack_pointer(block.stack_pointer()) };
    nix_ld::prepare(&mut image)
        .map_err(|report| (report.error.kind(), report.error, report.to_string()))
}

#[test]
fn jumps_to_the_mapped_entry_point() {
    let interpreter = write_file(&minimal_interpreter(0x40));
    let nix_ld = format!("NIX_LD={}", path_str(interpreter.path()));
    let mut block = StartupBlock::with_page_size(
        &["/bin/hello", "--flag"],
        &["HOME=/root", &nix_ld],
        &[(AT_BASE, KERNEL_BASE)],
    );

    let Ok(Handoff::Jump {
        entry_point,
        stack_pointer,
        image,
    }) = prepare(&mut block)
    else {
        panic!("expected a jump");
    };

    let load_bias = image.address();
    assert_eq!(image.len(), common::PAGE_SIZE);
    assert_eq!(entry_point, load_bias + 0x40);
    assert_eq!(stack_pointer, block.stack_pointer() as *const usize);
    assert_eq!(block.auxv(AT_BASE), Some(load_bias));
    // The segment maps the file itself.
    let mapped = unsafe { std::slice::from_raw_parts(load_bias as *const u8, 4) };
    assert_eq!(mapped, b"\x7fELF");
    assert_eq!(block.environment(), ["HOME=/root", nix_ld.as_str()]);
}

#[test]
fn executes_the_interpreter_when_started_directly() {
    let interpreter = write_file(&minimal_interpreter(0x40));
    let nix_ld = format!("NIX_LD={}", path_str(interpreter.path()));
    let mut block =
        StartupBlock::with_page_size(&["nix-ld", "/bin/hello"], &[&nix_ld], &[(AT_BASE, 0)]);

    let Ok(Handoff::Execute {
        interpreter: path,
        argv,
        envp,
    }) = prepare(&mut block)
    else {
        panic!("expected an exec");
    };

    assert_eq!(path.to_str().unwrap(), path_str(interpreter.path()));
    assert_eq!(argv as usize, block.argv() as usize);
    assert_eq!(envp as usize, block.envp() as usize);
    assert_eq!(block.auxv(AT_BASE), Some(0));
}

#[test]
fn leaves_a_missing_at_base_alone() {
    let interpreter = write_file(&minimal_interpreter(0x80));
    let nix_ld = format!("NIX_LD={}", path_str(interpreter.path()));
    let mut block = StartupBlock::with_page_size(&["hello"], &[&nix_ld], &[]);

    let Ok(Handoff::Jump {
        entry_point, image, ..
    }) = prepare(&mut block)
    else {
        panic!("expected a jump");
    };
    assert_eq!(entry_point, image.address() + 0x80);
    assert_eq!(block.auxv(AT_BASE), None);
}

#[test]
fn prefers_the_architecture_specific_interpreter() {
    let generic = write_file(b"not an elf file at all");
    let specific = write_file(&minimal_interpreter(0x40));
    let generic_var = format!("NIX_LD={}", path_str(generic.path()));
    let specific_var = format!("NIX_LD_{}={}", arch::SYSTEM, path_str(specific.path()));
    let mut block = StartupBlock::with_page_size(
        &["hello"],
        &[&generic_var, &specific_var],
        &[(AT_BASE, KERNEL_BASE)],
    );

    assert!(matches!(prepare(&mut block), Ok(Handoff::Jump { .. })));
}

#[test]
fn merges_library_paths_before_the_handoff() {
    let interpreter = write_file(&minimal_interpreter(0x40));
    let nix_ld = format!("NIX_LD={}", path_str(interpreter.path()));
    let mut block = StartupBlock::with_page_size(
        &["hello"],
        &[
            "LD_LIBRARY_PATH=/usr/lib",
            &nix_ld,
            "NIX_LD_LIBRARY_PATH=/nix/lib",
        ],
        &[(AT_BASE, 0)],
    );

    assert!(matches!(prepare(&mut block), Ok(Handoff::Execute { .. })));
    assert_eq!(
        block.environment(),
        [
            "LD_LIBRARY_PATH=/usr/lib:/nix/lib",
            nix_ld.as_str(),
            "NIX_LD_LIBRARY_PATH=/nix/lib",
        ]
    );
}

#[test]
fn renames_the_supplementary_path_when_none_exists() {
    let interpreter = write_file(&minimal_interpreter(0x40));
    let nix_ld = format!("NIX_LD={}", path_str(interpreter.path()));
    let mut block = StartupBlock::with_page_size(
        &["hello"],
        &[&nix_ld, "NIX_LD_LIBRARY_PATH=/nix/lib"],
        &[(AT_BASE, KERNEL_BASE)],
    );

    assert!(prepare(&mut block).is_ok());
    assert_eq!(
        block.environment(),
        [nix_ld.as_str(), "LD_LIBRARY_PATH=/nix/lib"]
    );
}

#[test]
fn reports_missing_configuration() {
    let mut block = StartupBlock::with_page_size(&["/bin/hello"], &["PATH=/bin"], &[]);
    let Err((kind, error, message)) = prepare(&mut block) else {
        panic!("expected an error");
    };
    assert_eq!(kind, ErrorKind::Configuration);
    assert_eq!(error, Error::MissingInterpreter);
    assert!(message.starts_with("cannot execute /bin/hello: "));
}

#[test]
fn reports_a_missing_page_size() {
    let interpreter = write_file(&minimal_interpreter(0x40));
    let nix_ld = format!("NIX_LD={}", path_str(interpreter.path()));
    let mut block = StartupBlock::new(&["hello"], &[&nix_ld], &[(AT_BASE, KERNEL_BASE)]);
    let Err((_, error, _)) = prepare(&mut block) else {
        panic!("expected an error");
    };
    assert_eq!(error, Error::MissingPageSize);
}

#[test]
fn reports_files_that_are_not_elf_objects() {
    let interpreter = write_file(b"#!/bin/sh\nexit 0\n");
    let nix_ld = format!("NIX_LD={}", path_str(interpreter.path()));
    let mut block =
        StartupBlock::with_page_size(&["hello"], &[&nix_ld], &[(AT_BASE, KERNEL_BASE)]);

    let Err((kind, error, message)) = prepare(&mut block) else {
        panic!("expected an error");
    };
    assert_eq!(kind, ErrorKind::Format);
    assert_eq!(error, Error::NotElf);
    assert!(!error.is_corrupt());
    assert_eq!(
        message,
        format!(
            "cannot execute hello: $NIX_LD ({}): not an elf file",
            path_str(interpreter.path())
        )
    );
    // Nothing was rewritten on the failure path.
    assert_eq!(block.auxv(AT_BASE), Some(KERNEL_BASE));
}

#[test]
fn reports_unopenable_interpreters() {
    let mut block = StartupBlock::with_page_size(
        &["hello"],
        &["NIX_LD=/nonexistent/ld.so"],
        &[(AT_BASE, KERNEL_BASE)],
    );
    let Err((kind, _, message)) = prepare(&mut block) else {
        panic!("expected an error");
    };
    assert_eq!(kind, ErrorKind::Io);
    assert!(message.ends_with("cannot open: No such file or directory"));
}
