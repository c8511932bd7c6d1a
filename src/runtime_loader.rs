//! The loader from start to finish: read the configuration, map the real
//! dynamic linker, fix up the process image and hand over to it.

use core::{
    ffi::{c_char, CStr},
    fmt::Write as _,
};

use log::{debug, warn};

use crate::{
    arch,
    context::LoaderContext,
    elf::ElfFile,
    error::{DisplayBytes, Error, Report},
    libc::{fs::Stderr, process},
    library_path,
    logger,
    mapping::Mapping,
    shared_object::LoadedInterpreter,
    start::{auxiliary_vector::AT_BASE, ProcessImage},
};

/// How control leaves this process.
#[derive(Debug)]
pub enum Handoff<'a> {
    /// Nothing requested an interpreter (`AT_BASE` is zero): this process was
    /// started directly, so start the real dynamic linker as a program.
    Execute {
        interpreter: &'a CStr,
        argv: *const *const c_char,
        envp: *const *const c_char,
    },
    /// Continue as the real dynamic linker, on the stack the kernel built.
    Jump {
        entry_point: usize,
        stack_pointer: *const usize,
        image: Mapping,
    },
}

impl<'a> Handoff<'a> {
    /// Carries out the handoff. Only returns if `execve` failed.
    ///
    /// # Safety
    ///
    /// For [`Handoff::Jump`], the pointers must come from [`prepare`] on the
    /// process' own start-up block, and nothing may touch that block or the
    /// mapped image afterwards.
    pub unsafe fn perform(self) -> Error {
        match self {
            Self::Execute {
                interpreter,
                argv,
                envp,
            } => Error::Execute(process::execve(interpreter, argv, envp)),
            Self::Jump {
                entry_point,
                stack_pointer,
                image,
            } => {
                // The image now belongs to the program that runs next.
                image.leak();
                arch::jump_to_entry(entry_point, stack_pointer)
            }
        }
    }
}

/// Everything up to the handoff: gathers the configuration, maps the
/// interpreter, rewrites `LD_LIBRARY_PATH` and patches `AT_BASE`.
pub fn prepare<'a>(image: &mut ProcessImage<'a>) -> Result<Handoff<'a>, Report<'a>> {
    let context = LoaderContext::from_process(image)
        .map_err(|error| Report::new(image.program_name(), error))?;
    apply_log_level(&context);

    let report = |error: Error| {
        Report::new(context.program_name, error)
            .with_interpreter(context.interpreter_path.to_bytes())
    };

    debug!(
        "loading interpreter {}",
        DisplayBytes(context.interpreter_path.to_bytes())
    );
    let loaded = {
        let elf = ElfFile::open(context.interpreter_path).map_err(report)?;
        LoadedInterpreter::map(&elf, context.page_size).map_err(report)?
    };

    library_path::rewrite(&context, &mut image.environment).map_err(report)?;

    match image.auxiliary_vector.get(AT_BASE) {
        Some(0) => {
            warn!("executed directly, starting the interpreter with execve");
            drop(loaded);
            return Ok(Handoff::Execute {
                interpreter: context.interpreter_path,
                argv: image.argv(),
                envp: image.environment.as_ptr(),
            });
        }
        Some(base) => {
            debug!("AT_BASE {base:#x} -> {:#x}", loaded.load_bias);
            image.auxiliary_vector.set(AT_BASE, loaded.load_bias);
        }
        None => debug!("no AT_BASE to patch"),
    }

    Ok(Handoff::Jump {
        entry_point: loaded.entry_point,
        stack_pointer: image.stack_pointer(),
        image: loaded.image,
    })
}

fn apply_log_level(context: &LoaderContext<'_>) {
    match context.log_level {
        Some(Ok(level)) => log::set_max_level(level),
        Some(Err(value)) => warn!("Unknown log level {}", DisplayBytes(value)),
        None => {}
    }
}

/// The whole program: load the interpreter named by `NIX_LD` and become it.
/// Prints a diagnostic and exits with status 1 on failure.
///
/// # Safety
///
/// `stack_pointer` must be the initial stack pointer the kernel started the
/// process with, and this must be the only code using the start-up block.
pub unsafe fn run(stack_pointer: *mut usize) -> ! {
    logger::init();

    let mut image = ProcessImage::from_stack_pointer(stack_pointer);
    let program_name = image.program_name();

    let report = match prepare(&mut image) {
        Ok(handoff) => {
            let interpreter = match &handoff {
                Handoff::Execute { interpreter, .. } => Some(interpreter.to_bytes()),
                Handoff::Jump { .. } => None,
            };
            let report = Report::new(program_name, handoff.perform());
            match interpreter {
                Some(interpreter) => report.with_interpreter(interpreter),
                None => report,
            }
        }
        Err(report) => report,
    };

    let _ = writeln!(Stderr, "{report}");
    process::exit(1)
}
