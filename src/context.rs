//! What the loader needs to know, gathered from the environment block and
//! auxiliary vector without copying anything.

use core::ffi::CStr;

use log::LevelFilter;

use crate::{
    arch,
    error::Error,
    page_size::PageSize,
    start::{
        auxiliary_vector::AT_PAGE_SIZE, environment_variables::EnvironmentVariable, ProcessImage,
    },
};

pub const NIX_LD: &[u8] = b"NIX_LD";
pub const NIX_LD_LIBRARY_PATH: &[u8] = b"NIX_LD_LIBRARY_PATH";
pub const LD_LIBRARY_PATH: &[u8] = b"LD_LIBRARY_PATH";
pub const NIX_LD_LOG: &[u8] = b"NIX_LD_LOG";

/// Matches `NAME` and the architecture-tagged `NAME_<system>`; returns
/// whether the tagged form matched.
fn match_variable(name: &[u8], base: &[u8]) -> Option<bool> {
    let rest = name.strip_prefix(base)?;
    if rest.is_empty() {
        return Some(false);
    }
    (rest.strip_prefix(b"_")? == arch::SYSTEM.as_bytes()).then_some(true)
}

/// Keeps the first tagged occurrence, else the first untagged one.
#[derive(Default)]
struct Candidate<'a> {
    tagged: Option<EnvironmentVariable<'a>>,
    untagged: Option<EnvironmentVariable<'a>>,
}

impl<'a> Candidate<'a> {
    fn offer(&mut self, tagged: bool, variable: EnvironmentVariable<'a>) {
        let choice = if tagged {
            &mut self.tagged
        } else {
            &mut self.untagged
        };
        choice.get_or_insert(variable);
    }

    fn resolve(self) -> Option<EnvironmentVariable<'a>> {
        self.tagged.or(self.untagged)
    }
}

#[derive(Debug)]
pub struct LoaderContext<'a> {
    pub program_name: &'a [u8],
    /// The real dynamic linker.
    pub interpreter_path: &'a CStr,
    /// `NIX_LD_LIBRARY_PATH_<system>` or `NIX_LD_LIBRARY_PATH`, whichever
    /// takes precedence.
    pub supplementary_library_path: Option<EnvironmentVariable<'a>>,
    /// `LD_LIBRARY_PATH` as inherited.
    pub existing_library_path: Option<EnvironmentVariable<'a>>,
    pub page_size: PageSize,
    /// Set by `NIX_LD_LOG`; `Err` holds a value that does not name a level.
    pub log_level: Option<Result<LevelFilter, &'a [u8]>>,
}

impl<'a> LoaderContext<'a> {
    pub fn from_process(image: &ProcessImage<'a>) -> Result<Self, Error> {
        let mut interpreter = Candidate::default();
        let mut supplementary = Candidate::default();
        let mut existing_library_path = None;
        let mut log_level = None;

        for variable in image.environment.iter() {
            if variable.name == LD_LIBRARY_PATH {
                existing_library_path.get_or_insert(variable);
            } else if variable.name == NIX_LD_LOG {
                log_level.get_or_insert_with(|| parse_level(variable.value));
            } else if let Some(tagged) = match_variable(variable.name, NIX_LD_LIBRARY_PATH) {
                supplementary.offer(tagged, variable);
            } else if let Some(tagged) = match_variable(variable.name, NIX_LD) {
                // An empty path is as good as none.
                if !variable.value.is_empty() {
                    interpreter.offer(tagged, variable);
                }
            }
        }

        let interpreter_path = interpreter
            .resolve()
            .ok_or(Error::MissingInterpreter)?
            .value_cstr();
        let page_size = image
            .auxiliary_vector
            .get(AT_PAGE_SIZE)
            .and_then(PageSize::new)
            .ok_or(Error::MissingPageSize)?;

        Ok(Self {
            program_name: image.program_name(),
            interpreter_path,
            supplementary_library_path: supplementary.resolve(),
            existing_library_path,
            page_size,
            log_level,
        })
    }
}

fn parse_level(value: &[u8]) -> Result<LevelFilter, &[u8]> {
    core::str::from_utf8(value)
        .ok()
        .and_then(|level| level.parse().ok())
        .ok_or(value)
}
