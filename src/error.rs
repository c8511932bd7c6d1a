use core::fmt::{self, Display};

use crate::{arch, libc::errno::Errno};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required variable or auxiliary vector entry is missing.
    Configuration,
    /// The interpreter could not be opened, read or executed.
    Io,
    /// The interpreter is not an object this process can load.
    Format,
    /// Mapping or allocation failed.
    Resource,
}

/// Why the interpreter could not be started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    MissingInterpreter,
    MissingPageSize,
    Open(Errno),
    ReadHeader(Errno),
    TruncatedHeader,
    NotElf,
    UnsupportedClass(u8),
    UnsupportedEncoding(u8),
    WrongArchitecture { expected: u16, found: u16 },
    NotDynamic(u16),
    ProgramHeaderSize(usize),
    ReadProgramHeaders(Errno),
    TruncatedProgramHeaders,
    NoLoadableSegments,
    SegmentOrder,
    MapSegment(Errno),
    OutOfMemory,
    Execute(Errno),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingInterpreter | Self::MissingPageSize => ErrorKind::Configuration,
            Self::Open(_) | Self::ReadHeader(_) | Self::ReadProgramHeaders(_) | Self::Execute(_) => {
                ErrorKind::Io
            }
            Self::TruncatedHeader
            | Self::NotElf
            | Self::UnsupportedClass(_)
            | Self::UnsupportedEncoding(_)
            | Self::WrongArchitecture { .. }
            | Self::NotDynamic(_)
            | Self::ProgramHeaderSize(_)
            | Self::TruncatedProgramHeaders
            | Self::NoLoadableSegments
            | Self::SegmentOrder => ErrorKind::Format,
            Self::MapSegment(_) | Self::OutOfMemory => ErrorKind::Resource,
        }
    }

    /// Format errors on a file that claims to be a loadable ELF object, as
    /// opposed to one that is not such an object at all.
    pub fn is_corrupt(&self) -> bool {
        matches!(
            self,
            Self::TruncatedHeader
                | Self::ProgramHeaderSize(_)
                | Self::TruncatedProgramHeaders
                | Self::NoLoadableSegments
                | Self::SegmentOrder
        )
    }

    /// Whether the message should name the interpreter file.
    fn concerns_interpreter(&self) -> bool {
        !matches!(
            self,
            Self::MissingInterpreter | Self::MissingPageSize | Self::OutOfMemory
        )
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingInterpreter => write!(
                f,
                "You are trying to run an unpatched binary on nixos, but you have not configured \
                 NIX_LD or NIX_LD_{}. See https://github.com/Mic92/nix-ld for more details",
                arch::SYSTEM
            ),
            Self::MissingPageSize => {
                f.write_str("no page size (AT_PAGESZ) given by operating system in auxv.")
            }
            Self::Open(errno) => write!(f, "cannot open: {errno}"),
            Self::ReadHeader(errno) => write!(f, "cannot read elf header: {errno}"),
            Self::TruncatedHeader => f.write_str("elf header is truncated"),
            Self::NotElf => f.write_str("not an elf file"),
            Self::UnsupportedClass(class) => write!(f, "unsupported elf class {class}"),
            Self::UnsupportedEncoding(data) => write!(f, "unsupported elf data encoding {data}"),
            Self::WrongArchitecture { expected, found } => write!(
                f,
                "built for machine {found}, this process runs machine {expected}"
            ),
            Self::NotDynamic(e_type) => write!(f, "not a dynamic library (type {e_type})"),
            Self::ProgramHeaderSize(size) => {
                write!(f, "incorrect program header size: {size}")
            }
            Self::ReadProgramHeaders(errno) => {
                write!(f, "cannot read program headers: {errno}")
            }
            Self::TruncatedProgramHeaders => f.write_str("program header table is truncated"),
            Self::NoLoadableSegments => f.write_str("no loadable segments"),
            Self::SegmentOrder => f.write_str("loadable segments are not sorted by address"),
            Self::MapSegment(errno) => write!(f, "mmap segment failed: {errno}"),
            Self::OutOfMemory => f.write_str("out of memory"),
            Self::Execute(errno) => write!(f, "cannot execute: {errno}"),
        }
    }
}

/// Renders bytes from the process image, replacing invalid UTF-8.
pub struct DisplayBytes<'a>(pub &'a [u8]);

impl Display for DisplayBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in self.0.utf8_chunks() {
            f.write_str(chunk.valid())?;
            if !chunk.invalid().is_empty() {
                f.write_str("\u{FFFD}")?;
            }
        }
        Ok(())
    }
}

/// An [`Error`] together with what was being started, rendered as the
/// one-line diagnostic the process exits with.
#[derive(Debug)]
pub struct Report<'a> {
    pub program_name: &'a [u8],
    pub interpreter_path: Option<&'a [u8]>,
    pub error: Error,
}

impl<'a> Report<'a> {
    pub fn new(program_name: &'a [u8], error: Error) -> Self {
        Self {
            program_name,
            interpreter_path: None,
            error,
        }
    }

    pub fn with_interpreter(mut self, interpreter_path: &'a [u8]) -> Self {
        self.interpreter_path = Some(interpreter_path);
        self
    }
}

impl Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot execute {}: ", DisplayBytes(self.program_name))?;
        match self.interpreter_path {
            Some(path) if self.error.concerns_interpreter() => {
                write!(f, "$NIX_LD ({}): {}", DisplayBytes(path), self.error)
            }
            _ => write!(f, "{}", self.error),
        }
    }
}
