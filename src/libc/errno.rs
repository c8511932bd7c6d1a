use core::fmt::{self, Display};

#[repr(transparent)]
#[doc(alias = "errno")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Errno(pub(crate) u32);

impl Errno {
    pub const NOENT: Self = Self(2);
    pub const BADF: Self = Self(9);
    pub const NOMEM: Self = Self(12);
    pub const INVAL: Self = Self(22);

    /// Splits a raw system call return value: the kernel returns `-errno` on
    /// failure.
    #[inline]
    pub(crate) fn from_return(result: isize) -> Result<usize, Self> {
        if (-4095..0).contains(&result) {
            Err(Self(result.unsigned_abs() as u32))
        } else {
            Ok(result as usize)
        }
    }
}

impl From<&Errno> for u32 {
    fn from(errno: &Errno) -> u32 {
        errno.0
    }
}

// Recognize errors documented in POSIX and use the documented strings.
// <https://pubs.opengroup.org/onlinepubs/9699919799/basedefs/errno.h.html>
static MESSAGES: phf::Map<u32, &'static str> = phf::phf_map! {
    1u32 => "Operation not permitted",
    2u32 => "No such file or directory",
    4u32 => "Interrupted system call",
    5u32 => "I/O error",
    6u32 => "No such device or address",
    7u32 => "Argument list too long",
    8u32 => "Exec format error",
    9u32 => "Bad file descriptor",
    11u32 => "Resource temporarily unavailable",
    12u32 => "Out of memory",
    13u32 => "Permission denied",
    14u32 => "Bad address",
    16u32 => "Resource busy",
    19u32 => "No such device",
    20u32 => "Not a directory",
    21u32 => "Is a directory",
    22u32 => "Invalid argument",
    23u32 => "Too many open files in system",
    24u32 => "Too many open files",
    26u32 => "Text file busy",
    27u32 => "File too large",
    36u32 => "Filename too long",
    40u32 => "Symbolic link loop",
    75u32 => "Value too large for data type",
};

impl Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match MESSAGES.get(&self.0) {
            Some(message) => f.write_str(message),
            None => write!(f, "Unknown error: {}", u32::from(self)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Errno::NOENT, "No such file or directory")]
    #[case(Errno::BADF, "Bad file descriptor")]
    #[case(Errno(8), "Exec format error")]
    #[case(Errno(4000), "Unknown error: 4000")]
    fn displays_posix_messages(#[case] errno: Errno, #[case] expected: &str) {
        assert_eq!(errno.to_string(), expected);
    }

    #[test]
    fn splits_kernel_return_values() {
        assert_eq!(Errno::from_return(3), Ok(3));
        assert_eq!(Errno::from_return(-2), Err(Errno::NOENT));
        // Addresses in the upper half are not errors.
        assert_eq!(Errno::from_return(-8192), Ok((-8192isize) as usize));
    }
}
