/// Reports a broken internal invariant and aborts the process.
#[cfg(not(test))]
macro_rules! fatal {
    ($($arg:tt)+) => {{
        use core::fmt::Write as _;
        let _ = write!(
            $crate::libc::fs::Stderr,
            "[nix-ld] FATAL: {}\n",
            format_args!($($arg)+),
        );
        $crate::libc::process::abort()
    }};
}

// Unit tests cannot observe an abort, so they get a panic with the same
// message.
#[cfg(test)]
macro_rules! fatal {
    ($($arg:tt)+) => {
        panic!("[nix-ld] FATAL: {}", format_args!($($arg)+))
    };
}

pub(crate) use fatal;

macro_rules! fatal_assert {
    ($condition:expr, $($arg:tt)+) => {
        if !$condition {
            $crate::io_macros::fatal!($($arg)+);
        }
    };
}

pub(crate) use fatal_assert;
