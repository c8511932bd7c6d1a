//! Exposes the supplementary library path to the real dynamic linker as
//! `LD_LIBRARY_PATH`.

use alloc::vec::Vec;
use core::ffi::CStr;

use log::info;

use crate::{
    context::{LoaderContext, LD_LIBRARY_PATH},
    error::{DisplayBytes, Error},
    io_macros::fatal,
    start::environment_variables::Environment,
};

/// Which rewrite [`rewrite`] performed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rewrite {
    /// No supplementary path was configured.
    Unchanged,
    /// The supplementary variable was renamed to `LD_LIBRARY_PATH` in place.
    Renamed { slot: usize },
    /// `LD_LIBRARY_PATH` was replaced by a new `existing:supplementary` string.
    Appended { slot: usize },
}

/// `existing[:]supplementary`, without an empty path segment.
pub fn join_paths(existing: &[u8], supplementary: &[u8]) -> Result<Vec<u8>, Error> {
    let separator: &[u8] = if existing.is_empty() || existing.ends_with(b":") {
        b""
    } else {
        b":"
    };
    let mut joined = Vec::new();
    joined
        .try_reserve_exact(existing.len() + separator.len() + supplementary.len())
        .map_err(|_| Error::OutOfMemory)?;
    joined.extend_from_slice(existing);
    joined.extend_from_slice(separator);
    joined.extend_from_slice(supplementary);
    Ok(joined)
}

/// `NAME=value\0` as a string the process never frees.
fn leak_entry(name: &[u8], value: &[u8]) -> Result<&'static CStr, Error> {
    let mut entry = Vec::new();
    entry
        .try_reserve_exact(name.len() + value.len() + 2)
        .map_err(|_| Error::OutOfMemory)?;
    entry.extend_from_slice(name);
    entry.push(b'=');
    entry.extend_from_slice(value);
    entry.push(0);
    match CStr::from_bytes_with_nul(entry.leak()) {
        Ok(entry) => Ok(entry),
        Err(_) => fatal!("environment value contains a NUL byte"),
    }
}

/// Renames the supplementary variable when there is no `LD_LIBRARY_PATH`,
/// appends its value to `LD_LIBRARY_PATH` otherwise.
pub fn rewrite(
    context: &LoaderContext<'_>,
    environment: &mut Environment<'_>,
) -> Result<Rewrite, Error> {
    let Some(supplementary) = context.supplementary_library_path else {
        return Ok(Rewrite::Unchanged);
    };

    // The slot was found while building the context, so it must still be
    // there with the same name.
    let Some(current) = environment.get(supplementary.slot) else {
        fatal!("environment slot {} vanished", supplementary.slot);
    };
    if current.name != supplementary.name {
        fatal!("environment slot {} changed under us", supplementary.slot);
    }

    match context.existing_library_path {
        None => {
            info!("renaming {} to LD_LIBRARY_PATH", DisplayBytes(supplementary.name));
            // Build the whole entry first, then copy it over the old one,
            // which is at least as long.
            let mut renamed = Vec::new();
            renamed
                .try_reserve_exact(LD_LIBRARY_PATH.len() + 1 + supplementary.value.len())
                .map_err(|_| Error::OutOfMemory)?;
            renamed.extend_from_slice(LD_LIBRARY_PATH);
            renamed.push(b'=');
            renamed.extend_from_slice(supplementary.value);
            environment.overwrite(supplementary.slot, &renamed);
            Ok(Rewrite::Renamed {
                slot: supplementary.slot,
            })
        }
        Some(existing) => {
            info!("appending {} to LD_LIBRARY_PATH", DisplayBytes(supplementary.name));
            let joined = join_paths(existing.value, supplementary.value)?;
            let entry = leak_entry(LD_LIBRARY_PATH, &joined)?;
            environment.replace(existing.slot, entry);
            Ok(Rewrite::Appended {
                slot: existing.slot,
            })
        }
    }
}
