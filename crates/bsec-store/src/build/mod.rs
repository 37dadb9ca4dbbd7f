//! Companion executable build cache.
//!
//! `<base>/bsec-library` is only rebuilt when it, or its `.md5` record, is
//! missing or the two disagree. The compiler writes to a temporary path and
//! the record is dropped before building, so a failed build never leaves an
//! executable paired with a valid hash.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bsec_abi::AlgorithmBackend;
use bsec_hwprof::HostProbe;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::errors::{Result, StoreError};
use crate::hash::{md5_file, read_hash_record, write_hash_record};
use crate::paths::{executable_path, executable_tmp_path, hash_record_path};

mod source;
mod toolchain;

pub use source::{write_companion_source, COMPANION_SOURCE};
pub use toolchain::{CompileOutput, SystemCompiler, Toolchain};

/// A companion executable and the hash it was recorded with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildArtifact {
    pub path: PathBuf,
    pub hash: String,
}

/// Return a working companion executable under `base`, building it at most once.
pub fn ensure_executable(
    base: &Path,
    vendor: &dyn AlgorithmBackend,
    probe: &HostProbe,
    toolchain: &dyn Toolchain,
) -> Result<BuildArtifact> {
    let exe = executable_path(base);
    let record = hash_record_path(base);

    if let Some(hash) = cached_hash(&exe, &record)? {
        info!("Found existing BSEC-Library executable, skipping build.");
        return Ok(BuildArtifact { path: exe, hash });
    }

    write_companion_source(&vendor.companion_source())?;
    let target = probe.detect()?;

    remove_if_exists(&record)?;
    let tmp = executable_tmp_path(base);
    let args = compile_args(vendor, target.lib_dir(), &tmp);
    let out = match toolchain.compile(&args) {
        Ok(out) => out,
        Err(e) => {
            remove_if_exists(&tmp)?;
            error!("Could not run the compiler: {e}");
            return Err(StoreError::BuildFailed {
                code: None,
                output: format!("failed to run compiler: {e}"),
            });
        }
    };
    if !out.success {
        remove_if_exists(&tmp)?;
        error!("Encountered an error during the build process!");
        error!("{}", out.log);
        return Err(StoreError::BuildFailed {
            code: out.code,
            output: out.log,
        });
    }
    info!("Build process complete.");

    fs::rename(&tmp, &exe)?;
    let hash = md5_file(&exe)?;
    write_hash_record(&record, &hash)?;
    Ok(BuildArtifact { path: exe, hash })
}

/// Hash of the executable if it and its record agree.
fn cached_hash(exe: &Path, record: &Path) -> Result<Option<String>> {
    if !exe.is_file() || !record.is_file() {
        warn!("BSEC-Library executable or hash file not found, starting build process.");
        return Ok(None);
    }
    let actual = md5_file(exe)?;
    let recorded = read_hash_record(record)?;
    if actual == recorded {
        Ok(Some(actual))
    } else {
        warn!("BSEC-Library executable and hash file don't match, rebuilding.");
        Ok(None)
    }
}

/// Fixed compiler command line for the companion, `-o` pointing at `out`.
pub fn compile_args(vendor: &dyn AlgorithmBackend, lib_variant: &str, out: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-Wall",
        "-Wno-unused-but-set-variable",
        "-Wno-unused-variable",
        "-static",
    ]
    .iter()
    .map(OsString::from)
    .collect();

    for dir in vendor.include_dirs(lib_variant) {
        args.push(prefixed("-iquote", &dir));
    }
    for src in vendor.sources() {
        args.push(src.into_os_string());
    }
    args.push(prefixed("-L", &vendor.library_dir(lib_variant)));
    for lib in vendor.link_libs() {
        args.push(OsString::from(format!("-l{lib}")));
    }
    args.push(OsString::from("-o"));
    args.push(out.as_os_str().to_os_string());
    args
}

fn prefixed(flag: &str, path: &Path) -> OsString {
    let mut s = OsString::from(flag);
    s.push(path.as_os_str());
    s
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
