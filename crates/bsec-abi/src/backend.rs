use std::path::{Path, PathBuf};

use crate::profile::ConfigIdentity;

/// Layout of a vendor algorithm distribution.
///
/// The fusion algorithm and the bus driver are opaque build inputs; the
/// supervisor only needs to know where they live so it can compile the
/// companion against them and copy the matching configuration blob.
pub trait AlgorithmBackend {
    /// Root of the unpacked vendor tree.
    fn root(&self) -> &Path;

    /// Where the generated companion source is placed inside the tree.
    fn companion_source(&self) -> PathBuf;

    /// Translation units compiled into the companion, companion source last.
    fn sources(&self) -> Vec<PathBuf>;

    /// Quoted include directories for a given prebuilt library variant.
    fn include_dirs(&self, lib_variant: &str) -> Vec<PathBuf>;

    /// Directory holding the prebuilt static algorithm library.
    fn library_dir(&self, lib_variant: &str) -> PathBuf;

    /// Libraries to link, in order (without the `-l` prefix).
    fn link_libs(&self) -> &'static [&'static str];

    /// Vendor-provided configuration blob for `identity`.
    fn config_blob(&self, identity: &ConfigIdentity) -> PathBuf;
}
