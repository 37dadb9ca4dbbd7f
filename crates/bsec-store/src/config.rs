//! Selects and installs the vendor configuration blob for a profile.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use bsec_abi::{AlgorithmBackend, ConfigIdentity, SampleRate, StateRetention, SupplyVoltage};
use once_cell::sync::Lazy;
use serde::Serialize;
use tracing::{error, info};

use crate::errors::{Result, StoreError};
use crate::hash::{md5_file, md5_file_if_exists};
use crate::paths::config_path;

/// A vendor config blob known by its MD5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownConfig {
    pub identity: &'static str,
    pub voltage: SupplyVoltage,
    pub sample_rate: SampleRate,
    pub retention: StateRetention,
}

const fn known(
    identity: &'static str,
    voltage: SupplyVoltage,
    sample_rate: SampleRate,
    retention: StateRetention,
) -> KnownConfig {
    KnownConfig {
        identity,
        voltage,
        sample_rate,
        retention,
    }
}

use SampleRate::{LowPower as LP, UltraLowPower as ULP};
use StateRetention::{Days28 as D28, Days4 as D4};
use SupplyVoltage::{V1_8, V3_3};

/// `generic_*` blobs from BSEC 1.4.x.
const KNOWN_CONFIG_HASHES: [(&str, KnownConfig); 8] = [
    ("305c5398b0359f7956584a7a52bb48ea", known("generic_18v_300s_28d", V1_8, ULP, D28)),
    ("eecd6e4000afa21901bb28e182a75c6e", known("generic_18v_300s_4d", V1_8, ULP, D4)),
    ("19389190311bbdbf3432791eb9a258b7", known("generic_18v_3s_28d", V1_8, LP, D28)),
    ("0505f6120e216f19987b59dc011fc609", known("generic_18v_3s_4d", V1_8, LP, D4)),
    ("344ff63b9f11c0427d7d205242ffd606", known("generic_33v_300s_28d", V3_3, ULP, D28)),
    ("16851fcb6becb9b814263deb3d31623b", known("generic_33v_300s_4d", V3_3, ULP, D4)),
    ("a401d7712179350a7b6ff6fc035d49c2", known("generic_33v_3s_28d", V3_3, LP, D28)),
    ("1107f7ce9fcb414de64e899babc1a1ee", known("generic_33v_3s_4d", V3_3, LP, D4)),
];

static KNOWN_CONFIGS: Lazy<HashMap<&'static str, KnownConfig>> =
    Lazy::new(|| KNOWN_CONFIG_HASHES.iter().copied().collect());

/// Look up a config blob by its lowercase hex MD5.
pub fn known_config(md5_hex: &str) -> Option<&'static KnownConfig> {
    KNOWN_CONFIGS.get(md5_hex)
}

/// The installed config and what it was matched as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigArtifact {
    pub path: PathBuf,
    pub hash: String,
    pub identity: ConfigIdentity,
}

/// Make sure `<base>/bsec-library.config` holds the blob for `identity`.
/// An existing file is reused only if its hash is a known blob for that same
/// identity; anything else is overwritten from the vendor tree.
pub fn ensure_config(
    base: &Path,
    vendor: &dyn AlgorithmBackend,
    identity: &ConfigIdentity,
) -> Result<ConfigArtifact> {
    let dst = config_path(base);

    if let Some(hash) = md5_file_if_exists(&dst)? {
        if known_config(&hash).is_some_and(|k| k.identity == identity.as_str()) {
            info!("Using existing BSEC-Library configuration [{identity}].");
            return Ok(ConfigArtifact {
                path: dst,
                hash,
                identity: identity.clone(),
            });
        }
    }

    let src = vendor.config_blob(identity);
    let fail = |msg: String| {
        error!("Error creating config file! {msg}");
        StoreError::ConfigWriteFailed(msg)
    };

    fs::copy(&src, &dst)
        .map_err(|e| fail(format!("copy {} -> {}: {e}", src.display(), dst.display())))?;

    let want = md5_file(&src)?;
    let got = md5_file(&dst)
        .map_err(|e| fail(format!("{} unreadable after copy: {e}", dst.display())))?;
    if got != want {
        return Err(fail(format!(
            "{} does not match {} after copy",
            dst.display(),
            src.display()
        )));
    }

    info!("Created new BSEC-Library configuration [{identity}].");
    Ok(ConfigArtifact {
        path: dst,
        hash: got,
        identity: identity.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_identities_match_their_settings() {
        for (hash, k) in KNOWN_CONFIG_HASHES.iter() {
            let id = ConfigIdentity::new(k.voltage, k.sample_rate, k.retention);
            assert_eq!(id.as_str(), k.identity, "entry {hash}");
            assert_eq!(known_config(hash), Some(k));
        }
    }

    #[test]
    fn unknown_hash_is_absent() {
        assert_eq!(known_config("d41d8cd98f00b204e9800998ecf8427e"), None);
    }
}
