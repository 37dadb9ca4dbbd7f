use std::path::PathBuf;

use sysinfo::System;
use tracing::{debug, info, warn};

use crate::error::{HwprofError, Result};
use crate::types::BuildTarget;

mod linux;
mod util;

pub use linux::{parse_revision, soc_from_revision, RevisionDecode};

/// Inputs to target detection. `current()` reads the running host; tests and
/// cross-setups build one by hand.
#[derive(Debug, Clone)]
pub struct HostProbe {
    /// `std::env::consts::OS` style name ("linux", "macos", ...).
    pub os: String,
    /// Kernel machine string (`uname -m`), e.g. "armv7l" or "aarch64".
    pub machine: Option<String>,
    /// Board revision descriptor, normally `/proc/cpuinfo`.
    pub cpuinfo_path: PathBuf,
}

impl HostProbe {
    pub fn current() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            machine: System::cpu_arch(),
            cpuinfo_path: util::cpuinfo_path(),
        }
    }

    /// Resolve the prebuilt library variant for this host.
    pub fn detect(&self) -> Result<BuildTarget> {
        if self.os != "linux" {
            return Err(HwprofError::UnsupportedPlatform(format!(
                "this library requires Linux, got {}",
                self.os
            )));
        }

        let machine = self.machine.as_deref().unwrap_or("unknown");
        if !is_arm_family(machine) {
            return Err(HwprofError::UnsupportedPlatform(format!(
                "this library requires an ARM processor, got {machine}"
            )));
        }

        // uname under-reports ARMv8 on 32-bit Pi kernels, so ask the board first.
        match linux::read_revision(&self.cpuinfo_path) {
            Ok(Some(code)) => match soc_from_revision(code) {
                RevisionDecode::Soc(soc) => {
                    let target = soc.target();
                    info!("Detected {soc:?} board, architecture {target}.");
                    return Ok(target);
                }
                RevisionDecode::UnknownProcessor(id) => {
                    warn!("Unknown board processor id {id} in revision {code:#x}, falling back to ISA detection.");
                }
            },
            Ok(None) => debug!("No board revision in {}", self.cpuinfo_path.display()),
            Err(e) => {
                if util::hwprof_debug() {
                    debug!("[hwprof] revision descriptor unavailable: {e:#}");
                }
            }
        }

        let target = coarse_target(machine).ok_or_else(|| {
            HwprofError::UnsupportedPlatform(format!(
                "could not determine ARM architecture from {machine}"
            ))
        })?;
        info!("Detected architecture as {target} from machine {machine}.");
        Ok(target)
    }
}

/// Detect the target for the running host.
pub fn detect_now() -> Result<BuildTarget> {
    HostProbe::current().detect()
}

/// Whether the machine string names an ARM core. Both the 32-bit (`armv7l`)
/// and 64-bit (`aarch64`, `arm64`) spellings count.
pub fn is_arm_family(machine: &str) -> bool {
    let m = machine.to_ascii_lowercase();
    m.contains("arm") || m.starts_with("aarch64")
}

/// ISA version from the machine string, if it carries one.
pub fn isa_version(machine: &str) -> Option<u32> {
    let m = machine.to_ascii_lowercase();
    if m.starts_with("aarch64") || m == "arm64" {
        return Some(8);
    }
    let rest = m.strip_prefix("armv")?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Coarse fallback when the board can't be identified.
fn coarse_target(machine: &str) -> Option<BuildTarget> {
    if !is_arm_family(machine) {
        return None;
    }
    match isa_version(machine) {
        Some(v) if v >= 8 => Some(BuildTarget::ArmV8a64),
        _ => Some(BuildTarget::ArmV6_32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isa_versions() {
        assert_eq!(isa_version("armv6l"), Some(6));
        assert_eq!(isa_version("armv7l"), Some(7));
        assert_eq!(isa_version("armv8l"), Some(8));
        assert_eq!(isa_version("aarch64"), Some(8));
        assert_eq!(isa_version("arm"), None);
        assert_eq!(isa_version("x86_64"), None);
    }

    #[test]
    fn coarse_targets() {
        assert_eq!(coarse_target("armv8l"), Some(BuildTarget::ArmV8a64));
        assert_eq!(coarse_target("aarch64"), Some(BuildTarget::ArmV8a64));
        assert_eq!(coarse_target("armv7l"), Some(BuildTarget::ArmV6_32));
        assert_eq!(coarse_target("arm"), Some(BuildTarget::ArmV6_32));
        assert_eq!(coarse_target("x86_64"), None);
    }
}
