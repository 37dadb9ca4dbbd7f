use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::types::Soc;

/// Bit 23 of a Pi revision code marks the new-style (bit-field) encoding.
const NEW_STYLE_BIT: u32 = 1 << 23;
const PROCESSOR_SHIFT: u32 = 12;
const PROCESSOR_MASK: u32 = 0xF;

/// Outcome of decoding a board revision code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionDecode {
    Soc(Soc),
    /// New-style code whose processor field isn't one we have a library for.
    UnknownProcessor(u32),
}

/// Read the revision code from a cpuinfo-style descriptor.
/// `Ok(None)` means the file exists but has no `Revision` line (non-Pi host).
pub(crate) fn read_revision(path: &Path) -> Result<Option<u32>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read board descriptor {}", path.display()))?;
    Ok(parse_revision(&text))
}

/// Extract the hex revision code from cpuinfo text.
pub fn parse_revision(cpuinfo: &str) -> Option<u32> {
    cpuinfo
        .lines()
        .find(|l| l.starts_with("Revision"))
        .and_then(|l| l.split_once(':'))
        .and_then(|(_, v)| {
            let v = v.trim();
            let v = v
                .strip_prefix("0x")
                .or_else(|| v.strip_prefix("0X"))
                .unwrap_or(v);
            u32::from_str_radix(v, 16).ok()
        })
}

/// Map a revision code to the board SoC. Old-style codes predate the
/// bit-field scheme and were only ever used on BCM2835 boards.
pub fn soc_from_revision(code: u32) -> RevisionDecode {
    if code & NEW_STYLE_BIT == 0 {
        return RevisionDecode::Soc(Soc::Bcm2835);
    }
    let id = (code >> PROCESSOR_SHIFT) & PROCESSOR_MASK;
    match Soc::from_processor_id(id) {
        Some(soc) => RevisionDecode::Soc(soc),
        None => RevisionDecode::UnknownProcessor(id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PI3B_CPUINFO: &str = "processor\t: 0\nmodel name\t: ARMv7 Processor rev 4 (v7l)\n\
        Hardware\t: BCM2835\nRevision\t: a02082\nSerial\t\t: 00000000deadbeef\n";

    #[test]
    fn parses_revision_line() {
        assert_eq!(parse_revision(PI3B_CPUINFO), Some(0xa02082));
        assert_eq!(parse_revision("Revision : 0x0010\n"), Some(0x10));
        assert_eq!(parse_revision("processor : 0\n"), None);
        assert_eq!(parse_revision("Revision : zz\n"), None);
    }

    #[test]
    fn decodes_processor_field() {
        // Pi 3B (BCM2837), Pi 2B (BCM2836), Pi Zero W (BCM2835)
        assert_eq!(soc_from_revision(0xa02082), RevisionDecode::Soc(Soc::Bcm2837));
        assert_eq!(soc_from_revision(0xa01041), RevisionDecode::Soc(Soc::Bcm2836));
        assert_eq!(soc_from_revision(0x9000c1), RevisionDecode::Soc(Soc::Bcm2835));
    }

    #[test]
    fn old_style_codes_are_bcm2835() {
        assert_eq!(soc_from_revision(0x000e), RevisionDecode::Soc(Soc::Bcm2835));
        // warranty-void prefix does not make it new-style
        assert_eq!(soc_from_revision(0x100000e), RevisionDecode::Soc(Soc::Bcm2835));
    }

    #[test]
    fn pi4_processor_is_unknown() {
        assert_eq!(soc_from_revision(0xc03111), RevisionDecode::UnknownProcessor(3));
    }
}
