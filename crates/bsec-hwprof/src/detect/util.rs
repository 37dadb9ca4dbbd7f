use std::path::PathBuf;

const DEFAULT_CPUINFO: &str = "/proc/cpuinfo";

pub fn cpuinfo_path() -> PathBuf {
    std::env::var_os("BSEC_CPUINFO_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CPUINFO))
}

pub fn hwprof_debug() -> bool {
    std::env::var("BSEC_HWPROF_DEBUG")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
