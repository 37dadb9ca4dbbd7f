use std::cell::{Cell, RefCell};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bsec_abi::{AlgorithmBackend, ConfigIdentity, SampleRate, StateRetention, SupplyVoltage};
use bsec_hwprof::HostProbe;
use bsec_store::{
    config_path, ensure_config, ensure_executable, ensure_state, executable_path, hash_record_path,
    known_config, CompileOutput, StoreError, SystemCompiler, Toolchain, VendorTree,
};
use tempfile::TempDir;

/// Records compiler invocations and writes `payload` to the `-o` path.
struct FakeCompiler {
    calls: Cell<usize>,
    last_args: RefCell<Vec<OsString>>,
    payload: RefCell<Vec<u8>>,
    fail: bool,
}

impl FakeCompiler {
    fn ok(payload: &[u8]) -> Self {
        Self {
            calls: Cell::new(0),
            last_args: RefCell::new(Vec::new()),
            payload: RefCell::new(payload.to_vec()),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::ok(b"")
        }
    }
}

impl Toolchain for FakeCompiler {
    fn compile(&self, args: &[OsString]) -> io::Result<CompileOutput> {
        self.calls.set(self.calls.get() + 1);
        *self.last_args.borrow_mut() = args.to_vec();

        let out = args
            .iter()
            .position(|a| a == "-o")
            .and_then(|i| args.get(i + 1))
            .map(PathBuf::from)
            .expect("-o present");

        if self.fail {
            // a half-written object, as a real compiler might leave
            fs::write(&out, b"\x7fELF partial")?;
            return Ok(CompileOutput {
                success: false,
                code: Some(1),
                log: "bsec-library.c:1: error: expected ';'".into(),
            });
        }
        fs::write(&out, &*self.payload.borrow())?;
        Ok(CompileOutput {
            success: true,
            code: Some(0),
            log: String::new(),
        })
    }
}

struct Fixture {
    dir: TempDir,
    vendor: VendorTree,
    probe: HostProbe,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("BSEC_1.4.7.2_GCC_CortexM4_20180907");
        fs::create_dir_all(root.join("API")).unwrap();
        fs::create_dir_all(root.join("examples")).unwrap();
        let cpuinfo = dir.path().join("cpuinfo");
        fs::write(&cpuinfo, "Hardware\t: BCM2835\nRevision\t: a02082\n").unwrap();
        Self {
            vendor: VendorTree::locate(dir.path()).unwrap(),
            probe: HostProbe {
                os: "linux".into(),
                machine: Some("armv7l".into()),
                cpuinfo_path: cpuinfo,
            },
            dir,
        }
    }

    fn base(&self) -> &Path {
        self.dir.path()
    }

    fn add_blob(&self, identity: &ConfigIdentity, bytes: &[u8]) -> PathBuf {
        let p = self.vendor.config_blob(identity);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(&p, bytes).unwrap();
        p
    }
}

fn identity() -> ConfigIdentity {
    ConfigIdentity::new(SupplyVoltage::V3_3, SampleRate::LowPower, StateRetention::Days4)
}

#[test]
fn first_build_compiles_once_then_cache_hits() {
    let fx = Fixture::new();
    let cc = FakeCompiler::ok(b"#!/bin/sh\nexit 0\n");

    let first = ensure_executable(fx.base(), &fx.vendor, &fx.probe, &cc).unwrap();
    assert_eq!(cc.calls.get(), 1);
    assert_eq!(first.path, executable_path(fx.base()));
    assert_eq!(
        fs::read_to_string(hash_record_path(fx.base())).unwrap(),
        first.hash
    );
    assert!(fx.vendor.companion_source().is_file());
    assert!(!fx.base().join("bsec-library.tmp").exists());

    // Pi 3 board: 64-bit library directory
    let args: Vec<String> = cc
        .last_args
        .borrow()
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    assert!(args
        .iter()
        .any(|a| a.ends_with("PiThree_ArmV8-a-64bits") && a.starts_with("-L")));

    let second = ensure_executable(fx.base(), &fx.vendor, &fx.probe, &cc).unwrap();
    assert_eq!(cc.calls.get(), 1);
    assert_eq!(second, first);
}

#[test]
fn tampered_executable_is_rebuilt() {
    let fx = Fixture::new();
    let cc = FakeCompiler::ok(b"build one");
    ensure_executable(fx.base(), &fx.vendor, &fx.probe, &cc).unwrap();

    fs::write(executable_path(fx.base()), b"modified by hand").unwrap();
    *cc.payload.borrow_mut() = b"build two".to_vec();
    let rebuilt = ensure_executable(fx.base(), &fx.vendor, &fx.probe, &cc).unwrap();
    assert_eq!(cc.calls.get(), 2);
    assert_eq!(fs::read(&rebuilt.path).unwrap(), b"build two");
}

#[test]
fn missing_record_triggers_build() {
    let fx = Fixture::new();
    fs::write(executable_path(fx.base()), b"stale").unwrap();
    let cc = FakeCompiler::ok(b"fresh");
    ensure_executable(fx.base(), &fx.vendor, &fx.probe, &cc).unwrap();
    assert_eq!(cc.calls.get(), 1);
    assert!(hash_record_path(fx.base()).is_file());
}

#[test]
fn failed_build_leaves_no_usable_pair() {
    let fx = Fixture::new();
    fs::write(executable_path(fx.base()), b"old").unwrap();
    fs::write(hash_record_path(fx.base()), "0123456789abcdef0123456789abcdef").unwrap();

    let cc = FakeCompiler::failing();
    let err = ensure_executable(fx.base(), &fx.vendor, &fx.probe, &cc).unwrap_err();
    match err {
        StoreError::BuildFailed { code, output } => {
            assert_eq!(code, Some(1));
            assert!(output.contains("expected ';'"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!hash_record_path(fx.base()).exists());
    assert!(!fx.base().join("bsec-library.tmp").exists());
}

#[test]
fn missing_compiler_is_a_build_failure() {
    let fx = Fixture::new();
    let cc = SystemCompiler::new("/nonexistent/cc");
    let err = ensure_executable(fx.base(), &fx.vendor, &fx.probe, &cc).unwrap_err();
    match err {
        StoreError::BuildFailed { code, output } => {
            assert_eq!(code, None);
            assert!(output.starts_with("failed to run compiler"), "{output}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!executable_path(fx.base()).exists());
    assert!(!hash_record_path(fx.base()).exists());
    assert!(!fx.base().join("bsec-library.tmp").exists());
}

#[test]
fn unsupported_host_is_reported_before_compiling() {
    let mut fx = Fixture::new();
    fx.probe.machine = Some("x86_64".into());
    let cc = FakeCompiler::ok(b"");
    let err = ensure_executable(fx.base(), &fx.vendor, &fx.probe, &cc).unwrap_err();
    assert!(matches!(err, StoreError::Platform(_)));
    assert_eq!(cc.calls.get(), 0);
}

#[test]
fn config_is_copied_from_vendor_tree() {
    let fx = Fixture::new();
    let blob = fx.add_blob(&identity(), b"\x00\x00\x01\x00config bytes");

    let art = ensure_config(fx.base(), &fx.vendor, &identity()).unwrap();
    assert_eq!(art.path, config_path(fx.base()));
    assert_eq!(fs::read(&art.path).unwrap(), fs::read(&blob).unwrap());
    // not one of the shipped blobs, so the next call copies again
    assert!(known_config(&art.hash).is_none());

    fs::write(&art.path, b"garbage").unwrap();
    ensure_config(fx.base(), &fx.vendor, &identity()).unwrap();
    assert_eq!(fs::read(&art.path).unwrap(), fs::read(&blob).unwrap());
}

#[test]
fn missing_blob_is_config_write_failure() {
    let fx = Fixture::new();
    let err = ensure_config(fx.base(), &fx.vendor, &identity()).unwrap_err();
    assert!(matches!(err, StoreError::ConfigWriteFailed(_)));
}

#[test]
fn state_file_survives_repeated_setup() {
    let fx = Fixture::new();
    let st = ensure_state(fx.base()).unwrap();
    fs::write(&st.path, b"learned baseline").unwrap();
    ensure_state(fx.base()).unwrap();
    assert_eq!(fs::read(&st.path).unwrap(), b"learned baseline");
}
