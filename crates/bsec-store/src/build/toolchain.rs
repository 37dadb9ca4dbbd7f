use std::ffi::{OsStr, OsString};
use std::io;
use std::process::Command;

use tracing::debug;

/// Captured result of one compiler run.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub success: bool,
    pub code: Option<i32>,
    /// stdout followed by stderr.
    pub log: String,
}

/// Something that can turn the companion sources into an executable.
pub trait Toolchain {
    fn compile(&self, args: &[OsString]) -> io::Result<CompileOutput>;
}

/// Runs the host C compiler. Defaults to `cc`; `BSEC_CC` overrides.
#[derive(Debug, Clone)]
pub struct SystemCompiler {
    program: OsString,
}

impl SystemCompiler {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var_os("BSEC_CC").unwrap_or_else(|| OsString::from("cc")))
    }
}

impl Default for SystemCompiler {
    fn default() -> Self {
        Self::from_env()
    }
}

impl Toolchain for SystemCompiler {
    fn compile(&self, args: &[OsString]) -> io::Result<CompileOutput> {
        debug!("[build] {:?} {:?}", self.program, args);
        let out = Command::new(&self.program).args(args).output()?;
        let mut log = String::from_utf8_lossy(&out.stdout).into_owned();
        log.push_str(&String::from_utf8_lossy(&out.stderr));
        Ok(CompileOutput {
            success: out.status.success(),
            code: out.status.code(),
            log,
        })
    }
}
