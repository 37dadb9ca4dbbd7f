use std::path::Path;
use std::time::Duration;

use bsec_hwprof::HostProbe;
use bsec_store::{
    ensure_config, ensure_executable, ensure_state, BuildArtifact, ConfigArtifact, StateArtifact,
    SystemCompiler, Toolchain, VendorTree,
};
use tracing::info;

use crate::decode::Readings;
use crate::error::Result;
use crate::profile::{DeviceProfile, ProfileParams};
use crate::supervisor::{CompanionCommand, Supervisor};

/// One BME680 device: its validated profile, the on-disk artifacts the
/// companion needs, and the supervisor running it.
pub struct BsecLibrary {
    profile: DeviceProfile,
    executable: BuildArtifact,
    config: ConfigArtifact,
    state: StateArtifact,
    supervisor: Supervisor,
}

impl BsecLibrary {
    /// Validate `params` and prepare the base directory for the running host,
    /// compiling with the system C compiler if needed.
    pub fn new(params: ProfileParams) -> Result<Self> {
        Self::with_toolchain(params, &HostProbe::current(), &SystemCompiler::from_env())
    }

    /// Same as `new` with explicit host detection inputs and compiler.
    pub fn with_toolchain(
        params: ProfileParams,
        probe: &HostProbe,
        toolchain: &dyn Toolchain,
    ) -> Result<Self> {
        let profile = DeviceProfile::new(params)?;
        let base = profile.base_dir();

        let vendor = VendorTree::locate(base)?;
        let executable = ensure_executable(base, &vendor, probe, toolchain)?;
        let config = ensure_config(base, &vendor, &profile.identity())?;
        let state = ensure_state(base)?;

        let supervisor = Supervisor::new(CompanionCommand {
            program: executable.path.clone(),
            args: profile.companion_args(),
            cwd: base.to_path_buf(),
        });
        info!(
            "BSEC-Library ready: address {:#x}, config {}",
            profile.bus_address(),
            config.identity
        );

        Ok(Self {
            profile,
            executable,
            config,
            state,
            supervisor,
        })
    }

    pub fn start(&mut self) -> Result<()> {
        self.supervisor.start()
    }

    pub fn stop(&mut self) {
        self.supervisor.stop()
    }

    /// False once the companion has been stopped or has exited on its own.
    pub fn is_running(&mut self) -> bool {
        self.supervisor.is_running()
    }

    pub fn readings(&mut self) -> Readings<'_> {
        self.supervisor.readings()
    }

    pub fn readings_timeout(&mut self, timeout: Duration) -> Readings<'_> {
        self.supervisor.readings_timeout(timeout)
    }

    /// Override `BSEC_STOP_GRACE_MS` for this instance (floored at 100 ms).
    pub fn set_stop_grace(&mut self, grace: Duration) {
        self.supervisor.set_stop_grace(grace);
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub fn executable_path(&self) -> &Path {
        &self.executable.path
    }

    /// MD5 the executable was built (or last verified) with.
    pub fn executable_hash(&self) -> &str {
        &self.executable.hash
    }

    pub fn config_path(&self) -> &Path {
        &self.config.path
    }

    pub fn state_path(&self) -> &Path {
        &self.state.path
    }
}
