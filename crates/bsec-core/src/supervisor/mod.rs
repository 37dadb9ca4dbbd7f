//! Companion process lifecycle.
//!
//! NotStarted -> Running -> Stopped, and Stopped can be started again. The
//! child handle lives in `running`; it is cleared by `stop` or when the
//! companion is found to have exited on its own.

use std::io;
use std::path::PathBuf;
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tracing::{debug, error, info, warn};

use crate::decode::Readings;
use crate::error::{BsecError, Result};

pub mod env;
pub mod lines;

use lines::LineReader;

const DEFAULT_STOP_GRACE: Duration = Duration::from_millis(1000);
const MIN_STOP_GRACE: Duration = Duration::from_millis(100);
const DEFAULT_STARTUP_PROBE: Duration = Duration::from_millis(100);
const STARTUP_POLL: Duration = Duration::from_millis(10);
/// How long to wait for the exit status once stdout has closed.
const EOF_REAP_WINDOW: Duration = Duration::from_millis(100);

/// What to run and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

struct Running {
    child: Child,
    stdout: LineReader<ChildStdout>,
}

pub struct Supervisor {
    command: CompanionCommand,
    running: Option<Running>,
    stop_grace: Duration,
    startup_probe: Duration,
}

impl Supervisor {
    /// Grace period and startup probe come from `BSEC_STOP_GRACE_MS` and
    /// `BSEC_STARTUP_PROBE_MS` when set.
    pub fn new(command: CompanionCommand) -> Self {
        Self {
            command,
            running: None,
            stop_grace: stop_grace_from_env(),
            startup_probe: env_millis("BSEC_STARTUP_PROBE_MS").unwrap_or(DEFAULT_STARTUP_PROBE),
        }
    }

    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.set_stop_grace(grace);
        self
    }

    pub fn set_stop_grace(&mut self, grace: Duration) {
        self.stop_grace = grace.max(MIN_STOP_GRACE);
    }

    pub fn with_startup_probe(mut self, probe: Duration) -> Self {
        self.startup_probe = probe;
        self
    }

    pub fn command(&self) -> &CompanionCommand {
        &self.command
    }

    /// Whether the companion is alive. An exited companion is reaped here and
    /// the supervisor moves to Stopped.
    pub fn is_running(&mut self) -> bool {
        self.reap_exited();
        self.running.is_some()
    }

    pub fn pid(&self) -> Option<u32> {
        self.running.as_ref().map(|r| r.child.id())
    }

    /// Launch the companion. A no-op (with a warning) when already running.
    pub fn start(&mut self) -> Result<()> {
        self.reap_exited();
        if self.running.is_some() {
            warn!("BSEC-Library already running.");
            return Ok(());
        }

        let mut cmd = Command::new(&self.command.program);
        cmd.args(&self.command.args)
            .current_dir(&self.command.cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        if let Some(tz) = env::injected_tz(std::env::var_os("TZ").as_deref()) {
            debug!("TZ not set, passing TZ={tz} to companion");
            cmd.env("TZ", tz);
        }

        info!("Starting BSEC-Library: {} {}", self.command.program.display(), self.command.args.join(" "));
        let mut child = cmd.spawn()?;

        if let Some(status) = exited_within(&mut child, self.startup_probe)? {
            error!("BSEC-Library exited during startup ({status}).");
            return Err(BsecError::ProcessStartupFailed {
                code: status.code(),
            });
        }

        let Some(stdout) = child.stdout.take() else {
            terminate(&child);
            return Err(io::Error::other("companion stdout was not captured").into());
        };
        self.running = Some(Running {
            child,
            stdout: LineReader::new(stdout),
        });
        Ok(())
    }

    /// SIGTERM the companion, wait out the grace period and reap it if it
    /// exited. There is no hard kill. A no-op (with a warning) when not
    /// running.
    pub fn stop(&mut self) {
        let Some(mut running) = self.running.take() else {
            warn!("BSEC-Library not running.");
            return;
        };

        info!("Stopping BSEC-Library process.");
        terminate(&running.child);
        thread::sleep(self.stop_grace);
        match running.child.try_wait() {
            Ok(Some(status)) => debug!("BSEC-Library exited ({status})"),
            Ok(None) => warn!(
                "BSEC-Library (pid {}) still running after {:?}, leaving it.",
                running.child.id(),
                self.stop_grace
            ),
            Err(e) => warn!("Could not reap BSEC-Library: {e}"),
        }
    }

    /// Decoded readings, blocking on each line for as long as it takes.
    pub fn readings(&mut self) -> Readings<'_> {
        self.readings_with(None)
    }

    /// Like `readings`, but a line that doesn't arrive within `timeout`
    /// yields `ReadTimeout` and ends the iterator.
    pub fn readings_timeout(&mut self, timeout: Duration) -> Readings<'_> {
        self.readings_with(Some(timeout))
    }

    fn readings_with(&mut self, timeout: Option<Duration>) -> Readings<'_> {
        // unread output is kept until the stream has been drained
        if self.running.as_ref().is_some_and(|r| r.stdout.at_eof()) {
            self.reap_exited();
        }
        match self.running.as_mut() {
            Some(r) => Readings::new(&mut r.stdout, timeout),
            None => {
                warn!("BSEC-Library not running, no output available.");
                Readings::empty()
            }
        }
    }

    /// Running -> Stopped when the companion exited on its own. Once stdout
    /// has closed the exit status gets a short window to show up.
    fn reap_exited(&mut self) {
        let Some(running) = self.running.as_mut() else {
            return;
        };
        let window = if running.stdout.at_eof() {
            EOF_REAP_WINDOW
        } else {
            Duration::ZERO
        };
        match exited_within(&mut running.child, window) {
            Ok(Some(status)) => {
                warn!("BSEC-Library exited unexpectedly ({status}).");
                self.running = None;
            }
            Ok(None) => {}
            Err(e) => warn!("Could not query BSEC-Library status: {e}"),
        }
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        if let Some(running) = self.running.as_mut() {
            terminate(&running.child);
            // A companion still shutting down stays unreaped until this
            // process exits.
            if let Ok(Some(status)) = running.child.try_wait() {
                debug!("BSEC-Library exited ({status})");
            }
        }
    }
}

fn terminate(child: &Child) {
    let pid = Pid::from_raw(child.id() as i32);
    if let Err(e) = kill(pid, Signal::SIGTERM) {
        debug!("SIGTERM to {pid} failed: {e}");
    }
}

/// Exit status if the child is gone already or dies within `probe`.
fn exited_within(child: &mut Child, probe: Duration) -> io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + probe;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(STARTUP_POLL.min(deadline - now));
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(_) => {
            warn!("Ignoring {key}={raw:?}: not a whole number of milliseconds");
            None
        }
    }
}

fn stop_grace_from_env() -> Duration {
    env_millis("BSEC_STOP_GRACE_MS")
        .map(|d| d.max(MIN_STOP_GRACE))
        .unwrap_or(DEFAULT_STOP_GRACE)
}
