use anyhow::{anyhow, Context, Result};
use bsec_core::{BsecLibrary, DeviceProfile, ProfileParams};
use bsec_hwprof::HostProbe;
use clap::{Args, Parser, Subcommand};
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "bsec-cli")]
#[command(about = "Supervise the Bosch BSEC companion for a BME680 sensor", long_about = None)]
struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG wins when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build if needed, start the companion and print readings as JSON lines
    Run {
        #[command(flatten)]
        profile: ProfileArgs,

        /// Stop after this many readings
        #[arg(short = 'n', long)]
        count: Option<u64>,

        /// Give up when no line arrives within this many milliseconds
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,
    },

    /// Print the prebuilt library variant this host would use
    Detect,

    /// Print the configuration identity for a profile
    Identity {
        #[command(flatten)]
        profile: ProfileArgs,
    },
}

/// Profile settings. A JSON profile file is read first and flags override it.
#[derive(Args)]
struct ProfileArgs {
    /// JSON profile file (default: <config dir>/bsec/profile.json if present)
    #[arg(long, value_name = "FILE")]
    profile: Option<PathBuf>,

    /// I2C address, 0x76 or 0x77
    #[arg(long, value_parser = parse_address)]
    address: Option<u16>,

    /// Temperature offset in degrees Celsius
    #[arg(long, allow_negative_numbers = true)]
    temp_offset: Option<f64>,

    /// Seconds per sample, 3 or 300
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Supply voltage, 1.8 or 3.3
    #[arg(long)]
    voltage: Option<f64>,

    /// Days of state history, 4 or 28
    #[arg(long)]
    retention_days: Option<u32>,

    /// Directory holding the BSEC_* sources and generated files
    #[arg(long, value_name = "DIR")]
    base_dir: Option<PathBuf>,
}

impl ProfileArgs {
    fn resolve(&self) -> Result<ProfileParams> {
        let mut p = match self.profile_file() {
            Some(path) => read_profile(&path)?,
            None => default_params(),
        };
        if let Some(v) = self.address {
            p.bus_address = v;
        }
        if let Some(v) = self.temp_offset {
            p.temperature_offset = v;
        }
        if let Some(v) = self.sample_rate {
            p.sample_rate = v;
        }
        if let Some(v) = self.voltage {
            p.voltage = v;
        }
        if let Some(v) = self.retention_days {
            p.retention_days = v;
        }
        if let Some(v) = &self.base_dir {
            p.base_dir = Some(v.clone());
        }
        Ok(p)
    }

    fn profile_file(&self) -> Option<PathBuf> {
        if let Some(p) = &self.profile {
            return Some(p.clone());
        }
        let fallback = dirs::config_dir()?.join("bsec").join("profile.json");
        fallback.is_file().then_some(fallback)
    }
}

fn default_params() -> ProfileParams {
    ProfileParams {
        bus_address: 0x77,
        temperature_offset: 0.0,
        sample_rate: 3,
        voltage: 3.3,
        retention_days: 4,
        base_dir: None,
    }
}

fn read_profile(path: &Path) -> Result<ProfileParams> {
    debug!("reading profile {}", path.display());
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))
}

fn parse_address(s: &str) -> std::result::Result<u16, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address {s:?}: {e}"))
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        // stdout carries the readings
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(profile: &ProfileArgs, count: Option<u64>, timeout: Option<Duration>) -> Result<()> {
    let mut lib = BsecLibrary::new(profile.resolve()?)?;
    lib.start()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut seen = 0u64;
    let readings = match timeout {
        Some(d) => lib.readings_timeout(d),
        None => lib.readings(),
    };
    for reading in readings {
        let reading = reading?;
        serde_json::to_writer(&mut out, &reading)?;
        writeln!(out)?;
        out.flush()?;

        seen += 1;
        if count.is_some_and(|n| seen >= n) {
            break;
        }
    }

    lib.stop();
    info!("{seen} reading(s) received");
    if count.is_some_and(|n| seen < n) {
        return Err(anyhow!("companion output ended after {seen} reading(s)"));
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run {
            profile,
            count,
            timeout_ms,
        } => run(&profile, count, timeout_ms.map(Duration::from_millis)),
        Command::Detect => {
            let target = HostProbe::current().detect()?;
            println!("{}", target.lib_dir());
            Ok(())
        }
        Command::Identity { profile } => {
            let p = DeviceProfile::new(profile.resolve()?)?;
            println!("{}", p.identity());
            Ok(())
        }
    }
}
