//! gdl90-feeder: broadcasts GDL-90 to EFB apps on the local network.
//!
//! Supports:
//! - Printing encoded heartbeat/ownship/traffic frames as hex
//! - Periodic UDP broadcast of heartbeat, ownship, and traffic from a
//!   JSON-lines file

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use gdl90_core::message::{seconds_today, Heartbeat, TrafficReport};
use gdl90_core::table::MAX_TRACKING_OBJECTS;
use gdl90_core::{
    addr_from_hex, addr_to_string, hex_encode, msg_info, AircraftState, ExportReport, Exporter,
    TrafficTable, Transport, OWNSHIP_MSG_ID, TRAFFIC_MSG_ID,
};

use crate::config::Config;

mod config;
mod source;
mod udp;

#[derive(Parser)]
#[command(
    name = "gdl90-feeder",
    version,
    about = "GDL-90 heartbeat, ownship, and traffic broadcaster"
)]
struct Cli {
    /// Config file (default: ~/.gdl90/config.yaml)
    #[arg(long, global = true, env = "GDL90_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print encoded frames for one aircraft as hex
    Encode {
        #[command(flatten)]
        aircraft: AircraftArgs,

        /// Report type to build
        #[arg(long, value_enum, default_value = "ownship")]
        kind: ReportKind,

        /// Also print the unescaped message body
        #[arg(short, long)]
        body: bool,
    },

    /// Broadcast heartbeat, ownship, and traffic every interval
    Broadcast {
        #[command(flatten)]
        aircraft: AircraftArgs,

        /// JSON-lines traffic file, re-read every cycle
        #[arg(long)]
        traffic: Option<PathBuf>,

        /// Destination (broadcast) address
        #[arg(long)]
        dest: Option<IpAddr>,

        /// Destination UDP port
        #[arg(long)]
        port: Option<u16>,

        /// Milliseconds between export cycles
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Stop after this many cycles (0 = run until Ctrl-C)
        #[arg(long, default_value = "0")]
        cycles: u64,
    },

    /// Write the effective settings to the config file
    InitConfig,
}

/// Ownship position arguments.
#[derive(Args, Clone)]
struct AircraftArgs {
    /// Latitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,

    /// Longitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    lon: f64,

    /// Pressure altitude in feet
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    alt: f64,

    /// Course in degrees true
    #[arg(long, default_value = "0")]
    course: f64,

    /// 24-bit address as hex (default: from config)
    #[arg(long)]
    addr: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportKind {
    Ownship,
    Traffic,
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    };

    match cli.command {
        Commands::Encode {
            aircraft,
            kind,
            body,
        } => cmd_encode(&config, &aircraft, kind, body),
        Commands::Broadcast {
            aircraft,
            traffic,
            dest,
            port,
            interval_ms,
            cycles,
        } => {
            let mut config = config;
            if let Some(dest) = dest {
                config.broadcast.dest = dest.to_string();
            }
            if let Some(port) = port {
                config.broadcast.port = port;
            }
            if let Some(ms) = interval_ms {
                config.export.interval_ms = ms;
            }
            cmd_broadcast(&config, &aircraft, traffic.as_deref(), cycles).await
        }
        Commands::InitConfig => cmd_init_config(cli.config.as_deref(), &config),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("GDL90_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let format = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();
    tracing_subscriber::registry().with(filter).with(format).init();
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn ownship_state(config: &Config, args: &AircraftArgs, now: f64) -> AircraftState {
    let addr = match args.addr.as_deref() {
        Some(hex) => match addr_from_hex(hex) {
            Some(addr) => addr,
            None => {
                eprintln!("Error: invalid address '{hex}' (expected up to 6 hex digits)");
                std::process::exit(1);
            }
        },
        None => config.ownship.addr,
    };

    let mut ac = AircraftState::new(addr, args.lat, args.lon, now);
    ac.altitude = args.alt;
    ac.course = args.course;
    ac
}

fn cmd_encode(config: &Config, args: &AircraftArgs, kind: ReportKind, print_body: bool) {
    let now = unix_now();
    let aircraft = ownship_state(config, args, now);

    let heartbeat = Heartbeat::new(seconds_today(now));
    println!("Heartbeat: {}", hex_encode(&heartbeat.to_frame()));

    let msg_id = match kind {
        ReportKind::Ownship => OWNSHIP_MSG_ID,
        ReportKind::Traffic => TRAFFIC_MSG_ID,
    };
    let label = msg_info(msg_id).map(|info| info.name).unwrap_or("report");
    let report = TrafficReport::from_aircraft(&aircraft);
    println!("{label}: {}", hex_encode(&report.to_frame(msg_id)));

    if print_body {
        println!("  Heartbeat body: {}", hex_encode(&heartbeat.encode()));
        println!("  {label} body: {}", hex_encode(&report.encode()));
    }
}

async fn cmd_broadcast(config: &Config, args: &AircraftArgs, traffic: Option<&Path>, cycles: u64) {
    let dest: IpAddr = match config.broadcast.dest.parse() {
        Ok(ip) => ip,
        Err(_) => {
            eprintln!("Error: invalid destination address '{}'", config.broadcast.dest);
            std::process::exit(1);
        }
    };

    let mut transport = match udp::UdpBroadcast::bind(dest, config.broadcast.port) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: cannot open UDP socket: {e}");
            std::process::exit(1);
        }
    };

    let ownship = ownship_state(config, args, unix_now());
    info!(
        dest = %transport.dest(),
        ownship = %addr_to_string(ownship.addr),
        interval_ms = config.export.interval_ms,
        "broadcasting GDL-90"
    );

    let mut exporter = Exporter::new(config.export.to_export_config());
    let mut table = TrafficTable::new(MAX_TRACKING_OBJECTS, config.export.expiration_secs);

    let mut ticker = tokio::time::interval(Duration::from_millis(config.export.interval_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut completed = 0u64;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }

        let now = unix_now();
        let report = run_cycle(
            now,
            &ownship,
            traffic,
            &mut table,
            &mut exporter,
            &mut transport,
        );
        if report.failed > 0 {
            warn!(failed = report.failed, sent = report.sent, "export cycle had send failures");
        }

        completed += 1;
        if cycles != 0 && completed >= cycles {
            break;
        }
    }

    info!(cycles = completed, "broadcast stopped");
}

/// One broadcast tick: refresh the table from the traffic file, drop
/// expired slots, then export.
fn run_cycle<T: Transport + ?Sized>(
    now: f64,
    ownship: &AircraftState,
    traffic: Option<&Path>,
    table: &mut TrafficTable,
    exporter: &mut Exporter,
    transport: &mut T,
) -> ExportReport {
    if let Some(path) = traffic {
        match source::load_traffic(path, now) {
            Ok(records) => {
                for ac in records {
                    table.upsert(ac, now);
                }
            }
            Err(e) => warn!(path = %path.display(), error = %e, "traffic file unreadable"),
        }
    }
    let pruned = table.prune(now);
    if pruned > 0 {
        debug!(pruned, "expired traffic removed");
    }

    let mut own = ownship.clone();
    own.timestamp = now;
    exporter.export(now, &own, table.iter(), transport)
}

fn cmd_init_config(path: Option<&Path>, current: &Config) {
    let result = match path {
        Some(p) => config::save_config_to(current, p).map(|_| p.to_path_buf()),
        None => config::save_config(current),
    };
    match result {
        Ok(p) => println!("Wrote {}", p.display()),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use gdl90_core::HEARTBEAT_MSG_ID;
    use std::io::Write;

    const NOW: f64 = 1_000_000.0;

    fn traffic_addrs(frames: &[Vec<u8>]) -> Vec<u8> {
        frames
            .iter()
            .filter(|f| f[1] == TRAFFIC_MSG_ID)
            .map(|f| f[5])
            .collect()
    }

    #[test]
    fn test_cycle_skips_stale_line_and_keeps_fresh_traffic() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"addr": 1, "latitude": 47.01, "longitude": 8.5, "timestamp": 999999.0}}"#).unwrap();
        writeln!(file, r#"{{"addr": 2, "latitude": 47.02, "longitude": 8.5, "timestamp": 999998.0}}"#).unwrap();
        writeln!(file, r#"{{"addr": 3, "latitude": 47.0, "longitude": 8.5, "timestamp": 999940.0}}"#).unwrap();

        let ownship = AircraftState::new(0xF00000, 47.0, 8.5, NOW);
        let mut table = TrafficTable::new(2, 5.0);
        let mut exporter = Exporter::default();
        let mut out: Vec<Vec<u8>> = Vec::new();

        let report = run_cycle(
            NOW,
            &ownship,
            Some(file.path()),
            &mut table,
            &mut exporter,
            &mut out,
        );

        assert_eq!(report.sent, 4);
        assert_eq!(out[0][1], HEARTBEAT_MSG_ID);
        assert_eq!(out[1][1], OWNSHIP_MSG_ID);
        assert_eq!(traffic_addrs(&out), vec![1, 2]);
    }

    #[test]
    fn test_cycle_repeats_with_same_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"addr": 7, "latitude": 47.01, "longitude": 8.5}}"#).unwrap();

        let ownship = AircraftState::new(0xF00000, 47.0, 8.5, NOW);
        let mut table = TrafficTable::default();
        let mut exporter = Exporter::default();

        for tick in 0..3 {
            let mut out: Vec<Vec<u8>> = Vec::new();
            let now = NOW + tick as f64;
            run_cycle(now, &ownship, Some(file.path()), &mut table, &mut exporter, &mut out);
            assert_eq!(traffic_addrs(&out), vec![7]);
        }
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        let cmd = Cli::command();
        cmd.clone().debug_assert();
        let config = cmd.get_arguments().find(|a| a.get_id() == "config").unwrap();
        assert_eq!(config.get_env(), Some(std::ffi::OsStr::new("GDL90_CONFIG")));
    }

    #[test]
    fn test_cycle_without_traffic_file() {
        let ownship = AircraftState::new(0xF00000, 47.0, 8.5, NOW);
        let mut table = TrafficTable::default();
        let mut exporter = Exporter::default();
        let mut out: Vec<Vec<u8>> = Vec::new();

        let missing = Path::new("/nonexistent/traffic.jsonl");
        let report = run_cycle(NOW, &ownship, Some(missing), &mut table, &mut exporter, &mut out);
        assert_eq!(report.sent, 2);
        assert_eq!(out.len(), 2);
    }
}
