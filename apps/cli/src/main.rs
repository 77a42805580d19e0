use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use diskinfo_core::{
    collect_report, resolve_target, DeviceOpener, ScanMode, Target, TargetError,
};
use diskinfo_host_windows::system_devices;
use diskinfo_report::{render_json, ReportHeader, TextReport};
use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: diskinfo <PhysicalDriveNo | DriveLetter[:]> [--probe-partitions] [--json]";
const LOG_ENV: &str = "DISKINFO_LOG";

#[derive(Parser, Debug)]
#[command(name = "diskinfo", version, allow_negative_numbers = true)]
#[command(about = "Report disk geometry and partition layout of a Windows drive", long_about = None)]
struct Cli {
    /// Physical drive number (0, 1, ...) or drive letter (C or C:)
    #[arg(value_name = "TARGET")]
    targets: Vec<String>,

    /// Open each Harddisk<N>\Partition<i> sub-device instead of reading the drive layout
    #[arg(long)]
    probe_partitions: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Usage,
    Report {
        target: Target,
        mode: ScanMode,
        json: bool,
    },
}

#[derive(Debug)]
enum ParseError {
    /// `--help` or `--version` output.
    Display(clap::Error),
    Target(TargetError),
}

fn parse_command<I, T>(args: I) -> Result<Command, ParseError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            return Err(ParseError::Display(err));
        }
        Err(err) => {
            debug!(error = %err, "rejected command line");
            return Ok(Command::Usage);
        }
    };

    let [token] = cli.targets.as_slice() else {
        return Ok(Command::Usage);
    };
    let target = resolve_target(token).map_err(ParseError::Target)?;
    let mode = if cli.probe_partitions {
        ScanMode::ProbePartitions
    } else {
        ScanMode::Layout
    };
    Ok(Command::Report {
        target,
        mode,
        json: cli.json,
    })
}

/// Prints the header, opens the device and renders the report to `out`.
fn run<O, F>(
    devices: F,
    target: &Target,
    mode: ScanMode,
    json: bool,
    out: &mut impl Write,
) -> Result<()>
where
    O: DeviceOpener,
    F: FnOnce() -> Result<O>,
{
    if !json {
        write!(out, "{}", ReportHeader(&target.device_path()))?;
    }
    let devices = devices()?;
    let report = collect_report(&devices, target, mode)?;
    if json {
        writeln!(out, "{}", render_json(&report)?)?;
    } else {
        write!(out, "{}", TextReport(&report))?;
    }
    Ok(())
}

/// Carries out a parsed command line and returns the process exit status.
/// Usage and help exit 0; a malformed target or a fatal device error exits 1.
fn execute<O, F>(
    parsed: Result<Command, ParseError>,
    devices: F,
    out: &mut impl Write,
    err: &mut impl Write,
) -> u8
where
    O: DeviceOpener,
    F: FnOnce() -> Result<O>,
{
    match parsed {
        Ok(Command::Usage) => {
            let _ = writeln!(out, "{}\n", USAGE);
            0
        }
        Ok(Command::Report { target, mode, json }) => match run(devices, &target, mode, json, out) {
            Ok(()) => 0,
            Err(e) => {
                let _ = writeln!(err, "{:#}", e);
                1
            }
        },
        Err(ParseError::Display(e)) => {
            let _ = write!(out, "{}", e.render());
            0
        }
        Err(ParseError::Target(e)) => {
            let _ = writeln!(err, "{}", e);
            let _ = writeln!(out, "{}\n", USAGE);
            1
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    init_tracing();

    let status = execute(
        parse_command(std::env::args_os()),
        system_devices,
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
    );
    ExitCode::from(status)
}
