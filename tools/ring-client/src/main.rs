// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: ring-client bring-up harness for the zzz-modem rings
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable (CLI surface may change)
//! TEST_COVERAGE: unit tests in harness.rs
//!
//! Talks to the simulator over `<socket>.sync` / `<socket>.async`, or serves a simulated
//! register window itself (`serve`, optionally echoing TX into RX with `--loopback`).

#![forbid(unsafe_code)]

mod harness;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use axi_sim::{SimError, SimServer, SocketPort, DEFAULT_BASE};
use clap::{Parser, Subcommand};
use log::{error, info};
use modem_hal::RegisterFile;
use modem_ring::{LoopbackPeer, RingError};
use zzz_modem::{DeviceConfig, DeviceError};

use harness::Harness;

/// Errors that end a ring-client run.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Device layer failure.
    #[error("{0}")]
    Device(#[from] DeviceError),
    /// Simulated transport failure.
    #[error("{0}")]
    Sim(#[from] SimError),
    /// Output could not be written.
    #[error("io: {0}")]
    Io(#[from] io::Error),
}

impl From<RingError> for ClientError {
    fn from(err: RingError) -> Self {
        Self::Device(err.into())
    }
}

impl From<modem_hal::PortError> for ClientError {
    fn from(err: modem_hal::PortError) -> Self {
        Self::Device(err.into())
    }
}

/// Result alias for CLI commands.
pub type Result<T> = core::result::Result<T, ClientError>;

#[derive(Parser)]
#[command(name = "ring-client")]
#[command(about = "Host harness for the zzz-modem ring buffers", long_about = None)]
struct Cli {
    /// Socket base path; `.sync` and `.async` are appended
    #[arg(short, long, default_value = DEFAULT_BASE)]
    socket: PathBuf,

    /// Device configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Dump RX, put lengths 4..=16 of the test string, get 16 times
    Selftest {
        /// Pause between the puts and the gets, in milliseconds
        #[arg(long, default_value_t = 10)]
        settle_ms: u64,
    },
    /// Print the first registers of the RX buffer
    DumpRx {
        /// Number of 32-bit words
        #[arg(long, default_value_t = 32)]
        words: u32,
    },
    /// Enqueue one message
    Put {
        /// Message text
        text: String,
    },
    /// Dequeue and print one message, if any
    Get,
    /// Serve a simulated register window on the socket pair
    Serve {
        /// Echo every TX message back into RX
        #[arg(long)]
        loopback: bool,
        /// Peer polling interval, in milliseconds
        #[arg(long, default_value_t = 1)]
        poll_ms: u64,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("ring-client: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => DeviceConfig::load(path)?,
        None => DeviceConfig::default(),
    };
    match cli.command {
        Command::Serve { loopback, poll_ms } => {
            serve(&cli.socket, &config, loopback, Duration::from_millis(poll_ms))
        }
        command => client(&cli.socket, &config, command),
    }
}

fn client(base: &Path, config: &DeviceConfig, command: Command) -> Result<()> {
    let port = Arc::new(SocketPort::connect(base)?);
    let mut harness = Harness::open(port, config)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match command {
        Command::Selftest { settle_ms } => {
            let received =
                harness.selftest(&mut out, || thread::sleep(Duration::from_millis(settle_ms)))?;
            info!("ring-client: selftest received {received} of 13 messages");
        }
        Command::DumpRx { words } => harness.dump_rx(&mut out, words)?,
        Command::Put { text } => {
            harness.put_msg(&mut out, &text)?;
        }
        Command::Get => {
            harness.get_msg(&mut out)?;
        }
        Command::Serve { .. } => {}
    }
    out.flush()?;
    harness.close();
    Ok(())
}

fn serve(base: &Path, config: &DeviceConfig, loopback: bool, poll: Duration) -> Result<()> {
    let map = config.register_map();
    let regs = Arc::new(RegisterFile::new(map.window_len()));
    if loopback {
        let mut peer = LoopbackPeer::new(&map).map_err(DeviceError::from)?;
        let regs = Arc::clone(&regs);
        thread::spawn(move || loop {
            if let Err(err) = peer.service(&*regs) {
                error!("ring-client: loopback peer stopped: {err}");
                return;
            }
            thread::sleep(poll);
        });
        info!("ring-client: loopback peer polling every {poll:?}");
    }
    let server = SimServer::bind(base, regs)?;
    server.run()?;
    Ok(())
}
