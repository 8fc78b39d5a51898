//! Reflex Host
//!
//! Host-side controller for a two-player colour reflex game. The game board
//! (a microcontroller with LEDs, a buzzer, a start button and a colour
//! sensor) is driven over a 9600-baud line protocol; the host sequences
//! rounds, measures reaction times and keeps score.
//!
//! # Usage
//!
//! ```bash
//! # List serial ports and spot the game board
//! reflex-host ports
//!
//! # Play against the board (auto-detects the port when -p is omitted)
//! reflex-host play -p /dev/ttyACM0
//!
//! # Play against the built-in simulated board, fast
//! reflex-host play --simulate --instant --games 1
//!
//! # Poke the firmware by hand
//! reflex-host send -p /dev/ttyACM0 SHOW_COLOR:2
//!
//! # Write the default configuration
//! reflex-host config -o reflex.toml
//! ```

mod config;
mod error;
mod game;
mod protocol;
mod serial;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use config::GameConfig;
use game::rng::SimpleRng;
use game::{ConsoleReporter, GameController};
use protocol::Device;
use serial::{LineLink, SimulatedDevice, Transport};

#[cfg(feature = "serial")]
use serial::{PortConfig, SerialConnection};
#[cfg(feature = "serial")]
use std::time::Duration;

/// Reflex Host
///
/// Runs the colour reflex game on a serial-attached game board
#[derive(Parser)]
#[command(name = "reflex-host")]
#[command(version = "0.1.0")]
#[command(about = "Host controller for a two-player colour reflex game")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (logs wire traffic)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the game
    Play {
        /// Serial port path (e.g., /dev/ttyACM0, COM3)
        #[arg(short, long)]
        port: Option<String>,

        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seed for colour picks and suspense delays
        #[arg(long)]
        seed: Option<u64>,

        /// Stop after this many games (default: play forever)
        #[arg(long)]
        games: Option<u32>,

        /// Rounds per game
        #[arg(long)]
        rounds: Option<u8>,

        /// Use the built-in simulated board instead of a serial port
        #[arg(long)]
        simulate: bool,

        /// Collapse every pause and wait
        #[arg(long)]
        instant: bool,

        /// Disable timestamps
        #[arg(long)]
        no_timestamps: bool,
    },

    /// List available serial ports
    #[cfg(feature = "serial")]
    Ports,

    /// Send a single protocol command and print the reply
    #[cfg(feature = "serial")]
    Send {
        /// Serial port path
        #[arg(short, long)]
        port: String,

        /// Command line to send (e.g., SHOW_COLOR:1)
        command: String,

        /// How long to wait for a reply, in milliseconds
        #[arg(short, long, default_value_t = 1000)]
        wait: u64,

        /// Baud rate
        #[arg(short, long, default_value_t = crate::config::DEFAULT_BAUD)]
        baud: u32,
    },

    /// Write the default configuration file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Play {
            port,
            config,
            seed,
            games,
            rounds,
            simulate,
            instant,
            no_timestamps,
        } => {
            let mut game_config = match config {
                Some(path) => GameConfig::load(&path)?,
                None => GameConfig::default(),
            };
            if instant {
                game_config = game_config.with_instant_pacing();
            }
            if seed.is_some() {
                game_config.game.seed = seed;
            }
            if let Some(rounds) = rounds {
                game_config.game.rounds = rounds;
            }
            game_config.validate()?;

            let reporter = ConsoleReporter::new(!no_timestamps);
            if simulate {
                let sim_seed = u64::from(SimpleRng::from_seed(game_config.game.seed).next_u32());
                println!("{} Using simulated game board", "[*]".cyan().bold());
                run_session(SimulatedDevice::with_fumbles(sim_seed), game_config, reporter, games)
            } else {
                handle_play_serial(port, game_config, reporter, games)
            }
        }

        #[cfg(feature = "serial")]
        Commands::Ports => serial::port::print_ports(),

        #[cfg(feature = "serial")]
        Commands::Send {
            port,
            command,
            wait,
            baud,
        } => {
            let conn = open_or_exit(PortConfig::new(&port).with_baud_rate(baud));
            let defaults = GameConfig::default();
            let mut device = Device::new(
                LineLink::new(conn, defaults.link.poll_interval()),
                defaults.waits,
            );

            println!(
                "{} Sending to {} at {} baud: {}",
                "[TX]".cyan().bold(),
                port,
                baud,
                command
            );
            match device.send_raw(&command, Duration::from_millis(wait))? {
                Some(reply) => println!("{} {}", "[RX]".green().bold(), reply),
                None => println!("{}", format!("No reply within {} ms", wait).yellow()),
            }
            device.close();
            Ok(())
        }

        Commands::Config { output } => {
            let content = GameConfig::default().to_toml()?;
            if let Some(path) = output {
                std::fs::write(&path, &content)?;
                println!(
                    "{} Default config written to {}",
                    "[OK]".green().bold(),
                    path.display()
                );
            } else {
                println!("{}", content);
            }
            Ok(())
        }
    }
}

/// Open the port, or report it and exit with status 1
#[cfg(feature = "serial")]
fn open_or_exit(port_config: PortConfig) -> SerialConnection {
    match SerialConnection::open(port_config) {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("{} Could not open serial port: {}", "[ERROR]".red().bold(), e);
            std::process::exit(1);
        }
    }
}

#[cfg(feature = "serial")]
fn handle_play_serial(
    port: Option<String>,
    config: GameConfig,
    reporter: ConsoleReporter,
    games: Option<u32>,
) -> Result<()> {
    // Try to auto-detect port if not specified
    let port_path = if let Some(p) = port {
        p
    } else {
        let detected = serial::port::detect_companion_ports()?;
        let Some(first) = detected.first() else {
            eprintln!("{} No game board detected", "[ERROR]".red().bold());
            eprintln!("Use -p to specify port manually");
            std::process::exit(1);
        };
        println!(
            "{} Auto-detected: {}",
            "[OK]".green().bold(),
            first.path.white()
        );
        first.path.clone()
    };

    let conn = open_or_exit(PortConfig::new(&port_path).with_baud_rate(config.link.baud_rate));
    println!(
        "{} Connected to {} at {} baud",
        "[OK]".green().bold(),
        port_path.white().bold(),
        config.link.baud_rate
    );

    run_session(conn, config, reporter, games)
}

#[cfg(not(feature = "serial"))]
fn handle_play_serial(
    _port: Option<String>,
    _config: GameConfig,
    _reporter: ConsoleReporter,
    _games: Option<u32>,
) -> Result<()> {
    bail!("built without the `serial` feature; use --simulate")
}

/// Handshake with the board, then play until the game limit (or forever)
fn run_session<T: Transport>(
    backend: T,
    config: GameConfig,
    reporter: ConsoleReporter,
    games: Option<u32>,
) -> Result<()> {
    let device = Device::new(
        LineLink::new(backend, config.link.poll_interval()),
        config.waits.clone(),
    );

    println!("{}", "=".repeat(33));
    println!("{}", "    COLOUR SENSOR REFLEX GAME".cyan().bold());
    println!("{}", "=".repeat(33));
    println!("\nConnecting to the board...");

    let mut controller = GameController::new(device, config, reporter);
    controller.handshake();

    let played = match controller.run(games) {
        Ok(played) => played,
        Err(e) if e.is_fatal() => {
            eprintln!("{} {} ({})", "[ERROR]".red().bold(), e, controller.phase());
            std::process::exit(1);
        }
        Err(e) => bail!("{} ({})", e, controller.phase()),
    };

    println!(
        "\n{} Played {} game{}",
        "[OK]".green().bold(),
        played,
        if played == 1 { "" } else { "s" }
    );
    Ok(())
}
