//! `mmcore-probe`: inspect a Micro-Manager core from the command line.
//!
//! # Usage
//!
//! ```bash
//! mmcore-probe info
//! mmcore-probe devices DemoCamera
//! mmcore-probe load --config config/session.example.toml
//! mmcore-probe snap --config config/session.example.toml
//! mmcore-probe watch --config config/session.example.toml --count 10
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mmcore::config::SessionConfig;
use mmcore::logging::{self, LoggingConfig};
use mmcore::{ImageFormat, Session};
use tracing::info;

#[derive(Parser)]
#[command(name = "mmcore-probe")]
#[command(about = "Inspect devices, images and events of a Micro-Manager core", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error). Overrides the config.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print core versions and the adapters found on the search paths
    Info {
        /// Directory searched for device adapters (repeatable)
        #[arg(long = "search-path")]
        search_paths: Vec<PathBuf>,
    },

    /// List the devices an adapter module provides
    Devices {
        /// Adapter module name, e.g. DemoCamera
        module: String,
    },

    /// Apply a session config and print every device's properties
    Load {
        /// Session configuration file
        #[arg(long)]
        config: PathBuf,
    },

    /// Apply a session config and snap one image with the current camera
    Snap {
        /// Session configuration file
        #[arg(long)]
        config: PathBuf,
    },

    /// Apply a session config and print property and stage events
    Watch {
        /// Session configuration file
        #[arg(long)]
        config: PathBuf,

        /// Stop after this many events
        #[arg(long, default_value = "10")]
        count: usize,

        /// Give up after this many seconds without an event
        #[arg(long, default_value = "5")]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Info { search_paths } => {
            init_logging(None, cli.log_level.as_deref())?;
            print_info(&search_paths)
        }
        Commands::Devices { module } => {
            init_logging(None, cli.log_level.as_deref())?;
            print_devices(&module)
        }
        Commands::Load { config } => {
            let config = load_config(&config)?;
            init_logging(Some(&config.logging), cli.log_level.as_deref())?;
            let session = open_configured(&config)?;
            print_properties(&session, &config)
        }
        Commands::Snap { config } => {
            let config = load_config(&config)?;
            init_logging(Some(&config.logging), cli.log_level.as_deref())?;
            let session = open_configured(&config)?;
            snap(&session)
        }
        Commands::Watch {
            config,
            count,
            timeout_secs,
        } => {
            let config = load_config(&config)?;
            init_logging(Some(&config.logging), cli.log_level.as_deref())?;
            watch(config, count, Duration::from_secs(timeout_secs)).await
        }
    }
}

fn init_logging(config: Option<&LoggingConfig>, level: Option<&str>) -> Result<()> {
    let mut logging_config = config.cloned().unwrap_or_else(|| LoggingConfig {
        level: "warn".into(),
        ..LoggingConfig::default()
    });
    if let Some(level) = level {
        logging_config.level = level.to_string();
    }
    logging::init(&logging_config).context("Failed to initialize logging")
}

fn load_config(path: &Path) -> Result<SessionConfig> {
    SessionConfig::load(path).with_context(|| format!("Failed to load config from {}", path.display()))
}

fn open_configured(config: &SessionConfig) -> Result<Session> {
    let session = Session::open().context("Failed to open core session")?;
    session
        .apply_config(config)
        .context("Failed to apply session configuration")?;
    Ok(session)
}

fn print_info(search_paths: &[PathBuf]) -> Result<()> {
    let session = Session::open().context("Failed to open core session")?;
    if !search_paths.is_empty() {
        let paths: Vec<String> = search_paths
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        session.set_device_adapter_search_paths(&paths)?;
    }

    println!("{}", session.version_info());
    println!("{}", session.api_version_info());
    println!("user:     {}", session.user_id());
    println!("host:     {}", session.host_name());
    for address in session.mac_addresses() {
        println!("mac:      {}", address);
    }
    for path in session.device_adapter_search_paths() {
        println!("path:     {}", path);
    }

    let adapters = session
        .device_adapter_names()
        .context("Failed to list device adapters")?;
    println!("adapters: {}", adapters.join(", "));
    Ok(())
}

fn print_devices(module: &str) -> Result<()> {
    let session = Session::open().context("Failed to open core session")?;
    let names = session
        .available_devices(module)
        .with_context(|| format!("Failed to list devices of {}", module))?;
    let descriptions = session.available_device_descriptions(module)?;
    let types = session.available_device_types(module)?;

    for ((name, description), kind) in names.iter().zip(&descriptions).zip(&types) {
        println!("{:<16} {:<12} {}", name, format!("{:?}", kind), description);
    }
    Ok(())
}

fn print_properties(session: &Session, config: &SessionConfig) -> Result<()> {
    for label in config.device_labels() {
        println!("[{}]", label);
        for name in session.device_property_names(label)? {
            let value = session.property(label, &name)?;
            let read_only = if session.is_property_read_only(label, &name)? {
                " (read-only)"
            } else {
                ""
            };
            println!("  {} = {}{}", name, value, read_only);
        }
    }
    Ok(())
}

fn snap(session: &Session) -> Result<()> {
    let camera = session.camera_device();
    anyhow::ensure!(!camera.is_empty(), "No camera role in the configuration");

    session.snap_image().context("Snap failed")?;
    let image = session.image().context("Failed to read image")?;
    let format = session.image_format();

    println!(
        "{}: {}x{} px, {} byte(s)/px, {} bit, {} bytes",
        camera, format.width, format.height, format.bytes_per_pixel, format.bit_depth, image.len()
    );
    if let Some((min, max, mean)) = pixel_stats(&image, &format) {
        println!("min {}  max {}  mean {:.2}", min, max, mean);
    }
    Ok(())
}

/// Min, max and mean of a grayscale 8 or 16 bit image.
fn pixel_stats(image: &[u8], format: &ImageFormat) -> Option<(u16, u16, f64)> {
    let pixels: Vec<u16> = match format.bytes_per_pixel {
        1 => image.iter().map(|&b| u16::from(b)).collect(),
        2 => image
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect(),
        _ => return None,
    };
    let min = *pixels.iter().min()?;
    let max = *pixels.iter().max()?;
    let mean = pixels.iter().map(|&p| f64::from(p)).sum::<f64>() / pixels.len() as f64;
    Some((min, max, mean))
}

async fn watch(config: SessionConfig, count: usize, timeout: Duration) -> Result<()> {
    let session = Arc::new(Session::open().context("Failed to open core session")?);
    let mut properties = session.subscribe_property_changed(config.events.policy);
    let mut stages = session.subscribe_stage_position_changed(config.events.policy);

    // Applying the config raises events; it runs off the runtime so a
    // blocking policy can wait on this task draining them.
    let applier = {
        let session = Arc::clone(&session);
        tokio::task::spawn_blocking(move || session.apply_config(&config))
    };

    let mut seen = 0;
    while seen < count {
        let next = tokio::time::timeout(timeout, async {
            tokio::select! {
                Some(event) = properties.recv() => {
                    Some(format!("property {}.{} = {}", event.label, event.property, event.value))
                }
                Some(event) = stages.recv() => {
                    Some(format!("stage    {} -> {:.3} um", event.label, event.position))
                }
                else => None,
            }
        })
        .await;

        match next {
            Ok(Some(line)) => {
                println!("{}", line);
                seen += 1;
            }
            Ok(None) => break,
            Err(_) => {
                info!(seen, "No event within timeout, stopping");
                break;
            }
        }
    }

    // Unsubscribe first so a blocking delivery cannot stall the config task.
    let dropped = properties.dropped() + stages.dropped();
    drop(properties);
    drop(stages);

    applier
        .await
        .context("Config task panicked")?
        .context("Failed to apply session configuration")?;

    if dropped > 0 {
        println!("{} event(s) dropped", dropped);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_stats_16bit() {
        let format = ImageFormat {
            width: 2,
            height: 1,
            bytes_per_pixel: 2,
            bit_depth: 16,
            components: 1,
            channels: 1,
            buffer_len: 4,
        };
        let image = [0x10, 0x00, 0x30, 0x00];
        assert_eq!(pixel_stats(&image, &format), Some((0x10, 0x30, 32.0)));
    }

    #[test]
    fn test_pixel_stats_empty() {
        let format = ImageFormat {
            width: 0,
            height: 0,
            bytes_per_pixel: 1,
            bit_depth: 8,
            components: 1,
            channels: 1,
            buffer_len: 0,
        };
        assert_eq!(pixel_stats(&[], &format), None);
    }

    #[test]
    fn test_cli_parses_watch() {
        let cli = Cli::parse_from(["mmcore-probe", "watch", "--config", "s.toml", "--count", "3"]);
        assert!(matches!(cli.command, Commands::Watch { count: 3, .. }));
    }
}
