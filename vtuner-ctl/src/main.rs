//! vtuner-ctl: operate one DVB adapter through the hardware control layer.

use std::path::{Path, PathBuf};

use clap::Parser;
use log::{debug, error};
use vtuner_hw::{DeviceConfig, DvbDevice, HwSession, DEFAULT_DEMUX_BUFFER_SIZE};

mod commands;
mod context;
mod logging;

use context::Cli;

const DEFAULT_CONFIG_FILE: &str = "vtuner.toml";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_RETENTION_DAYS: u64 = 7;

/// Configuration file format.
#[derive(Debug, serde::Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    device: DeviceSection,
    #[serde(default)]
    logging: LoggingSection,
}

#[derive(Debug, serde::Deserialize, Default)]
struct DeviceSection {
    adapter: Option<u32>,
    frontend: Option<u32>,
    demux: Option<u32>,
    demux_buffer_size: Option<u32>,
}

#[derive(Debug, serde::Deserialize, Default)]
struct LoggingSection {
    log_dir: Option<String>,
    retention_days: Option<u64>,
    level: Option<String>,
}

fn load_config(path: &Path) -> Result<ConfigFile, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let config: ConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Command line values win over the file; defaults fill the rest.
fn device_config(cli: &Cli, file: &DeviceSection) -> DeviceConfig {
    DeviceConfig {
        adapter: cli.adapter.or(file.adapter).unwrap_or(0),
        frontend: cli.frontend.or(file.frontend).unwrap_or(0),
        demux: cli.demux.or(file.demux).unwrap_or(0),
        demux_buffer_size: file.demux_buffer_size.unwrap_or(DEFAULT_DEMUX_BUFFER_SIZE),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load config file: explicit path > auto-detect > default
    let config_path = cli.config.clone().or_else(|| {
        let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Some(default_path)
        } else {
            None
        }
    });
    let file_config = match &config_path {
        Some(path) => load_config(path).map_err(|e| {
            eprintln!("Failed to load config file {}: {}", path.display(), e);
            e
        })?,
        None => ConfigFile::default(),
    };

    let log_dir = cli
        .log_dir
        .clone()
        .or_else(|| file_config.logging.log_dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR));
    let retention_days = cli
        .log_retention_days
        .or(file_config.logging.retention_days)
        .unwrap_or(DEFAULT_RETENTION_DAYS);
    logging::init_logging(
        &log_dir,
        retention_days,
        cli.verbose,
        file_config.logging.level.as_deref(),
    )?;

    if let Some(path) = &config_path {
        debug!("Loaded config from: {}", path.display());
    }

    let device_config = device_config(&cli, &file_config.device);
    let device = DvbDevice::open(&device_config).map_err(|e| {
        error!("Failed to open adapter{}: {}", device_config.adapter, e);
        e
    })?;
    let mut session = HwSession::new(device)?;

    if let Err(e) = commands::run(&mut session, cli.command, cli.format) {
        error!("{}", e);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_file() {
        let content = r#"
[device]
adapter = 1
demux_buffer_size = 2097152

[logging]
log_dir = "/var/log/vtuner"
level = "debug"
"#;
        let config: ConfigFile = toml::from_str(content).unwrap();
        assert_eq!(config.device.adapter, Some(1));
        assert_eq!(config.device.frontend, None);
        assert_eq!(config.device.demux_buffer_size, Some(2_097_152));
        assert_eq!(config.logging.log_dir.as_deref(), Some("/var/log/vtuner"));
        assert_eq!(config.logging.retention_days, None);
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_empty_config_file() {
        let config: ConfigFile = toml::from_str("").unwrap();
        assert_eq!(config.device.adapter, None);
        assert_eq!(config.logging.level, None);
    }

    #[test]
    fn test_device_config_precedence() {
        let file = DeviceSection {
            adapter: Some(1),
            frontend: Some(1),
            demux: None,
            demux_buffer_size: Some(4096),
        };
        let cli = Cli::parse_from(["vtuner-ctl", "--adapter", "3", "status"]);
        let config = device_config(&cli, &file);
        assert_eq!(
            config,
            DeviceConfig {
                adapter: 3,
                frontend: 1,
                demux: 0,
                demux_buffer_size: 4096,
            }
        );

        let config = device_config(&cli, &DeviceSection::default());
        assert_eq!(config.frontend, 0);
        assert_eq!(config.demux_buffer_size, DEFAULT_DEMUX_BUFFER_SIZE);
    }
}
