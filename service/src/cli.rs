// Copyright 2025 camboot developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::ffi::OsString;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use camboot_core::AgentConfig;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Monitoring policy options shared by every mode.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentArgs {
    /// Seconds between fallback scans for boot mode cameras [default: 10]
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval_secs: Option<u64>,

    /// Milliseconds to wait after a device arrival before scanning [default: 1000]
    #[arg(long, value_name = "MILLISECONDS")]
    pub settle_delay_ms: Option<u64>,

    /// Directory containing the firmware image [default: directory of this executable]
    #[arg(long, value_name = "DIR")]
    pub firmware_dir: Option<PathBuf>,

    /// File name of the firmware image [default: firmware_discord_and_gamma_fix.bin]
    #[arg(long, value_name = "NAME")]
    pub firmware_name: Option<String>,
}

impl AgentArgs {
    pub fn to_config(&self) -> AgentConfig {
        let mut config = AgentConfig::default();
        if let Some(secs) = self.poll_interval_secs {
            config = config.with_poll_interval(Duration::from_secs(secs));
        }
        if let Some(ms) = self.settle_delay_ms {
            config = config.with_settle_delay(Duration::from_millis(ms));
        }
        if let Some(dir) = &self.firmware_dir {
            config = config.with_firmware_dir(dir.clone());
        }
        if let Some(name) = &self.firmware_name {
            config = config.with_firmware_file_name(name.clone());
        }
        config
    }

    /// The same options as command line arguments, for the installed service's launch command.
    pub fn to_launch_arguments(&self) -> Vec<OsString> {
        let mut args = Vec::new();
        if let Some(secs) = self.poll_interval_secs {
            args.extend([OsString::from("--poll-interval-secs"), OsString::from(secs.to_string())]);
        }
        if let Some(ms) = self.settle_delay_ms {
            args.extend([OsString::from("--settle-delay-ms"), OsString::from(ms.to_string())]);
        }
        if let Some(dir) = &self.firmware_dir {
            args.extend([OsString::from("--firmware-dir"), dir.clone().into_os_string()]);
        }
        if let Some(name) = &self.firmware_name {
            args.extend([OsString::from("--firmware-name"), OsString::from(name)]);
        }
        args
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Set the log level
    #[arg(short, long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Directory for log files [default: platform log directory]
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(flatten)]
    pub agent: AgentArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Watch for boot mode cameras in the foreground until interrupted (default)
    Run,

    /// Upload firmware to the boot mode cameras connected right now, then exit
    Once,

    /// Service management commands
    Service {
        #[command(subcommand)]
        command: ServiceCommands,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ServiceCommands {
    /// Install the service
    Install {
        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Service log level
        #[arg(short, long, value_enum)]
        service_log_level: Option<LogLevel>,
    },

    /// Uninstall the service
    Uninstall {
        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run as a service
    Run,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_means_default_foreground_run() {
        let cli = Cli::try_parse_from(["camboot_service"]).unwrap();
        assert_eq!(cli.log_level, LogLevel::Info);
        assert!(cli.command.is_none());
        assert_eq!(cli.agent.to_config(), AgentConfig::default());
    }

    #[test]
    fn agent_options_override_defaults() {
        let cli = Cli::try_parse_from([
            "camboot_service",
            "--poll-interval-secs", "30",
            "--settle-delay-ms", "250",
            "--firmware-dir", "/opt/fw",
            "--firmware-name", "custom.bin",
            "once",
        ]).unwrap();
        let config = cli.agent.to_config();
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.settle_delay, Duration::from_millis(250));
        assert_eq!(config.firmware_dir, Some(PathBuf::from("/opt/fw")));
        assert_eq!(config.firmware_file_name, "custom.bin");
        assert_eq!(cli.command, Some(Commands::Once));
    }

    #[test]
    fn zero_poll_interval_is_rejected_at_parse_time() {
        assert!(Cli::try_parse_from(["camboot_service", "--poll-interval-secs", "0"]).is_err());
    }

    #[test]
    fn launch_arguments_reproduce_the_configuration() {
        let agent = AgentArgs {
            poll_interval_secs: Some(5),
            settle_delay_ms: None,
            firmware_dir: Some(PathBuf::from("C:\\Camera")),
            firmware_name: None,
        };
        let mut argv = vec![OsString::from("camboot_service")];
        argv.extend(agent.to_launch_arguments());
        argv.extend([OsString::from("service"), OsString::from("run")]);

        let cli = Cli::try_parse_from(argv).unwrap();
        assert_eq!(cli.agent, agent);
        assert_eq!(cli.command, Some(Commands::Service { command: ServiceCommands::Run }));
    }

    #[test]
    fn service_install_accepts_its_own_log_level() {
        let cli = Cli::try_parse_from(["camboot_service", "-l", "debug", "service", "install", "-v", "-s", "warn"])
            .unwrap();
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert_eq!(
            cli.command,
            Some(Commands::Service {
                command: ServiceCommands::Install { verbose: true, service_log_level: Some(LogLevel::Warn) }
            })
        );
    }

    #[test]
    fn log_level_parses_case_insensitively() {
        assert_eq!("WARN".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert!("loud".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::Trace.to_string(), "trace");
    }
}
