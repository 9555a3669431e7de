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

pub mod cli;
pub mod constants;
pub mod logger;
pub mod once;
pub mod standalone;

#[cfg(target_os = "windows")]
pub mod windows;

pub use cli::{AgentArgs, Cli, Commands, LogLevel, ServiceCommands};
pub use once::run_once;
pub use standalone::run_standalone;

use std::path::PathBuf;
use clap::Parser;

pub fn camboot_main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log_level = cli.log_level;
    let log_dir = cli.log_dir;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_standalone(cli.agent.to_config(), log_level, log_dir),
        Commands::Once => run_once(cli.agent.to_config(), log_level, log_dir),
        Commands::Service { command } => run_service_command(command, &cli.agent, log_level, log_dir),
    }
}

#[cfg(target_os = "windows")]
fn run_service_command(command: ServiceCommands,
                       agent: &AgentArgs,
                       log_level: LogLevel,
                       log_dir: Option<PathBuf>) -> anyhow::Result<()> {
    use anyhow::bail;
    use log::{debug, error, info};
    use crate::logger::{init_install_logger, init_service_logger};
    use crate::windows::{install_service, start_service, uninstall_service};

    match command {
        ServiceCommands::Install { verbose, service_log_level } => {
            if let Err(e) = init_install_logger(log_dir.as_deref(), verbose, log_level) {
                eprintln!("Failed to initialize logger: {}", e);
                bail!("Failed to initialize logger: {}", e);
            }
            debug!("Installing service with log level: {}", log_level);
            let result = install_service(service_log_level, agent, log_dir.as_deref());
            if let Err(ref e) = result {
                error!("Failed to install service: {}", e);
            }
            result
        }
        ServiceCommands::Uninstall { verbose } => {
            if let Err(e) = init_install_logger(log_dir.as_deref(), verbose, log_level) {
                eprintln!("Failed to initialize logger: {}", e);
                bail!("Failed to initialize logger: {}", e);
            }
            let result = uninstall_service();
            if let Err(ref e) = result {
                error!("Failed to uninstall service: {}", e);
            }
            result
        }
        ServiceCommands::Run => {
            if let Err(e) = init_service_logger(log_dir.as_deref(), log_level) {
                // Can't log this error since the logger failed to initialize
                eprintln!("Failed to initialize logger: {}", e);
                bail!("Failed to initialize logger: {}", e);
            }
            info!("Service starting with log level: {}", log_level);
            start_service()
        }
    }
}

#[cfg(not(target_os = "windows"))]
fn run_service_command(_command: ServiceCommands,
                       _agent: &AgentArgs,
                       _log_level: LogLevel,
                       _log_dir: Option<PathBuf>) -> anyhow::Result<()> {
    anyhow::bail!("Service management is only available on Windows, use `run` to monitor in the foreground")
}
