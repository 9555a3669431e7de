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

use std::path::PathBuf;
use camboot_core::{AgentConfig, LifecycleController};
use log::{debug, error, info};
use tokio::runtime::Runtime;
use crate::cli::LogLevel;
use crate::logger::init_standalone_logger;

#[cfg(target_os = "windows")]
async fn shutdown_signal() {
    debug!("Press Ctrl+C or close the console window to exit");

    let mut close_signal = match tokio::signal::windows::ctrl_close() {
        Ok(signal) => signal,
        Err(e) => {
            error!("Failed to register console close handler: {}", e);
            return ctrl_c_signal().await;
        }
    };

    tokio::select! {
        _ = ctrl_c_signal() => {}
        _ = close_signal.recv() => {
            info!("Received close signal from Windows, stopping...");
        }
    }
}

#[cfg(not(target_os = "windows"))]
async fn shutdown_signal() {
    debug!("Press Ctrl+C to exit");
    ctrl_c_signal().await
}

async fn ctrl_c_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C signal, stopping..."),
        Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
    }
}

/// Runs the agent in the foreground until interrupted.
pub fn run_standalone(config: AgentConfig, log_level: LogLevel, log_dir: Option<PathBuf>) -> anyhow::Result<()> {
    if let Err(e) = init_standalone_logger(log_dir.as_deref(), log_level) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    info!("Running camera boot service in console mode");

    let rt = Runtime::new()?;
    rt.block_on(async {
        let controller = LifecycleController::with_usb(config);
        debug!("Configuration: {:?}", controller.config());
        controller.start().await
            .inspect_err(|e| error!("Failed to start camera boot service: {}", e))?;

        shutdown_signal().await;

        controller.stop().await;
        Ok::<(), anyhow::Error>(())
    })?;

    debug!("Standalone mode exited");
    Ok(())
}
