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
use std::sync::Arc;
use anyhow::bail;
use camboot_core::usb::UsbBootEnumerator;
use camboot_core::{check_once, AgentConfig, PassOutcome};
use log::{debug, info};
use crate::cli::LogLevel;
use crate::logger::init_standalone_logger;

/// Uploads firmware to the boot mode cameras attached right now and exits.
pub fn run_once(config: AgentConfig, log_level: LogLevel, log_dir: Option<PathBuf>) -> anyhow::Result<()> {
    if let Err(e) = init_standalone_logger(log_dir.as_deref(), log_level) {
        eprintln!("Failed to initialize logger: {}", e);
    }
    config.validate()?;
    debug!("Single pass with configuration: {:?}", config);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let outcome = rt.block_on(check_once(&config, Arc::new(UsbBootEnumerator::new())));
    outcome_to_result(outcome)
}

/// Nothing to load is not a failure, only a device that was found and not loaded is.
fn outcome_to_result(outcome: PassOutcome) -> anyhow::Result<()> {
    match outcome {
        PassOutcome::Completed { found, uploaded } if found == uploaded => {
            info!("Firmware uploaded to {} camera(s)", uploaded);
            Ok(())
        }
        PassOutcome::Completed { found, uploaded } => {
            bail!("Firmware uploaded to {} of {} boot mode camera(s)", uploaded, found)
        }
        PassOutcome::NoDevice => {
            info!("Usb boot device not found");
            Ok(())
        }
        PassOutcome::QueryFailed => bail!("Failed to query USB devices"),
        PassOutcome::Coalesced | PassOutcome::NotRunning => bail!("Device check did not run"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_device_is_not_an_error() {
        assert!(outcome_to_result(PassOutcome::NoDevice).is_ok());
        assert!(outcome_to_result(PassOutcome::Completed { found: 2, uploaded: 2 }).is_ok());
    }

    #[test]
    fn failed_upload_or_query_is_an_error() {
        let err = outcome_to_result(PassOutcome::Completed { found: 2, uploaded: 1 }).unwrap_err();
        assert!(err.to_string().contains("1 of 2"));
        assert!(outcome_to_result(PassOutcome::QueryFailed).is_err());
    }
}
