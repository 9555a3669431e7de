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
use std::time::Duration;
use crate::errors::SetupError;
use crate::firmware::FirmwareLocator;

/// Interval of the fallback re-scan for devices whose arrival notification was missed.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Wait after an arrival notification before enumerating, freshly attached devices are not
/// reliably enumerable right away.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1000);

pub const DEFAULT_FIRMWARE_FILE_NAME: &str = "firmware_discord_and_gamma_fix.bin";

/// Runtime policy of the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub poll_interval: Duration,
    pub settle_delay: Duration,
    /// Directory holding the firmware image, `None` means the directory of the running executable.
    pub firmware_dir: Option<PathBuf>,
    pub firmware_file_name: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            settle_delay: DEFAULT_SETTLE_DELAY,
            firmware_dir: None,
            firmware_file_name: DEFAULT_FIRMWARE_FILE_NAME.to_string(),
        }
    }
}

impl AgentConfig {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn with_firmware_dir(mut self, firmware_dir: impl Into<PathBuf>) -> Self {
        self.firmware_dir = Some(firmware_dir.into());
        self
    }

    pub fn with_firmware_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.firmware_file_name = file_name.into();
        self
    }

    pub fn firmware_locator(&self) -> FirmwareLocator {
        FirmwareLocator::new(self.firmware_dir.clone(), self.firmware_file_name.clone())
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        if self.poll_interval.is_zero() {
            return Err(SetupError::InvalidConfig("poll interval must be greater than zero".to_string()));
        }
        if self.firmware_file_name.trim().is_empty() {
            return Err(SetupError::InvalidConfig("firmware file name must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_agent_policy() {
        let config = AgentConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.settle_delay, Duration::from_millis(1000));
        assert_eq!(config.firmware_file_name, "firmware_discord_and_gamma_fix.bin");
        assert!(config.firmware_dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let config = AgentConfig::default().with_poll_interval(Duration::ZERO);
        assert!(matches!(config.validate(), Err(SetupError::InvalidConfig(_))));
    }

    #[test]
    fn empty_firmware_name_is_rejected() {
        let config = AgentConfig::default().with_firmware_file_name("  ");
        assert!(matches!(config.validate(), Err(SetupError::InvalidConfig(_))));
    }

    #[test]
    fn zero_settle_delay_is_allowed() {
        let config = AgentConfig::default().with_settle_delay(Duration::ZERO);
        assert!(config.validate().is_ok());
    }
}
