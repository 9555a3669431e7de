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

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use futures::FutureExt;
use log::{debug, error, info, warn};
use tokio::sync::Mutex;
use crate::config::AgentConfig;
use crate::device::{BootDevice, DeviceEnumerator};
use crate::firmware::FirmwareLocator;
use crate::run_state::{RunState, SharedRunState};
use crate::trigger::Trigger;

/// How a single reaction pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Another pass was in flight, the trigger was dropped.
    Coalesced,
    /// The controller was not running, nothing was done.
    NotRunning,
    /// Enumeration failed, the pass ended early.
    QueryFailed,
    /// No boot mode device is connected.
    NoDevice,
    Completed {
        found: usize,
        uploaded: usize,
    },
}

/// Turns triggers into firmware uploads.
///
/// At most one pass runs at a time. A trigger arriving while a pass is in flight is dropped
/// rather than queued, the next poll tick re-checks anyway.
pub struct ReactionEngine {
    enumerator: Arc<dyn DeviceEnumerator>,
    firmware: FirmwareLocator,
    run_state: SharedRunState,
    upload_guard: Mutex<()>,
}

impl ReactionEngine {
    pub fn new(enumerator: Arc<dyn DeviceEnumerator>,
               firmware: FirmwareLocator,
               run_state: SharedRunState) -> Self {
        Self {
            enumerator,
            firmware,
            run_state,
            upload_guard: Mutex::new(()),
        }
    }

    /// Runs one reaction pass for `trigger`. Never fails, every problem is logged.
    pub async fn react(&self, trigger: Trigger) -> PassOutcome {
        let Ok(_guard) = self.upload_guard.try_lock() else {
            debug!("Reaction pass already in flight, dropping {} trigger", trigger);
            return PassOutcome::Coalesced;
        };

        if !self.run_state.is_running() {
            debug!("Ignoring {} trigger, service is {}", trigger, self.run_state.get());
            return PassOutcome::NotRunning;
        }

        debug!("Checking for boot mode cameras ({})", trigger);
        let devices = match AssertUnwindSafe(self.enumerator.enumerate(true)).catch_unwind().await {
            Ok(Ok(devices)) => devices,
            Ok(Err(e)) => {
                error!("Error checking devices: {}", e);
                return PassOutcome::QueryFailed;
            }
            Err(_) => {
                error!("Error checking devices: device enumeration panicked");
                return PassOutcome::QueryFailed;
            }
        };

        if devices.is_empty() {
            info!("No boot mode camera found ({})", trigger);
            return PassOutcome::NoDevice;
        }

        let found = devices.len();
        info!("Camera detected in boot mode ({} device(s), {})", found, trigger);

        let mut uploaded = 0;
        for mut device in devices {
            if !self.run_state.is_running() {
                warn!("Stop requested, not uploading to {}", device.describe());
                break;
            }
            if self.upload_to_device(device.as_mut()).await {
                uploaded += 1;
            }
        }
        PassOutcome::Completed { found, uploaded }
    }

    /// Waits until no pass is in flight.
    pub(crate) async fn drain(&self) {
        let _guard = self.upload_guard.lock().await;
    }

    async fn upload_to_device(&self, device: &mut dyn BootDevice) -> bool {
        let firmware_path = match self.firmware.locate() {
            Ok(path) => path,
            Err(e) => {
                warn!("{}, skipping {}", e, device.describe());
                return false;
            }
        };

        device.set_firmware_path(firmware_path);
        let result = AssertUnwindSafe(device.upload()).catch_unwind().await;
        match result {
            Ok(Ok(())) => {
                info!("Firmware uploaded successfully to {}", device.describe());
                true
            }
            Ok(Err(e)) => {
                error!("Failed to upload firmware to {}: {}", device.describe(), e);
                false
            }
            Err(_) => {
                error!("Firmware upload to {} panicked", device.describe());
                false
            }
        }
    }
}

/// Runs a single pass outside of a controller, for one-shot loading.
pub async fn check_once(config: &AgentConfig, enumerator: Arc<dyn DeviceEnumerator>) -> PassOutcome {
    let run_state = SharedRunState::new();
    let engine = ReactionEngine::new(enumerator, config.firmware_locator(), run_state.clone());
    if let Err(state) = run_state.walk(&[RunState::Starting, RunState::Running]) {
        error!("Cannot run device check, state is {}", state);
        return PassOutcome::NotRunning;
    }
    let outcome = engine.react(Trigger::Startup).await;
    if let Err(state) = run_state.walk(&[RunState::StoppingRequested, RunState::Stopped]) {
        error!("Unexpected state {} after device check", state);
    }
    outcome
}
