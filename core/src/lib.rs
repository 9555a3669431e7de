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

pub mod config;
pub mod device;
pub mod errors;
pub mod firmware;
pub mod run_state;
pub mod service;
pub mod trigger;
pub mod usb;

mod controller;
mod reaction;

#[cfg(test)]
mod test_support;

pub use config::AgentConfig;
pub use controller::{ArrivalHandle, LifecycleController};
pub use device::{ArrivalSource, ArrivalStream, BootDevice, DeviceEnumerator};
pub use errors::{DeviceQueryError, FirmwareError, NotificationError, SetupError, UploadError};
pub use firmware::FirmwareLocator;
pub use reaction::{check_once, PassOutcome, ReactionEngine};
pub use run_state::{RunState, SharedRunState};
pub use service::{spawn_service, spawn_service_on, MultiServiceHandle, ServiceHandle, StopHandle};
pub use trigger::Trigger;
