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
use std::pin::Pin;
use async_trait::async_trait;
use futures::Stream;
use crate::errors::{DeviceQueryError, NotificationError, UploadError};

/// A connected camera that can receive a firmware image.
///
/// Handles are obtained per reaction pass and dropped when the pass ends.
#[async_trait]
pub trait BootDevice: Send {
    /// Short identification used in log lines.
    fn describe(&self) -> String;

    /// Image transmitted by the next [`upload`](Self::upload).
    fn set_firmware_path(&mut self, path: PathBuf);

    /// Transmits the image set with [`set_firmware_path`](Self::set_firmware_path) to the device.
    async fn upload(&mut self) -> Result<(), UploadError>;
}

/// Lists connected cameras.
#[async_trait]
pub trait DeviceEnumerator: Send + Sync {
    /// Returns connected cameras, only those in boot mode if `boot_mode_only` is set.
    ///
    /// No device present is `Ok` with an empty list, errors are reserved for I/O or driver failures.
    async fn enumerate(&self, boot_mode_only: bool) -> Result<Vec<Box<dyn BootDevice>>, DeviceQueryError>;
}

/// Stream of "something was plugged in" notifications. Items carry no payload, devices are
/// always re-enumerated.
pub type ArrivalStream = Pin<Box<dyn Stream<Item = ()> + Send>>;

/// Platform subscription to hardware arrival notifications.
pub trait ArrivalSource: Send + Sync {
    /// Registers for notifications. Called once per controller instance.
    fn subscribe(&self) -> Result<ArrivalStream, NotificationError>;
}
