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

use std::io;
use std::path::PathBuf;
use nusb::transfer::TransferError;
use thiserror::Error;
use crate::run_state::RunState;

/// Failure to subscribe to platform device arrival notifications.
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Arrival notifications were already registered for this source")]
    AlreadyRegistered,

    #[error("Other error: {0}")]
    OtherError(String),
}

/// Fatal error of `LifecycleController::start`. The controller does not enter `Running`.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Failed to register for device arrival notifications: {0}")]
    NotificationRegistration(#[from] NotificationError),

    #[error("Controller cannot be started from state {0}")]
    InvalidState(RunState),

    #[error("Controller has already been started once, create a new instance")]
    AlreadyStarted,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Error, Debug)]
pub enum DeviceQueryError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Other error: {0}")]
    OtherError(String),
}


#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Firmware path was not set")]
    FirmwarePathNotSet,

    #[error("Failed to read firmware image {}: {source}", .path.display())]
    FirmwareRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Firmware image {} is empty", .0.display())]
    EmptyImage(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Control transfer failed at image offset {offset:#x}: {source}")]
    Transfer {
        offset: usize,
        #[source]
        source: TransferError,
    },

    #[error("Other error: {0}")]
    OtherError(String),
}


#[derive(Error, Debug)]
pub enum FirmwareError {
    #[error("Firmware file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Firmware path {} is not a regular file", .0.display())]
    NotAFile(PathBuf),

    #[error("Cannot determine executable directory: {0}")]
    ExecutableDir(#[source] io::Error),
}
