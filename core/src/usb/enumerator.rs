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

use async_trait::async_trait;
use nusb::list_devices;
use crate::device::{BootDevice, DeviceEnumerator};
use crate::errors::DeviceQueryError;
use crate::usb::boot_device::UsbBootDevice;
use crate::usb::{is_boot_mode, is_camera};

/// Lists cameras attached over USB.
#[derive(Debug, Default, Clone)]
pub struct UsbBootEnumerator;

impl UsbBootEnumerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DeviceEnumerator for UsbBootEnumerator {
    async fn enumerate(&self, boot_mode_only: bool) -> Result<Vec<Box<dyn BootDevice>>, DeviceQueryError> {
        let devices = list_devices()?
            .filter(|device_info| {
                if boot_mode_only { is_boot_mode(device_info) } else { is_camera(device_info) }
            })
            .map(|device_info| Box::new(UsbBootDevice::new(device_info)) as Box<dyn BootDevice>)
            .collect();
        Ok(devices)
    }
}
