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

use futures::{future, StreamExt};
use log::debug;
use nusb::hotplug::HotplugEvent;
use crate::device::{ArrivalSource, ArrivalStream};
use crate::errors::NotificationError;
use crate::usb::describe_device;

/// Arrival notifications from the `nusb` hotplug watcher.
///
/// Every connected USB device produces an arrival, the reaction pass filters for cameras.
#[derive(Debug, Default, Clone)]
pub struct UsbHotplugSource;

impl UsbHotplugSource {
    pub fn new() -> Self {
        Self
    }
}

impl ArrivalSource for UsbHotplugSource {
    fn subscribe(&self) -> Result<ArrivalStream, NotificationError> {
        let watch = nusb::watch_devices()?;
        let arrivals = watch.filter_map(|event| {
            future::ready(match event {
                HotplugEvent::Connected(device_info) => {
                    debug!("USB device connected: {}", describe_device(&device_info));
                    Some(())
                }
                HotplugEvent::Disconnected(_) => None,
            })
        });
        Ok(arrivals.boxed())
    }
}
