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

//! USB adapters for the device collaborators: boot mode enumeration, firmware transfer and
//! hotplug notifications, all backed by `nusb`.

use nusb::DeviceInfo;

mod boot_device;
mod enumerator;
mod hotplug;

pub use boot_device::{FirmwareChunk, FirmwareChunks, UsbBootDevice};
pub use enumerator::UsbBootEnumerator;
pub use hotplug::UsbHotplugSource;

/// Vendor ID of the camera's USB bridge.
pub const CAMERA_VENDOR_ID: u16 = 0x05A9;

/// Product ID the camera reports while waiting for firmware.
pub const BOOT_PRODUCT_ID: u16 = 0x0580;

pub fn is_camera(device_info: &DeviceInfo) -> bool {
    device_info.vendor_id() == CAMERA_VENDOR_ID
}

pub fn is_boot_mode(device_info: &DeviceInfo) -> bool {
    is_camera(device_info) && device_info.product_id() == BOOT_PRODUCT_ID
}

pub(crate) fn describe_device(device_info: &DeviceInfo) -> String {
    format!("\"{}\" ({:04X}:{:04X}{})",
            device_info.product_string().unwrap_or("Unknown"),
            device_info.vendor_id(),
            device_info.product_id(),
            device_info.serial_number().map(|sn| format!(", SN {}", sn)).unwrap_or_default())
}
