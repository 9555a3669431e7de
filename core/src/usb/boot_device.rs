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

use std::ops::Range;
use std::path::PathBuf;
use async_trait::async_trait;
use log::debug;
use nusb::DeviceInfo;
use nusb::transfer::{ControlOut, ControlType, Recipient};
use crate::device::BootDevice;
use crate::errors::UploadError;
use crate::usb::describe_device;

/// Interface the boot loader accepts vendor requests on.
const BOOT_INTERFACE: u8 = 0;

/// Vendor request used for both image chunks and the launch command.
const UPLOAD_REQUEST: u8 = 0x00;

/// Bytes per control transfer.
pub const CHUNK_SIZE: usize = 512;

/// wIndex of the first chunk. wValue holds the low 16 bits of the image offset, every wrap of
/// wValue advances wIndex.
const FIRST_CHUNK_INDEX: u16 = 0x14;

const LAUNCH_VALUE: u16 = 0x2200;
const LAUNCH_INDEX: u16 = 0x8018;
const LAUNCH_DATA: [u8; 1] = [0x5B];

/// Addressing of one control transfer of the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareChunk {
    pub value: u16,
    pub index: u16,
    pub range: Range<usize>,
}

/// Splits an image of `len` bytes into boot loader write requests.
#[derive(Debug, Clone)]
pub struct FirmwareChunks {
    len: usize,
    offset: usize,
}

impl FirmwareChunks {
    pub fn new(len: usize) -> Self {
        Self { len, offset: 0 }
    }
}

impl Iterator for FirmwareChunks {
    type Item = FirmwareChunk;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.len {
            return None;
        }
        let start = self.offset;
        let end = (start + CHUNK_SIZE).min(self.len);
        self.offset = end;
        Some(FirmwareChunk {
            value: (start & 0xFFFF) as u16,
            index: FIRST_CHUNK_INDEX.wrapping_add((start >> 16) as u16),
            range: start..end,
        })
    }
}

/// A camera in boot mode reachable over USB.
pub struct UsbBootDevice {
    device_info: DeviceInfo,
    firmware_path: Option<PathBuf>,
}

impl UsbBootDevice {
    pub fn new(device_info: DeviceInfo) -> Self {
        Self {
            device_info,
            firmware_path: None,
        }
    }
}

#[async_trait]
impl BootDevice for UsbBootDevice {
    fn describe(&self) -> String {
        describe_device(&self.device_info)
    }

    fn set_firmware_path(&mut self, path: PathBuf) {
        self.firmware_path = Some(path);
    }

    async fn upload(&mut self) -> Result<(), UploadError> {
        let path = self.firmware_path.clone().ok_or(UploadError::FirmwarePathNotSet)?;
        let image = tokio::fs::read(&path)
            .await
            .map_err(|source| UploadError::FirmwareRead { path: path.clone(), source })?;
        if image.is_empty() {
            return Err(UploadError::EmptyImage(path));
        }

        let device = self.device_info.open()?;
        let interface = device.claim_interface(BOOT_INTERFACE)?;
        debug!("Uploading {} bytes from {} to {}", image.len(), path.display(), self.describe());

        for chunk in FirmwareChunks::new(image.len()) {
            let offset = chunk.range.start;
            let control_out = ControlOut {
                control_type: ControlType::Vendor,
                recipient: Recipient::Device,
                request: UPLOAD_REQUEST,
                value: chunk.value,
                index: chunk.index,
                data: &image[chunk.range],
            };
            interface.control_out(control_out)
                     .await
                     .into_result()
                     .map_err(|source| UploadError::Transfer { offset, source })?;
        }

        let launch = ControlOut {
            control_type: ControlType::Vendor,
            recipient: Recipient::Device,
            request: UPLOAD_REQUEST,
            value: LAUNCH_VALUE,
            index: LAUNCH_INDEX,
            data: &LAUNCH_DATA,
        };
        // The camera drops off the bus to re-enumerate while handling this request.
        if let Err(e) = interface.control_out(launch).await.into_result() {
            debug!("Launch request ended with {} while device re-enumerates", e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_image_has_no_chunks() {
        assert_eq!(FirmwareChunks::new(0).count(), 0);
    }

    #[test]
    fn last_chunk_is_short() {
        let chunks: Vec<_> = FirmwareChunks::new(CHUNK_SIZE * 2 + 10).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], FirmwareChunk { value: 0, index: 0x14, range: 0..512 });
        assert_eq!(chunks[1], FirmwareChunk { value: 512, index: 0x14, range: 512..1024 });
        assert_eq!(chunks[2], FirmwareChunk { value: 1024, index: 0x14, range: 1024..1034 });
    }

    #[test]
    fn value_wraps_into_index_every_64k() {
        let chunks: Vec<_> = FirmwareChunks::new(0x10000 + CHUNK_SIZE).collect();
        let before_wrap = &chunks[chunks.len() - 2];
        let after_wrap = &chunks[chunks.len() - 1];
        assert_eq!(before_wrap.value, 0xFE00);
        assert_eq!(before_wrap.index, 0x14);
        assert_eq!(after_wrap.value, 0x0000);
        assert_eq!(after_wrap.index, 0x15);
        assert_eq!(after_wrap.range, 0x10000..0x10200);
    }

    #[test]
    fn chunks_cover_image_exactly_once() {
        let len = 300_001;
        let mut expected_start = 0;
        for chunk in FirmwareChunks::new(len) {
            assert_eq!(chunk.range.start, expected_start);
            assert!(chunk.range.len() <= CHUNK_SIZE);
            expected_start = chunk.range.end;
        }
        assert_eq!(expected_start, len);
    }
}
