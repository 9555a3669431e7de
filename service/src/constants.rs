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

pub const SERVICE_NAME: &str = "PS5CameraService";
pub const SERVICE_DISPLAY_NAME: &str = "PS5 Camera Service";
pub const SERVICE_DESCRIPTION: &str = "Uploads firmware to PS5 cameras connected in boot mode so they become usable as webcams.";

/// Sub-directory of the platform log location.
pub const LOG_DIR_NAME: &str = "PS5CameraService";
