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
use std::path::{Path, PathBuf};
use crate::errors::FirmwareError;

/// Resolves the location of the firmware image and checks that it is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareLocator {
    dir: Option<PathBuf>,
    file_name: String,
}

impl FirmwareLocator {
    pub fn new(dir: Option<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            dir,
            file_name: file_name.into(),
        }
    }

    pub fn next_to_executable(file_name: impl Into<String>) -> Self {
        Self::new(None, file_name)
    }

    pub fn in_directory(dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self::new(Some(dir.into()), file_name)
    }

    /// Path the image is expected at. Does not touch the image itself.
    pub fn resolve(&self) -> Result<PathBuf, FirmwareError> {
        let dir = match &self.dir {
            Some(dir) => dir.clone(),
            None => executable_dir()?,
        };
        Ok(dir.join(&self.file_name))
    }

    /// Resolves the image path and verifies a regular file exists there.
    pub fn locate(&self) -> Result<PathBuf, FirmwareError> {
        let path = self.resolve()?;
        match std::fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => Ok(path),
            Ok(_) => Err(FirmwareError::NotAFile(path)),
            Err(_) => Err(FirmwareError::NotFound(path)),
        }
    }
}

/// Directory containing the running executable.
pub fn executable_dir() -> Result<PathBuf, FirmwareError> {
    let exe = std::env::current_exe().map_err(FirmwareError::ExecutableDir)?;
    exe.parent()
       .map(Path::to_path_buf)
       .ok_or_else(|| FirmwareError::ExecutableDir(io::Error::new(io::ErrorKind::NotFound,
                                                                  "executable path has no parent directory")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use crate::test_support::write_file;

    #[test]
    fn locate_finds_existing_image() {
        let dir = tempdir().unwrap();
        let expected = write_file(dir.path(), "fw.bin", &[1, 2, 3]);
        let locator = FirmwareLocator::in_directory(dir.path(), "fw.bin");
        assert_eq!(locator.locate().unwrap(), expected);
    }

    #[test]
    fn locate_reports_missing_image_with_its_path() {
        let dir = tempdir().unwrap();
        let locator = FirmwareLocator::in_directory(dir.path(), "missing.bin");
        match locator.locate() {
            Err(FirmwareError::NotFound(path)) => assert_eq!(path, dir.path().join("missing.bin")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn locate_rejects_directory() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("fw.bin")).unwrap();
        let locator = FirmwareLocator::in_directory(dir.path(), "fw.bin");
        assert!(matches!(locator.locate(), Err(FirmwareError::NotAFile(_))));
    }

    #[test]
    fn default_location_is_next_to_executable() {
        let locator = FirmwareLocator::next_to_executable("firmware_discord_and_gamma_fix.bin");
        let exe = std::env::current_exe().unwrap();
        assert_eq!(
            locator.resolve().unwrap(),
            exe.parent().unwrap().join("firmware_discord_and_gamma_fix.bin")
        );
    }
}
