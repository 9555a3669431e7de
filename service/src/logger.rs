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

use std::path::{Path, PathBuf};
use log::debug;
use log4rs::{
    append::{console::ConsoleAppender, file::FileAppender},
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};
use crate::cli::LogLevel;
use crate::constants::LOG_DIR_NAME;

#[cfg(target_os = "windows")]
pub fn default_log_dir() -> PathBuf {
    let program_data = std::env::var("PROGRAMDATA").unwrap_or_else(|_| "C:\\ProgramData".to_string());
    PathBuf::from(program_data).join(LOG_DIR_NAME)
}

#[cfg(not(target_os = "windows"))]
pub fn default_log_dir() -> PathBuf {
    std::env::temp_dir().join(LOG_DIR_NAME)
}

/// Resolves the log directory, falling back to the platform default, and creates it if missing.
pub fn get_log_dir(log_dir: Option<&Path>) -> anyhow::Result<PathBuf> {
    let log_dir = log_dir.map(Path::to_path_buf).unwrap_or_else(default_log_dir);
    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)?;
    }
    Ok(log_dir)
}

pub fn get_logger_pattern() -> PatternEncoder {
    PatternEncoder::new("{d(%Y-%m-%d %H:%M:%S%.3f)} - {l} - {m}\n")
}

pub fn build_logger_config(log_file: PathBuf, log_level: LogLevel, include_console: bool) -> anyhow::Result<Config> {
    let file_appender = FileAppender::builder()
        .encoder(Box::new(get_logger_pattern()))
        .build(log_file)?;

    let mut config_builder = Config::builder()
        .appender(Appender::builder().build("file", Box::new(file_appender)));
    let mut root_builder = Root::builder().appender("file");

    if include_console {
        let console_appender = ConsoleAppender::builder()
            .encoder(Box::new(get_logger_pattern()))
            .build();
        config_builder = config_builder.appender(Appender::builder().build("console", Box::new(console_appender)));
        root_builder = root_builder.appender("console");
    }

    Ok(config_builder.build(root_builder.build(log_level.to_level_filter()))?)
}

fn init_logger_common(log_dir: Option<&Path>,
                      log_file_name: &str,
                      log_level: LogLevel,
                      include_console: bool) -> anyhow::Result<()> {
    let log_file = get_log_dir(log_dir)?.join(log_file_name);
    let config = build_logger_config(log_file, log_level, include_console)?;
    log4rs::init_config(config)?;
    debug!("Logger initialized with level: {}", log_level);
    Ok(())
}

pub fn init_service_logger(log_dir: Option<&Path>, log_level: LogLevel) -> anyhow::Result<()> {
    init_logger_common(log_dir, "camboot_service.log", log_level, false)
}

pub fn init_install_logger(log_dir: Option<&Path>, verbose: bool, log_level: LogLevel) -> anyhow::Result<()> {
    init_logger_common(log_dir, "camboot_install.log", log_level, verbose)
}

pub fn init_standalone_logger(log_dir: Option<&Path>, log_level: LogLevel) -> anyhow::Result<()> {
    init_logger_common(log_dir, "camboot_standalone.log", log_level, true)
}
