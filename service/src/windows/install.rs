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

use std::ffi::OsString;
use std::path::Path;
use anyhow::Result;
use log::{debug, error, info};
use windows_service::{
    service::{ServiceAccess, ServiceErrorControl, ServiceInfo, ServiceStartType, ServiceType},
    service_manager::{ServiceManager, ServiceManagerAccess},
};
use crate::cli::{AgentArgs, LogLevel};
use crate::constants::{SERVICE_DESCRIPTION, SERVICE_DISPLAY_NAME, SERVICE_NAME};

fn launch_arguments(log_level: Option<LogLevel>, agent: &AgentArgs, log_dir: Option<&Path>) -> Vec<OsString> {
    let mut arguments = Vec::new();
    if let Some(log_level) = log_level {
        arguments.extend([OsString::from("--log-level"), OsString::from(log_level.to_string())]);
    }
    if let Some(log_dir) = log_dir {
        arguments.extend([OsString::from("--log-dir"), log_dir.as_os_str().to_owned()]);
    }
    arguments.extend(agent.to_launch_arguments());
    arguments.extend([OsString::from("service"), OsString::from("run")]);
    arguments
}

/// Registers the current executable as an auto-start service running as LocalSystem.
pub fn install_service(log_level: Option<LogLevel>, agent: &AgentArgs, log_dir: Option<&Path>) -> Result<()> {
    debug!("Connecting to service manager");
    let manager_access = ServiceManagerAccess::CONNECT | ServiceManagerAccess::CREATE_SERVICE;
    let service_manager = ServiceManager::local_computer(None::<&str>, manager_access)
        .inspect_err(|e| error!("Failed to connect to service manager: {}", e))?;

    let executable_path = std::env::current_exe()
        .inspect_err(|e| error!("Failed to get current executable path: {}", e))?;
    debug!("Service binary path: {}", executable_path.display());

    let service_info = ServiceInfo {
        name: OsString::from(SERVICE_NAME),
        display_name: OsString::from(SERVICE_DISPLAY_NAME),
        service_type: ServiceType::OWN_PROCESS,
        start_type: ServiceStartType::AutoStart,
        error_control: ServiceErrorControl::Normal,
        executable_path,
        launch_arguments: launch_arguments(log_level, agent, log_dir),
        dependencies: vec![],
        account_name: None,
        account_password: None,
    };

    debug!("Creating service");
    let service = service_manager.create_service(&service_info, ServiceAccess::CHANGE_CONFIG)
        .inspect_err(|e| error!("Failed to create service: {}", e))?;
    service.set_description(SERVICE_DESCRIPTION)
        .inspect_err(|e| error!("Failed to set service description: {}", e))?;

    info!("Service installed successfully");
    println!("Service installed successfully");
    Ok(())
}

pub fn uninstall_service() -> Result<()> {
    debug!("Connecting to service manager");
    let service_manager = ServiceManager::local_computer(None::<&str>, ServiceManagerAccess::CONNECT)
        .inspect_err(|e| error!("Failed to connect to service manager: {}", e))?;

    debug!("Opening service: {}", SERVICE_NAME);
    let service = service_manager.open_service(SERVICE_NAME, ServiceAccess::DELETE)
        .inspect_err(|e| error!("Failed to open service: {}", e))?;
    service.delete()
        .inspect_err(|e| error!("Failed to delete service: {}", e))?;

    info!("Service uninstalled successfully");
    println!("Service uninstalled successfully");
    Ok(())
}
