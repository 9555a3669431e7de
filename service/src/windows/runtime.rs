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
use std::time::Duration;
use anyhow::Result;
use camboot_core::{AgentConfig, LifecycleController};
use clap::Parser;
use log::{debug, error, info, warn};
use windows_service::{
    define_windows_service,
    service::{ServiceControl, ServiceControlAccept, ServiceExitCode, ServiceState, ServiceStatus, ServiceType},
    service_control_handler::{self, ServiceControlHandlerResult, ServiceStatusHandle},
    service_dispatcher,
};
use crate::cli::Cli;
use crate::constants::SERVICE_NAME;

const START_FAILED_EXIT_CODE: u32 = 1;
const STOP_WAIT_HINT: Duration = Duration::from_secs(10);

enum ServiceEvent {
    Stop,
}

define_windows_service!(ffi_service_main, service_main);

pub fn start_service() -> Result<()> {
    service_dispatcher::start(SERVICE_NAME, ffi_service_main)?;
    Ok(())
}

pub fn service_main(arguments: Vec<OsString>) {
    if let Err(e) = run_service_main(arguments) {
        error!("Service failed: {}", e);
    }
}

/// The dispatcher callback has no parameters of ours, the configuration travels in the
/// launch arguments written at install time.
fn config_from_launch_arguments() -> AgentConfig {
    match Cli::try_parse() {
        Ok(cli) => cli.agent.to_config(),
        Err(e) => {
            warn!("Failed to parse service launch arguments, using defaults: {}", e);
            AgentConfig::default()
        }
    }
}

fn set_status(status_handle: &ServiceStatusHandle,
              current_state: ServiceState,
              controls_accepted: ServiceControlAccept,
              exit_code: ServiceExitCode,
              wait_hint: Duration) -> windows_service::Result<()> {
    status_handle.set_service_status(ServiceStatus {
        service_type: ServiceType::OWN_PROCESS,
        current_state,
        controls_accepted,
        exit_code,
        checkpoint: 0,
        wait_hint,
        process_id: None,
    })
}

fn run_service_main(_arguments: Vec<OsString>) -> Result<()> {
    let config = config_from_launch_arguments();

    debug!("Creating Tokio runtime");
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<ServiceEvent>();
    let event_handler = move |control_event| -> ServiceControlHandlerResult {
        match control_event {
            ServiceControl::Stop | ServiceControl::Shutdown => {
                debug!("Received stop control event");
                let _ = event_tx.send(ServiceEvent::Stop);
                ServiceControlHandlerResult::NoError
            }
            ServiceControl::Interrogate => ServiceControlHandlerResult::NoError,
            _ => {
                debug!("Received unsupported control event: {:?}", control_event);
                ServiceControlHandlerResult::NotImplemented
            }
        }
    };

    debug!("Registering service control handler");
    let status_handle = service_control_handler::register(SERVICE_NAME, event_handler)?;
    set_status(&status_handle, ServiceState::StartPending, ServiceControlAccept::empty(),
               ServiceExitCode::Win32(0), Duration::default())?;

    let exit_code = rt.block_on(async {
        let controller = LifecycleController::with_usb(config);
        if let Err(e) = controller.start().await {
            error!("Failed to start camera boot service: {}", e);
            return ServiceExitCode::ServiceSpecific(START_FAILED_EXIT_CODE);
        }

        let running = set_status(&status_handle, ServiceState::Running,
                                 ServiceControlAccept::STOP | ServiceControlAccept::SHUTDOWN,
                                 ServiceExitCode::Win32(0), Duration::default());
        if let Err(e) = running {
            error!("Failed to set service status: {}", e);
            controller.stop().await;
            return ServiceExitCode::ServiceSpecific(START_FAILED_EXIT_CODE);
        }

        match event_rx.recv().await {
            Some(ServiceEvent::Stop) => info!("Received stop request, stopping..."),
            None => warn!("Service control channel closed, stopping..."),
        }

        set_status(&status_handle, ServiceState::StopPending, ServiceControlAccept::empty(),
                   ServiceExitCode::Win32(0), STOP_WAIT_HINT)
            .inspect_err(|e| error!("Failed to set service status: {}", e))
            .ok();
        controller.stop().await;
        ServiceExitCode::Win32(0)
    });

    rt.shutdown_timeout(Duration::from_secs(10));

    debug!("Setting service status to Stopped");
    set_status(&status_handle, ServiceState::Stopped, ServiceControlAccept::empty(),
               exit_code, Duration::default())?;

    info!("Service stopped");
    Ok(())
}
