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

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use futures::StreamExt;
use log::{debug, error, info, warn};
use tokio::runtime::Handle;
use tokio::select;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::task::TaskTracker;
use crate::config::AgentConfig;
use crate::device::{ArrivalSource, ArrivalStream, DeviceEnumerator};
use crate::errors::SetupError;
use crate::reaction::ReactionEngine;
use crate::run_state::{RunState, SharedRunState};
use crate::service::{spawn_service_on, MultiServiceHandle, StopHandle, StopSignal};
use crate::trigger::Trigger;
use crate::usb::{UsbBootEnumerator, UsbHotplugSource};

/// Owns the run state of the agent and every background task it spawns.
///
/// One instance is started at most once. All work is tracked so that [`stop`](Self::stop)
/// returns only after it has drained.
pub struct LifecycleController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: AgentConfig,
    run_state: SharedRunState,
    engine: Arc<ReactionEngine>,
    arrivals: Arc<dyn ArrivalSource>,
    started: AtomicBool,
    runtime: OnceLock<Handle>,
    services: Mutex<Option<MultiServiceHandle>>,
    passes: TaskTracker,
    stop: StopSignal,
}

/// Routes platform arrival callbacks to the controller that created it.
///
/// Cheap to clone and safe to call from any thread, including threads outside the Tokio runtime.
#[derive(Clone)]
pub struct ArrivalHandle {
    inner: Arc<ControllerInner>,
}

impl ArrivalHandle {
    /// Reports that a device interface appeared. Returns immediately.
    pub fn notify(&self) {
        self.inner.handle_arrival_event();
    }
}

impl LifecycleController {
    pub fn new(config: AgentConfig,
               enumerator: Arc<dyn DeviceEnumerator>,
               arrivals: Arc<dyn ArrivalSource>) -> Self {
        let run_state = SharedRunState::new();
        let engine = Arc::new(ReactionEngine::new(enumerator, config.firmware_locator(), run_state.clone()));
        Self {
            inner: Arc::new(ControllerInner {
                config,
                run_state,
                engine,
                arrivals,
                started: AtomicBool::new(false),
                runtime: OnceLock::new(),
                services: Mutex::new(None),
                passes: TaskTracker::new(),
                stop: StopSignal::new(),
            }),
        }
    }

    /// Controller backed by the USB enumerator and USB hotplug notifications.
    pub fn with_usb(config: AgentConfig) -> Self {
        Self::new(config, Arc::new(UsbBootEnumerator::new()), Arc::new(UsbHotplugSource::new()))
    }

    pub fn state(&self) -> RunState {
        self.inner.run_state.get()
    }

    pub fn config(&self) -> &AgentConfig {
        &self.inner.config
    }

    pub fn engine(&self) -> Arc<ReactionEngine> {
        self.inner.engine.clone()
    }

    pub fn arrival_handle(&self) -> ArrivalHandle {
        ArrivalHandle { inner: self.inner.clone() }
    }

    /// Registers for arrival notifications and starts monitoring.
    ///
    /// On success the controller is `Running`, a startup pass is scheduled and the poll timer
    /// is armed. On failure the controller is back in `Stopped`.
    pub async fn start(&self) -> Result<(), SetupError> {
        let inner = &self.inner;
        inner.config.validate()?;
        if inner.started.swap(true, Ordering::SeqCst) {
            return Err(SetupError::AlreadyStarted);
        }
        if let Err(state) = inner.run_state.transition(RunState::Stopped, RunState::Starting) {
            inner.started.store(false, Ordering::SeqCst);
            return Err(SetupError::InvalidState(state));
        }
        info!("Camera boot service starting");

        let arrivals = match inner.arrivals.subscribe() {
            Ok(arrivals) => arrivals,
            Err(e) => {
                error!("Failed to register device notification: {}", e);
                let _ = inner.run_state.transition(RunState::Starting, RunState::Stopped);
                inner.started.store(false, Ordering::SeqCst);
                return Err(SetupError::NotificationRegistration(e));
            }
        };

        let runtime = inner.runtime.get_or_init(Handle::current).clone();

        let mut services = MultiServiceHandle::with_capacity(2);
        let handle = self.arrival_handle();
        services.add(spawn_service_on(&runtime, move |stop| run_arrival_watch(arrivals, handle, stop)));
        let engine = inner.engine.clone();
        let poll_interval = inner.config.poll_interval;
        services.add(spawn_service_on(&runtime, move |stop| run_poll_loop(engine, poll_interval, stop)));
        *inner.services.lock().unwrap() = Some(services);

        if let Err(state) = inner.run_state.transition(RunState::Starting, RunState::Running) {
            // Nothing else moves the state out of Starting.
            error!("Unexpected state {} while starting", state);
        }
        info!("Camera boot service started successfully");

        let engine = inner.engine.clone();
        inner.passes.spawn_on(async move {
            engine.react(Trigger::Startup).await;
        }, &runtime);
        Ok(())
    }

    /// Stops monitoring and waits for background work to drain.
    ///
    /// An in-flight pass is allowed to finish, no new pass starts. Calling it when not running
    /// is a no-op.
    pub async fn stop(&self) {
        let inner = &self.inner;
        if let Err(state) = inner.run_state.transition(RunState::Running, RunState::StoppingRequested) {
            debug!("Stop ignored, service is {}", state);
            return;
        }
        info!("Camera boot service stopping...");
        inner.stop.signal();

        let services = inner.services.lock().unwrap().take();
        if let Some(services) = services {
            match services.shutdown().await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => debug!("Monitoring task was cancelled during shutdown"),
                Err(e) => error!("Monitoring task failed during shutdown: {}", e),
            }
        }

        inner.passes.close();
        inner.passes.wait().await;
        inner.engine.drain().await;

        if let Err(state) = inner.run_state.transition(RunState::StoppingRequested, RunState::Stopped) {
            error!("Unexpected state {} while stopping", state);
        }
        info!("Camera boot service stopped");
    }

    /// Entry point for platform arrival callbacks, see [`ArrivalHandle::notify`].
    pub fn handle_arrival_event(&self) {
        self.inner.handle_arrival_event();
    }
}

impl Drop for LifecycleController {
    /// A controller dropped without [`stop`](LifecycleController::stop) still winds down its
    /// background work, it just cannot wait for it.
    fn drop(&mut self) {
        let inner = &self.inner;
        if inner.run_state.transition(RunState::Running, RunState::StoppingRequested).is_err() {
            return;
        }
        warn!("Camera boot service dropped while running, stopping background work");
        inner.stop.signal();
        if let Some(mut services) = inner.services.lock().unwrap().take() {
            services.request_shutdown();
        }
        inner.passes.close();
    }
}

impl ControllerInner {
    fn handle_arrival_event(&self) {
        if !self.run_state.is_running() {
            debug!("Device arrival ignored, service is {}", self.run_state.get());
            return;
        }
        let Some(runtime) = self.runtime.get() else {
            warn!("Device arrival before runtime was attached, ignoring");
            return;
        };
        debug!("Device arrival, re-checking in {:?}", self.config.settle_delay);
        let engine = self.engine.clone();
        let settle_delay = self.config.settle_delay;
        let stop = self.stop.handle();
        self.passes.spawn_on(settle_then_react(engine, settle_delay, stop), runtime);
    }
}

async fn settle_then_react(engine: Arc<ReactionEngine>, settle_delay: Duration, mut stop: StopHandle) {
    select! {
        biased;
        _ = stop.signaled() => {
            debug!("Settle delay cancelled by stop");
            return;
        }
        _ = tokio::time::sleep(settle_delay) => {}
    }
    engine.react(Trigger::ArrivalNotification).await;
}

async fn run_arrival_watch(mut arrivals: ArrivalStream, handle: ArrivalHandle, mut stop: StopHandle) {
    loop {
        select! {
            biased;
            _ = stop.signaled() => {
                debug!("Shutdown requested, stopping device arrival watch");
                break;
            }
            event = arrivals.next() => {
                match event {
                    Some(()) => handle.notify(),
                    None => {
                        warn!("Device arrival stream ended, relying on polling");
                        break;
                    }
                }
            }
        }
    }
}

async fn run_poll_loop(engine: Arc<ReactionEngine>, period: Duration, mut stop: StopHandle) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        select! {
            biased;
            _ = stop.signaled() => {
                debug!("Shutdown requested, stopping device polling");
                break;
            }
            _ = ticker.tick() => {
                engine.react(Trigger::PollTick).await;
            }
        }
    }
}
