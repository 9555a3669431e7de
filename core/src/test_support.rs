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

//! Mock collaborators shared by the unit tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use async_trait::async_trait;
use futures::channel::mpsc;
use log::{Level, LevelFilter, Log, Metadata, Record};
use tokio::sync::Notify;
use tempfile::{tempdir, TempDir};
use crate::device::{ArrivalSource, ArrivalStream, BootDevice, DeviceEnumerator};
use crate::errors::{DeviceQueryError, NotificationError, UploadError};
use crate::run_state::{RunState, SharedRunState};

/// Keeps every info-or-louder message and forwards records to `env_logger`.
struct CapturingLogger {
    inner: env_logger::Logger,
    lines: Mutex<Vec<String>>,
}

impl Log for CapturingLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info || self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if record.level() <= Level::Info {
            self.lines.lock().unwrap().push(record.args().to_string());
        }
        if self.inner.matches(record) {
            self.inner.log(record);
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

static LOGGER: OnceLock<CapturingLogger> = OnceLock::new();

/// Routes `log` output to the test harness, `RUST_LOG=debug` shows the engine's decisions.
pub fn init_logger() {
    let logger = LOGGER.get_or_init(|| CapturingLogger {
        inner: env_logger::Builder::from_default_env().is_test(true).build(),
        lines: Mutex::new(Vec::new()),
    });
    if log::set_logger(logger).is_ok() {
        log::set_max_level(logger.inner.filter().max(LevelFilter::Info));
    }
}

/// Whether any test logged a line containing every one of `fragments`.
pub fn logged(fragments: &[&str]) -> bool {
    LOGGER.get().is_some_and(|logger| {
        logger.lines
              .lock()
              .unwrap()
              .iter()
              .any(|line| fragments.iter().all(|fragment| line.contains(fragment)))
    })
}

pub fn running_state() -> SharedRunState {
    let state = SharedRunState::new();
    state.transition(RunState::Stopped, RunState::Starting).unwrap();
    state.transition(RunState::Starting, RunState::Running).unwrap();
    state
}

/// Scratch directory holding a firmware image named `file_name`.
pub fn firmware_dir(file_name: &str) -> TempDir {
    let dir = tempdir().unwrap();
    write_file(dir.path(), file_name, &[0x5b; 64]);
    dir
}

pub fn write_file(dir: &Path, file_name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadCall {
    pub device: String,
    pub path: PathBuf,
}

#[derive(Default)]
pub struct UploadRecorder {
    uploads: Mutex<Vec<UploadCall>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
    started: Notify,
}

pub struct ActiveUpload<'a> {
    recorder: &'a UploadRecorder,
}

impl Drop for ActiveUpload<'_> {
    fn drop(&mut self) {
        self.recorder.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl UploadRecorder {
    fn begin(&self, device: &str, path: PathBuf) -> ActiveUpload<'_> {
        self.uploads.lock().unwrap().push(UploadCall { device: device.to_string(), path });
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        self.started.notify_one();
        ActiveUpload { recorder: self }
    }

    pub fn uploads(&self) -> Vec<UploadCall> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn max_concurrent_uploads(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub async fn wait_for_upload_start(&self) {
        self.started.notified().await;
    }
}

#[derive(Clone)]
enum Behavior {
    Succeed,
    Fail,
    Panic,
    Slow(Duration),
    Gated(Arc<Notify>),
}

/// Description of a device the mock enumerator reports on every call.
#[derive(Clone)]
pub struct MockDevice {
    name: String,
    behavior: Behavior,
}

impl MockDevice {
    pub fn ok(name: &str) -> Self {
        Self { name: name.to_string(), behavior: Behavior::Succeed }
    }

    pub fn failing(name: &str) -> Self {
        Self { name: name.to_string(), behavior: Behavior::Fail }
    }

    pub fn panicking(name: &str) -> Self {
        Self { name: name.to_string(), behavior: Behavior::Panic }
    }

    pub fn slow(name: &str, duration: Duration) -> Self {
        Self { name: name.to_string(), behavior: Behavior::Slow(duration) }
    }

    /// Upload blocks until the returned gate is notified.
    pub fn gated(name: &str) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        (Self { name: name.to_string(), behavior: Behavior::Gated(gate.clone()) }, gate)
    }
}

struct MockBootDevice {
    template: MockDevice,
    firmware_path: Option<PathBuf>,
    recorder: Arc<UploadRecorder>,
}

#[async_trait]
impl BootDevice for MockBootDevice {
    fn describe(&self) -> String {
        self.template.name.clone()
    }

    fn set_firmware_path(&mut self, path: PathBuf) {
        self.firmware_path = Some(path);
    }

    async fn upload(&mut self) -> Result<(), UploadError> {
        let path = self.firmware_path.clone().ok_or(UploadError::FirmwarePathNotSet)?;
        let _active = self.recorder.begin(&self.template.name, path);
        match &self.template.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail => Err(UploadError::OtherError("transfer failed".to_string())),
            Behavior::Panic => panic!("mock device {} exploded", self.template.name),
            Behavior::Slow(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(())
            }
            Behavior::Gated(gate) => {
                gate.notified().await;
                Ok(())
            }
        }
    }
}

pub struct MockEnumerator {
    devices: Mutex<Vec<MockDevice>>,
    boot_mode_flags: Mutex<Vec<bool>>,
    failures_left: AtomicUsize,
    panics_left: AtomicUsize,
    pub recorder: Arc<UploadRecorder>,
}

impl MockEnumerator {
    pub fn new(devices: Vec<MockDevice>) -> Arc<Self> {
        Arc::new(Self {
            devices: Mutex::new(devices),
            boot_mode_flags: Mutex::new(Vec::new()),
            failures_left: AtomicUsize::new(0),
            panics_left: AtomicUsize::new(0),
            recorder: Arc::new(UploadRecorder::default()),
        })
    }

    pub fn set_devices(&self, devices: Vec<MockDevice>) {
        *self.devices.lock().unwrap() = devices;
    }

    pub fn fail_next_queries(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    pub fn panic_next_queries(&self, count: usize) {
        self.panics_left.store(count, Ordering::SeqCst);
    }

    pub fn enumerate_calls(&self) -> usize {
        self.boot_mode_flags.lock().unwrap().len()
    }

    pub fn boot_mode_flags(&self) -> Vec<bool> {
        self.boot_mode_flags.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeviceEnumerator for MockEnumerator {
    async fn enumerate(&self, boot_mode_only: bool) -> Result<Vec<Box<dyn BootDevice>>, DeviceQueryError> {
        self.boot_mode_flags.lock().unwrap().push(boot_mode_only);
        if self.panics_left.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok() {
            panic!("mock enumerator exploded");
        }
        let fail = self.failures_left
                       .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                       .is_ok();
        if fail {
            return Err(DeviceQueryError::OtherError("driver not responding".to_string()));
        }
        let devices = self.devices.lock().unwrap().clone();
        Ok(devices
            .into_iter()
            .map(|template| {
                Box::new(MockBootDevice {
                    template,
                    firmware_path: None,
                    recorder: self.recorder.clone(),
                }) as Box<dyn BootDevice>
            })
            .collect())
    }
}

/// Arrival source fed by the test through an unbounded channel.
pub struct MockArrivalSource {
    receiver: Mutex<Option<mpsc::UnboundedReceiver<()>>>,
    refuse: bool,
}

impl MockArrivalSource {
    pub fn channel() -> (Arc<Self>, mpsc::UnboundedSender<()>) {
        let (tx, rx) = mpsc::unbounded();
        (Arc::new(Self { receiver: Mutex::new(Some(rx)), refuse: false }), tx)
    }

    pub fn refusing() -> Arc<Self> {
        Arc::new(Self { receiver: Mutex::new(None), refuse: true })
    }
}

impl ArrivalSource for MockArrivalSource {
    fn subscribe(&self) -> Result<ArrivalStream, NotificationError> {
        if self.refuse {
            return Err(NotificationError::OtherError("device notification registration refused".to_string()));
        }
        let receiver = self.receiver.lock().unwrap().take().ok_or(NotificationError::AlreadyRegistered)?;
        Ok(Box::pin(receiver))
    }
}
