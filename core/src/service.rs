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

use std::future::Future;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A handle passed to background tasks that lets them observe a stop request.
///
/// Clones observe the same request, so one stop can be fanned out to every task spawned for a
/// service.
#[derive(Clone)]
pub struct StopHandle {
    shutdown_rx: watch::Receiver<bool>,
}

impl StopHandle {
    pub(crate) fn new(shutdown_rx: watch::Receiver<bool>) -> Self { Self { shutdown_rx } }

    /// Resolves once stop has been requested.
    ///
    /// Resolves immediately if the request happened before the call. A dropped sender counts as
    /// a stop request.
    ///
    /// # Example
    /// ```rust
    /// use camboot_core::spawn_service;
    ///
    /// async fn run_service() {
    ///     let service_handle = spawn_service(move |mut stop_handle| async move {
    ///         println!("Waiting for shutdown signal...");
    ///         stop_handle.signaled().await;
    ///         println!("Shutdown signal received!");
    ///     });
    ///     service_handle.shutdown().await.unwrap();
    /// }
    /// ```
    pub async fn signaled(&mut self) {
        let _ = self.shutdown_rx.wait_for(|stop| *stop).await;
    }

    pub fn is_signaled(&self) -> bool {
        *self.shutdown_rx.borrow()
    }
}

/// Sending half of a stop request shared by several tasks.
pub(crate) struct StopSignal {
    shutdown_tx: watch::Sender<bool>,
}

impl StopSignal {
    pub(crate) fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self { shutdown_tx }
    }

    pub(crate) fn handle(&self) -> StopHandle {
        StopHandle::new(self.shutdown_tx.subscribe())
    }

    pub(crate) fn signal(&self) {
        self.shutdown_tx.send_replace(true);
    }
}

/// Handle of a background service task that supports cooperative shutdown.
pub struct ServiceHandle {
    join: JoinHandle<()>,
    stop: StopSignal,
}

impl ServiceHandle {
    fn new(join: JoinHandle<()>, stop: StopSignal) -> Self {
        Self { join, stop }
    }

    /// Another handle observing this service's stop request.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.handle()
    }

    /// Request cooperative shutdown signal without awaiting task completion.
    pub fn request_shutdown(&mut self) {
        self.stop.signal();
    }

    /// Await task completion without sending a shutdown signal.
    pub async fn await_join(self) -> Result<(), tokio::task::JoinError> {
        self.join.await
    }

    /// Request cooperative shutdown and await task completion.
    pub async fn shutdown(mut self) -> Result<(), tokio::task::JoinError> {
        self.request_shutdown();
        self.await_join().await
    }
}

/// Spawn a background service task with a standard stop mechanism on the current runtime.
///
/// The provided function receives a StopHandle to await for shutdown. The returned ServiceHandle
/// allows triggering a cooperative shutdown.
pub fn spawn_service<Fut, Func>(f: Func) -> ServiceHandle
where
    Fut: Future<Output=()> + Send + 'static,
    Func: FnOnce(StopHandle) -> Fut + Send + 'static,
{
    spawn_service_on(&Handle::current(), f)
}

/// Same as [`spawn_service`] but on an explicit runtime, usable from threads outside of it.
pub fn spawn_service_on<Fut, Func>(runtime: &Handle, f: Func) -> ServiceHandle
where
    Fut: Future<Output=()> + Send + 'static,
    Func: FnOnce(StopHandle) -> Fut + Send + 'static,
{
    let stop = StopSignal::new();
    let stop_handle = stop.handle();
    let join = runtime.spawn(async move {
        f(stop_handle).await;
    });
    ServiceHandle::new(join, stop)
}

/// A container for multiple ServiceHandles with a single shutdown method.
#[derive(Default)]
pub struct MultiServiceHandle {
    handles: Vec<ServiceHandle>,
}

impl MultiServiceHandle {
    pub fn new() -> Self { Self::default() }

    pub fn with_capacity(cap: usize) -> Self { Self { handles: Vec::with_capacity(cap) } }

    pub fn add(&mut self, handle: ServiceHandle) { self.handles.push(handle); }

    pub fn len(&self) -> usize { self.handles.len() }

    pub fn is_empty(&self) -> bool { self.handles.is_empty() }

    /// Request shutdown for all services without awaiting them.
    pub fn request_shutdown(&mut self) {
        for h in &mut self.handles {
            h.request_shutdown();
        }
    }

    /// Request shutdown for all services, then await their completion.
    /// Returns Ok(()) if all joins succeed; otherwise returns the first JoinError encountered.
    pub async fn shutdown(mut self) -> Result<(), tokio::task::JoinError> {
        self.request_shutdown();
        let mut first_err: Option<tokio::task::JoinError> = None;
        for h in self.handles.into_iter() {
            if let Err(e) = h.await_join().await {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::time::{sleep, Duration};

    #[tokio::test]
    async fn shutdown_wakes_the_service_and_joins_it() {
        let exited = Arc::new(AtomicBool::new(false));
        let exited_in_task = exited.clone();
        let handle = spawn_service(move |mut stop| async move {
            stop.signaled().await;
            exited_in_task.store(true, Ordering::SeqCst);
        });
        handle.shutdown().await.unwrap();
        assert!(exited.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn late_subscriber_sees_earlier_stop_request() {
        let mut handle = spawn_service(|mut stop| async move { stop.signaled().await });
        handle.request_shutdown();
        let mut late = handle.stop_handle();
        assert!(late.is_signaled());
        late.signaled().await;
        handle.await_join().await.unwrap();
    }

    #[tokio::test]
    async fn multi_handle_stops_every_service() {
        let mut multi = MultiServiceHandle::with_capacity(3);
        for _ in 0..3 {
            multi.add(spawn_service(|mut stop| async move {
                stop.signaled().await;
                sleep(Duration::from_millis(5)).await;
            }));
        }
        assert_eq!(multi.len(), 3);
        multi.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn multi_handle_request_does_not_wait() {
        let mut multi = MultiServiceHandle::new();
        multi.add(spawn_service(|mut stop| async move { stop.signaled().await }));
        let observer = multi.handles[0].stop_handle();
        multi.request_shutdown();
        assert!(observer.is_signaled());
        multi.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn multi_handle_reports_panicked_service() {
        let mut multi = MultiServiceHandle::new();
        multi.add(spawn_service(|_stop| async move { panic!("service failure") }));
        multi.add(spawn_service(|mut stop| async move { stop.signaled().await }));
        let err = multi.shutdown().await.unwrap_err();
        assert!(err.is_panic());
    }
}
