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

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Lifecycle state of a controller instance.
///
/// Moves strictly forward: `Stopped -> Starting -> Running -> StoppingRequested -> Stopped`.
/// `Starting -> Stopped` is only taken when start-up setup fails.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Stopped = 0,
    Starting = 1,
    Running = 2,
    StoppingRequested = 3,
}

impl RunState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => RunState::Starting,
            2 => RunState::Running,
            3 => RunState::StoppingRequested,
            _ => RunState::Stopped,
        }
    }

    /// Whether `self -> next` is an edge of the lifecycle state machine.
    pub fn can_transition_to(self, next: RunState) -> bool {
        matches!(
            (self, next),
            (RunState::Stopped, RunState::Starting)
                | (RunState::Starting, RunState::Running)
                | (RunState::Starting, RunState::Stopped)
                | (RunState::Running, RunState::StoppingRequested)
                | (RunState::StoppingRequested, RunState::Stopped)
        )
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Stopped => write!(f, "stopped"),
            RunState::Starting => write!(f, "starting"),
            RunState::Running => write!(f, "running"),
            RunState::StoppingRequested => write!(f, "stopping"),
        }
    }
}

/// Run state shared between the lifecycle controller and every trigger handler.
#[derive(Debug, Clone, Default)]
pub struct SharedRunState {
    state: Arc<AtomicU8>,
}

impl SharedRunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> RunState {
        RunState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_running(&self) -> bool {
        self.get() == RunState::Running
    }

    /// Atomically moves from `from` to `to`.
    ///
    /// Fails with the state actually observed when the current state is not `from`, or when
    /// `from -> to` is not a lifecycle edge.
    pub(crate) fn transition(&self, from: RunState, to: RunState) -> Result<(), RunState> {
        if !from.can_transition_to(to) {
            return Err(self.get());
        }
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(RunState::from_u8)
    }

    /// Follows `path` edge by edge from the current state, stopping at the first illegal edge.
    pub(crate) fn walk(&self, path: &[RunState]) -> Result<(), RunState> {
        for &next in path {
            self.transition(self.get(), next)?;
        }
        Ok(())
    }
}
