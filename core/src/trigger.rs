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

/// Reason for a reaction pass, "re-check devices now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Issued once right after the controller enters `Running`.
    Startup,
    /// A device arrival notification after its settle delay elapsed.
    ArrivalNotification,
    /// Periodic re-scan for arrivals that were missed.
    PollTick,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Startup => write!(f, "startup"),
            Trigger::ArrivalNotification => write!(f, "arrival notification"),
            Trigger::PollTick => write!(f, "poll tick"),
        }
    }
}
