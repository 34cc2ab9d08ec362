// Copyright 2026 The Matrix.org Foundation C.I.C.
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

//! The document controller.
//!
//! [`Document`] owns the flat delta and the tree, routes every edit
//! intent through the heuristic rules, composes the resulting change
//! into both representations in lockstep, and fans the change out to
//! subscribers.

mod base;
mod change;
mod compose;
mod edits;

pub use base::Document;
pub use change::{ChangeSource, DocumentChange, SubscriptionId};
