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

//! Change events and the subscriber fan-out.

use std::fmt;

use crate::delta::Delta;

/// Who authored a change. The engine never reconciles histories; the
/// tag lets a host layer operational transforms on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    Local,
    Remote,
}

impl ChangeSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeSource::Local => "local",
            ChangeSource::Remote => "remote",
        }
    }
}

impl fmt::Display for ChangeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One successfully composed change: the document as it was, the change
/// applied to it, and who authored it.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChange {
    pub before: Delta,
    pub change: Delta,
    pub source: ChangeSource,
}

/// Handle returned by [`Document::subscribe`](super::Document::subscribe).
pub type SubscriptionId = usize;

type Listener = Box<dyn Fn(&DocumentChange)>;

/// Synchronous single-producer fan-out: listeners run in registration
/// order, from within compose, after tree and delta agree.
#[derive(Default)]
pub(crate) struct ChangeBus {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: SubscriptionId,
}

impl ChangeBus {
    pub(crate) fn subscribe(
        &mut self,
        listener: impl Fn(&DocumentChange) + 'static,
    ) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub(crate) fn publish(&self, event: &DocumentChange) {
        for (_, listener) in &self.listeners {
            listener(event);
        }
    }
}

impl fmt::Debug for ChangeBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn event() -> DocumentChange {
        let mut before = Delta::new();
        before.insert("\n");
        let mut change = Delta::new();
        change.insert("a");
        DocumentChange {
            before,
            change,
            source: ChangeSource::Local,
        }
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut bus = ChangeBus::default();
        for tag in ["first", "second", "third"] {
            let order = Rc::clone(&order);
            bus.subscribe(move |_| order.borrow_mut().push(tag));
        }
        bus.publish(&event());
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn unsubscribe_removes_exactly_one_listener() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = ChangeBus::default();
        let kept = {
            let count = Rc::clone(&count);
            bus.subscribe(move |_| *count.borrow_mut() += 1)
        };
        let dropped = {
            let count = Rc::clone(&count);
            bus.subscribe(move |_| *count.borrow_mut() += 10)
        };
        assert!(bus.unsubscribe(dropped));
        assert!(!bus.unsubscribe(dropped));
        bus.publish(&event());
        assert_eq!(*count.borrow(), 1);
        let _ = kept;
    }

    #[test]
    fn source_tags_render_for_hosts() {
        assert_eq!(ChangeSource::Local.to_string(), "local");
        assert_eq!(ChangeSource::Remote.as_str(), "remote");
    }
}
