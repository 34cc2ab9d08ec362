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

//! Lockstep composition of a change into the tree and the delta.

use tracing::debug;

use crate::delta::{Delta, Op};
use crate::error::{DocumentError, Result};

use super::change::{ChangeSource, DocumentChange};
use super::Document;

impl Document {
    /// Compose a change into the document.
    ///
    /// Walks the change with a running offset, dispatching each op to
    /// the tree, composes the change into the stored delta, and checks
    /// that `root.to_delta()` equals the result before anything is
    /// published. On any failure both representations are restored to
    /// the pre-change snapshot. Exactly one [`DocumentChange`] is
    /// emitted per successful call, synchronously, after consistency is
    /// established.
    pub fn compose(&mut self, change: &Delta, source: ChangeSource) -> Result<()> {
        self.ensure_open()?;
        if self.composing {
            return Err(DocumentError::ReentrantEdit);
        }
        let mut change = change.clone();
        change.trim();
        if change.is_empty() {
            return Err(DocumentError::EmptyChange);
        }
        let affected = change.base_len();
        if affected > self.len() {
            return Err(DocumentError::ChangeTooLong {
                affected,
                length: self.len(),
            });
        }

        self.composing = true;
        let before = self.delta.clone();
        let snapshot = self.root.clone();
        let outcome = self.apply_to_tree(&change).and_then(|()| {
            self.delta = before.compose(&change);
            if self.root.to_delta() != self.delta {
                return Err(DocumentError::TreeDivergence {
                    stage: source.as_str(),
                    change: change.to_json(),
                });
            }
            Ok(())
        });

        match outcome {
            Ok(()) => {
                debug!(%source, len = self.delta.len(), "composed change");
                let event = DocumentChange {
                    before,
                    change,
                    source,
                };
                self.bus.publish(&event);
                self.composing = false;
                Ok(())
            }
            Err(error) => {
                self.delta = before;
                self.root = snapshot;
                self.composing = false;
                Err(error)
            }
        }
    }

    fn apply_to_tree(&mut self, change: &Delta) -> Result<()> {
        let mut offset = 0;
        for op in change.ops() {
            match op {
                Op::Retain { len, attributes } => {
                    if !attributes.is_empty() {
                        self.root.retain(offset, *len, attributes);
                    }
                    offset += len;
                }
                Op::Insert { text, attributes } => {
                    self.root.insert(offset, text, attributes);
                    offset += op.len();
                }
                Op::InsertObject {
                    key,
                    value,
                    attributes,
                } => {
                    let embed = self.embeds.get(key, value)?;
                    self.root
                        .insert_object(offset, embed, value.clone(), attributes.clone());
                    offset += 1;
                }
                Op::Delete { len } => {
                    self.root.delete(offset, *len);
                }
            }
        }
        Ok(())
    }
}
