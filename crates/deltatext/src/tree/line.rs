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

//! A run of leaves terminated by an implicit `'\n'`.

use crate::delta::Delta;
use crate::embed::EMBED_PLACEHOLDER;
use crate::style::Style;

use super::leaf::Leaf;

/// One line of the document.
///
/// The line's length includes its terminating newline; `style` is the
/// style carried by that newline (the line style plus any transient
/// markers already compacted away).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    pub(crate) style: Style,
    pub(crate) leaves: Vec<Leaf>,
}

impl Line {
    pub fn new(style: Style) -> Line {
        Line {
            style,
            leaves: Vec::new(),
        }
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    /// Length of the content, excluding the terminating newline.
    pub fn text_len(&self) -> usize {
        self.leaves.iter().map(Leaf::len).sum()
    }

    /// Length including the terminating newline.
    pub fn len(&self) -> usize {
        self.text_len() + 1
    }

    /// Whether the line has no content (just the newline).
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Emit this line's ops: one insert per leaf plus the newline.
    pub fn to_delta(&self, delta: &mut Delta) {
        for leaf in &self.leaves {
            match leaf {
                Leaf::Text { text, style } => {
                    delta.insert_with(text.clone(), style.clone());
                }
                Leaf::Embed {
                    embed,
                    value,
                    style,
                } => {
                    delta.insert_object(embed.key(), value.clone(), style.clone());
                }
            }
        }
        delta.insert_with("\n", self.style.clone());
    }

    pub(crate) fn plain_text(&self, out: &mut String) {
        for leaf in &self.leaves {
            match leaf {
                Leaf::Text { text, .. } => out.push_str(text),
                Leaf::Embed { .. } => out.push(EMBED_PLACEHOLDER),
            }
        }
        out.push('\n');
    }

    /// Split the leaves at content offset `local` and return the tail.
    pub(crate) fn split_leaves_at(&mut self, local: usize) -> Vec<Leaf> {
        let mut acc = 0;
        let mut split_index = self.leaves.len();
        let mut carry = None;
        for (i, leaf) in self.leaves.iter_mut().enumerate() {
            if local == acc {
                split_index = i;
                break;
            }
            let end = acc + leaf.len();
            if local < end {
                match leaf {
                    Leaf::Text { text, style } => {
                        let byte = char_to_byte(text, local - acc);
                        let tail = text.split_off(byte);
                        carry = Some(Leaf::text(tail, style.clone()));
                    }
                    // An embed has length 1, so a split can only land on
                    // its edges, which the boundary checks already cover.
                    Leaf::Embed { .. } => {}
                }
                split_index = i + 1;
                break;
            }
            acc = end;
        }
        let mut tail = self.leaves.split_off(split_index);
        if let Some(leaf) = carry {
            tail.insert(0, leaf);
        }
        tail
    }

    pub(crate) fn insert_leaf(&mut self, local: usize, leaf: Leaf) {
        let tail = self.split_leaves_at(local);
        self.leaves.push(leaf);
        self.leaves.extend(tail);
        self.normalize();
    }

    pub(crate) fn insert_text(&mut self, local: usize, text: &str, style: Style) {
        self.insert_leaf(local, Leaf::text(text, style));
    }

    pub(crate) fn prepend_leaves(&mut self, mut leaves: Vec<Leaf>) {
        leaves.extend(self.leaves.drain(..));
        self.leaves = leaves;
        self.normalize();
    }

    /// Delete `len` characters of content starting at `local`.
    pub(crate) fn delete_range(&mut self, local: usize, len: usize) {
        let tail = self.split_leaves_at(local);
        let mut remaining = len;
        for mut leaf in tail {
            if remaining == 0 {
                self.leaves.push(leaf);
                continue;
            }
            let leaf_len = leaf.len();
            if leaf_len <= remaining {
                remaining -= leaf_len;
                continue;
            }
            if let Leaf::Text { text, .. } = &mut leaf {
                let byte = char_to_byte(text, remaining);
                text.drain(..byte);
            }
            remaining = 0;
            self.leaves.push(leaf);
        }
        self.normalize();
    }

    /// Merge `style` into every leaf covering `[local, local + len)`,
    /// splitting leaves at the range edges.
    pub(crate) fn apply_inline(&mut self, local: usize, len: usize, style: &Style) {
        let tail = self.split_leaves_at(local);
        let mut remaining = len;
        for mut leaf in tail {
            if remaining == 0 {
                self.leaves.push(leaf);
                continue;
            }
            let leaf_len = leaf.len();
            if leaf_len <= remaining {
                remaining -= leaf_len;
                leaf.set_style(leaf.style().merge_all(style));
                self.leaves.push(leaf);
                continue;
            }
            // Partial coverage: split the leaf, restyle the head.
            if let Leaf::Text { text, style: leaf_style } = &mut leaf {
                let byte = char_to_byte(text, remaining);
                let tail_text = text.split_off(byte);
                let tail_leaf = Leaf::text(tail_text, leaf_style.clone());
                leaf.set_style(leaf.style().merge_all(style));
                self.leaves.push(leaf);
                self.leaves.push(tail_leaf);
            } else {
                self.leaves.push(leaf);
            }
            remaining = 0;
        }
        self.normalize();
    }

    /// Drop empty text leaves and merge adjacent text leaves that share
    /// a style.
    pub(crate) fn normalize(&mut self) {
        let mut merged: Vec<Leaf> = Vec::with_capacity(self.leaves.len());
        for leaf in std::mem::take(&mut self.leaves) {
            if let Leaf::Text { text, style } = &leaf {
                if text.is_empty() {
                    continue;
                }
                if let Some(Leaf::Text {
                    text: previous,
                    style: previous_style,
                }) = merged.last_mut()
                {
                    if previous_style == style {
                        previous.push_str(text);
                        continue;
                    }
                }
            }
            merged.push(leaf);
        }
        self.leaves = merged;
    }
}

/// Byte offset of the `idx`-th character of `s`.
pub(crate) fn char_to_byte(s: &str, idx: usize) -> usize {
    s.char_indices().nth(idx).map_or(s.len(), |(byte, _)| byte)
}
