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

//! Delete rules, in pipeline order.

use crate::delta::{Delta, DeltaIterator};
use crate::style::Style;

use super::{is_line_embed, DeleteRule, RuleContext};

/// The document's final `'\n'` may never be deleted. A range covering
/// it is clamped to stop before it; a deletion reduced to nothing is
/// vetoed with an empty change.
pub struct EnsureTrailingNewlineRule;

impl DeleteRule for EnsureTrailingNewlineRule {
    fn apply(
        &self,
        _ctx: &RuleContext<'_>,
        document: &Delta,
        index: usize,
        len: usize,
    ) -> Option<Delta> {
        let total = document.len();
        if index + len < total {
            return None;
        }
        let clamped = (total - 1).saturating_sub(index);
        let mut result = Delta::new();
        if clamped > 0 {
            result.retain(index);
            result.delete(clamped);
        }
        Some(result)
    }
}

/// Keeps line-placed embeds alone on their line: a deletion that would
/// merge an embed's line with a neighbour is shifted or shrunk so the
/// embed keeps its own line. Deleting the empty line after an embed is
/// still allowed.
pub struct EnsureEmbedLineRule;

impl DeleteRule for EnsureEmbedLineRule {
    fn apply(
        &self,
        ctx: &RuleContext<'_>,
        document: &Delta,
        index: usize,
        len: usize,
    ) -> Option<Delta> {
        let mut iter = DeltaIterator::new(document);
        let previous = iter.skip(index);

        let mut start_shift = 0usize;
        let mut length_shift = 0isize;
        let mut remaining = len;
        let mut found = false;

        // The range starts at the newline terminating an embed's line.
        // That newline is never deleted; the deletion shifts past it.
        if previous.as_ref().map_or(false, |op| is_line_embed(ctx, op)) {
            found = true;
            if remaining > 0 {
                let candidate = iter.take(1);
                remaining -= 1;
                if candidate.starts_with('\n') {
                    start_shift += 1;
                    length_shift -= 1;
                    if remaining == 0 {
                        // A single-character delete retargets to the
                        // empty line after the embed, when there is one.
                        let mut peek = iter.clone();
                        if peek.take(1).starts_with('\n') {
                            length_shift += 1;
                        }
                    }
                }
            }
        }

        // The range ends with the newline just before an embed's line.
        let before_end = iter.skip(remaining);
        if before_end.as_ref().map_or(false, |op| op.ends_with('\n')) {
            if let Some(candidate) = iter.next_op() {
                if is_line_embed(ctx, &candidate) {
                    found = true;
                    length_shift -= 1;
                }
            }
        }

        if !found {
            return None;
        }
        let length = len
            .saturating_add_signed(length_shift)
            .min(document.len().saturating_sub(index + start_shift));
        let mut result = Delta::new();
        if length > 0 {
            result.retain(index + start_shift);
            result.delete(length);
        }
        Some(result)
    }
}

/// Deleting a newline merges two lines; the deleted newline's line
/// style wins on the merged result, and attributes only the surviving
/// newline carried are unset so the merge never coerces the remainder
/// into a block it was not part of.
pub struct PreserveLineStyleOnMergeRule;

impl DeleteRule for PreserveLineStyleOnMergeRule {
    fn apply(
        &self,
        _ctx: &RuleContext<'_>,
        document: &Delta,
        index: usize,
        len: usize,
    ) -> Option<Delta> {
        let mut iter = DeltaIterator::new(document);
        iter.skip(index);
        let target = iter.take(1);
        if !target.starts_with('\n') {
            return None;
        }
        iter.skip(len - 1);

        let mut result = Delta::new();
        result.retain(index);
        result.delete(len);

        let target_style = target.attributes().cloned().unwrap_or_default();
        while let Some(op) = iter.next_op() {
            match op.newline_index() {
                None => {
                    result.retain(op.len());
                }
                Some(newline_at) => {
                    let mut attributes = Style::new();
                    if let Some(existing) = op.attributes() {
                        for attribute in existing.values() {
                            attributes = attributes.put(attribute.unset());
                        }
                    }
                    for attribute in target_style.values() {
                        attributes = attributes.put(attribute.clone());
                    }
                    result.retain(newline_at);
                    if !attributes.is_empty() {
                        result.retain_with(1, attributes);
                    }
                    break;
                }
            }
        }
        Some(result)
    }
}

/// Unconditional fallback: apply the deletion literally.
pub struct CatchAllDeleteRule;

impl DeleteRule for CatchAllDeleteRule {
    fn apply(
        &self,
        _ctx: &RuleContext<'_>,
        _document: &Delta,
        index: usize,
        len: usize,
    ) -> Option<Delta> {
        let mut result = Delta::new();
        result.retain(index);
        result.delete(len);
        Some(result)
    }
}
