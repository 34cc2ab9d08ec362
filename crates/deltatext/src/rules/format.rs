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

//! Format rules, in pipeline order.

use crate::attributes::{keys, Attribute, AttributeScope};
use crate::delta::{Delta, DeltaIterator, Op};
use crate::style::Style;

use super::{FormatRule, RuleContext};

/// Applying `link` at a collapsed caret re-formats the whole link run
/// around the caret to the new value.
pub struct FormatLinkAtCaretRule;

impl FormatRule for FormatLinkAtCaretRule {
    fn apply(
        &self,
        _ctx: &RuleContext<'_>,
        document: &Delta,
        index: usize,
        len: usize,
        attribute: &Attribute,
    ) -> Option<Delta> {
        if attribute.key() != keys::LINK || len != 0 {
            return None;
        }
        let mut iter = DeltaIterator::new(document);
        let previous = iter.skip(index);
        let target = iter.next_op();

        let mut start = index;
        let mut run = 0;
        if let Some(op) = previous {
            if op.has_attribute(keys::LINK) {
                start -= op.len();
                run += op.len();
            }
        }
        if let Some(op) = target {
            if op.has_attribute(keys::LINK) {
                run += op.len();
            }
        }
        if run == 0 {
            return None;
        }
        let mut result = Delta::new();
        result.retain(start);
        result.retain_with(run, Style::single(attribute.clone()));
        Some(result)
    }
}

/// Line-scoped attributes format newlines: every `'\n'` inside the
/// range plus the one terminating the line the range ends on, so a
/// zero-length format anywhere on a line formats that line. Any other
/// set line-scoped attribute on a target newline is unset.
pub struct ResolveLineFormatRule;

impl ResolveLineFormatRule {
    fn newline_attributes(op: &Op, attribute: &Attribute) -> Style {
        let mut style = Style::new();
        if let Some(existing) = op.attributes() {
            for other in existing.values() {
                if other.is_line() && !other.is_unset() && other.key() != attribute.key()
                {
                    style = style.put(other.unset());
                }
            }
        }
        style.put(attribute.clone())
    }
}

impl FormatRule for ResolveLineFormatRule {
    fn apply(
        &self,
        _ctx: &RuleContext<'_>,
        document: &Delta,
        index: usize,
        len: usize,
        attribute: &Attribute,
    ) -> Option<Delta> {
        if attribute.scope() != AttributeScope::Line {
            return None;
        }
        let mut result = Delta::new();
        result.retain(index);
        let mut iter = DeltaIterator::new(document);
        iter.skip(index);

        let mut current = 0;
        while current < len && iter.has_next() {
            let op = iter.take(len - current);
            current += op.len();
            match op.text() {
                Some(text) if text.contains('\n') => {
                    let parts: Vec<&str> = text.split('\n').collect();
                    for (position, part) in parts.iter().enumerate() {
                        result.retain(part.chars().count());
                        if position < parts.len() - 1 {
                            result.retain_with(
                                1,
                                Self::newline_attributes(&op, attribute),
                            );
                        }
                    }
                }
                _ => {
                    result.retain(op.len());
                }
            }
        }

        // Continue to the newline terminating the last touched line.
        while let Some(op) = iter.next_op() {
            match op.newline_index() {
                None => {
                    result.retain(op.len());
                }
                Some(newline_at) => {
                    result.retain(newline_at);
                    result.retain_with(1, Self::newline_attributes(&op, attribute));
                    break;
                }
            }
        }
        Some(result)
    }
}

/// Inline-scoped attributes format every non-newline character of the
/// range; newlines pass through unformatted.
pub struct ResolveInlineFormatRule;

impl FormatRule for ResolveInlineFormatRule {
    fn apply(
        &self,
        _ctx: &RuleContext<'_>,
        document: &Delta,
        index: usize,
        len: usize,
        attribute: &Attribute,
    ) -> Option<Delta> {
        if attribute.scope() != AttributeScope::Inline {
            return None;
        }
        let mut result = Delta::new();
        result.retain(index);
        let mut iter = DeltaIterator::new(document);
        iter.skip(index);

        let mut current = 0;
        while current < len && iter.has_next() {
            let op = iter.take(len - current);
            current += op.len();
            match op.text() {
                Some(text) if text.contains('\n') => {
                    let parts: Vec<&str> = text.split('\n').collect();
                    for (position, part) in parts.iter().enumerate() {
                        result.retain_with(
                            part.chars().count(),
                            Style::single(attribute.clone()),
                        );
                        if position < parts.len() - 1 {
                            result.retain(1);
                        }
                    }
                }
                _ => {
                    result.retain_with(op.len(), Style::single(attribute.clone()));
                }
            }
        }
        Some(result)
    }
}
