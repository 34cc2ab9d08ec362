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

//! Insert-object rules, in pipeline order.

use serde_json::Value;

use crate::delta::{Delta, DeltaIterator};
use crate::embed::{EmbedPlacement, EmbedType};
use crate::style::Style;

use super::{find_next_newline, InsertObjectRule, RuleContext};

/// A line-placed embed gets a line of its own: on an empty line it goes
/// in as-is, anywhere else the line is split around it.
pub struct PlaceEmbedOnOwnLineRule;

impl InsertObjectRule for PlaceEmbedOnOwnLineRule {
    fn apply(
        &self,
        _ctx: &RuleContext<'_>,
        document: &Delta,
        index: usize,
        embed: &EmbedType,
        value: &Value,
        style: &Style,
    ) -> Option<Delta> {
        if embed.placement() != EmbedPlacement::Line {
            return None;
        }
        let mut iter = DeltaIterator::new(document);
        let previous = iter.skip(index);
        let target = iter.next_op();
        let newline_before = previous.map_or(true, |op| op.ends_with('\n'));
        let newline_after = target.map_or(false, |op| op.starts_with('\n'));

        let mut result = Delta::new();
        result.retain(index);
        if !newline_before {
            // Terminate the first half of the split line with the
            // line's own style.
            let mut scan = DeltaIterator::new(document);
            scan.skip(index);
            let (newline_op, _) = find_next_newline(&mut scan);
            let line_style = newline_op
                .and_then(|op| op.attributes().cloned())
                .unwrap_or_default();
            result.insert_with("\n", line_style);
        }
        result.insert_object(embed.key(), value.clone(), style.clone());
        if !newline_after {
            result.insert("\n");
        }
        Some(result)
    }
}

/// Unconditional fallback: insert the embed as-is with the provided
/// inline style.
pub struct CatchAllInsertObjectRule;

impl InsertObjectRule for CatchAllInsertObjectRule {
    fn apply(
        &self,
        _ctx: &RuleContext<'_>,
        _document: &Delta,
        index: usize,
        embed: &EmbedType,
        value: &Value,
        style: &Style,
    ) -> Option<Delta> {
        let mut result = Delta::new();
        result.retain(index);
        result.insert_object(embed.key(), value.clone(), style.clone());
        Some(result)
    }
}
