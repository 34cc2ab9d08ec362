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

//! Heuristic edit rules.
//!
//! Every edit intent is rewritten by an ordered pipeline of rules, each
//! a pure function from the current document delta and the intent to an
//! optional change delta. The first rule to return a change wins; the
//! fallback pipelines end in a catch-all so rewriting always
//! terminates. A pipeline that runs dry is a programmer error (a custom
//! rule list without a catch-all).

mod delete;
mod format;
mod insert;
mod insert_object;

pub use delete::{
    CatchAllDeleteRule, EnsureEmbedLineRule, EnsureTrailingNewlineRule,
    PreserveLineStyleOnMergeRule,
};
pub use format::{
    FormatLinkAtCaretRule, ResolveInlineFormatRule, ResolveLineFormatRule,
};
pub use insert::{
    AutoExitBlockRule, AutoFormatLinksRule, CatchAllInsertRule,
    ForceNewlineAroundEmbedRule, PreserveBlockStyleOnInsertRule,
    PreserveInlineStylesRule, PreserveLineStyleOnSplitRule,
    ResetLineFormatOnNewLineRule,
};
pub use insert_object::{CatchAllInsertObjectRule, PlaceEmbedOnOwnLineRule};

use serde_json::Value;
use tracing::trace;

use crate::attributes::{Attribute, AttributeRegistry};
use crate::delta::{Delta, DeltaIterator, Op};
use crate::embed::{EmbedPlacement, EmbedRegistry, EmbedType};
use crate::error::{DocumentError, Result};
use crate::style::Style;

/// Read-only registries handed to every rule invocation.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub attributes: &'a AttributeRegistry,
    pub embeds: &'a EmbedRegistry,
}

/// Rewrites a text insertion into a change delta.
pub trait InsertRule: Send + Sync {
    fn apply(
        &self,
        ctx: &RuleContext<'_>,
        document: &Delta,
        index: usize,
        text: &str,
    ) -> Option<Delta>;
}

/// Rewrites an embed insertion into a change delta.
pub trait InsertObjectRule: Send + Sync {
    fn apply(
        &self,
        ctx: &RuleContext<'_>,
        document: &Delta,
        index: usize,
        embed: &EmbedType,
        value: &Value,
        style: &Style,
    ) -> Option<Delta>;
}

/// Rewrites a format intent into a change delta.
pub trait FormatRule: Send + Sync {
    fn apply(
        &self,
        ctx: &RuleContext<'_>,
        document: &Delta,
        index: usize,
        len: usize,
        attribute: &Attribute,
    ) -> Option<Delta>;
}

/// Rewrites a deletion into a change delta.
pub trait DeleteRule: Send + Sync {
    fn apply(
        &self,
        ctx: &RuleContext<'_>,
        document: &Delta,
        index: usize,
        len: usize,
    ) -> Option<Delta>;
}

/// The four ordered rule pipelines.
pub struct RuleSet {
    insert: Vec<Box<dyn InsertRule>>,
    insert_object: Vec<Box<dyn InsertObjectRule>>,
    format: Vec<Box<dyn FormatRule>>,
    delete: Vec<Box<dyn DeleteRule>>,
}

impl RuleSet {
    /// The fallback pipelines. Order matters: the first matching rule
    /// wins, and each list ends in a catch-all.
    pub fn fallback() -> RuleSet {
        RuleSet {
            insert: vec![
                Box::new(PreserveBlockStyleOnInsertRule),
                Box::new(ForceNewlineAroundEmbedRule),
                Box::new(PreserveLineStyleOnSplitRule),
                Box::new(AutoExitBlockRule),
                Box::new(ResetLineFormatOnNewLineRule),
                Box::new(AutoFormatLinksRule),
                Box::new(PreserveInlineStylesRule),
                Box::new(CatchAllInsertRule),
            ],
            insert_object: vec![
                Box::new(PlaceEmbedOnOwnLineRule),
                Box::new(CatchAllInsertObjectRule),
            ],
            format: vec![
                Box::new(FormatLinkAtCaretRule),
                Box::new(ResolveLineFormatRule),
                Box::new(ResolveInlineFormatRule),
            ],
            delete: vec![
                Box::new(EnsureTrailingNewlineRule),
                Box::new(EnsureEmbedLineRule),
                Box::new(PreserveLineStyleOnMergeRule),
                Box::new(CatchAllDeleteRule),
            ],
        }
    }

    /// Custom pipelines. Each list must still end in a catch-all or
    /// edits it fails to match abort with
    /// [`DocumentError::RulesExhausted`].
    pub fn new(
        insert: Vec<Box<dyn InsertRule>>,
        insert_object: Vec<Box<dyn InsertObjectRule>>,
        format: Vec<Box<dyn FormatRule>>,
        delete: Vec<Box<dyn DeleteRule>>,
    ) -> RuleSet {
        RuleSet {
            insert,
            insert_object,
            format,
            delete,
        }
    }

    pub(crate) fn apply_insert(
        &self,
        ctx: &RuleContext<'_>,
        document: &Delta,
        index: usize,
        text: &str,
    ) -> Result<Delta> {
        for (position, rule) in self.insert.iter().enumerate() {
            if let Some(mut change) = rule.apply(ctx, document, index, text) {
                change.trim();
                trace!(rule = position, index, "insert rule matched");
                return Ok(change);
            }
        }
        Err(DocumentError::RulesExhausted { pipeline: "insert" })
    }

    pub(crate) fn apply_insert_object(
        &self,
        ctx: &RuleContext<'_>,
        document: &Delta,
        index: usize,
        embed: &EmbedType,
        value: &Value,
        style: &Style,
    ) -> Result<Delta> {
        for (position, rule) in self.insert_object.iter().enumerate() {
            if let Some(mut change) =
                rule.apply(ctx, document, index, embed, value, style)
            {
                change.trim();
                trace!(rule = position, index, "insert-object rule matched");
                return Ok(change);
            }
        }
        Err(DocumentError::RulesExhausted {
            pipeline: "insert-object",
        })
    }

    pub(crate) fn apply_format(
        &self,
        ctx: &RuleContext<'_>,
        document: &Delta,
        index: usize,
        len: usize,
        attribute: &Attribute,
    ) -> Result<Delta> {
        for (position, rule) in self.format.iter().enumerate() {
            if let Some(mut change) =
                rule.apply(ctx, document, index, len, attribute)
            {
                change.trim();
                trace!(rule = position, index, len, "format rule matched");
                return Ok(change);
            }
        }
        Err(DocumentError::RulesExhausted { pipeline: "format" })
    }

    pub(crate) fn apply_delete(
        &self,
        ctx: &RuleContext<'_>,
        document: &Delta,
        index: usize,
        len: usize,
    ) -> Result<Delta> {
        for (position, rule) in self.delete.iter().enumerate() {
            if let Some(mut change) = rule.apply(ctx, document, index, len) {
                change.trim();
                trace!(rule = position, index, len, "delete rule matched");
                return Ok(change);
            }
        }
        Err(DocumentError::RulesExhausted { pipeline: "delete" })
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::fallback()
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("insert", &self.insert.len())
            .field("insert_object", &self.insert_object.len())
            .field("format", &self.format.len())
            .field("delete", &self.delete.len())
            .finish()
    }
}

/// Scan forward to the op containing the next `'\n'`. Returns that op
/// and the number of characters skipped before it.
pub(crate) fn find_next_newline(
    iter: &mut DeltaIterator<'_>,
) -> (Option<Op>, usize) {
    let mut skipped = 0;
    while let Some(op) = iter.next_op() {
        if op.contains('\n') {
            return (Some(op), skipped);
        }
        skipped += op.len();
    }
    (None, skipped)
}

/// Whether `op` inserts a line-placed embed.
pub(crate) fn is_line_embed(ctx: &RuleContext<'_>, op: &Op) -> bool {
    if let Op::InsertObject { key, value, .. } = op {
        ctx.embeds
            .get(key, value)
            .map_or(false, |embed| embed.placement() == EmbedPlacement::Line)
    } else {
        false
    }
}
