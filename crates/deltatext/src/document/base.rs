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

//! Document construction, queries and lifecycle.

use std::fmt;
use std::sync::Arc;

use crate::attributes::AttributeRegistry;
use crate::delta::{Delta, DeltaIterator, Op};
use crate::embed::EmbedRegistry;
use crate::error::{DocumentError, Result};
use crate::rules::RuleSet;
use crate::style::Style;
use crate::tree::{Lookup, Root};

use super::change::{ChangeBus, DocumentChange, SubscriptionId};

/// A structured, attributed text document.
///
/// The document owns exactly one [`Root`] tree and the equivalent flat
/// [`Delta`] from construction to [`close`](Self::close); only
/// [`compose`](Self::compose) mutates them, and it keeps them in
/// lockstep. The engine is single-threaded and synchronous: every edit
/// either commits both representations and emits exactly one change, or
/// fails and leaves the document untouched.
pub struct Document {
    pub(super) delta: Delta,
    pub(super) root: Root,
    pub(super) rules: RuleSet,
    pub(super) attributes: Arc<AttributeRegistry>,
    pub(super) embeds: Arc<EmbedRegistry>,
    pub(super) bus: ChangeBus,
    pub(super) composing: bool,
    pub(super) closed: bool,
}

impl Document {
    /// An empty document (`"\n"`) with the fallback registries and
    /// rules.
    pub fn new() -> Document {
        let mut delta = Delta::new();
        delta.insert("\n");
        Self::with_registries(
            delta,
            Arc::new(AttributeRegistry::fallback()),
            Arc::new(EmbedRegistry::fallback()),
        )
        .expect("the empty document is well-formed")
    }

    /// Load a document delta with the fallback registries.
    pub fn from_delta(delta: Delta) -> Result<Document> {
        Self::with_registries(
            delta,
            Arc::new(AttributeRegistry::fallback()),
            Arc::new(EmbedRegistry::fallback()),
        )
    }

    /// Decode and load a JSON document with the fallback registries.
    pub fn from_json(json: &str) -> Result<Document> {
        let attributes = Arc::new(AttributeRegistry::fallback());
        let delta = Delta::from_json(json, &attributes)?;
        Self::with_registries(delta, attributes, Arc::new(EmbedRegistry::fallback()))
    }

    /// Load a document delta against host-provided registries.
    pub fn with_registries(
        delta: Delta,
        attributes: Arc<AttributeRegistry>,
        embeds: Arc<EmbedRegistry>,
    ) -> Result<Document> {
        if !delta.is_document() {
            let reason = if delta.ops().iter().all(Op::is_insert) {
                "content does not end with a newline"
            } else {
                "contains non-insert operations"
            };
            return Err(DocumentError::InvalidDocument {
                reason: reason.to_string(),
            });
        }
        let root = Self::load_tree(&delta, Arc::clone(&attributes), &embeds)?;
        if root.to_delta() != delta {
            return Err(DocumentError::InvalidDocument {
                reason: "attributes are not carried by the characters they scope to"
                    .to_string(),
            });
        }
        Ok(Document {
            delta,
            root,
            rules: RuleSet::fallback(),
            attributes,
            embeds,
            bus: ChangeBus::default(),
            composing: false,
            closed: false,
        })
    }

    /// Replace the rule pipelines. Custom lists must keep a catch-all
    /// last.
    pub fn with_rules(mut self, rules: RuleSet) -> Document {
        self.rules = rules;
        self
    }

    pub(super) fn load_tree(
        delta: &Delta,
        attributes: Arc<AttributeRegistry>,
        embeds: &EmbedRegistry,
    ) -> Result<Root> {
        let mut root = Root::new(attributes);
        let mut offset = 0;
        for op in delta.ops() {
            match op {
                Op::Insert { text, attributes } => {
                    root.insert(offset, text, attributes);
                }
                Op::InsertObject {
                    key,
                    value,
                    attributes,
                } => {
                    let embed = embeds.get(key, value)?;
                    root.insert_object(offset, embed, value.clone(), attributes.clone());
                }
                // `is_document` has already rejected these.
                Op::Retain { .. } | Op::Delete { .. } => unreachable!(),
            }
            offset += op.len();
        }
        root.drop_trailing_empty_line();
        Ok(root)
    }

    // ────────────────────────────────────────────────────────────────────
    // Queries
    // ────────────────────────────────────────────────────────────────────

    /// The flat delta. Between edits `root().to_delta()` equals this.
    pub fn delta(&self) -> &Delta {
        &self.delta
    }

    /// The document tree.
    pub fn root(&self) -> &Root {
        &self.root
    }

    /// Document length in characters, including the final newline.
    pub fn len(&self) -> usize {
        self.delta.len()
    }

    /// Whether the document holds nothing but its final newline.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    pub fn attributes(&self) -> &Arc<AttributeRegistry> {
        &self.attributes
    }

    pub fn embeds(&self) -> &Arc<EmbedRegistry> {
        &self.embeds
    }

    /// Plain text: every text insert concatenated, one placeholder
    /// character per embed.
    pub fn to_plain_text(&self) -> String {
        self.root.to_plain_text()
    }

    /// The JSON array form of the document delta.
    pub fn to_json(&self) -> String {
        self.delta.to_json()
    }

    /// Tree descent to the deepest node containing `offset`.
    pub fn lookup(&self, offset: usize, inclusive: bool) -> Option<Lookup<'_>> {
        self.root.lookup(offset, inclusive)
    }

    /// The style effective over `[index, index + len)`: the inline
    /// attributes shared by every character of the range (for a
    /// collapsed range, those of the character before the caret) plus
    /// the line style shared by every line the range touches.
    pub fn collect_style(&self, index: usize, len: usize) -> Result<Style> {
        self.validate_range(index, len)?;
        let mut result = self.collect_inline_style(index, len);
        let lines = self.collect_line_style(index, len);
        result = result.merge_all(&lines);
        Ok(result)
    }

    fn collect_inline_style(&self, index: usize, len: usize) -> Style {
        let mut iter = DeltaIterator::new(&self.delta);
        if len == 0 {
            return match iter.skip(index) {
                Some(op) if op.is_text_insert() && !op.ends_with('\n') => op
                    .attributes()
                    .cloned()
                    .unwrap_or_default()
                    .inline_only(),
                _ => Style::new(),
            };
        }
        iter.skip(index);
        let mut shared: Option<Style> = None;
        let mut current = 0;
        while current < len && iter.has_next() {
            let op = iter.take(len - current);
            current += op.len();
            // Newline-only ops carry line styling, not character
            // styling.
            let is_content = match op.text() {
                Some(text) => text.chars().any(|c| c != '\n'),
                None => op.is_object_insert(),
            };
            if !is_content {
                continue;
            }
            let attributes =
                op.attributes().cloned().unwrap_or_default().inline_only();
            shared = Some(match shared {
                None => attributes,
                Some(previous) => previous.intersect(&attributes),
            });
        }
        shared.unwrap_or_default()
    }

    fn collect_line_style(&self, index: usize, len: usize) -> Style {
        let mut iter = DeltaIterator::new(&self.delta);
        iter.skip(index);
        // The last line the range touches is the one holding its final
        // covered character (the caret's line for a collapsed range);
        // its terminator is the first newline at or past the cutoff.
        let cutoff = index + len.saturating_sub(1);
        let mut position = index;
        let mut shared: Option<Style> = None;
        'scan: while let Some(op) = iter.next_op() {
            let Some(text) = op.text() else {
                position += op.len();
                continue;
            };
            for ch in text.chars() {
                if ch == '\n' {
                    let style = op
                        .attributes()
                        .cloned()
                        .unwrap_or_default()
                        .line_only();
                    shared = Some(match shared {
                        None => style,
                        Some(previous) => previous.intersect(&style),
                    });
                    if position >= cutoff {
                        break 'scan;
                    }
                }
                position += 1;
            }
        }
        shared.unwrap_or_default()
    }

    // ────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ────────────────────────────────────────────────────────────────────

    /// Mark the document read-only; all further edits fail.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Register a change listener; it runs synchronously after every
    /// composed change, in registration order.
    pub fn subscribe(
        &mut self,
        listener: impl Fn(&DocumentChange) + 'static,
    ) -> SubscriptionId {
        self.bus.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    // ────────────────────────────────────────────────────────────────────
    // Validation
    // ────────────────────────────────────────────────────────────────────

    pub(super) fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(DocumentError::Closed);
        }
        Ok(())
    }

    /// An insertion point must fall before the final newline.
    pub(super) fn validate_position(&self, index: usize) -> Result<()> {
        if index >= self.len() {
            return Err(DocumentError::IndexOutOfRange {
                index,
                length: self.len(),
            });
        }
        Ok(())
    }

    /// A range must lie within the document; zero lengths are allowed.
    pub(super) fn validate_range(&self, index: usize, len: usize) -> Result<()> {
        let end = index.checked_add(len).unwrap_or(usize::MAX);
        if index > self.len() || end > self.len() {
            return Err(DocumentError::RangeOutOfRange {
                index,
                end,
                length: self.len(),
            });
        }
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("delta", &self.delta)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Attribute;

    #[test]
    fn a_new_document_is_a_single_newline() {
        let document = Document::new();
        assert_eq!(document.len(), 1);
        assert!(document.is_empty());
        assert_eq!(document.to_plain_text(), "\n");
        assert_eq!(document.root().to_delta(), *document.delta());
    }

    #[test]
    fn loading_rejects_malformed_documents() {
        let mut no_newline = Delta::new();
        no_newline.insert("abc");
        assert!(matches!(
            Document::from_delta(no_newline),
            Err(DocumentError::InvalidDocument { .. })
        ));

        let mut not_inserts = Delta::new();
        not_inserts.retain(1).insert("\n");
        assert!(matches!(
            Document::from_delta(not_inserts),
            Err(DocumentError::InvalidDocument { .. })
        ));

        // A line attribute carried by ordinary characters never
        // round-trips through the tree.
        let mut misplaced = Delta::new();
        misplaced
            .insert_with("x", Style::single(Attribute::bullet_list()))
            .insert("\n");
        assert!(matches!(
            Document::from_delta(misplaced),
            Err(DocumentError::InvalidDocument { .. })
        ));
    }

    #[test]
    fn loading_builds_an_equivalent_tree() {
        let mut delta = Delta::new();
        delta
            .insert("Title")
            .insert_with("\n", Style::single(Attribute::header(1)))
            .insert("one")
            .insert_with("\n", Style::single(Attribute::bullet_list()))
            .insert_object("hr", serde_json::Value::Bool(true), Style::new())
            .insert("\n");
        let document = Document::from_delta(delta.clone()).unwrap();
        assert_eq!(document.root().to_delta(), delta);
        assert_eq!(document.len(), 12);
        assert_eq!(
            document.to_plain_text(),
            format!("Title\none\n{}\n", crate::embed::EMBED_PLACEHOLDER)
        );
    }

    #[test]
    fn json_round_trip() {
        let mut delta = Delta::new();
        delta
            .insert_with("bold", Style::single(Attribute::bold()))
            .insert("\n");
        let document = Document::from_delta(delta).unwrap();
        let reloaded = Document::from_json(&document.to_json()).unwrap();
        assert_eq!(reloaded.delta(), document.delta());
    }

    #[test]
    fn collect_style_intersects_inline_attributes() {
        let bold = Style::single(Attribute::bold());
        let both = bold.put(Attribute::italic());
        let mut delta = Delta::new();
        delta
            .insert_with("ab", both.clone())
            .insert_with("cd", Style::single(Attribute::bold()))
            .insert("\n");
        let document = Document::from_delta(delta).unwrap();
        assert_eq!(
            document.collect_style(0, 4).unwrap(),
            Style::single(Attribute::bold())
        );
        assert_eq!(document.collect_style(0, 2).unwrap(), both);
        // Collapsed: style of the character before the caret.
        assert_eq!(
            document.collect_style(2, 0).unwrap(),
            both
        );
    }

    #[test]
    fn collect_style_includes_the_shared_line_style() {
        let bullet = Style::single(Attribute::bullet_list());
        let mut delta = Delta::new();
        delta
            .insert("one")
            .insert_with("\n", bullet.clone())
            .insert("two")
            .insert_with("\n", bullet.clone())
            .insert("plain\n");
        let document = Document::from_delta(delta).unwrap();
        assert_eq!(document.collect_style(1, 4).unwrap(), bullet);
        // A range reaching the plain line loses the shared line style.
        assert!(document
            .collect_style(1, 9)
            .unwrap()
            .line_style()
            .is_none());
    }

    #[test]
    fn lookup_is_exposed_on_the_document() {
        let document = Document::from_json(r#"[{"insert":"ab\ncd\n"}]"#).unwrap();
        let hit = document.lookup(4, false).unwrap();
        assert_eq!(hit.offset, 1);
        assert!(document.lookup(99, false).is_none());
    }

    #[test]
    fn closing_is_permanent_and_queryable() {
        let mut document = Document::new();
        assert!(!document.is_closed());
        document.close();
        assert!(document.is_closed());
        assert!(matches!(
            document.ensure_open(),
            Err(DocumentError::Closed)
        ));
    }

    #[test]
    fn validation_bounds() {
        let document = Document::from_json(r#"[{"insert":"abc\n"}]"#).unwrap();
        assert!(document.validate_position(0).is_ok());
        assert!(document.validate_position(3).is_ok());
        assert!(document.validate_position(4).is_err());
        assert!(document.validate_range(0, 4).is_ok());
        assert!(document.validate_range(4, 0).is_ok());
        assert!(document.validate_range(2, 3).is_err());
    }
}
