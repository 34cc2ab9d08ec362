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

//! Edit intents: insert, insert_object, delete, format, replace.
//!
//! Each method validates its arguments, routes the intent through the
//! matching rule pipeline, and composes the winning change into the
//! document. The returned delta is the change that was actually
//! applied — possibly empty when a rule vetoed the edit or it was a
//! no-op.

use serde_json::Value;
use tracing::debug;

use crate::attributes::Attribute;
use crate::delta::Delta;
use crate::embed::{EmbedType, EMBED_PLACEHOLDER};
use crate::error::{DocumentError, Result};
use crate::rules::RuleContext;
use crate::style::Style;

use super::change::ChangeSource;
use super::Document;

impl Document {
    /// Insert `text` at `index`.
    ///
    /// The text is sanitized by stripping the embed placeholder
    /// character; an insert reduced to nothing is a no-op.
    pub fn insert(&mut self, index: usize, text: &str) -> Result<Delta> {
        self.ensure_open()?;
        self.validate_position(index)?;
        if text.is_empty() {
            return Err(DocumentError::EmptyText);
        }
        let sanitized: String =
            text.chars().filter(|&c| c != EMBED_PLACEHOLDER).collect();
        if sanitized.is_empty() {
            return Ok(Delta::new());
        }
        debug!(index, chars = sanitized.chars().count(), "insert");
        let ctx = RuleContext {
            attributes: &self.attributes,
            embeds: &self.embeds,
        };
        let change = self
            .rules
            .apply_insert(&ctx, &self.delta, index, &sanitized)?;
        self.apply(change)
    }

    /// Insert a single embed at `index`.
    pub fn insert_object(
        &mut self,
        index: usize,
        embed: &EmbedType,
        value: Value,
        style: Style,
    ) -> Result<Delta> {
        self.ensure_open()?;
        self.validate_position(index)?;
        if embed.key().is_empty() {
            return Err(DocumentError::EmptyEmbedKey);
        }
        debug!(index, key = embed.key(), "insert object");
        let ctx = RuleContext {
            attributes: &self.attributes,
            embeds: &self.embeds,
        };
        let change = self
            .rules
            .apply_insert_object(&ctx, &self.delta, index, embed, &value, &style)?;
        self.apply(change)
    }

    /// Delete `len` characters starting at `index`.
    ///
    /// Returns the applied change — empty when a rule vetoes the
    /// deletion (the trailing newline is protected this way).
    pub fn delete(&mut self, index: usize, len: usize) -> Result<Delta> {
        self.ensure_open()?;
        self.validate_range(index, len)?;
        if len == 0 {
            return Ok(Delta::new());
        }
        debug!(index, len, "delete");
        let ctx = RuleContext {
            attributes: &self.attributes,
            embeds: &self.embeds,
        };
        let change = self.rules.apply_delete(&ctx, &self.delta, index, len)?;
        self.apply(change)
    }

    /// Apply `attribute` over `[index, index + len)`.
    ///
    /// Format is idempotent; a no-op returns an empty change. A
    /// zero-length range formats the containing line for line-scoped
    /// attributes.
    pub fn format(
        &mut self,
        index: usize,
        len: usize,
        attribute: &Attribute,
    ) -> Result<Delta> {
        self.ensure_open()?;
        self.validate_range(index, len)?;
        debug!(index, len, key = attribute.key(), "format");
        let ctx = RuleContext {
            attributes: &self.attributes,
            embeds: &self.embeds,
        };
        let change = self
            .rules
            .apply_format(&ctx, &self.delta, index, len, attribute)?;
        self.apply(change)
    }

    /// Replace `[index, index + len)` with `text`.
    ///
    /// Runs as an insert at the end of the range followed by the
    /// deletion, so both sides go through their rule pipelines; the
    /// returned delta is the two changes composed.
    pub fn replace(&mut self, index: usize, len: usize, text: &str) -> Result<Delta> {
        if text.is_empty() && len == 0 {
            return Err(DocumentError::EmptyChange);
        }
        if text.is_empty() {
            return self.delete(index, len);
        }
        if len == 0 {
            return self.insert(index, text);
        }
        let inserted = self.insert(index + len, text)?;
        let deleted = self.delete(index, len)?;
        Ok(inserted.compose(&deleted))
    }

    /// Compose a non-empty rule result into the document.
    fn apply(&mut self, change: Delta) -> Result<Delta> {
        if change.is_empty() {
            return Ok(change);
        }
        self.compose(&change, ChangeSource::Local)?;
        Ok(change)
    }
}
