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

//! Scoped document attributes and the attribute registry.
//!
//! An [`Attribute`] is a `(key, scope, value)` triple. The fallback
//! registry recognises the standard set:
//!
//! | Key          | Scope  | Value                     |
//! |--------------|--------|---------------------------|
//! | `bold`       | Inline | `true`                    |
//! | `italic`     | Inline | `true`                    |
//! | `link`       | Inline | URL string                |
//! | `header`     | Line   | `1`, `2` or `3`           |
//! | `list`       | Line   | `"bullet"` or `"ordered"` |
//! | `blockquote` | Line   | `true`                    |
//! | `code-block` | Line   | `true`                    |
//!
//! A `null` value marks an *unset* attribute: a transient marker that
//! removes the attribute when merged into a style, never persisted in a
//! document.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{DocumentError, Result};

/// Attribute keys recognised by the fallback registry.
pub mod keys {
    pub const BOLD: &str = "bold";
    pub const ITALIC: &str = "italic";
    pub const LINK: &str = "link";
    pub const HEADER: &str = "header";
    pub const LIST: &str = "list";
    pub const BLOCKQUOTE: &str = "blockquote";
    pub const CODE_BLOCK: &str = "code-block";

    /// Value of `list` for bulleted lists.
    pub const LIST_BULLET: &str = "bullet";
    /// Value of `list` for ordered lists.
    pub const LIST_ORDERED: &str = "ordered";
}

/// Whether an attribute applies to characters within a line or to the
/// line itself (carried by the line's terminating newline).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeScope {
    Inline,
    Line,
}

/// A named style value with a scope.
///
/// Two attributes are equal iff key, scope and value all match. Value
/// equality is structural JSON equality.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    key: String,
    scope: AttributeScope,
    value: Value,
}

impl Attribute {
    pub fn new(
        key: impl Into<String>,
        scope: AttributeScope,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            key: key.into(),
            scope,
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn scope(&self) -> AttributeScope {
        self.scope
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn is_inline(&self) -> bool {
        self.scope == AttributeScope::Inline
    }

    pub fn is_line(&self) -> bool {
        self.scope == AttributeScope::Line
    }

    /// Whether this attribute is an unset marker (`null` value).
    pub fn is_unset(&self) -> bool {
        self.value.is_null()
    }

    /// The unset form of this attribute: same key and scope, `null` value.
    pub fn unset(&self) -> Attribute {
        Attribute {
            key: self.key.clone(),
            scope: self.scope,
            value: Value::Null,
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Standard attribute constructors
    // ────────────────────────────────────────────────────────────────────

    pub fn bold() -> Attribute {
        Attribute::new(keys::BOLD, AttributeScope::Inline, true)
    }

    pub fn italic() -> Attribute {
        Attribute::new(keys::ITALIC, AttributeScope::Inline, true)
    }

    pub fn link(url: impl Into<String>) -> Attribute {
        Attribute::new(keys::LINK, AttributeScope::Inline, url.into())
    }

    pub fn header(level: u8) -> Attribute {
        Attribute::new(keys::HEADER, AttributeScope::Line, level)
    }

    pub fn bullet_list() -> Attribute {
        Attribute::new(keys::LIST, AttributeScope::Line, keys::LIST_BULLET)
    }

    pub fn ordered_list() -> Attribute {
        Attribute::new(keys::LIST, AttributeScope::Line, keys::LIST_ORDERED)
    }

    pub fn block_quote() -> Attribute {
        Attribute::new(keys::BLOCKQUOTE, AttributeScope::Line, true)
    }

    pub fn code_block() -> Attribute {
        Attribute::new(keys::CODE_BLOCK, AttributeScope::Line, true)
    }
}

/// Registry metadata for one attribute key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeDefinition {
    pub scope: AttributeScope,
    /// Whether consecutive lines carrying this attribute group under a
    /// common block node. Heading-like attributes keep their lines
    /// directly under the root.
    pub requires_block: bool,
}

impl AttributeDefinition {
    pub fn inline() -> Self {
        Self {
            scope: AttributeScope::Inline,
            requires_block: false,
        }
    }

    pub fn line(requires_block: bool) -> Self {
        Self {
            scope: AttributeScope::Line,
            requires_block,
        }
    }
}

/// Policy invoked when a parsed attribute key is not registered.
pub type CreateMissingAttribute = fn(&str, &Value) -> Result<Attribute>;

/// Maps attribute keys to their scope and grouping metadata.
///
/// Read-only after document construction; share across documents behind
/// an `Arc`.
#[derive(Debug, Clone)]
pub struct AttributeRegistry {
    definitions: HashMap<String, AttributeDefinition>,
    create_missing: Option<CreateMissingAttribute>,
}

impl AttributeRegistry {
    /// A registry with no recognised keys and no missing-key policy.
    pub fn empty() -> Self {
        Self {
            definitions: HashMap::new(),
            create_missing: None,
        }
    }

    /// The standard attribute set. Unknown keys are an error.
    pub fn fallback() -> Self {
        let mut registry = Self::empty();
        registry.register(keys::BOLD, AttributeDefinition::inline());
        registry.register(keys::ITALIC, AttributeDefinition::inline());
        registry.register(keys::LINK, AttributeDefinition::inline());
        registry.register(keys::HEADER, AttributeDefinition::line(false));
        registry.register(keys::LIST, AttributeDefinition::line(true));
        registry.register(keys::BLOCKQUOTE, AttributeDefinition::line(true));
        registry.register(keys::CODE_BLOCK, AttributeDefinition::line(true));
        registry
    }

    pub fn register(
        &mut self,
        key: impl Into<String>,
        definition: AttributeDefinition,
    ) {
        self.definitions.insert(key.into(), definition);
    }

    /// Replace the missing-key policy.
    pub fn set_create_missing(&mut self, policy: CreateMissingAttribute) {
        self.create_missing = Some(policy);
    }

    pub fn definition(&self, key: &str) -> Option<AttributeDefinition> {
        self.definitions.get(key).copied()
    }

    pub fn scope_of(&self, key: &str) -> Option<AttributeScope> {
        self.definition(key).map(|d| d.scope)
    }

    pub fn requires_block(&self, key: &str) -> bool {
        self.definition(key).map_or(false, |d| d.requires_block)
    }

    /// Resolve a raw `key → value` pair into an [`Attribute`].
    ///
    /// Unknown keys consult the `create_missing` policy; without one the
    /// resolution fails.
    pub fn resolve(&self, key: &str, value: &Value) -> Result<Attribute> {
        if let Some(definition) = self.definitions.get(key) {
            return Ok(Attribute::new(key, definition.scope, value.clone()));
        }
        match self.create_missing {
            Some(policy) => policy(key, value),
            None => Err(DocumentError::UnknownAttribute(key.to_string())),
        }
    }
}

impl Default for AttributeRegistry {
    fn default() -> Self {
        Self::fallback()
    }
}
