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

//! Attributed rich-text document engine.
//!
//! The engine keeps a document in two equivalent representations at
//! once: a flat, composable [`Delta`] of insert operations, and a tree
//! of blocks, lines and leaves rooted at [`Root`]. Edit intents —
//! insert, delete, format, insert-embed, replace — are first rewritten
//! by ordered pipelines of heuristic [`rules`] that encode editor
//! behaviour (splitting and merging lines, auto-linking URLs, leaving a
//! block on a double enter, keeping embeds on their own line), then
//! composed into both representations in lockstep. After every edit
//! `root.to_delta()` equals the stored delta, and one
//! [`DocumentChange`] is broadcast to subscribers.
//!
//! ```
//! use deltatext::{Attribute, Document};
//!
//! let mut document = Document::new();
//! document.insert(0, "Grocery list").unwrap();
//! document.format(0, 0, &Attribute::header(1)).unwrap();
//! assert_eq!(document.to_plain_text(), "Grocery list\n");
//! ```
//!
//! Documents serialize to a JSON array of operations and load back via
//! [`Document::from_json`]. Attribute scopes are not carried on the
//! wire; they come from the [`AttributeRegistry`], which hosts may
//! extend alongside the [`EmbedRegistry`] and the [`RuleSet`].

mod attributes;
mod delta;
mod document;
mod embed;
mod error;
pub mod rules;
mod style;
mod tree;

pub use attributes::{
    keys, Attribute, AttributeDefinition, AttributeRegistry, AttributeScope,
    CreateMissingAttribute,
};
pub use delta::{Delta, DeltaIterator, Op};
pub use document::{ChangeSource, Document, DocumentChange, SubscriptionId};
pub use embed::{
    CreateMissingEmbed, EmbedPlacement, EmbedRegistry, EmbedType, StringifyEmbed,
    EMBED_PLACEHOLDER,
};
pub use error::{DocumentError, Result};
pub use rules::{RuleContext, RuleSet};
pub use style::Style;
pub use tree::{Block, Leaf, Line, Lookup, Node, Root};
