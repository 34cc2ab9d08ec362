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

//! Ordered operation sequences describing documents and changes.
//!
//! A [`Delta`] is a normalized list of [`Op`]s. A *document* delta
//! contains only inserts and its textual content ends with `'\n'`; a
//! *change* delta may additionally retain and delete. All lengths and
//! offsets count Unicode scalar values; an object insert counts as one.

mod iterator;

pub use iterator::DeltaIterator;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Map, Value};

use crate::attributes::AttributeRegistry;
use crate::embed::EMBED_PLACEHOLDER;
use crate::error::{DocumentError, Result};
use crate::style::Style;

/// One element of a [`Delta`].
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Advance the cursor over `len` characters. With non-empty
    /// attributes this re-applies them over the retained range.
    Retain { len: usize, attributes: Style },
    /// Insert textual content; the text may contain `'\n'`.
    Insert { text: String, attributes: Style },
    /// Insert a single opaque embed of length 1.
    InsertObject {
        key: String,
        value: Value,
        attributes: Style,
    },
    /// Remove `len` characters.
    Delete { len: usize },
}

impl Op {
    pub fn retain(len: usize) -> Op {
        Op::Retain {
            len,
            attributes: Style::new(),
        }
    }

    pub fn retain_with(len: usize, attributes: Style) -> Op {
        Op::Retain { len, attributes }
    }

    pub fn insert(text: impl Into<String>) -> Op {
        Op::Insert {
            text: text.into(),
            attributes: Style::new(),
        }
    }

    pub fn insert_with(text: impl Into<String>, attributes: Style) -> Op {
        Op::Insert {
            text: text.into(),
            attributes,
        }
    }

    pub fn insert_object(
        key: impl Into<String>,
        value: Value,
        attributes: Style,
    ) -> Op {
        Op::InsertObject {
            key: key.into(),
            value,
            attributes,
        }
    }

    pub fn delete(len: usize) -> Op {
        Op::Delete { len }
    }

    /// Length of this op in characters.
    pub fn len(&self) -> usize {
        match self {
            Op::Retain { len, .. } | Op::Delete { len } => *len,
            Op::Insert { text, .. } => text.chars().count(),
            Op::InsertObject { .. } => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_retain(&self) -> bool {
        matches!(self, Op::Retain { .. })
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Op::Delete { .. })
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Op::Insert { .. } | Op::InsertObject { .. })
    }

    pub fn is_text_insert(&self) -> bool {
        matches!(self, Op::Insert { .. })
    }

    pub fn is_object_insert(&self) -> bool {
        matches!(self, Op::InsertObject { .. })
    }

    /// The attributes of this op; `None` for deletes.
    pub fn attributes(&self) -> Option<&Style> {
        match self {
            Op::Retain { attributes, .. }
            | Op::Insert { attributes, .. }
            | Op::InsertObject { attributes, .. } => Some(attributes),
            Op::Delete { .. } => None,
        }
    }

    pub fn has_attributes(&self) -> bool {
        self.attributes().map_or(false, |a| !a.is_empty())
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes().map_or(false, |a| a.contains(key))
    }

    /// The textual payload of a text insert.
    pub fn text(&self) -> Option<&str> {
        match self {
            Op::Insert { text, .. } => Some(text),
            _ => None,
        }
    }

    // Character-model queries. An object insert acts as its single
    // placeholder character; retains and deletes have no characters.

    pub fn starts_with(&self, ch: char) -> bool {
        match self {
            Op::Insert { text, .. } => text.starts_with(ch),
            Op::InsertObject { .. } => ch == EMBED_PLACEHOLDER,
            _ => false,
        }
    }

    pub fn ends_with(&self, ch: char) -> bool {
        match self {
            Op::Insert { text, .. } => text.ends_with(ch),
            Op::InsertObject { .. } => ch == EMBED_PLACEHOLDER,
            _ => false,
        }
    }

    pub fn contains(&self, ch: char) -> bool {
        match self {
            Op::Insert { text, .. } => text.contains(ch),
            Op::InsertObject { .. } => ch == EMBED_PLACEHOLDER,
            _ => false,
        }
    }

    /// Character index of the first `'\n'` in a text insert.
    pub fn newline_index(&self) -> Option<usize> {
        self.text()
            .and_then(|t| t.chars().position(|c| c == '\n'))
    }

    /// This op with its attributes replaced.
    pub(crate) fn with_attributes(self, attributes: Style) -> Op {
        match self {
            Op::Retain { len, .. } => Op::Retain { len, attributes },
            Op::Insert { text, .. } => Op::Insert { text, attributes },
            Op::InsertObject { key, value, .. } => Op::InsertObject {
                key,
                value,
                attributes,
            },
            Op::Delete { .. } => self,
        }
    }

    /// A sub-op of `len` characters starting at character `start`.
    pub(crate) fn slice(&self, start: usize, len: usize) -> Op {
        match self {
            Op::Retain { attributes, .. } => Op::Retain {
                len,
                attributes: attributes.clone(),
            },
            Op::Delete { .. } => Op::Delete { len },
            Op::Insert { text, attributes } => Op::Insert {
                text: text.chars().skip(start).take(len).collect(),
                attributes: attributes.clone(),
            },
            Op::InsertObject { .. } => self.clone(),
        }
    }
}

/// An ordered, normalized sequence of operations.
///
/// Normalization invariants: adjacent ops of equal kind and attributes
/// are merged, inserts sort before an adjacent delete, and
/// [`trim`](Self::trim) drops a trailing attribute-less retain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delta {
    ops: Vec<Op>,
}

impl Delta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn first(&self) -> Option<&Op> {
        self.ops.first()
    }

    pub fn last(&self) -> Option<&Op> {
        self.ops.last()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Sum of op lengths.
    pub fn len(&self) -> usize {
        self.ops.iter().map(Op::len).sum()
    }

    /// Number of characters of an existing document this delta affects
    /// (retained plus deleted).
    pub fn base_len(&self) -> usize {
        self.ops
            .iter()
            .map(|op| match op {
                Op::Retain { len, .. } | Op::Delete { len } => *len,
                _ => 0,
            })
            .sum()
    }

    /// Whether this delta describes a document: inserts only, with a
    /// final `'\n'`.
    pub fn is_document(&self) -> bool {
        self.ops.iter().all(Op::is_insert)
            && self.ops.last().map_or(false, |op| op.ends_with('\n'))
    }

    /// Append an op, merging it into the tail where normalization
    /// allows.
    pub fn push(&mut self, new_op: Op) {
        if new_op.is_empty() {
            return;
        }
        let mut index = self.ops.len();
        if let Some(Op::Delete { len }) = self.ops.last_mut() {
            if let Op::Delete { len: more } = new_op {
                *len += more;
                return;
            }
            // Inserts sort before an adjacent delete so equivalent edit
            // sequences normalize to the same delta.
            if new_op.is_insert() {
                index -= 1;
            }
        }
        if index > 0 {
            match (&mut self.ops[index - 1], &new_op) {
                (
                    Op::Insert { text, attributes },
                    Op::Insert {
                        text: more,
                        attributes: other,
                    },
                ) if attributes == other => {
                    text.push_str(more);
                    return;
                }
                (
                    Op::Retain { len, attributes },
                    Op::Retain {
                        len: more,
                        attributes: other,
                    },
                ) if attributes == other => {
                    *len += more;
                    return;
                }
                _ => {}
            }
        }
        self.ops.insert(index, new_op);
    }

    pub fn retain(&mut self, len: usize) -> &mut Self {
        self.push(Op::retain(len));
        self
    }

    pub fn retain_with(&mut self, len: usize, attributes: Style) -> &mut Self {
        self.push(Op::retain_with(len, attributes));
        self
    }

    pub fn insert(&mut self, text: impl Into<String>) -> &mut Self {
        self.push(Op::insert(text));
        self
    }

    pub fn insert_with(
        &mut self,
        text: impl Into<String>,
        attributes: Style,
    ) -> &mut Self {
        self.push(Op::insert_with(text, attributes));
        self
    }

    pub fn insert_object(
        &mut self,
        key: impl Into<String>,
        value: Value,
        attributes: Style,
    ) -> &mut Self {
        self.push(Op::insert_object(key, value, attributes));
        self
    }

    pub fn delete(&mut self, len: usize) -> &mut Self {
        self.push(Op::delete(len));
        self
    }

    /// Drop a trailing retain that carries no attributes.
    pub fn trim(&mut self) {
        if let Some(Op::Retain { attributes, .. }) = self.ops.last() {
            if attributes.is_empty() {
                self.ops.pop();
            }
        }
    }

    /// Compose `other` on top of this delta, producing the single delta
    /// equivalent to applying both in sequence. Composition is
    /// associative.
    pub fn compose(&self, other: &Delta) -> Delta {
        let mut result = Delta::new();
        let mut base = DeltaIterator::new(self);
        let mut change = DeltaIterator::new(other);

        while base.has_next() || change.has_next() {
            if change.peek_is_insert() {
                result.push(change.take(usize::MAX));
                continue;
            }
            if base.peek_is_delete() {
                result.push(base.take(usize::MAX));
                continue;
            }
            let len = base.peek_len().min(change.peek_len());
            let base_op = base.take(len);
            let change_op = change.take(len);
            match change_op {
                Op::Retain { attributes, .. } => {
                    // A retain over a retain keeps unset markers alive so
                    // they still strip attributes when applied later; over
                    // an insert they compact away.
                    let keep_null = base_op.is_retain();
                    let composed = base_op
                        .attributes()
                        .map(|a| a.compose(&attributes, keep_null))
                        .unwrap_or_default();
                    result.push(base_op.with_attributes(composed));
                }
                Op::Delete { len } => {
                    // Deleting freshly inserted content cancels out.
                    if base_op.is_retain() {
                        result.push(Op::delete(len));
                    }
                }
                _ => unreachable!("inserts are consumed before alignment"),
            }
        }
        result.trim();
        result
    }

    // ────────────────────────────────────────────────────────────────────
    // JSON wire format
    // ────────────────────────────────────────────────────────────────────

    pub fn to_json_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Array(Vec::new()))
    }

    pub fn to_json(&self) -> String {
        self.to_json_value().to_string()
    }

    /// Decode a delta from its JSON array form. Attribute scopes are not
    /// carried on the wire, so decoding consults the registry.
    pub fn from_json(json: &str, registry: &AttributeRegistry) -> Result<Delta> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_json_value(&value, registry)
    }

    pub fn from_json_value(
        value: &Value,
        registry: &AttributeRegistry,
    ) -> Result<Delta> {
        let items = value.as_array().ok_or_else(|| {
            DocumentError::MalformedOp("expected an array of operations".into())
        })?;
        let mut delta = Delta::new();
        for item in items {
            delta.push(decode_op(item, registry)?);
        }
        Ok(delta)
    }
}

fn decode_op(value: &Value, registry: &AttributeRegistry) -> Result<Op> {
    let object = value.as_object().ok_or_else(|| {
        DocumentError::MalformedOp("operation must be an object".into())
    })?;
    let attributes = match object.get("attributes") {
        None | Some(Value::Null) => Style::new(),
        Some(Value::Object(map)) => Style::from_raw(map, registry)?,
        Some(_) => {
            return Err(DocumentError::MalformedOp(
                "attributes must be an object".into(),
            ))
        }
    };
    if let Some(insert) = object.get("insert") {
        return match insert {
            Value::String(text) if !text.is_empty() => {
                Ok(Op::insert_with(text.clone(), attributes))
            }
            Value::Object(map) => {
                let mut entries = map.iter();
                match (entries.next(), entries.next()) {
                    (Some((key, value)), None) => {
                        Ok(Op::insert_object(key.clone(), value.clone(), attributes))
                    }
                    _ => Err(DocumentError::MalformedOp(
                        "object insert must carry exactly one key".into(),
                    )),
                }
            }
            _ => Err(DocumentError::MalformedOp(
                "insert must be a non-empty string or a single-key object".into(),
            )),
        };
    }
    if let Some(retain) = object.get("retain") {
        let len = decode_len(retain, "retain")?;
        return Ok(Op::retain_with(len, attributes));
    }
    if let Some(delete) = object.get("delete") {
        let len = decode_len(delete, "delete")?;
        return Ok(Op::delete(len));
    }
    Err(DocumentError::MalformedOp(
        "operation must be an insert, retain or delete".into(),
    ))
}

fn decode_len(value: &Value, kind: &str) -> Result<usize> {
    value
        .as_u64()
        .filter(|&n| n >= 1)
        .map(|n| n as usize)
        .ok_or_else(|| {
            DocumentError::MalformedOp(format!("{kind} must be a positive integer"))
        })
}

impl Serialize for Op {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            Op::Retain { len, .. } => map.serialize_entry("retain", len)?,
            Op::Delete { len } => map.serialize_entry("delete", len)?,
            Op::Insert { text, .. } => map.serialize_entry("insert", text)?,
            Op::InsertObject { key, value, .. } => {
                let mut inner = Map::new();
                inner.insert(key.clone(), value.clone());
                map.serialize_entry("insert", &Value::Object(inner))?;
            }
        }
        if let Some(attributes) = self.attributes().and_then(Style::to_map) {
            map.serialize_entry("attributes", &attributes)?;
        }
        map.end()
    }
}

impl Serialize for Delta {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.ops.len()))?;
        for op in &self.ops {
            seq.serialize_element(op)?;
        }
        seq.end()
    }
}

impl FromIterator<Op> for Delta {
    fn from_iter<T: IntoIterator<Item = Op>>(iter: T) -> Self {
        let mut delta = Delta::new();
        for op in iter {
            delta.push(op);
        }
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Attribute;

    fn bold() -> Style {
        Style::single(Attribute::bold())
    }

    fn bullet() -> Style {
        Style::single(Attribute::bullet_list())
    }

    #[test]
    fn push_merges_equal_neighbours() {
        let mut delta = Delta::new();
        delta.insert("ab").insert("cd").retain(2).retain(3).delete(1).delete(4);
        assert_eq!(
            delta.ops(),
            &[Op::insert("abcd"), Op::retain(5), Op::delete(5)]
        );
    }

    #[test]
    fn push_keeps_differently_attributed_ops_apart() {
        let mut delta = Delta::new();
        delta.insert("ab").insert_with("cd", bold());
        assert_eq!(delta.ops().len(), 2);
    }

    #[test]
    fn push_moves_an_insert_before_a_trailing_delete() {
        let mut delta = Delta::new();
        delta.retain(1).delete(2).insert("x");
        assert_eq!(
            delta.ops(),
            &[Op::retain(1), Op::insert("x"), Op::delete(2)]
        );
    }

    #[test]
    fn push_ignores_empty_ops() {
        let mut delta = Delta::new();
        delta.retain(0).insert("").delete(0);
        assert!(delta.is_empty());
    }

    #[test]
    fn trim_drops_a_plain_trailing_retain() {
        let mut delta = Delta::new();
        delta.insert("a").retain(3);
        delta.trim();
        assert_eq!(delta.ops(), &[Op::insert("a")]);

        let mut delta = Delta::new();
        delta.retain_with(3, bold());
        delta.trim();
        assert_eq!(delta.ops().len(), 1);
    }

    #[test]
    fn object_inserts_have_length_one() {
        let op = Op::insert_object("hr", Value::Bool(true), Style::new());
        assert_eq!(op.len(), 1);
        assert!(op.contains(crate::embed::EMBED_PLACEHOLDER));
        assert!(!op.contains('\n'));
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        let op = Op::insert("héllo\u{1F680}");
        assert_eq!(op.len(), 6);
        assert_eq!(op.slice(1, 4).text(), Some("éllo"));
    }

    #[test]
    fn compose_retain_over_insert_overlays_attributes() {
        let mut doc = Delta::new();
        doc.insert("abc\n");
        let mut change = Delta::new();
        change.retain_with(3, bold());
        let composed = doc.compose(&change);
        assert_eq!(
            composed.ops(),
            &[Op::insert_with("abc", bold()), Op::insert("\n")]
        );
    }

    #[test]
    fn compose_delete_cancels_insert() {
        let mut doc = Delta::new();
        doc.insert("ab\n");
        let mut change = Delta::new();
        change.retain(1).delete(1);
        let composed = doc.compose(&change);
        assert_eq!(composed.ops(), &[Op::insert("a\n")]);
    }

    #[test]
    fn compose_insert_splices_into_document() {
        let mut doc = Delta::new();
        doc.insert("ac\n");
        let mut change = Delta::new();
        change.retain(1).insert("b");
        let composed = doc.compose(&change);
        assert_eq!(composed.ops(), &[Op::insert("abc\n")]);
    }

    #[test]
    fn compose_unset_marker_strips_attribute_from_document() {
        let mut doc = Delta::new();
        doc.insert("One").insert_with("\n", bullet());
        let mut change = Delta::new();
        change
            .retain(3)
            .retain_with(1, Style::new().put(Attribute::bullet_list().unset()));
        let composed = doc.compose(&change);
        assert_eq!(composed.ops(), &[Op::insert("One\n")]);
    }

    #[test]
    fn compose_retain_over_retain_keeps_unset_markers() {
        let mut a = Delta::new();
        a.retain_with(1, Style::new().put(Attribute::bold().unset()));
        let mut b = Delta::new();
        b.retain_with(1, Style::single(Attribute::italic()));
        let composed = a.compose(&b);
        let Op::Retain { attributes, .. } = &composed.ops()[0] else {
            panic!("expected retain");
        };
        assert!(attributes.get("bold").unwrap().is_unset());
        assert!(attributes.contains_same(&Attribute::italic()));
    }

    #[test]
    fn compose_is_associative() {
        let mut doc = Delta::new();
        doc.insert("Correct\nLine\n");
        let mut first = Delta::new();
        first.retain(7).retain_with(1, bullet());
        let mut second = Delta::new();
        second.retain(2).delete(3).insert_with("x", bold());
        assert_eq!(
            doc.compose(&first).compose(&second),
            doc.compose(&first.compose(&second))
        );
    }

    #[test]
    fn document_predicate() {
        let mut doc = Delta::new();
        doc.insert("abc\n");
        assert!(doc.is_document());

        let mut not_doc = Delta::new();
        not_doc.insert("abc");
        assert!(!not_doc.is_document());

        let mut change = Delta::new();
        change.retain(1).insert("x\n");
        assert!(!change.is_document());
    }

    #[test]
    fn json_round_trip() {
        let registry = AttributeRegistry::fallback();
        let mut doc = Delta::new();
        doc.insert("Title")
            .insert_with("\n", Style::single(Attribute::header(1)))
            .insert_with("bold", bold())
            .insert_object("image", serde_json::json!({"source": "a.png"}), Style::new())
            .insert("\n");
        let decoded = Delta::from_json(&doc.to_json(), &registry).unwrap();
        assert_eq!(decoded, doc);
    }

    #[test]
    fn json_encodes_unset_as_null() {
        let mut change = Delta::new();
        change.retain_with(1, Style::new().put(Attribute::header(1).unset()));
        assert_eq!(
            change.to_json(),
            r#"[{"retain":1,"attributes":{"header":null}}]"#
        );
    }

    #[test]
    fn json_rejects_malformed_ops() {
        let registry = AttributeRegistry::fallback();
        for json in [
            r#"{"insert":"a"}"#,
            r#"[{"insert":""}]"#,
            r#"[{"retain":0}]"#,
            r#"[{"insert":{"a":1,"b":2}}]"#,
            r#"[{"noop":true}]"#,
        ] {
            assert!(Delta::from_json(json, &registry).is_err(), "{json}");
        }
    }
}
