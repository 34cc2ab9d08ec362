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

//! The document tree: root → blocks → lines → leaves.
//!
//! Ownership runs strictly downward; blocks are fully determined by the
//! line styles of their lines (invariant: a block groups consecutive
//! lines whose set line-scoped attribute matches in key and value), so
//! every mutation flattens the children into a line list, edits it, and
//! regroups. Splitting and merging blocks falls out of regrouping.

mod leaf;
mod line;

pub use leaf::Leaf;
pub use line::Line;

use std::sync::Arc;

use serde_json::Value;

use crate::attributes::AttributeRegistry;
use crate::delta::Delta;
use crate::embed::EmbedType;
use crate::style::Style;

/// A child of the root: a bare line or a block of grouped lines.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Line(Line),
    Block(Block),
}

impl Node {
    pub fn len(&self) -> usize {
        match self {
            Node::Line(line) => line.len(),
            Node::Block(block) => block.len(),
        }
    }
}

/// A contiguous group of lines sharing the same set line-scoped
/// attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    lines: Vec<Line>,
}

impl Block {
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// The line-scoped attribute this block groups on.
    pub fn attribute(&self) -> Option<&crate::attributes::Attribute> {
        self.lines.first().and_then(|line| line.style().line_style())
    }

    pub fn len(&self) -> usize {
        self.lines.iter().map(Line::len).sum()
    }
}

/// Result of a tree lookup: the containing line, the containing leaf
/// when the offset lands inside the line's content, and the offset local
/// to the deepest node found.
#[derive(Debug, Clone, Copy)]
pub struct Lookup<'a> {
    pub line: &'a Line,
    pub leaf: Option<&'a Leaf>,
    pub offset: usize,
}

/// The root of the document tree.
///
/// Only the document controller mutates the tree; all mutators are
/// crate-private.
#[derive(Debug, Clone)]
pub struct Root {
    children: Vec<Node>,
    registry: Arc<AttributeRegistry>,
}

impl Root {
    /// A tree holding a single empty line (the document `"\n"`).
    pub(crate) fn new(registry: Arc<AttributeRegistry>) -> Root {
        Root {
            children: vec![Node::Line(Line::new(Style::new()))],
            registry,
        }
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.children.iter().flat_map(|child| match child {
            Node::Line(line) => std::slice::from_ref(line).iter(),
            Node::Block(block) => block.lines.iter(),
        })
    }

    pub fn len(&self) -> usize {
        self.lines().map(Line::len).sum()
    }

    /// Flat delta equivalent of the tree: per line, one insert per leaf
    /// plus a styled `'\n'`.
    pub fn to_delta(&self) -> Delta {
        let mut delta = Delta::new();
        for line in self.lines() {
            line.to_delta(&mut delta);
        }
        delta
    }

    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        for line in self.lines() {
            line.plain_text(&mut out);
        }
        out
    }

    /// Descend to the deepest node containing `offset`.
    ///
    /// With `inclusive` a lookup landing exactly on a node boundary
    /// resolves to the *preceding* node, giving zero-length edits a
    /// defined home.
    pub fn lookup(&self, offset: usize, inclusive: bool) -> Option<Lookup<'_>> {
        let mut remaining = offset;
        for line in self.lines() {
            let len = line.len();
            if remaining < len || (inclusive && remaining == len) {
                return Some(Self::lookup_in_line(line, remaining, inclusive));
            }
            remaining -= len;
        }
        None
    }

    fn lookup_in_line(line: &Line, offset: usize, inclusive: bool) -> Lookup<'_> {
        let mut remaining = offset;
        for leaf in line.leaves() {
            let len = leaf.len();
            if remaining < len || (inclusive && remaining == len) {
                return Lookup {
                    line,
                    leaf: Some(leaf),
                    offset: remaining,
                };
            }
            remaining -= len;
        }
        // The offset points at the terminating newline (or past the last
        // leaf with nothing to land on).
        Lookup {
            line,
            leaf: None,
            offset,
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Mutators (document controller only)
    // ────────────────────────────────────────────────────────────────────

    /// Insert text at `offset`. Newlines split the containing line; every
    /// produced line break carries exactly the caller's line style (rules
    /// that want to preserve a line style say so explicitly in the change
    /// they emit), and the final piece keeps the original line's style on
    /// its terminator.
    pub(crate) fn insert(&mut self, offset: usize, text: &str, style: &Style) {
        let mut lines = self.take_lines();
        let (index, local) = locate(&lines, offset);
        if !text.contains('\n') {
            lines[index].insert_text(local, text, style.inline_only());
        } else {
            let inline = style.inline_only();
            let line = &mut lines[index];
            let tail = line.split_leaves_at(local);
            let original_style = line.style.clone();
            let break_style = style.line_only();

            let segments: Vec<&str> = text.split('\n').collect();
            let last_index = segments.len() - 1;

            if !segments[0].is_empty() {
                line.leaves.push(Leaf::text(segments[0], inline.clone()));
            }
            line.style = break_style.clone();
            line.normalize();

            let mut produced = Vec::with_capacity(last_index);
            for segment in &segments[1..last_index] {
                let mut middle = Line::new(break_style.clone());
                if !segment.is_empty() {
                    middle.leaves.push(Leaf::text(*segment, inline.clone()));
                }
                produced.push(middle);
            }
            let mut last = Line::new(original_style);
            if !segments[last_index].is_empty() {
                last.leaves.push(Leaf::text(segments[last_index], inline));
            }
            last.leaves.extend(tail);
            last.normalize();
            produced.push(last);

            for (shift, produced_line) in produced.into_iter().enumerate() {
                lines.insert(index + 1 + shift, produced_line);
            }
        }
        self.regroup(lines);
    }

    /// Insert a single embed leaf at `offset` with the given inline
    /// style. Placement invariants are the insert-object rules' job.
    pub(crate) fn insert_object(
        &mut self,
        offset: usize,
        embed: EmbedType,
        value: Value,
        style: Style,
    ) {
        let mut lines = self.take_lines();
        let (index, local) = locate(&lines, offset);
        lines[index].insert_leaf(local, Leaf::embed(embed, value, style.inline_only()));
        self.regroup(lines);
    }

    /// Delete `len` characters starting at `offset`. Deleting a line's
    /// terminating newline merges its content into the following line,
    /// which keeps the later line's style.
    pub(crate) fn delete(&mut self, offset: usize, len: usize) {
        let mut lines = self.take_lines();
        let (mut index, local) = locate(&lines, offset);
        let mut remaining = len;
        while remaining > 0 {
            let line = &mut lines[index];
            let span = remaining.min(line.len() - local);
            let content_span = span.min(line.text_len().saturating_sub(local));
            if content_span > 0 {
                line.delete_range(local, content_span);
            }
            remaining -= span;
            if span > content_span {
                // The terminator went too: merge into the next line.
                if index + 1 >= lines.len() {
                    break;
                }
                let merged = lines.remove(index);
                lines[index].prepend_leaves(merged.leaves);
            } else {
                break;
            }
        }
        self.regroup(lines);
    }

    /// Re-apply `style` over `[offset, offset + len)`. Inline attributes
    /// restyle the covered leaves; line attributes apply where the range
    /// covers a terminating newline, replacing any existing line-scoped
    /// attribute there.
    pub(crate) fn retain(&mut self, offset: usize, len: usize, style: &Style) {
        let inline = style.inline_only();
        let line_part = style.line_only();
        let mut lines = self.take_lines();
        let (mut index, mut local) = locate(&lines, offset);
        let mut remaining = len;
        while remaining > 0 && index < lines.len() {
            let line = &mut lines[index];
            let span = remaining.min(line.len() - local);
            let content_span = span.min(line.text_len().saturating_sub(local));
            if content_span > 0 && !inline.is_empty() {
                line.apply_inline(local, content_span, &inline);
            }
            if span > content_span && !line_part.is_empty() {
                line.style = line.style.merge_all(&line_part);
            }
            remaining -= span;
            index += 1;
            local = 0;
        }
        self.regroup(lines);
    }

    /// Remove the trailing empty plain line left behind by the seed line
    /// when a document is loaded op by op.
    pub(crate) fn drop_trailing_empty_line(&mut self) {
        let mut lines = self.take_lines();
        if lines.len() > 1 {
            let last = &lines[lines.len() - 1];
            if last.is_empty() && last.style().is_empty() {
                lines.pop();
            }
        }
        self.regroup(lines);
    }

    fn take_lines(&mut self) -> Vec<Line> {
        let mut lines = Vec::new();
        for child in self.children.drain(..) {
            match child {
                Node::Line(line) => lines.push(line),
                Node::Block(block) => lines.extend(block.lines),
            }
        }
        lines
    }

    /// Rebuild the children, grouping consecutive lines whose set
    /// line-scoped attribute matches (key and value) under blocks —
    /// but only for attributes whose semantic requires a block parent.
    fn regroup(&mut self, lines: Vec<Line>) {
        let mut children: Vec<Node> = Vec::with_capacity(lines.len());
        for line in lines {
            let grouping = line
                .style()
                .line_style()
                .filter(|attribute| self.registry.requires_block(attribute.key()))
                .cloned();
            match grouping {
                Some(attribute) => match children.last_mut() {
                    Some(Node::Block(block))
                        if block.attribute() == Some(&attribute) =>
                    {
                        block.lines.push(line);
                    }
                    _ => children.push(Node::Block(Block { lines: vec![line] })),
                },
                None => children.push(Node::Line(line)),
            }
        }
        self.children = children;
    }
}

/// Index of the line containing `offset` plus the offset local to it.
fn locate(lines: &[Line], offset: usize) -> (usize, usize) {
    let mut acc = 0;
    for (index, line) in lines.iter().enumerate() {
        let end = acc + line.len();
        if offset < end {
            return (index, offset - acc);
        }
        acc = end;
    }
    // Offsets are validated against the document length before they
    // reach the tree; landing here means the terminator of the last
    // line.
    let last = lines.len().saturating_sub(1);
    (last, lines.get(last).map_or(0, Line::text_len))
}
