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

//! Insert rules, in pipeline order.

use std::sync::OnceLock;

use regex::Regex;

use crate::attributes::{keys, Attribute};
use crate::delta::{Delta, DeltaIterator};
use crate::style::Style;

use super::{find_next_newline, is_line_embed, InsertRule, RuleContext};

/// Multi-line insertions (pastes) adopt the target line's block style.
///
/// The first inserted newline carries the target line's attributes.
/// List, quote and code styles propagate to every inserted line;
/// headings do not, so the intermediate newlines stay plain and the
/// heading is unset at the tail of the original line.
pub struct PreserveBlockStyleOnInsertRule;

impl InsertRule for PreserveBlockStyleOnInsertRule {
    fn apply(
        &self,
        _ctx: &RuleContext<'_>,
        document: &Delta,
        index: usize,
        text: &str,
    ) -> Option<Delta> {
        if !text.contains('\n') || text.chars().count() <= 1 {
            return None;
        }
        let mut iter = DeltaIterator::new(document);
        iter.skip(index);
        let (newline_op, skipped) = find_next_newline(&mut iter);
        let line_style = newline_op
            .as_ref()
            .and_then(|op| op.attributes().cloned())
            .unwrap_or_default();

        let mut unset_header = None;
        let mut block_style = Style::new();
        if let Some(attribute) = line_style.line_style() {
            if attribute.key() == keys::HEADER {
                unset_header = Some(attribute.unset());
            } else {
                block_style = Style::single(attribute.clone());
            }
        }

        let mut result = Delta::new();
        result.retain(index);
        let segments: Vec<&str> = text.split('\n').collect();
        let last = segments.len() - 1;
        for (position, segment) in segments.iter().enumerate() {
            if !segment.is_empty() {
                result.insert(*segment);
            }
            if position == 0 {
                result.insert_with("\n", line_style.clone());
            } else if position < last {
                result.insert_with("\n", block_style.clone());
            }
        }
        if let (Some(unset), Some(op)) = (unset_header, newline_op) {
            if let Some(newline_at) = op.newline_index() {
                result.retain(skipped + newline_at);
                result.retain_with(1, Style::single(unset));
            }
        }
        Some(result)
    }
}

/// Text typed against a line-placed embed gets wrapped in newlines so
/// the embed keeps its own line.
pub struct ForceNewlineAroundEmbedRule;

impl InsertRule for ForceNewlineAroundEmbedRule {
    fn apply(
        &self,
        ctx: &RuleContext<'_>,
        document: &Delta,
        index: usize,
        text: &str,
    ) -> Option<Delta> {
        let mut iter = DeltaIterator::new(document);
        let previous = iter.skip(index);
        let target = iter.next_op();
        let embed_before = previous
            .as_ref()
            .map_or(false, |op| is_line_embed(ctx, op));
        let embed_after = target.as_ref().map_or(false, |op| is_line_embed(ctx, op));
        if !embed_before && !embed_after {
            return None;
        }
        let mut result = Delta::new();
        result.retain(index);
        if embed_before && !text.starts_with('\n') {
            result.insert("\n");
        }
        result.insert(text);
        if embed_after && !text.ends_with('\n') {
            result.insert("\n");
        }
        Some(result)
    }
}

/// Splitting a styled line mid-content yields two lines of that style:
/// the inserted newline copies the attributes of the line's terminator.
pub struct PreserveLineStyleOnSplitRule;

impl InsertRule for PreserveLineStyleOnSplitRule {
    fn apply(
        &self,
        _ctx: &RuleContext<'_>,
        document: &Delta,
        index: usize,
        text: &str,
    ) -> Option<Delta> {
        if text != "\n" {
            return None;
        }
        let mut iter = DeltaIterator::new(document);
        let previous = iter.skip(index)?;
        if previous.ends_with('\n') {
            return None;
        }
        let target = iter.next_op()?;
        if target.starts_with('\n') {
            return None;
        }
        let mut result = Delta::new();
        result.retain(index);
        if target.contains('\n') {
            // The terminator lives inside the target op, whose
            // attributes do not style lines (it is not a lone newline),
            // so the split line is plain.
            result.insert("\n");
            return Some(result);
        }
        let (newline_op, _) = find_next_newline(&mut iter);
        let style = newline_op
            .and_then(|op| op.attributes().cloned())
            .unwrap_or_default();
        result.insert_with("\n", style);
        Some(result)
    }
}

/// Enter on an empty styled line leaves the block: the line's
/// line-scoped attribute is unset instead of a newline being inserted.
pub struct AutoExitBlockRule;

impl InsertRule for AutoExitBlockRule {
    fn apply(
        &self,
        _ctx: &RuleContext<'_>,
        document: &Delta,
        index: usize,
        text: &str,
    ) -> Option<Delta> {
        if text != "\n" {
            return None;
        }
        let mut iter = DeltaIterator::new(document);
        let previous = iter.skip(index);
        let target = iter.next_op()?;
        let on_empty_line =
            previous.map_or(true, |op| op.ends_with('\n')) && target.starts_with('\n');
        if !on_empty_line {
            return None;
        }
        let attribute = target.attributes().and_then(Style::line_style)?.clone();
        let mut result = Delta::new();
        result.retain(index);
        result.retain_with(1, Style::single(attribute.unset()));
        Some(result)
    }
}

/// Enter at the end of a line re-applies that line's attributes to the
/// inserted newline, and unsets `header` on the pushed-down newline so
/// headings never propagate to the next line.
pub struct ResetLineFormatOnNewLineRule;

impl InsertRule for ResetLineFormatOnNewLineRule {
    fn apply(
        &self,
        _ctx: &RuleContext<'_>,
        document: &Delta,
        index: usize,
        text: &str,
    ) -> Option<Delta> {
        if text != "\n" {
            return None;
        }
        let mut iter = DeltaIterator::new(document);
        iter.skip(index);
        let target = iter.next_op()?;
        if !target.starts_with('\n') {
            return None;
        }
        let attributes = target.attributes().cloned().unwrap_or_default();
        let mut result = Delta::new();
        result.retain(index);
        result.insert_with("\n", attributes.clone());
        if let Some(header) = attributes.get(keys::HEADER) {
            if !header.is_unset() {
                result.retain_with(1, Style::single(header.unset()));
            }
        }
        Some(result)
    }
}

/// Typing a space after an absolute `http(s)://` URL formats the word
/// as a link.
pub struct AutoFormatLinksRule;

// TODO: trailing punctuation ends up inside the link ("see https://a.b,"
// links the comma); trim it once the desired behaviour is settled.
fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^https?://\S+$").expect("hard-coded pattern compiles")
    })
}

impl InsertRule for AutoFormatLinksRule {
    fn apply(
        &self,
        _ctx: &RuleContext<'_>,
        document: &Delta,
        index: usize,
        text: &str,
    ) -> Option<Delta> {
        if text != " " {
            return None;
        }
        let mut iter = DeltaIterator::new(document);
        let previous = iter.skip(index)?;
        let candidate = previous
            .text()?
            .split('\n')
            .next_back()?
            .split(' ')
            .next_back()?;
        if candidate.is_empty() || !url_pattern().is_match(candidate) {
            return None;
        }
        let attributes = previous.attributes().cloned().unwrap_or_default();
        if attributes.contains(keys::LINK) {
            return None;
        }
        let linked = attributes.put(Attribute::link(candidate));
        let candidate_len = candidate.chars().count();
        let mut result = Delta::new();
        result.retain(index - candidate_len);
        result.retain_with(candidate_len, linked);
        result.insert_with(" ", attributes);
        Some(result)
    }
}

/// Plain text continues the inline style of the character before the
/// caret. A link is continued only when the caret sits strictly inside
/// it; at its boundary the link must not grow.
pub struct PreserveInlineStylesRule;

impl InsertRule for PreserveInlineStylesRule {
    fn apply(
        &self,
        _ctx: &RuleContext<'_>,
        document: &Delta,
        index: usize,
        text: &str,
    ) -> Option<Delta> {
        if text.contains('\n') {
            return None;
        }
        let mut iter = DeltaIterator::new(document);
        let previous = iter.skip(index)?;
        if !previous.is_text_insert() || previous.contains('\n') {
            return None;
        }
        let attributes = previous.attributes().cloned().unwrap_or_default();
        let mut result = Delta::new();
        result.retain(index);
        let Some(link) = attributes.get(keys::LINK).cloned() else {
            result.insert_with(text, attributes);
            return Some(result);
        };
        let continues_link = iter.next_op().map_or(false, |next| {
            next.attributes()
                .and_then(|a| a.get(keys::LINK))
                .map_or(false, |next_link| *next_link == link)
        });
        let style = if continues_link {
            attributes
        } else {
            attributes.merge(link.unset())
        };
        result.insert_with(text, style);
        Some(result)
    }
}

/// Unconditional fallback: insert the text unformatted.
pub struct CatchAllInsertRule;

impl InsertRule for CatchAllInsertRule {
    fn apply(
        &self,
        _ctx: &RuleContext<'_>,
        _document: &Delta,
        index: usize,
        text: &str,
    ) -> Option<Delta> {
        let mut result = Delta::new();
        result.retain(index);
        result.insert(text);
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{applied, context};
    use super::*;
    use crate::delta::Op;

    fn ctx_pair() -> (crate::attributes::AttributeRegistry, crate::embed::EmbedRegistry)
    {
        context()
    }

    fn bullet() -> Style {
        Style::single(Attribute::bullet_list())
    }

    fn heading() -> Style {
        Style::single(Attribute::header(1))
    }

    #[test]
    fn catch_all_inserts_plain_text() {
        let (attributes, embeds) = ctx_pair();
        let ctx = RuleContext {
            attributes: &attributes,
            embeds: &embeds,
        };
        let mut doc = Delta::new();
        doc.insert("abc\n");
        let change = CatchAllInsertRule.apply(&ctx, &doc, 1, "x").unwrap();
        assert_eq!(change.ops(), &[Op::retain(1), Op::insert("x")]);
    }

    #[test]
    fn split_copies_the_line_style_forward() {
        let (attributes, embeds) = ctx_pair();
        let ctx = RuleContext {
            attributes: &attributes,
            embeds: &embeds,
        };
        let mut doc = Delta::new();
        doc.insert("item").insert_with("\n", bullet());
        let change = PreserveLineStyleOnSplitRule
            .apply(&ctx, &doc, 2, "\n")
            .unwrap();
        assert_eq!(
            change.ops(),
            &[Op::retain(2), Op::insert_with("\n", bullet())]
        );
        // Splitting a list item yields two list items.
        let after = applied(&doc, &change);
        assert_eq!(
            after.ops(),
            &[
                Op::insert("it"),
                Op::insert_with("\n", bullet()),
                Op::insert("em"),
                Op::insert_with("\n", bullet()),
            ]
        );
    }

    #[test]
    fn split_at_line_edges_defers() {
        let (attributes, embeds) = ctx_pair();
        let ctx = RuleContext {
            attributes: &attributes,
            embeds: &embeds,
        };
        let mut doc = Delta::new();
        doc.insert("ab\ncd\n");
        // At the start of a line the previous op ends with '\n'.
        assert!(PreserveLineStyleOnSplitRule
            .apply(&ctx, &doc, 3, "\n")
            .is_none());
        // At the end of a line the target starts with '\n'.
        assert!(PreserveLineStyleOnSplitRule
            .apply(&ctx, &doc, 2, "\n")
            .is_none());
    }

    #[test]
    fn auto_exit_unsets_the_block_attribute_on_an_empty_line() {
        let (attributes, embeds) = ctx_pair();
        let ctx = RuleContext {
            attributes: &attributes,
            embeds: &embeds,
        };
        let mut doc = Delta::new();
        doc.insert("one")
            .insert_with("\n", bullet())
            .insert_with("\n", bullet());
        let change = AutoExitBlockRule.apply(&ctx, &doc, 4, "\n").unwrap();
        assert_eq!(
            change.ops(),
            &[
                Op::retain(4),
                Op::retain_with(1, Style::new().put(Attribute::bullet_list().unset())),
            ]
        );
    }

    #[test]
    fn auto_exit_requires_an_empty_line() {
        let (attributes, embeds) = ctx_pair();
        let ctx = RuleContext {
            attributes: &attributes,
            embeds: &embeds,
        };
        let mut doc = Delta::new();
        doc.insert("one").insert_with("\n", bullet());
        assert!(AutoExitBlockRule.apply(&ctx, &doc, 3, "\n").is_none());
    }

    #[test]
    fn enter_at_end_of_heading_resets_the_next_line() {
        let (attributes, embeds) = ctx_pair();
        let ctx = RuleContext {
            attributes: &attributes,
            embeds: &embeds,
        };
        let mut doc = Delta::new();
        doc.insert("Title").insert_with("\n", heading());
        let change = ResetLineFormatOnNewLineRule
            .apply(&ctx, &doc, 5, "\n")
            .unwrap();
        assert_eq!(
            change.ops(),
            &[
                Op::retain(5),
                Op::insert_with("\n", heading()),
                Op::retain_with(1, Style::new().put(Attribute::header(1).unset())),
            ]
        );
        let after = applied(&doc, &change);
        assert_eq!(
            after.ops(),
            &[
                Op::insert("Title"),
                Op::insert_with("\n", heading()),
                Op::insert("\n"),
            ]
        );
    }

    #[test]
    fn enter_at_end_of_list_item_continues_the_list() {
        let (attributes, embeds) = ctx_pair();
        let ctx = RuleContext {
            attributes: &attributes,
            embeds: &embeds,
        };
        let mut doc = Delta::new();
        doc.insert("one").insert_with("\n", bullet());
        let change = ResetLineFormatOnNewLineRule
            .apply(&ctx, &doc, 3, "\n")
            .unwrap();
        let after = applied(&doc, &change);
        assert_eq!(
            after.ops(),
            &[
                Op::insert("one"),
                Op::insert_with("\n\n", bullet()),
            ]
        );
    }

    #[test]
    fn paste_preserves_the_block_style() {
        let (attributes, embeds) = ctx_pair();
        let ctx = RuleContext {
            attributes: &attributes,
            embeds: &embeds,
        };
        let mut doc = Delta::new();
        doc.insert("one").insert_with("\n", bullet());
        let change = PreserveBlockStyleOnInsertRule
            .apply(&ctx, &doc, 1, "a\nb\nc")
            .unwrap();
        let after = applied(&doc, &change);
        assert_eq!(
            after.ops(),
            &[
                Op::insert("oa"),
                Op::insert_with("\n", bullet()),
                Op::insert("b"),
                Op::insert_with("\n", bullet()),
                Op::insert("cne"),
                Op::insert_with("\n", bullet()),
            ]
        );
    }

    #[test]
    fn paste_into_a_heading_does_not_propagate_it() {
        let (attributes, embeds) = ctx_pair();
        let ctx = RuleContext {
            attributes: &attributes,
            embeds: &embeds,
        };
        let mut doc = Delta::new();
        doc.insert("Title").insert_with("\n", heading());
        let change = PreserveBlockStyleOnInsertRule
            .apply(&ctx, &doc, 2, "a\nb")
            .unwrap();
        let after = applied(&doc, &change);
        assert_eq!(
            after.ops(),
            &[
                Op::insert("Tia"),
                Op::insert_with("\n", heading()),
                Op::insert("btle\n"),
            ]
        );
    }

    #[test]
    fn typing_after_a_url_and_a_space_links_the_url() {
        let (attributes, embeds) = ctx_pair();
        let ctx = RuleContext {
            attributes: &attributes,
            embeds: &embeds,
        };
        let mut doc = Delta::new();
        doc.insert("go to https://matrix.org\n");
        let change = AutoFormatLinksRule.apply(&ctx, &doc, 24, " ").unwrap();
        assert_eq!(
            change.ops(),
            &[
                Op::retain(6),
                Op::retain_with(
                    18,
                    Style::single(Attribute::link("https://matrix.org"))
                ),
                Op::insert(" "),
            ]
        );
    }

    #[test]
    fn non_urls_and_existing_links_are_left_alone() {
        let (attributes, embeds) = ctx_pair();
        let ctx = RuleContext {
            attributes: &attributes,
            embeds: &embeds,
        };
        let mut doc = Delta::new();
        doc.insert("ftp://host or plain\n");
        assert!(AutoFormatLinksRule.apply(&ctx, &doc, 12, " ").is_none());

        let mut linked = Delta::new();
        linked.insert_with(
            "https://matrix.org",
            Style::single(Attribute::link("https://matrix.org")),
        );
        linked.insert("\n");
        assert!(AutoFormatLinksRule.apply(&ctx, &linked, 18, " ").is_none());
    }

    #[test]
    fn plain_text_continues_the_previous_inline_style() {
        let (attributes, embeds) = ctx_pair();
        let ctx = RuleContext {
            attributes: &attributes,
            embeds: &embeds,
        };
        let bold = Style::single(Attribute::bold());
        let mut doc = Delta::new();
        doc.insert_with("ab", bold.clone()).insert("\n");
        let change = PreserveInlineStylesRule.apply(&ctx, &doc, 2, "c").unwrap();
        assert_eq!(
            change.ops(),
            &[Op::retain(2), Op::insert_with("c", bold)]
        );
    }

    #[test]
    fn typing_at_a_link_boundary_does_not_extend_it() {
        let (attributes, embeds) = ctx_pair();
        let ctx = RuleContext {
            attributes: &attributes,
            embeds: &embeds,
        };
        let link = Style::single(Attribute::link("https://a.example"));
        let mut doc = Delta::new();
        doc.insert_with("site", link.clone()).insert(" more\n");
        // Caret at the end of the link: the next op has no link.
        let change = PreserveInlineStylesRule.apply(&ctx, &doc, 4, "x").unwrap();
        assert_eq!(change.ops(), &[Op::retain(4), Op::insert("x")]);
        // Caret inside the link: both sides carry it, so it continues.
        let change = PreserveInlineStylesRule.apply(&ctx, &doc, 2, "x").unwrap();
        assert_eq!(change.ops(), &[Op::retain(2), Op::insert_with("x", link)]);
    }

    #[test]
    fn typing_against_a_line_embed_forces_a_newline() {
        let (attributes, embeds) = ctx_pair();
        let ctx = RuleContext {
            attributes: &attributes,
            embeds: &embeds,
        };
        let mut doc = Delta::new();
        doc.insert("a\n")
            .insert_object("hr", serde_json::Value::Bool(true), Style::new())
            .insert("\n");
        // Inserting right after the embed.
        let change = ForceNewlineAroundEmbedRule
            .apply(&ctx, &doc, 3, "x")
            .unwrap();
        assert_eq!(
            change.ops(),
            &[Op::retain(3), Op::insert("\nx")]
        );
        // Inserting right before the embed.
        let change = ForceNewlineAroundEmbedRule
            .apply(&ctx, &doc, 2, "x")
            .unwrap();
        assert_eq!(change.ops(), &[Op::retain(2), Op::insert("x\n")]);
        // Elsewhere the rule defers.
        assert!(ForceNewlineAroundEmbedRule
            .apply(&ctx, &doc, 1, "x")
            .is_none());
    }
}
