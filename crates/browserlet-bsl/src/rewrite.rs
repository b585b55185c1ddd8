//! Targeted, format-preserving in-place rewrite of a single step's `hints`
//! block.
//!
//! No maintained crate preserves YAML comments and layout the way
//! `toml_edit` does for TOML (see `DESIGN.md`), so this module performs a
//! textual splice instead of a round-trip re-serialization: it locates the
//! target step's `hints:` key by a line-indentation scan and replaces only
//! the lines that make up that block, byte-for-byte identical everywhere
//! else — including comments.

use browserlet_protocol::{Hint, HintValue};

use crate::error::Error;

/// Rewrite step `step_index`'s `hints` block in `source` to `new_hints`,
/// returning the full, updated file contents.
pub fn rewrite_step_hints(
    source: &str,
    path_for_errors: &str,
    step_index: usize,
    new_hints: &[Hint],
) -> Result<String, Error> {
    let lines: Vec<&str> = source.lines().collect();
    let item_range = find_step_item_range(&lines, step_index).ok_or_else(|| {
        Error::RewriteTargetNotFound {
            path: path_for_errors.to_string(),
            step_index,
        }
    })?;

    let hints_block = find_hints_block(&lines, item_range.clone()).ok_or_else(|| {
        Error::RewriteTargetNotFound {
            path: path_for_errors.to_string(),
            step_index,
        }
    })?;

    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    out.extend(lines[..hints_block.key_line].iter().map(|s| s.to_string()));

    if hints_block.flow_style {
        out.push(format!(
            "{}hints: {}",
            " ".repeat(hints_block.key_indent),
            render_hints_flow(new_hints)
        ));
    } else {
        out.push(format!("{}hints:", " ".repeat(hints_block.key_indent)));
        out.extend(render_hints_block(new_hints, hints_block.key_indent + 2));
    }

    out.extend(
        lines[hints_block.block_end..]
            .iter()
            .map(|s| s.to_string()),
    );

    let mut rendered = out.join("\n");
    if source.ends_with('\n') {
        rendered.push('\n');
    }
    Ok(rendered)
}

/// Half-open `[start, end)` line range of one `- `-prefixed list item.
#[derive(Clone)]
struct ItemRange {
    start: usize,
    end: usize,
}

/// Find the `[start, end)` line range of the `step_index`-th item under the
/// top-level `steps:` key.
fn find_step_item_range(lines: &[&str], step_index: usize) -> Option<std::ops::Range<usize>> {
    let steps_line = lines
        .iter()
        .position(|l| l.trim_start() == l && l.trim_end() == "steps:")?;

    let mut item_indent = None;
    let mut items: Vec<ItemRange> = Vec::new();
    let mut cursor = steps_line + 1;
    while cursor < lines.len() {
        let line = lines[cursor];
        if line.trim().is_empty() || (item_indent.is_none() && line.trim_start().starts_with('#'))
        {
            cursor += 1;
            continue;
        }
        let indent = line.len() - line.trim_start().len();
        let trimmed = line.trim_start();

        match item_indent {
            None => {
                if !trimmed.starts_with("- ") && trimmed != "-" {
                    // `steps:` had no list items at all.
                    return None;
                }
                item_indent = Some(indent);
                items.push(ItemRange {
                    start: cursor,
                    end: lines.len(),
                });
            }
            Some(ii) => {
                if indent < ii {
                    // Dedented past the steps list: section ended.
                    if let Some(last) = items.last_mut() {
                        last.end = cursor;
                    }
                    break;
                }
                if indent == ii && (trimmed.starts_with("- ") || trimmed == "-") {
                    if let Some(last) = items.last_mut() {
                        last.end = cursor;
                    }
                    items.push(ItemRange {
                        start: cursor,
                        end: lines.len(),
                    });
                }
            }
        }
        cursor += 1;
    }

    items
        .get(step_index)
        .map(|item| item.start..item.end)
}

/// A located `hints:` key within a step item.
struct HintsBlock {
    /// Line index of the `hints:` key itself.
    key_line: usize,
    /// Leading-whitespace width of the `hints:` key line.
    key_indent: usize,
    /// True when `hints:` is followed on the same line by a flow-style `[…]`.
    flow_style: bool,
    /// Exclusive end of the block being replaced (block-style body, or the
    /// single `hints:` line itself for flow style).
    block_end: usize,
}

/// Locate the `hints:` key inside `range` and compute the span of lines it
/// occupies (its block-style body, if any).
fn find_hints_block(lines: &[&str], range: std::ops::Range<usize>) -> Option<HintsBlock> {
    for idx in range.clone() {
        let line = lines[idx];
        let trimmed = line.trim_start();
        let key_part = trimmed.strip_prefix("- ").unwrap_or(trimmed);
        if !(key_part.starts_with("hints:")) {
            continue;
        }
        let key_indent = line.len() - trimmed.len() + (trimmed.len() - key_part.len());
        let after_colon = key_part["hints:".len()..].trim();
        if !after_colon.is_empty() {
            return Some(HintsBlock {
                key_line: idx,
                key_indent,
                flow_style: true,
                block_end: idx + 1,
            });
        }
        let mut end = idx + 1;
        while end < range.end {
            let l = lines[end];
            if l.trim().is_empty() {
                end += 1;
                continue;
            }
            let child_indent = l.len() - l.trim_start().len();
            if child_indent <= key_indent {
                break;
            }
            end += 1;
        }
        return Some(HintsBlock {
            key_line: idx,
            key_indent,
            flow_style: false,
            block_end: end,
        });
    }
    None
}

/// Quote a YAML scalar only when it needs it.
fn quote_scalar(value: &str) -> String {
    let needs_quoting = value.is_empty()
        || value.trim() != value
        || value
            .chars()
            .any(|c| matches!(c, ':' | '#' | '{' | '}' | '[' | ']' | '&' | '*' | '!' | '|' | '>' | '\'' | '"' | '%' | '@' | '`'));
    if needs_quoting {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

/// Render `hints` as a block-style YAML sequence, with each `- ` at `indent`
/// spaces.
fn render_hints_block(hints: &[Hint], indent: usize) -> Vec<String> {
    let pad = " ".repeat(indent);
    let mut out = Vec::new();
    for hint in hints {
        out.push(format!("{pad}- type: {}", hint_type_name(hint)));
        match &hint.value {
            HintValue::Plain(v) => out.push(format!("{pad}  value: {}", quote_scalar(v))),
            HintValue::Named { name, value } => {
                out.push(format!("{pad}  value:"));
                out.push(format!("{pad}    name: {}", quote_scalar(name)));
                out.push(format!("{pad}    value: {}", quote_scalar(value)));
            }
        }
    }
    out
}

/// Render `hints` as a single-line flow-style YAML sequence.
fn render_hints_flow(hints: &[Hint]) -> String {
    let items: Vec<String> = hints
        .iter()
        .map(|hint| match &hint.value {
            HintValue::Plain(v) => {
                format!("{{type: {}, value: {}}}", hint_type_name(hint), quote_scalar(v))
            }
            HintValue::Named { name, value } => format!(
                "{{type: {}, value: {{name: {}, value: {}}}}}",
                hint_type_name(hint),
                quote_scalar(name),
                quote_scalar(value)
            ),
        })
        .collect();
    format!("[{}]", items.join(", "))
}

/// The `snake_case` BSL name for a hint's type.
fn hint_type_name(hint: &Hint) -> &'static str {
    match hint.kind {
        browserlet_protocol::HintType::DataAttribute => "data_attribute",
        browserlet_protocol::HintType::Role => "role",
        browserlet_protocol::HintType::Type => "type",
        browserlet_protocol::HintType::AriaLabel => "aria_label",
        browserlet_protocol::HintType::Name => "name",
        browserlet_protocol::HintType::Id => "id",
        browserlet_protocol::HintType::TextContains => "text_contains",
        browserlet_protocol::HintType::PlaceholderContains => "placeholder_contains",
        browserlet_protocol::HintType::FieldsetContext => "fieldset_context",
        browserlet_protocol::HintType::AssociatedLabel => "associated_label",
        browserlet_protocol::HintType::LandmarkContext => "landmark_context",
        browserlet_protocol::HintType::SectionContext => "section_context",
        browserlet_protocol::HintType::NearLabel => "near_label",
        browserlet_protocol::HintType::PositionContext => "position_context",
        browserlet_protocol::HintType::ClassContains => "class_contains",
    }
}

#[cfg(test)]
mod tests {
    use browserlet_protocol::HintType;

    use super::*;

    const SCRIPT: &str = "\
name: login
steps:
  # Step 1: open the page
  - id: nav
    action: navigate
    value: https://example.com/login
  - id: submit
    action: click
    target:
      intent: submit button
      hints:
        - type: role
          value: button
        - type: text_contains
          value: Sign in
";

    #[test]
    fn replaces_block_style_hints_preserving_comment() {
        let new_hints = vec![Hint::plain(HintType::AriaLabel, "Submit form")];
        let out = rewrite_step_hints(SCRIPT, "login.bsl", 1, &new_hints).unwrap();
        assert!(out.contains("# Step 1: open the page"));
        assert!(out.contains("type: aria_label"));
        assert!(out.contains("value: Submit form"));
        assert!(!out.contains("type: role"));
    }

    #[test]
    fn replaces_flow_style_hints() {
        let script = "steps:\n  - action: click\n    target:\n      intent: x\n      hints: [{type: role, value: button}]\n";
        let new_hints = vec![Hint::plain(HintType::AriaLabel, "Submit")];
        let out = rewrite_step_hints(script, "s.bsl", 0, &new_hints).unwrap();
        assert!(out.contains("hints: [{type: aria_label, value: Submit}]"));
    }

    #[test]
    fn missing_step_index_errors() {
        let new_hints = vec![Hint::plain(HintType::Role, "button")];
        let err = rewrite_step_hints(SCRIPT, "login.bsl", 5, &new_hints).unwrap_err();
        assert!(matches!(err, Error::RewriteTargetNotFound { .. }));
    }

    #[test]
    fn quoting_only_applied_when_needed() {
        assert_eq!(quote_scalar("button"), "button");
        assert_eq!(quote_scalar("a: b"), "\"a: b\"");
        assert_eq!(quote_scalar(""), "\"\"");
    }
}
