//! The candidate descriptor: a DOM element serialized at the
//! resolver/diagnostic boundary. A `Candidate` holds no DOM reference once
//! constructed.

use serde::{Deserialize, Serialize};

/// Maximum length of `Candidate::visible_text`.
pub const VISIBLE_TEXT_MAX: usize = 80;

/// Maximum number of class tokens carried on a candidate.
pub const CLASS_TOKENS_MAX: usize = 3;

/// A scored DOM element as a serialized, DOM-reference-free descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Candidate {
    /// Lowercase tag name, e.g. `"button"`.
    pub tag: String,
    /// Visible text, truncated to [`VISIBLE_TEXT_MAX`] characters.
    pub visible_text: String,
    /// Selected HTML attributes.
    pub attributes: CandidateAttributes,
    /// Context derived from the element's position in the document.
    pub structural_context: StructuralContext,
}

impl Candidate {
    /// Build a candidate, truncating `visible_text` to [`VISIBLE_TEXT_MAX`].
    pub fn new(
        tag: impl Into<String>,
        visible_text: impl Into<String>,
        attributes: CandidateAttributes,
        structural_context: StructuralContext,
    ) -> Self {
        let mut visible_text: String = visible_text.into();
        if visible_text.chars().count() > VISIBLE_TEXT_MAX {
            visible_text = visible_text.chars().take(VISIBLE_TEXT_MAX).collect();
        }
        Self {
            tag: tag.into(),
            visible_text,
            attributes,
            structural_context,
        }
    }
}

/// Attributes carried by a candidate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidateAttributes {
    /// `id` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// `name` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `type` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    /// Computed or explicit ARIA role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// `aria-label` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aria_label: Option<String>,
    /// `placeholder` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// First [`CLASS_TOKENS_MAX`] class tokens, in document order.
    #[serde(default)]
    pub class_tokens: Vec<String>,
    /// `data-*` attributes relevant to `data_attribute` hints, keyed by the
    /// full attribute name (e.g. `"data-testid"`).
    #[serde(default)]
    pub data_attributes: std::collections::BTreeMap<String, String>,
}

/// Structural position of a candidate within the document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StructuralContext {
    /// Nearest enclosing `<fieldset>`'s `<legend>` text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fieldset_legend: Option<String>,
    /// Text of an associated `<label for=…>` or `aria-labelledby` target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub associated_label: Option<String>,
    /// Nearest enclosing ARIA landmark role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landmark: Option<String>,
    /// Nearest preceding `<h1>`–`<h6>` text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_heading: Option<String>,
    /// Nearest visible label text within the near-label search radius.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub near_label: Option<String>,
    /// Row/column/sibling index, for `position_context` hints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionIndex>,
}

/// A computed row/column/sibling index used by `position_context` matching.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PositionIndex {
    /// Zero-based row index within the nearest table, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<u32>,
    /// Zero-based column index within the nearest table, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub col: Option<u32>,
    /// Zero-based index among the element's siblings.
    pub index: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_visible_text_to_eighty_chars() {
        let long = "x".repeat(200);
        let candidate = Candidate::new(
            "button",
            long,
            CandidateAttributes::default(),
            StructuralContext::default(),
        );
        assert_eq!(candidate.visible_text.chars().count(), VISIBLE_TEXT_MAX);
    }
}
