//! The closed set of semantic hint types and their process-wide weights.

use serde::{Deserialize, Serialize};

/// A single weighted predicate describing how to find an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hint {
    /// Which predicate this hint applies.
    #[serde(rename = "type")]
    pub kind: HintType,
    /// The value(s) the predicate matches against.
    pub value: HintValue,
}

impl Hint {
    /// Create a hint carrying a plain string value.
    pub fn plain(kind: HintType, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: HintValue::Plain(value.into()),
        }
    }

    /// Create a `data_attribute` hint with an explicit attribute name.
    pub fn named(kind: HintType, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: HintValue::Named {
                name: name.into(),
                value: value.into(),
            },
        }
    }

    /// The process-wide weight for this hint's type.
    pub fn weight(&self) -> f64 {
        self.kind.weight()
    }
}

/// A hint's value: most hints carry a plain string, `data_attribute` carries
/// an explicit `{name, value}` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HintValue {
    /// A bare string value, e.g. the text a `role` hint must match.
    Plain(String),
    /// A named attribute pair, used by `data_attribute`.
    Named {
        /// Attribute name, e.g. `data-testid`.
        name: String,
        /// Attribute value to match.
        value: String,
    },
}

impl HintValue {
    /// Return the value as a plain string, ignoring any attribute name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Plain(s) => s,
            Self::Named { value, .. } => value,
        }
    }
}

/// The closed set of hint types. No other hint type may ever be scored:
/// this list and the weights in [`HintType::weight`] are process-wide
/// constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintType {
    /// `{name, value}` pair form; matches that attribute exactly.
    DataAttribute,
    /// ARIA role.
    Role,
    /// `type=` attribute on form controls.
    Type,
    /// `aria-label` exact-or-substring.
    AriaLabel,
    /// `name=` attribute.
    Name,
    /// `id=` attribute.
    Id,
    /// Visible text substring.
    TextContains,
    /// Placeholder substring.
    PlaceholderContains,
    /// Containing `<fieldset>`'s legend.
    FieldsetContext,
    /// `<label for=…>` or `aria-labelledby`.
    AssociatedLabel,
    /// Nearest ARIA landmark.
    LandmarkContext,
    /// Nearest preceding heading.
    SectionContext,
    /// Nearest visible label text.
    NearLabel,
    /// n-th row/cell inside a table.
    PositionContext,
    /// Class-token substring.
    ClassContains,
}

impl HintType {
    /// The process-wide weight for this hint type.
    pub fn weight(self) -> f64 {
        match self {
            Self::DataAttribute | Self::Role | Self::Type => 1.00,
            Self::AriaLabel | Self::Name => 0.90,
            Self::Id => 0.85,
            Self::TextContains => 0.80,
            Self::PlaceholderContains | Self::FieldsetContext | Self::AssociatedLabel => 0.70,
            Self::LandmarkContext => 0.65,
            Self::SectionContext => 0.60,
            Self::NearLabel => 0.60,
            Self::PositionContext => 0.55,
            Self::ClassContains => 0.50,
        }
    }

    /// Whether this hint type alone is sufficient for a stage-1 exact-anchor
    /// lookup.
    pub fn is_exact_anchor(self) -> bool {
        matches!(self, Self::DataAttribute | Self::Id | Self::Name)
    }

    /// All fifteen hint types, in the published table's order.
    pub const ALL: [HintType; 15] = [
        Self::DataAttribute,
        Self::Role,
        Self::Type,
        Self::AriaLabel,
        Self::Name,
        Self::Id,
        Self::TextContains,
        Self::PlaceholderContains,
        Self::FieldsetContext,
        Self::AssociatedLabel,
        Self::LandmarkContext,
        Self::SectionContext,
        Self::NearLabel,
        Self::PositionContext,
        Self::ClassContains,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_match_published_table() {
        assert_eq!(HintType::DataAttribute.weight(), 1.00);
        assert_eq!(HintType::Role.weight(), 1.00);
        assert_eq!(HintType::Type.weight(), 1.00);
        assert_eq!(HintType::AriaLabel.weight(), 0.90);
        assert_eq!(HintType::Name.weight(), 0.90);
        assert_eq!(HintType::Id.weight(), 0.85);
        assert_eq!(HintType::TextContains.weight(), 0.80);
        assert_eq!(HintType::PlaceholderContains.weight(), 0.70);
        assert_eq!(HintType::FieldsetContext.weight(), 0.70);
        assert_eq!(HintType::AssociatedLabel.weight(), 0.70);
        assert_eq!(HintType::LandmarkContext.weight(), 0.65);
        assert_eq!(HintType::SectionContext.weight(), 0.60);
        assert_eq!(HintType::NearLabel.weight(), 0.60);
        assert_eq!(HintType::PositionContext.weight(), 0.55);
        assert_eq!(HintType::ClassContains.weight(), 0.50);
    }

    #[test]
    fn serializes_as_snake_case() {
        let hint = Hint::plain(HintType::AriaLabel, "Submit form");
        let json = serde_json::to_string(&hint).unwrap();
        assert!(json.contains("\"aria_label\""));
    }

    #[test]
    fn named_value_round_trips() {
        let hint = Hint::named(HintType::DataAttribute, "data-testid", "submit-btn");
        let json = serde_json::to_string(&hint).unwrap();
        let back: Hint = serde_json::from_str(&json).unwrap();
        assert_eq!(hint, back);
    }
}
