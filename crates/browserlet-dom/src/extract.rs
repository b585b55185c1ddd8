//! JS-side candidate extraction: walks the live DOM once per scan and
//! returns a plain JSON array our side turns into [`Candidate`]s. Keeping the
//! structural-context computation (nearest `<label>`, enclosing `<fieldset>`,
//! landmark role, row/col position) in the page avoids round-tripping the
//! DOM tree through CDP node-by-node.

use browserlet_protocol::{Candidate, CandidateAttributes, PositionIndex, StructuralContext};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Attribute used to tag scanned elements so later actions (click, type, …)
/// can find the exact element a [`Candidate`] was built from, without the
/// candidate itself ever holding a DOM handle.
pub const REF_ATTRIBUTE: &str = "data-browserlet-ref";

/// Evaluated in the page to stamp every candidate element with a unique
/// `data-browserlet-ref` and return its descriptor. Intentionally broad: the
/// cascade resolver's later stages narrow this set down by hint weight, not
/// by a tighter selector here.
pub const SCAN_SCRIPT: &str = r#"
(() => {
  const SELECTOR = [
    'a[href]', 'button', 'input', 'select', 'textarea',
    '[role]', '[data-testid]', '[data-test]', '[data-qa]', '[data-cy]',
    '[aria-label]', '[contenteditable="true"]'
  ].join(',');

  const isVisible = (el) => {
    const rect = el.getBoundingClientRect();
    if (rect.width <= 0 || rect.height <= 0) return false;
    const style = window.getComputedStyle(el);
    return style.visibility !== 'hidden' && style.display !== 'none';
  };

  const nearestLandmark = (el) => {
    let cur = el;
    while (cur) {
      const role = cur.getAttribute && cur.getAttribute('role');
      if (role && ['navigation', 'main', 'banner', 'contentinfo', 'form', 'search'].includes(role)) {
        return role;
      }
      const tag = cur.tagName && cur.tagName.toLowerCase();
      if (['nav', 'main', 'header', 'footer', 'form'].includes(tag)) return tag;
      cur = cur.parentElement;
    }
    return null;
  };

  const nearestFieldsetLegend = (el) => {
    const fieldset = el.closest('fieldset');
    if (!fieldset) return null;
    const legend = fieldset.querySelector('legend');
    return legend ? legend.textContent.trim().slice(0, 80) : null;
  };

  const associatedLabel = (el) => {
    if (el.id) {
      const byFor = document.querySelector(`label[for="${CSS.escape(el.id)}"]`);
      if (byFor) return byFor.textContent.trim().slice(0, 80);
    }
    const enclosing = el.closest('label');
    return enclosing ? enclosing.textContent.trim().slice(0, 80) : null;
  };

  const nearestSectionHeading = (el) => {
    const section = el.closest('section, article, [role="region"]');
    if (!section) return null;
    const heading = section.querySelector('h1, h2, h3, h4, h5, h6');
    return heading ? heading.textContent.trim().slice(0, 80) : null;
  };

  const nearLabelText = (el) => {
    const prev = el.previousElementSibling;
    if (prev && prev.textContent && prev.textContent.trim()) {
      return prev.textContent.trim().slice(0, 80);
    }
    const parent = el.parentElement;
    if (parent) {
      const text = Array.from(parent.childNodes)
        .filter((n) => n.nodeType === Node.TEXT_NODE)
        .map((n) => n.textContent.trim())
        .filter(Boolean)
        .join(' ');
      if (text) return text.slice(0, 80);
    }
    return null;
  };

  const rowColPosition = (el, index) => {
    const cell = el.closest('td, th');
    const row = cell ? cell.parentElement : null;
    if (cell && row) {
      const col = Array.from(row.children).indexOf(cell);
      const table = row.closest('table');
      const rowIndex = table ? Array.from(table.querySelectorAll('tr')).indexOf(row) : 0;
      return { row: rowIndex, col, index };
    }
    return { row: null, col: null, index };
  };

  const classTokens = (el) =>
    Array.from(el.classList || []).slice(0, 3);

  const dataAttributes = (el) => {
    const out = {};
    for (const attr of el.attributes) {
      if (attr.name.startsWith('data-') && attr.name !== 'data-browserlet-ref') {
        out[attr.name] = attr.value;
      }
    }
    return out;
  };

  const nodes = Array.from(document.querySelectorAll(SELECTOR)).filter(isVisible);
  const out = [];
  nodes.forEach((el, index) => {
    let ref = el.getAttribute('data-browserlet-ref');
    if (!ref) {
      ref = 'bl-' + Math.random().toString(36).slice(2) + '-' + index;
      el.setAttribute('data-browserlet-ref', ref);
    }
    const pos = rowColPosition(el, index);
    out.push({
      element_ref: ref,
      tag: el.tagName.toLowerCase(),
      visible_text: (el.innerText || el.value || el.textContent || '').trim().slice(0, 80),
      attributes: {
        id: el.id || null,
        name: el.getAttribute('name'),
        type: el.getAttribute('type'),
        role: el.getAttribute('role'),
        aria_label: el.getAttribute('aria-label'),
        placeholder: el.getAttribute('placeholder'),
        class_tokens: classTokens(el),
        data_attributes: dataAttributes(el),
      },
      structural_context: {
        fieldset_legend: nearestFieldsetLegend(el),
        associated_label: associatedLabel(el),
        landmark: nearestLandmark(el),
        section_heading: nearestSectionHeading(el),
        near_label: nearLabelText(el),
        position: pos,
      },
    });
  });
  return JSON.stringify(out);
})()
"#;

/// A raw scan result from [`SCAN_SCRIPT`], before it is split into the
/// DOM-handle-free [`Candidate`] and the opaque ref used to act on it.
#[derive(Debug, Deserialize)]
struct RawCandidate {
    element_ref: String,
    tag: String,
    visible_text: String,
    attributes: RawAttributes,
    structural_context: RawContext,
}

#[derive(Debug, Deserialize)]
struct RawAttributes {
    id: Option<String>,
    name: Option<String>,
    r#type: Option<String>,
    role: Option<String>,
    aria_label: Option<String>,
    placeholder: Option<String>,
    class_tokens: Vec<String>,
    data_attributes: std::collections::BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RawContext {
    fieldset_legend: Option<String>,
    associated_label: Option<String>,
    landmark: Option<String>,
    section_heading: Option<String>,
    near_label: Option<String>,
    position: RawPosition,
}

#[derive(Debug, Deserialize)]
struct RawPosition {
    row: Option<u32>,
    col: Option<u32>,
    index: u32,
}

/// Parse the JSON string returned by [`SCAN_SCRIPT`] into `(element_ref,
/// Candidate)` pairs.
pub fn parse_scan_result(json: &str) -> Result<Vec<(String, Candidate)>> {
    let raw: Vec<RawCandidate> =
        serde_json::from_str(json).map_err(|e| Error::Query(e.to_string()))?;

    Ok(raw
        .into_iter()
        .map(|r| {
            let candidate = Candidate::new(
                r.tag,
                r.visible_text,
                CandidateAttributes {
                    id: r.attributes.id,
                    name: r.attributes.name,
                    r#type: r.attributes.r#type,
                    role: r.attributes.role,
                    aria_label: r.attributes.aria_label,
                    placeholder: r.attributes.placeholder,
                    class_tokens: r.attributes.class_tokens,
                    data_attributes: r.attributes.data_attributes,
                },
                StructuralContext {
                    fieldset_legend: r.structural_context.fieldset_legend,
                    associated_label: r.structural_context.associated_label,
                    landmark: r.structural_context.landmark,
                    section_heading: r.structural_context.section_heading,
                    near_label: r.structural_context.near_label,
                    position: Some(PositionIndex {
                        row: r.structural_context.position.row,
                        col: r.structural_context.position.col,
                        index: r.structural_context.position.index,
                    }),
                },
            );
            (r.element_ref, candidate)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_scan_result() {
        let json = r#"[{
            "element_ref": "bl-abc-0",
            "tag": "button",
            "visible_text": "Sign in",
            "attributes": {
                "id": "submit", "name": null, "type": "submit", "role": null,
                "aria_label": null, "placeholder": null,
                "class_tokens": ["btn", "btn-primary"], "data_attributes": {}
            },
            "structural_context": {
                "fieldset_legend": null, "associated_label": null, "landmark": "form",
                "section_heading": null, "near_label": null,
                "position": {"row": null, "col": null, "index": 3}
            }
        }]"#;
        let parsed = parse_scan_result(json).unwrap();
        assert_eq!(parsed.len(), 1);
        let (element_ref, candidate) = &parsed[0];
        assert_eq!(element_ref, "bl-abc-0");
        assert_eq!(candidate.tag, "button");
        assert_eq!(candidate.attributes.id.as_deref(), Some("submit"));
        assert_eq!(candidate.structural_context.landmark.as_deref(), Some("form"));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(parse_scan_result("not json").is_err());
    }
}
