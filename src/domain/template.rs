//! `{{placeholder}}` substitution for stored message templates.

use std::collections::BTreeMap;

/// Flat key → value map handed to [`render`].
pub type TemplateVars = BTreeMap<String, String>;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Replace every `{{key}}` whose key is present in `vars`.
///
/// Matching is exact and case-sensitive. Unknown placeholders are copied
/// through untouched, and substituted values are never scanned again.
pub fn render(template: &str, vars: &TemplateVars) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];

        let replaced = after_open.find(CLOSE).and_then(|end| {
            vars.get(&after_open[..end])
                .map(|value| (value, start + OPEN.len() + end + CLOSE.len()))
        });

        match replaced {
            Some((value, consumed)) => {
                out.push_str(value);
                rest = &rest[consumed..];
            }
            None => {
                // Emit a single brace so `{{{name}}}` still matches at the next offset.
                out.push('{');
                rest = &rest[start + 1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Distinct placeholder names in order of first appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        let after_open = &rest[start + OPEN.len()..];
        let Some(end) = after_open.find(CLOSE) else {
            break;
        };
        let key = &after_open[..end];
        if !key.is_empty() && !key.contains(OPEN) && !found.iter().any(|k| k == key) {
            found.push(key.to_string());
        }
        rest = &after_open[end + CLOSE.len()..];
    }

    found
}

/// Placeholders in `template` that `vars` cannot fill.
pub fn unresolved(template: &str, vars: &TemplateVars) -> Vec<String> {
    placeholders(template)
        .into_iter()
        .filter(|key| !vars.contains_key(key))
        .collect()
}
