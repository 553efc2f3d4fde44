use std::collections::BTreeMap;

use crate::fields::resolve::FieldValue;
use crate::foundation::error::{CardError, CardResult};

/// Pre-parsed `str.format`-style template.
///
/// Supported placeholders: `{}` (the field's own value), `{name}`
/// (a named substitution), and a `:%…` strftime spec on either form
/// for datetime-parsed values. `{{` and `}}` escape literal braces.
/// Parsed once at configuration load so malformed templates never
/// surface mid-render.
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    segments: Vec<Segment>,
}

#[derive(Clone, Debug, PartialEq)]
enum Segment {
    Literal(String),
    Placeholder {
        /// `None` for the positional `{}` form.
        key: Option<String>,
        spec: Option<String>,
    },
}

impl Template {
    pub fn parse(raw: &str) -> CardResult<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = raw;

        while let Some(idx) = rest.find(['{', '}']) {
            literal.push_str(&rest[..idx]);
            let after = &rest[idx + 1..];

            if rest.as_bytes()[idx] == b'{' {
                if let Some(tail) = after.strip_prefix('{') {
                    literal.push('{');
                    rest = tail;
                    continue;
                }
                let Some(end) = after.find('}') else {
                    return Err(CardError::format(format!(
                        "unterminated '{{' in template \"{raw}\""
                    )));
                };
                let body = &after[..end];
                if body.contains('{') {
                    return Err(CardError::format(format!(
                        "nested '{{' in template \"{raw}\""
                    )));
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                let (name, spec) = match body.split_once(':') {
                    Some((name, spec)) => (name, Some(spec.to_string())),
                    None => (body, None),
                };
                segments.push(Segment::Placeholder {
                    key: (!name.is_empty()).then(|| name.to_string()),
                    spec,
                });
                rest = &after[end + 1..];
            } else if let Some(tail) = after.strip_prefix('}') {
                literal.push('}');
                rest = tail;
            } else {
                return Err(CardError::format(format!(
                    "single '}}' in template \"{raw}\""
                )));
            }
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    /// Substitute `positional` for `{}` and `named` entries for
    /// `{name}`. A placeholder with no matching value is a
    /// [`CardError::Format`].
    pub fn render(
        &self,
        positional: Option<&FieldValue>,
        named: &BTreeMap<&str, &FieldValue>,
    ) -> CardResult<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder { key, spec } => {
                    let value = match key {
                        None => positional.ok_or_else(|| {
                            CardError::format(
                                "template uses '{}' but no positional value is available",
                            )
                        })?,
                        Some(name) => *named.get(name.as_str()).ok_or_else(|| {
                            CardError::format(format!(
                                "template references unknown name '{name}'"
                            ))
                        })?,
                    };
                    match spec {
                        None => out.push_str(&value.render_plain()),
                        Some(spec) => out.push_str(&value.render_spec(spec)?),
                    }
                }
            }
        }
        Ok(out)
    }
}
