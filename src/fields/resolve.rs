use std::collections::BTreeMap;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

use crate::config::model::ValueParser;
use crate::config::spec::{FieldSource, TextFieldSpec};
use crate::foundation::error::{CardError, CardResult};

/// Parsed frontmatter of one input document: string keys to arbitrary
/// (possibly nested/list-valued) data. Produced by an external
/// frontmatter-extraction collaborator.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// One metadata value after lookup and the optional parse transform.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Text(String),
    Timestamp(DateTime<FixedOffset>),
}

impl FieldValue {
    /// Render without a format spec.
    pub fn render_plain(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Timestamp(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Render with a strftime format spec; only datetime-parsed values
    /// accept one.
    pub fn render_spec(&self, spec: &str) -> CardResult<String> {
        match self {
            Self::Text(_) => Err(CardError::format(format!(
                "format spec '{spec}' is only valid for datetime-parsed values"
            ))),
            Self::Timestamp(dt) => {
                let items: Vec<Item<'_>> = StrftimeItems::new(spec).collect();
                if items.iter().any(|item| matches!(item, Item::Error)) {
                    return Err(CardError::format(format!(
                        "invalid datetime format spec '{spec}'"
                    )));
                }
                Ok(dt.format_with_items(items.into_iter()).to_string())
            }
        }
    }
}

/// Final string(s) for one field, ready to draw.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolvedValue {
    One(String),
    Many(Vec<String>),
}

/// Resolve one field's value(s) from the metadata mapping, applying
/// defaults, the optional parse transform, and the format template.
pub fn resolve_field(meta: &Metadata, field: &TextFieldSpec) -> CardResult<ResolvedValue> {
    match &field.source {
        FieldSource::Single(key) => {
            let value = resolve_one(
                meta,
                key,
                field.default.for_key(key),
                field.optional,
                field.parse,
            )?;
            let text = match &field.format {
                None => value.render_plain(),
                // The value binds both positionally and under its own
                // source-key name.
                Some(template) => {
                    let named = BTreeMap::from([(key.as_str(), &value)]);
                    template.render(Some(&value), &named)?
                }
            };
            Ok(ResolvedValue::One(text))
        }
        FieldSource::Tags(key) => {
            let values = resolve_seq(
                meta,
                key,
                field.default.for_key(key),
                field.optional,
                field.parse,
            )?;
            let mut out = Vec::with_capacity(values.len());
            for value in &values {
                out.push(match &field.format {
                    None => value.render_plain(),
                    Some(template) => {
                        let named = BTreeMap::from([(key.as_str(), value)]);
                        template.render(Some(value), &named)?
                    }
                });
            }
            Ok(ResolvedValue::Many(out))
        }
        FieldSource::Composite(keys) => {
            let mut values = Vec::with_capacity(keys.len());
            for key in keys {
                values.push((
                    key.as_str(),
                    resolve_one(
                        meta,
                        key,
                        field.default.for_key(key),
                        field.optional,
                        field.parse,
                    )?,
                ));
            }
            let named: BTreeMap<&str, &FieldValue> =
                values.iter().map(|(key, value)| (*key, value)).collect();
            let template = field.format.as_ref().ok_or_else(|| {
                CardError::validation("composite source fields require a format template")
            })?;
            Ok(ResolvedValue::One(template.render(None, &named)?))
        }
    }
}

fn resolve_one(
    meta: &Metadata,
    key: &str,
    default: Option<&str>,
    optional: bool,
    parser: Option<ValueParser>,
) -> CardResult<FieldValue> {
    match lookup(meta, key) {
        Some(raw) => to_field_value(raw, key, parser),
        None if optional => Ok(FieldValue::Text(default.unwrap_or("").to_string())),
        None => Err(CardError::missing_field(key)),
    }
}

fn resolve_seq(
    meta: &Metadata,
    key: &str,
    default: Option<&str>,
    optional: bool,
    parser: Option<ValueParser>,
) -> CardResult<Vec<FieldValue>> {
    let Some(raw) = lookup(meta, key) else {
        if optional {
            return Ok(Vec::new());
        }
        return Err(CardError::missing_field(key));
    };

    let serde_json::Value::Array(items) = raw else {
        return Err(CardError::validation(format!(
            "frontmatter key '{key}' must hold a sequence for a multi field"
        )));
    };

    items
        .iter()
        .map(|item| {
            if item.is_null() {
                if optional {
                    Ok(FieldValue::Text(default.unwrap_or("").to_string()))
                } else {
                    Err(CardError::missing_field(key))
                }
            } else {
                to_field_value(item, key, parser)
            }
        })
        .collect()
}

/// A JSON `null` behaves exactly like an absent key.
fn lookup<'m>(meta: &'m Metadata, key: &str) -> Option<&'m serde_json::Value> {
    meta.get(key).filter(|value| !value.is_null())
}

fn to_field_value(
    raw: &serde_json::Value,
    key: &str,
    parser: Option<ValueParser>,
) -> CardResult<FieldValue> {
    let text = match raw {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => {
            return Err(CardError::validation(format!(
                "frontmatter key '{key}' does not hold a scalar value"
            )));
        }
    };
    match parser {
        None => Ok(FieldValue::Text(text)),
        Some(ValueParser::Datetime) => Ok(FieldValue::Timestamp(parse_datetime(&text)?)),
    }
}

fn parse_datetime(raw: &str) -> CardResult<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(dt.and_utc().fixed_offset());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc().fixed_offset());
    }
    Err(CardError::parse(format!(
        "can't interpret '{raw}' as a datetime"
    )))
}
