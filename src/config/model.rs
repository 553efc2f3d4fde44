use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::{
    color::Rgba,
    error::{CardError, CardResult},
    geom::Padding,
};

/// Root configuration document for one card layout.
///
/// This is the raw serde form: padding shorthand, polymorphic
/// `source`/`default` values, and unset style attributes are all still
/// present. [`CardConfig::resolve`] normalizes everything into the
/// immutable specs that rendering consumes.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CardConfig {
    pub template: PathBuf,

    /// Output filename pattern, commonly templated with a per-document
    /// slug by the caller. Unused by the renderer itself.
    #[serde(default = "default_output_pattern")]
    pub output: String,

    #[serde(default)]
    pub defaults: StyleDefaults,

    #[serde(default)]
    pub fonts: Vec<FontEntry>,

    #[serde(default, alias = "text_fields")]
    pub fields: Vec<FieldConfig>,
}

impl CardConfig {
    pub fn from_json_str(text: &str) -> CardResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| CardError::validation(format!("invalid card config: {e}")))
    }

    pub fn from_path(path: &Path) -> CardResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read card config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }
}

fn default_output_pattern() -> String {
    "out-{slug}.png".to_string()
}

/// Global style defaults inherited by every field attribute left unset.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StyleDefaults {
    #[serde(default = "default_font_name")]
    pub font: String,

    #[serde(default = "default_font_size")]
    pub font_size: u32,

    #[serde(default = "default_fg")]
    pub fg: Rgba,

    #[serde(default)]
    pub bg: Option<Rgba>,

    #[serde(default)]
    pub padding: PaddingSpec,
}

impl Default for StyleDefaults {
    fn default() -> Self {
        Self {
            font: default_font_name(),
            font_size: default_font_size(),
            fg: default_fg(),
            bg: None,
            padding: PaddingSpec::default(),
        }
    }
}

fn default_font_name() -> String {
    "default".to_string()
}

fn default_font_size() -> u32 {
    40
}

fn default_fg() -> Rgba {
    Rgba::opaque(0.0, 0.0, 0.0)
}

/// Symbolic font name mapped to a font file on disk.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FontEntry {
    pub name: String,
    pub path: PathBuf,
}

/// One text field as written in the config document.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    pub source: SourceSpec,

    /// Treat the source's metadata value as a sequence of independent
    /// values (tag field).
    #[serde(default)]
    pub multi: bool,

    #[serde(default)]
    pub optional: bool,

    #[serde(default)]
    pub default: Option<DefaultSpec>,

    pub x: i32,
    pub y: i32,

    #[serde(default)]
    pub font: Option<String>,

    #[serde(default)]
    pub font_size: Option<u32>,

    #[serde(default)]
    pub fg: Option<Rgba>,

    #[serde(default)]
    pub bg: Option<Rgba>,

    #[serde(default)]
    pub padding: Option<PaddingSpec>,

    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub parse: Option<ValueParser>,

    #[serde(default)]
    pub wrap: bool,

    #[serde(default)]
    pub max_width: Option<u32>,

    #[serde(default)]
    pub spacing: u32,
}

/// `source` accepts either one metadata key or an ordered list of keys.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(untagged)]
pub enum SourceSpec {
    Single(String),
    Multiple(Vec<String>),
}

/// `default` accepts either one shared string or a per-source-key map.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(untagged)]
pub enum DefaultSpec {
    Shared(String),
    PerSource(BTreeMap<String, String>),
}

/// Value transform applied to a raw metadata value before formatting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueParser {
    Datetime,
}

/// Padding as written in config: a uniform scalar or named sides,
/// where `horizontal`/`vertical` are shorthands for left+right and
/// top+bottom respectively.
#[derive(Clone, Copy, Debug, serde::Deserialize)]
#[serde(untagged)]
pub enum PaddingSpec {
    Uniform(u32),
    Sides {
        #[serde(default)]
        horizontal: Option<u32>,
        #[serde(default)]
        vertical: Option<u32>,
        #[serde(default)]
        top: Option<u32>,
        #[serde(default)]
        left: Option<u32>,
        #[serde(default)]
        bottom: Option<u32>,
        #[serde(default)]
        right: Option<u32>,
    },
}

impl Default for PaddingSpec {
    fn default() -> Self {
        Self::Uniform(0)
    }
}

impl PaddingSpec {
    /// Normalize into the four-sided form, rejecting conflicting
    /// shorthand combinations.
    pub fn normalize(self) -> CardResult<Padding> {
        match self {
            Self::Uniform(v) => Ok(Padding::uniform(v)),
            Self::Sides {
                horizontal,
                vertical,
                top,
                left,
                bottom,
                right,
            } => {
                if horizontal.is_some() && (left.is_some() || right.is_some()) {
                    return Err(CardError::validation(
                        "padding can't combine 'horizontal' with 'left' or 'right'",
                    ));
                }
                if vertical.is_some() && (top.is_some() || bottom.is_some()) {
                    return Err(CardError::validation(
                        "padding can't combine 'vertical' with 'top' or 'bottom'",
                    ));
                }
                Ok(Padding {
                    top: vertical.or(top).unwrap_or(0),
                    left: horizontal.or(left).unwrap_or(0),
                    bottom: vertical.or(bottom).unwrap_or(0),
                    right: horizontal.or(right).unwrap_or(0),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_config_fills_defaults() {
        let cfg = CardConfig::from_json_str(
            r#"{"template": "template.png", "fields": [{"source": "title", "x": 0, "y": 0}]}"#,
        )
        .unwrap();
        assert_eq!(cfg.output, "out-{slug}.png");
        assert_eq!(cfg.defaults.font, "default");
        assert_eq!(cfg.defaults.font_size, 40);
        assert_eq!(cfg.fields.len(), 1);
        assert_eq!(
            cfg.fields[0].source,
            SourceSpec::Single("title".to_string())
        );
        assert!(!cfg.fields[0].multi);
    }

    #[test]
    fn unknown_field_attribute_is_rejected() {
        let err = CardConfig::from_json_str(
            r#"{"template": "t.png", "fields": [{"source": "title", "x": 0, "y": 0, "fnt": "x"}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("validation error:"));
    }

    #[test]
    fn source_list_and_default_map_deserialize() {
        let field: FieldConfig = serde_json::from_value(json!({
            "source": ["author", "date"],
            "default": {"author": "anonymous"},
            "format": "{author} on {date}",
            "x": 10,
            "y": 20,
        }))
        .unwrap();
        assert_eq!(
            field.source,
            SourceSpec::Multiple(vec!["author".to_string(), "date".to_string()])
        );
        let DefaultSpec::PerSource(map) = field.default.unwrap() else {
            panic!("expected per-source default");
        };
        assert_eq!(map.get("author").map(String::as_str), Some("anonymous"));
    }

    #[test]
    fn parse_tag_deserializes() {
        let field: FieldConfig = serde_json::from_value(json!({
            "source": "date",
            "parse": "datetime",
            "x": 0,
            "y": 0,
        }))
        .unwrap();
        assert_eq!(field.parse, Some(ValueParser::Datetime));
    }

    #[test]
    fn padding_scalar_normalizes_to_four_sides() {
        let spec: PaddingSpec = serde_json::from_value(json!(6)).unwrap();
        assert_eq!(spec.normalize().unwrap(), Padding::uniform(6));
    }

    #[test]
    fn padding_shorthand_expands() {
        let spec: PaddingSpec =
            serde_json::from_value(json!({"horizontal": 8, "vertical": 2})).unwrap();
        assert_eq!(
            spec.normalize().unwrap(),
            Padding {
                top: 2,
                left: 8,
                bottom: 2,
                right: 8
            }
        );
    }

    #[test]
    fn padding_conflicts_are_rejected() {
        let spec: PaddingSpec =
            serde_json::from_value(json!({"horizontal": 8, "left": 1})).unwrap();
        assert!(spec.normalize().is_err());

        let spec: PaddingSpec =
            serde_json::from_value(json!({"vertical": 8, "bottom": 1})).unwrap();
        assert!(spec.normalize().is_err());
    }
}
