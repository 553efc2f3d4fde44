use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::model::{CardConfig, DefaultSpec, SourceSpec, ValueParser};
use crate::fields::template::Template;
use crate::foundation::{
    color::Rgba,
    error::{CardError, CardResult},
    geom::Padding,
};

/// Symbolic font name reserved for the backend's built-in fallback font.
pub const BUILTIN_FONT_NAME: &str = "default";

/// Font reference after symbolic-name resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FontSpec {
    /// Backend fallback font; ignores the requested size.
    Builtin,
    /// Font file on disk.
    File(PathBuf),
}

/// Where a field's value(s) come from, with the `multi`/list
/// polymorphism already resolved into explicit variants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldSource {
    /// One metadata key yielding one value.
    Single(String),
    /// One metadata key whose value is a sequence of independent values.
    Tags(String),
    /// An ordered list of keys feeding one format template.
    Composite(Vec<String>),
}

/// Fallback value(s) for optional fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldDefault {
    None,
    Shared(String),
    PerSource(BTreeMap<String, String>),
}

impl FieldDefault {
    /// Default string for one source key, if configured.
    pub fn for_key(&self, key: &str) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Shared(s) => Some(s),
            Self::PerSource(map) => map.get(key).map(String::as_str),
        }
    }
}

/// One fully-merged, immutable rendering instruction.
///
/// Built once by [`CardConfig::resolve`]; rendering never consults the
/// global defaults or re-normalizes anything.
#[derive(Clone, Debug)]
pub struct TextFieldSpec {
    pub source: FieldSource,
    pub optional: bool,
    pub default: FieldDefault,
    pub x: i32,
    pub y: i32,
    pub font: FontSpec,
    pub font_size: u32,
    pub fg: Rgba,
    pub bg: Option<Rgba>,
    pub padding: Padding,
    pub format: Option<Template>,
    pub parse: Option<ValueParser>,
    pub wrap: bool,
    pub max_width: Option<u32>,
    pub spacing: u32,
}

/// Everything rendering needs for one card layout.
#[derive(Clone, Debug)]
pub struct RenderPlan {
    pub template: PathBuf,
    pub output: String,
    pub fields: Vec<TextFieldSpec>,
}

impl CardConfig {
    /// Normalize this config into an immutable [`RenderPlan`].
    ///
    /// Merges the global defaults into every field, normalizes padding
    /// shorthand, resolves symbolic font names, collapses the
    /// `source`/`multi` and `default` polymorphism into tagged
    /// variants, and parses format templates. All load-time errors
    /// surface here instead of mid-render.
    pub fn resolve(&self) -> CardResult<RenderPlan> {
        let mut font_table = BTreeMap::new();
        for entry in &self.fonts {
            font_table.insert(entry.name.to_ascii_lowercase(), entry.path.clone());
        }

        let mut fields = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let source = match (&field.source, field.multi) {
                (SourceSpec::Single(key), false) => FieldSource::Single(key.clone()),
                (SourceSpec::Single(key), true) => FieldSource::Tags(key.clone()),
                (SourceSpec::Multiple(_), true) => {
                    return Err(CardError::validation(
                        "multi fields take a single source key, not a list",
                    ));
                }
                (SourceSpec::Multiple(keys), false) => {
                    if keys.is_empty() {
                        return Err(CardError::validation(
                            "source key list must be non-empty",
                        ));
                    }
                    FieldSource::Composite(keys.clone())
                }
            };

            let default = match &field.default {
                None => FieldDefault::None,
                Some(DefaultSpec::Shared(s)) => FieldDefault::Shared(s.clone()),
                Some(DefaultSpec::PerSource(map)) => FieldDefault::PerSource(map.clone()),
            };

            let format = field
                .format
                .as_deref()
                .map(Template::parse)
                .transpose()?;
            if matches!(source, FieldSource::Composite(_)) && format.is_none() {
                return Err(CardError::validation(
                    "fields with multiple source keys require a format template",
                ));
            }

            let font_name = field.font.as_deref().unwrap_or(&self.defaults.font);
            fields.push(TextFieldSpec {
                source,
                optional: field.optional,
                default,
                x: field.x,
                y: field.y,
                font: resolve_font(font_name, &font_table),
                font_size: field.font_size.unwrap_or(self.defaults.font_size),
                fg: field.fg.unwrap_or(self.defaults.fg),
                bg: field.bg.or(self.defaults.bg),
                padding: field
                    .padding
                    .unwrap_or(self.defaults.padding)
                    .normalize()?,
                format,
                parse: field.parse,
                wrap: field.wrap,
                max_width: field.max_width,
                spacing: field.spacing,
            });
        }

        Ok(RenderPlan {
            template: self.template.clone(),
            output: self.output.clone(),
            fields,
        })
    }
}

fn resolve_font(name: &str, table: &BTreeMap<String, PathBuf>) -> FontSpec {
    let key = name.to_ascii_lowercase();
    if key == BUILTIN_FONT_NAME {
        return FontSpec::Builtin;
    }
    match table.get(&key) {
        Some(path) => FontSpec::File(path.clone()),
        // Names missing from the font table are taken as paths.
        None => FontSpec::File(PathBuf::from(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(json: serde_json::Value) -> CardConfig {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn fields_inherit_unset_attributes_from_defaults() {
        let cfg = config(serde_json::json!({
            "template": "template.png",
            "defaults": {
                "font_size": 64,
                "fg": "#ffffff",
                "bg": "#00000080",
                "padding": 4,
            },
            "fields": [
                {"source": "title", "x": 10, "y": 20},
                {"source": "author", "x": 0, "y": 0, "font_size": 24, "fg": "#ff0000"},
            ],
        }));
        let plan = cfg.resolve().unwrap();

        let title = &plan.fields[0];
        assert_eq!(title.font_size, 64);
        assert_eq!(title.fg.to_rgba8(), [255, 255, 255, 255]);
        assert_eq!(title.bg.unwrap().to_rgba8(), [0, 0, 0, 128]);
        assert_eq!(title.padding, Padding::uniform(4));

        let author = &plan.fields[1];
        assert_eq!(author.font_size, 24);
        assert_eq!(author.fg.to_rgba8(), [255, 0, 0, 255]);
        assert_eq!(author.bg.unwrap().to_rgba8(), [0, 0, 0, 128]);
    }

    #[test]
    fn font_names_resolve_through_the_font_table() {
        let cfg = config(serde_json::json!({
            "template": "template.png",
            "fonts": [{"name": "Heading", "path": "fonts/heading.ttf"}],
            "fields": [
                {"source": "a", "x": 0, "y": 0, "font": "heading"},
                {"source": "b", "x": 0, "y": 0, "font": "other/path.ttf"},
                {"source": "c", "x": 0, "y": 0},
            ],
        }));
        let plan = cfg.resolve().unwrap();
        assert_eq!(
            plan.fields[0].font,
            FontSpec::File(PathBuf::from("fonts/heading.ttf"))
        );
        assert_eq!(
            plan.fields[1].font,
            FontSpec::File(PathBuf::from("other/path.ttf"))
        );
        assert_eq!(plan.fields[2].font, FontSpec::Builtin);
    }

    #[test]
    fn multi_resolves_to_tags_and_rejects_key_lists() {
        let cfg = config(serde_json::json!({
            "template": "template.png",
            "fields": [{"source": "tags", "multi": true, "x": 0, "y": 0}],
        }));
        let plan = cfg.resolve().unwrap();
        assert_eq!(plan.fields[0].source, FieldSource::Tags("tags".to_string()));

        let cfg = config(serde_json::json!({
            "template": "template.png",
            "fields": [{"source": ["a", "b"], "multi": true, "x": 0, "y": 0}],
        }));
        assert!(cfg.resolve().is_err());
    }

    #[test]
    fn composite_source_requires_a_format_template() {
        let cfg = config(serde_json::json!({
            "template": "template.png",
            "fields": [{"source": ["author", "date"], "x": 0, "y": 0}],
        }));
        assert!(cfg.resolve().is_err());

        let cfg = config(serde_json::json!({
            "template": "template.png",
            "fields": [{
                "source": ["author", "date"],
                "format": "{author} on {date}",
                "x": 0, "y": 0,
            }],
        }));
        assert!(cfg.resolve().is_ok());
    }

    #[test]
    fn bad_format_template_fails_at_load_time() {
        let cfg = config(serde_json::json!({
            "template": "template.png",
            "fields": [{"source": "title", "format": "{title", "x": 0, "y": 0}],
        }));
        let err = cfg.resolve().unwrap_err();
        assert!(err.to_string().contains("format error:"));
    }

    #[test]
    fn per_key_defaults_survive_normalization() {
        let cfg = config(serde_json::json!({
            "template": "template.png",
            "fields": [{
                "source": ["author", "date"],
                "format": "{author} on {date}",
                "default": {"author": "anonymous"},
                "optional": true,
                "x": 0, "y": 0,
            }],
        }));
        let plan = cfg.resolve().unwrap();
        assert_eq!(plan.fields[0].default.for_key("author"), Some("anonymous"));
        assert_eq!(plan.fields[0].default.for_key("date"), None);
    }
}
