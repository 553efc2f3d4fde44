//! Cardforge renders text pulled from a document's frontmatter onto a
//! template image, producing a "card" image for social-media previews.
//!
//! # Pipeline overview
//!
//! 1. **Load**: a config document deserializes into [`CardConfig`];
//!    [`CardConfig::resolve`] merges global defaults, normalizes
//!    padding/source/default shorthands, resolves symbolic font names,
//!    and parses format templates into an immutable [`RenderPlan`].
//! 2. **Resolve**: per field, [`resolve_field`] pulls value(s) out of
//!    the metadata mapping, applying defaults, the optional datetime
//!    parse, and `str.format`-style templating.
//! 3. **Draw**: [`render`] lays out each value with Parley (wrapping
//!    against a pixel budget when asked), rasterizes glyphs and
//!    background boxes into transparent scratch layers with the CPU
//!    renderer, and composites them over the template in premultiplied
//!    RGBA8.
//!
//! Rendering is single-threaded, synchronous, and fails fast: one
//! field's error aborts the whole render. Frontmatter extraction,
//! output paths, and file persistence stay with the caller.
#![forbid(unsafe_code)]

mod config;
mod fields;
mod foundation;
mod render;
mod text;

pub use config::model::{
    CardConfig, DefaultSpec, FieldConfig, FontEntry, PaddingSpec, SourceSpec, StyleDefaults,
    ValueParser,
};
pub use config::spec::{
    BUILTIN_FONT_NAME, FieldDefault, FieldSource, FontSpec, RenderPlan, TextFieldSpec,
};
pub use fields::resolve::{FieldValue, Metadata, ResolvedValue, resolve_field};
pub use fields::template::Template;
pub use foundation::color::Rgba;
pub use foundation::error::{CardError, CardResult};
pub use foundation::geom::Padding;
pub use render::canvas::CardCanvas;
pub use render::draw::{render, render_plan};
pub use text::engine::{
    BUILTIN_FONT_SIZE_PX, FontMeasure, LoadedFont, TextBrushRgba8, TextEngine, builtin_font_path,
};
pub use text::wrap::{MeasureText, wrap_text};
