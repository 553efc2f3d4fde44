use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::spec::FontSpec;
use crate::foundation::error::{CardError, CardResult};
use crate::text::wrap::MeasureText;

/// Size used whenever the built-in fallback font is selected; the
/// configured size is ignored for it.
pub const BUILTIN_FONT_SIZE_PX: f32 = 16.0;

/// RGBA8 brush color carried through Parley layouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// A registered font ready for layout and rasterization.
#[derive(Clone)]
pub struct LoadedFont {
    family: String,
    data: vello_cpu::peniko::FontData,
    size_px: f32,
}

impl LoadedFont {
    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn size_px(&self) -> f32 {
        self.size_px
    }

    pub(crate) fn data(&self) -> &vello_cpu::peniko::FontData {
        &self.data
    }
}

impl std::fmt::Debug for LoadedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedFont")
            .field("family", &self.family)
            .field("size_px", &self.size_px)
            .finish()
    }
}

/// Stateful helper for loading fonts and building Parley text layouts.
///
/// Fonts are cached by path for the engine's lifetime; one engine
/// serves one render invocation.
pub struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    by_path: HashMap<PathBuf, (String, vello_cpu::peniko::FontData)>,
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            by_path: HashMap::new(),
        }
    }

    /// Load the font a field asks for. [`FontSpec::Builtin`] resolves
    /// to a font discovered on the system and ignores `size_px`.
    pub fn load_font(&mut self, spec: &FontSpec, size_px: f32) -> CardResult<LoadedFont> {
        match spec {
            FontSpec::File(path) => self.load_font_file(path, size_px),
            FontSpec::Builtin => {
                let path = builtin_font_path()?;
                self.load_font_file(&path, BUILTIN_FONT_SIZE_PX)
            }
        }
    }

    fn load_font_file(&mut self, path: &Path, size_px: f32) -> CardResult<LoadedFont> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(CardError::validation(
                "font size must be finite and > 0",
            ));
        }

        if let Some((family, data)) = self.by_path.get(path) {
            return Ok(LoadedFont {
                family: family.clone(),
                data: data.clone(),
                size_px,
            });
        }

        let bytes = std::fs::read(path)
            .map_err(|e| CardError::font_load(format!("read font '{}': {e}", path.display())))?;

        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            CardError::font_load(format!(
                "'{}' contains no usable font families",
                path.display()
            ))
        })?;
        let family = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| {
                CardError::font_load(format!(
                    "font family in '{}' has no name",
                    path.display()
                ))
            })?
            .to_string();

        let data = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), 0);
        self.by_path
            .insert(path.to_path_buf(), (family.clone(), data.clone()));

        Ok(LoadedFont {
            family,
            data,
            size_px,
        })
    }

    /// Shape and lay out single-style text. Line breaks happen only at
    /// explicit newlines; width-constrained wrapping is done up front
    /// by [`crate::text::wrap::wrap_text`].
    pub fn layout(
        &mut self,
        font: &LoadedFont,
        text: &str,
        brush: TextBrushRgba8,
    ) -> parley::Layout<TextBrushRgba8> {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(font.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(font.size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }

    /// Measured `(width, height)` of `text` in pixels.
    pub fn measure(&mut self, font: &LoadedFont, text: &str) -> (f32, f32) {
        let layout = self.layout(font, text, TextBrushRgba8::default());
        (layout.full_width(), layout.height())
    }
}

/// [`MeasureText`] adapter over one engine + font pair.
pub struct FontMeasure<'a> {
    engine: &'a mut TextEngine,
    font: &'a LoadedFont,
}

impl<'a> FontMeasure<'a> {
    pub fn new(engine: &'a mut TextEngine, font: &'a LoadedFont) -> Self {
        Self { engine, font }
    }
}

impl MeasureText for FontMeasure<'_> {
    fn text_width(&mut self, text: &str) -> CardResult<f32> {
        Ok(self.engine.measure(self.font, text).0)
    }
}

/// Locate the font file backing [`FontSpec::Builtin`]: the first font
/// found under the conventional system font directories, in sorted
/// order so repeated runs agree.
pub fn builtin_font_path() -> CardResult<PathBuf> {
    for dir in builtin_font_dirs() {
        if let Some(path) = first_font_in(&dir, 2) {
            return Ok(path);
        }
    }
    Err(CardError::font_load(
        "no system font found for the built-in fallback; configure an explicit font path",
    ))
}

fn builtin_font_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/usr/share/fonts"),
        PathBuf::from("/usr/local/share/fonts"),
        PathBuf::from("/System/Library/Fonts"),
        PathBuf::from("/Library/Fonts"),
        PathBuf::from("C:\\Windows\\Fonts"),
    ];
    if let Ok(home) = std::env::var("HOME") {
        dirs.push(Path::new(&home).join(".local/share/fonts"));
        dirs.push(Path::new(&home).join("Library/Fonts"));
    }
    dirs
}

fn first_font_in(dir: &Path, depth: u32) -> Option<PathBuf> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .collect();
    entries.sort();

    for path in &entries {
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext == "ttf" || ext == "otf" || ext == "ttc" {
            return Some(path.clone());
        }
    }

    if depth > 0 {
        for path in &entries {
            if path.is_dir()
                && let Some(found) = first_font_in(path, depth - 1)
            {
                return Some(found);
            }
        }
    }

    None
}
