use crate::config::spec::{RenderPlan, TextFieldSpec};
use crate::fields::resolve::{Metadata, ResolvedValue, resolve_field};
use crate::foundation::{
    color::Rgba,
    error::{CardError, CardResult},
};
use crate::render::canvas::CardCanvas;
use crate::text::engine::{FontMeasure, LoadedFont, TextBrushRgba8, TextEngine};
use crate::text::wrap::wrap_text;

/// Render every field onto the template canvas, in configuration
/// order. Later fields draw over earlier ones.
///
/// The canvas is exclusively owned and mutated for the duration of the
/// call and returned as the finished card.
#[tracing::instrument(skip_all, fields(field_count = fields.len()))]
pub fn render(
    metadata: &Metadata,
    fields: &[TextFieldSpec],
    template: CardCanvas,
) -> CardResult<CardCanvas> {
    let mut canvas = template;
    let mut engine = TextEngine::new();

    for field in fields {
        tracing::debug!(source = ?field.source, "rendering field");
        match resolve_field(metadata, field)? {
            ResolvedValue::One(text) => draw_text_field(&mut canvas, &mut engine, field, &text)?,
            ResolvedValue::Many(tags) => draw_tag_field(&mut canvas, &mut engine, field, &tags)?,
        }
    }

    Ok(canvas)
}

/// Convenience wrapper: open the plan's template, then [`render`].
pub fn render_plan(metadata: &Metadata, plan: &RenderPlan) -> CardResult<CardCanvas> {
    render(metadata, &plan.fields, CardCanvas::open(&plan.template)?)
}

fn draw_text_field(
    canvas: &mut CardCanvas,
    engine: &mut TextEngine,
    field: &TextFieldSpec,
    text: &str,
) -> CardResult<()> {
    let font = engine.load_font(&field.font, field.font_size as f32)?;

    let text = if field.wrap {
        let budget = wrap_budget(canvas.width(), field.x, field.max_width);
        let mut measure = FontMeasure::new(engine, &font);
        wrap_text(&mut measure, text, budget)?
    } else {
        text.to_owned()
    };

    let layout = engine.layout(&font, &text, brush_for(field.fg));

    if let Some(bg) = field.bg {
        let bbox = kurbo::Rect::new(
            f64::from(field.x),
            f64::from(field.y),
            f64::from(field.x) + f64::from(layout.full_width()),
            f64::from(field.y) + f64::from(layout.height()),
        );
        draw_rect(canvas, field.padding.expand(bbox), bg)?;
    }

    draw_layout(
        canvas,
        &layout,
        &font,
        f64::from(field.x),
        f64::from(field.y),
    )
}

fn draw_tag_field(
    canvas: &mut CardCanvas,
    engine: &mut TextEngine,
    field: &TextFieldSpec,
    tags: &[String],
) -> CardResult<()> {
    if tags.is_empty() {
        return Ok(());
    }

    let font = engine.load_font(&field.font, field.font_size as f32)?;
    let brush = brush_for(field.fg);

    // One shared box height measured over all tags at once, so
    // ascender/descender variation can't give boxes uneven heights.
    let joined = tags.join(" ");
    let (_, shared_height) = engine.measure(&font, &joined);

    let advance_gap = f64::from(field.spacing + field.padding.left + field.padding.right);
    let mut cursor_x = f64::from(field.x);
    let y = f64::from(field.y);

    for tag in tags {
        let layout = engine.layout(&font, tag, brush);
        let width = f64::from(layout.full_width());

        if let Some(bg) = field.bg {
            let bbox = kurbo::Rect::new(cursor_x, y, cursor_x + width, y + f64::from(shared_height));
            draw_rect(canvas, field.padding.expand(bbox), bg)?;
        }
        draw_layout(canvas, &layout, &font, cursor_x, y)?;

        cursor_x += width + advance_gap;
    }

    Ok(())
}

fn wrap_budget(canvas_width: u32, x: i32, max_width: Option<u32>) -> f32 {
    match max_width {
        Some(w) => w as f32,
        None => canvas_width.saturating_sub(x.max(0) as u32) as f32,
    }
}

fn brush_for(color: Rgba) -> TextBrushRgba8 {
    let [r, g, b, a] = color.to_rgba8();
    TextBrushRgba8 { r, g, b, a }
}

/// Fill `rect` in `color` on the canvas.
///
/// The fill goes into a transparent scratch layer first and is then
/// composited source-over; drawing a translucent fill straight onto
/// the canvas would punch through instead of blending.
fn draw_rect(canvas: &mut CardCanvas, rect: kurbo::Rect, color: Rgba) -> CardResult<()> {
    let [r, g, b, a] = color.to_rgba8();
    paint_layer(canvas, |ctx| {
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            rect.x0, rect.y0, rect.x1, rect.y1,
        ));
    })
}

/// Rasterize a shaped layout anchored at `(x, y)` and composite it.
fn draw_layout(
    canvas: &mut CardCanvas,
    layout: &parley::Layout<TextBrushRgba8>,
    font: &LoadedFont,
    x: f64,
    y: f64,
) -> CardResult<()> {
    paint_layer(canvas, |ctx| {
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((x, y)));

        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };

                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));

                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(font.data())
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
    })
}

/// Run `draw` against a transparent scratch context the size of the
/// canvas, then composite the result over the canvas.
fn paint_layer(
    canvas: &mut CardCanvas,
    draw: impl FnOnce(&mut vello_cpu::RenderContext),
) -> CardResult<()> {
    let width: u16 = canvas
        .width()
        .try_into()
        .map_err(|_| CardError::validation("canvas width exceeds u16"))?;
    let height: u16 = canvas
        .height()
        .try_into()
        .map_err(|_| CardError::validation("canvas height exceeds u16"))?;

    let mut ctx = vello_cpu::RenderContext::new(width, height);
    draw(&mut ctx);
    ctx.flush();

    let mut layer = vello_cpu::Pixmap::new(width, height);
    ctx.render_to_pixmap(&mut layer);

    canvas.composite_layer(layer.data_as_u8_slice())
}
