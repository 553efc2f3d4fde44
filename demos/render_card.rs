use cardforge::{CardCanvas, CardConfig, Metadata, render};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = CardConfig::from_json_str(
        r##"{
            "template": "unused.png",
            "defaults": {"font_size": 48, "fg": "#222222"},
            "fields": [
                {"source": "title", "x": 60, "y": 60, "wrap": true, "max_width": 520},
                {
                    "source": "date", "x": 60, "y": 260,
                    "parse": "datetime", "format": "{date:%B %-d, %Y}",
                    "font_size": 24
                },
                {
                    "source": "tags", "multi": true, "optional": true,
                    "x": 60, "y": 320, "font_size": 24,
                    "fg": "#ffffff", "bg": "#1a6b3cd0",
                    "padding": {"horizontal": 8, "vertical": 4}, "spacing": 14
                }
            ]
        }"##,
    )?;
    let plan = config.resolve()?;

    let metadata: Metadata = serde_json::from_str(
        r#"{
            "title": "Rendering frontmatter onto cards",
            "date": "2021-07-16",
            "tags": ["rust", "images", "previews"]
        }"#,
    )?;

    // A flat light-gray template stands in for a real design.
    let template = image::RgbaImage::from_pixel(640, 400, image::Rgba([235, 235, 230, 255]));
    let card = render(&metadata, &plan.fields, CardCanvas::from_image(template))?;

    let out = std::env::temp_dir().join("cardforge_demo.png");
    card.into_image()?.save(&out)?;
    println!("wrote {}", out.display());

    Ok(())
}
