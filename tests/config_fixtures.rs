use cardforge::{CardConfig, FieldSource, FontSpec, Padding};

const FULL_CONFIG: &str = r##"
{
    "template": "template.png",
    "output": "cards/{slug}.png",
    "defaults": {
        "font": "body",
        "font_size": 48,
        "fg": "#ffffff",
        "padding": {"horizontal": 6, "vertical": 2}
    },
    "fonts": [
        {"name": "body", "path": "fonts/body.ttf"},
        {"name": "Heading", "path": "fonts/heading.ttf"}
    ],
    "fields": [
        {
            "source": "title",
            "x": 40, "y": 40,
            "font": "heading",
            "font_size": 96,
            "wrap": true,
            "max_width": 1100
        },
        {
            "source": "date",
            "x": 40, "y": 560,
            "parse": "datetime",
            "format": "{date:%B %-d, %Y}"
        },
        {
            "source": ["author", "date"],
            "optional": true,
            "default": {"author": "anonymous"},
            "format": "{author}",
            "x": 40, "y": 600
        },
        {
            "source": "tags",
            "multi": true,
            "optional": true,
            "bg": "#00000080",
            "spacing": 12,
            "x": 40, "y": 640
        }
    ]
}
"##;

#[test]
fn full_config_resolves_into_a_plan() {
    let cfg = CardConfig::from_json_str(FULL_CONFIG).unwrap();
    let plan = cfg.resolve().unwrap();

    assert_eq!(plan.output, "cards/{slug}.png");
    assert_eq!(plan.fields.len(), 4);

    let title = &plan.fields[0];
    assert_eq!(title.source, FieldSource::Single("title".to_string()));
    assert_eq!(title.font, FontSpec::File("fonts/heading.ttf".into()));
    assert_eq!(title.font_size, 96);
    assert!(title.wrap);
    assert_eq!(title.max_width, Some(1100));
    assert_eq!(
        title.padding,
        Padding {
            top: 2,
            left: 6,
            bottom: 2,
            right: 6
        }
    );

    let date = &plan.fields[1];
    assert_eq!(date.font, FontSpec::File("fonts/body.ttf".into()));
    assert_eq!(date.font_size, 48);
    assert!(date.format.is_some());

    let byline = &plan.fields[2];
    assert_eq!(
        byline.source,
        FieldSource::Composite(vec!["author".to_string(), "date".to_string()])
    );
    assert_eq!(byline.default.for_key("author"), Some("anonymous"));

    let tags = &plan.fields[3];
    assert_eq!(tags.source, FieldSource::Tags("tags".to_string()));
    assert_eq!(tags.spacing, 12);
    assert_eq!(tags.bg.unwrap().to_rgba8(), [0, 0, 0, 128]);
    // fg inherited from defaults.
    assert_eq!(tags.fg.to_rgba8(), [255, 255, 255, 255]);
}

#[test]
fn malformed_documents_are_rejected() {
    assert!(CardConfig::from_json_str("not json").is_err());
    assert!(CardConfig::from_json_str(r#"{"fields": []}"#).is_err(), "template is required");
    assert!(
        CardConfig::from_json_str(
            r##"{"template": "t.png", "fields": [{"source": "a", "x": 0, "y": 0, "fg": "#12345"}]}"##,
        )
        .is_err(),
        "bad hex color must fail"
    );
}

#[test]
fn missing_config_file_reports_its_path() {
    let err = CardConfig::from_path(std::path::Path::new("/nonexistent/cards.json")).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/cards.json"));
}
