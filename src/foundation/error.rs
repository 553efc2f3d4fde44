/// Convenience result type used across the crate.
pub type CardResult<T> = Result<T, CardError>;

/// Top-level error taxonomy for card rendering.
///
/// Every failure aborts the whole render; there is no retry or
/// partial-result mode. A failure indicates a configuration/data
/// mismatch that needs human correction.
#[derive(thiserror::Error, Debug)]
pub enum CardError {
    /// A required, non-optional source key is absent from the metadata.
    #[error("missing field error: frontmatter key '{0}' has no value")]
    MissingField(String),

    /// A format template could not be parsed or referenced an unresolved name.
    #[error("format error: {0}")]
    Format(String),

    /// A configured value parser (e.g. datetime) rejected the raw value.
    #[error("parse error: {0}")]
    Parse(String),

    /// A font file could not be read or contains no usable font.
    #[error("font load error: {0}")]
    FontLoad(String),

    /// The template image could not be read or decoded.
    #[error("template load error: {0}")]
    TemplateLoad(String),

    /// Invalid configuration or a violated internal contract.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CardError {
    pub fn missing_field(key: impl Into<String>) -> Self {
        Self::MissingField(key.into())
    }

    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn font_load(msg: impl Into<String>) -> Self {
        Self::FontLoad(msg.into())
    }

    pub fn template_load(msg: impl Into<String>) -> Self {
        Self::TemplateLoad(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            CardError::missing_field("title")
                .to_string()
                .contains("missing field error:")
        );
        assert!(CardError::format("x").to_string().contains("format error:"));
        assert!(CardError::parse("x").to_string().contains("parse error:"));
        assert!(
            CardError::font_load("x")
                .to_string()
                .contains("font load error:")
        );
        assert!(
            CardError::template_load("x")
                .to_string()
                .contains("template load error:")
        );
        assert!(
            CardError::validation("x")
                .to_string()
                .contains("validation error:")
        );
    }

    #[test]
    fn missing_field_names_the_key() {
        assert!(
            CardError::missing_field("title")
                .to_string()
                .contains("'title'")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = CardError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
