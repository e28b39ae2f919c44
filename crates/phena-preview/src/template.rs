//! Preview document templates and their placeholder tokens

use crate::error::TemplateError;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Template shipped with the crate
pub const DEFAULT_TEMPLATE: &str = include_str!("../assets/preview.html");

/// Named substitution points in a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// The content-security policy string (inside a `<meta>` attribute)
    Csp,
    /// The per-render nonce, repeated on every inline script and style tag
    Nonce,
    /// The escaped sketch source, placed as the body of a function
    UserCode,
    /// JSON record of the default rotation speed and refresh rate
    Defaults,
    /// URL the p5.js library is loaded from
    P5Url,
}

impl Placeholder {
    /// Tokens a template must contain to be usable
    pub const REQUIRED: [Placeholder; 3] = [Self::Csp, Self::Nonce, Self::UserCode];

    /// Every token recognized during substitution
    pub const ALL: [Placeholder; 5] = [
        Self::Csp,
        Self::Nonce,
        Self::UserCode,
        Self::Defaults,
        Self::P5Url,
    ];

    /// The literal token text
    pub const fn token(self) -> &'static str {
        match self {
            Self::Csp => "{{CSP}}",
            Self::Nonce => "{{NONCE}}",
            Self::UserCode => "{{USER_CODE}}",
            Self::Defaults => "{{DEFAULTS}}",
            Self::P5Url => "{{P5_URL}}",
        }
    }
}

/// A validated document template
#[derive(Debug, Clone)]
pub struct Template {
    text: Cow<'static, str>,
}

impl Template {
    /// Validate template text, checking that every required token is present
    pub fn parse(text: impl Into<Cow<'static, str>>) -> Result<Self, TemplateError> {
        let text = text.into();
        if let Some(missing) = Placeholder::REQUIRED
            .iter()
            .find(|p| !text.contains(p.token()))
        {
            return Err(TemplateError::MissingPlaceholder(missing.token()));
        }
        Ok(Self { text })
    }

    /// The template embedded in the binary
    pub fn embedded() -> Result<Self, TemplateError> {
        Self::parse(DEFAULT_TEMPLATE)
    }

    /// Read and validate a template file
    pub fn from_file(path: &Path) -> Result<Self, TemplateError> {
        let text = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(text)
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Where the builder gets its template from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TemplateSource {
    /// The template compiled into the crate
    #[default]
    Embedded,
    /// A template file on disk, re-read on every build
    File(PathBuf),
}

impl TemplateSource {
    pub fn load(&self) -> Result<Template, TemplateError> {
        match self {
            Self::Embedded => Template::embedded(),
            Self::File(path) => Template::from_file(path),
        }
    }
}
