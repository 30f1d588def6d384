//! Conversion options: the opaque blob callers may install globally or pass
//! per call, with layered precedence (per-call override → global override →
//! engine defaults).

use comrak::options::Options;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_MAX_INCLUDE_DEPTH: usize = 8;

/// Typed rendering options. Unknown fields in a parsed blob are rejected so
/// a misspelled key surfaces at install time rather than silently changing
/// nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    /// Enable GitHub-style tables.
    pub tables: bool,
    /// Enable `~~strikethrough~~`.
    pub strikethrough: bool,
    /// Autolink bare URLs.
    pub autolink: bool,
    /// Enable task list items.
    pub tasklist: bool,
    /// Enable footnotes.
    pub footnotes: bool,
    /// Smart punctuation (quotes, dashes, ellipses).
    pub smart: bool,
    /// Run the rendered body through the HTML sanitizer.
    pub sanitize: bool,
    /// Wrap the rendered body in a full HTML document with a `<title>`.
    pub full_page: bool,
    /// Maximum depth of nested include directives before the expansion is
    /// abandoned with a fatal diagnostic.
    pub max_include_depth: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            autolink: true,
            tasklist: true,
            footnotes: true,
            smart: true,
            sanitize: true,
            full_page: true,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }
}

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("options blob is not valid TOML: {message}")]
    Toml { message: String },
}

impl RenderOptions {
    /// Parse an options blob serialized as TOML.
    pub fn from_toml(blob: &str) -> Result<Self, OptionsError> {
        toml::from_str(blob).map_err(|err| OptionsError::Toml {
            message: err.to_string(),
        })
    }

    /// Map these options onto the markdown parser configuration.
    pub(crate) fn comrak_options(&self) -> Options<'static> {
        let mut options = Options::default();

        let ext = &mut options.extension;
        ext.table = self.tables;
        ext.strikethrough = self.strikethrough;
        ext.autolink = self.autolink;
        ext.tasklist = self.tasklist;
        ext.footnotes = self.footnotes;

        options.parse.smart = self.smart;

        let render = &mut options.render;
        render.github_pre_lang = true;
        render.r#unsafe = true;

        options
    }
}
