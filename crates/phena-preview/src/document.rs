//! Preview document construction
//!
//! [`render_document`] is the pure string transform. [`DocumentBuilder`]
//! wraps it with the per-build work: loading the template, drawing a nonce,
//! computing the policy and escaping the sketch.

use crate::controls::Preferences;
use crate::csp::{DEFAULT_CDN_ORIGIN, content_security_policy};
use crate::error::Result;
use crate::escape::{escape_attribute, escape_script_text};
use crate::nonce::Nonce;
use crate::template::{Placeholder, Template, TemplateSource};

/// Version-pinned p5.js build loaded by the page
pub const DEFAULT_P5_URL: &str = "https://cdn.jsdelivr.net/npm/p5@1.11.11/lib/p5.min.js";

/// Values substituted into a template
///
/// Values are inserted as given. Escaping for the surrounding context is the
/// caller's job.
#[derive(Debug, Clone, Copy)]
pub struct DocumentParts<'a> {
    pub csp: &'a str,
    pub nonce: &'a str,
    pub user_code: &'a str,
    pub defaults: &'a str,
    pub p5_url: &'a str,
}

impl DocumentParts<'_> {
    fn value(&self, placeholder: Placeholder) -> &str {
        match placeholder {
            Placeholder::Csp => self.csp,
            Placeholder::Nonce => self.nonce,
            Placeholder::UserCode => self.user_code,
            Placeholder::Defaults => self.defaults,
            Placeholder::P5Url => self.p5_url,
        }
    }
}

/// Substitute every placeholder in one left-to-right pass
///
/// Inserted text is never scanned again, so a sketch containing `{{NONCE}}`
/// stays literal.
pub fn render_document(template: &Template, parts: &DocumentParts<'_>) -> String {
    let text = template.text();
    let mut out = String::with_capacity(text.len() + parts.user_code.len() + 256);
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match Placeholder::ALL
            .iter()
            .find(|p| tail.starts_with(p.token()))
        {
            Some(&placeholder) => {
                out.push_str(parts.value(placeholder));
                rest = &tail[placeholder.token().len()..];
            }
            None => {
                out.push_str("{{");
                rest = &tail[2..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// A rendered preview page
#[derive(Debug, Clone)]
pub struct PreviewDocument {
    /// Complete HTML for the panel
    pub html: String,
    /// Nonce this document's policy accepts
    pub nonce: Nonce,
    /// The policy string, unescaped
    pub csp: String,
}

/// Options for building preview documents
#[derive(Debug, Clone)]
pub struct BuilderOptions {
    pub template: TemplateSource,
    /// Script URL for p5.js
    pub p5_url: String,
    /// Origin allowed by `script-src` besides the nonce
    pub cdn_origin: String,
    /// Preferences the page starts with when nothing is stored
    pub defaults: Preferences,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            template: TemplateSource::Embedded,
            p5_url: DEFAULT_P5_URL.to_string(),
            cdn_origin: DEFAULT_CDN_ORIGIN.to_string(),
            defaults: Preferences::default(),
        }
    }
}

impl BuilderOptions {
    /// Use a template file instead of the embedded one
    pub fn with_template_file(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.template = TemplateSource::File(path.into());
        self
    }

    /// Load p5.js from another URL and allow its origin
    pub fn with_library(mut self, p5_url: impl Into<String>, cdn_origin: impl Into<String>) -> Self {
        self.p5_url = p5_url.into();
        self.cdn_origin = cdn_origin.into();
        self
    }

    pub fn with_defaults(mut self, defaults: Preferences) -> Self {
        self.defaults = defaults;
        self
    }
}

/// Builds preview documents for validated sketches
#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder {
    options: BuilderOptions,
}

impl DocumentBuilder {
    pub fn new(options: BuilderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    /// Load the configured template
    pub fn load_template(&self) -> Result<Template> {
        Ok(self.options.template.load()?)
    }

    /// Build a document for `source`
    ///
    /// The template is loaded on every call and a new nonce is drawn, so two
    /// builds of the same sketch never share a nonce.
    pub fn build(&self, source: &str, csp_source: &str) -> Result<PreviewDocument> {
        let template = self.load_template()?;
        self.build_with(&template, source, csp_source)
    }

    /// Build a document from an already loaded template
    pub fn build_with(
        &self,
        template: &Template,
        source: &str,
        csp_source: &str,
    ) -> Result<PreviewDocument> {
        let nonce = Nonce::generate()?;
        let csp = content_security_policy(csp_source, &nonce, &self.options.cdn_origin);
        let user_code = escape_script_text(source);
        let defaults = escape_script_text(&self.options.defaults.to_json());

        let html = render_document(
            template,
            &DocumentParts {
                csp: &escape_attribute(&csp),
                nonce: nonce.as_str(),
                user_code: &user_code,
                defaults: &defaults,
                p5_url: &escape_attribute(&self.options.p5_url),
            },
        );

        tracing::debug!(
            bytes = html.len(),
            sketch_bytes = source.len(),
            "Built preview document"
        );

        Ok(PreviewDocument { html, nonce, csp })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::escape::contains_script_close;

    fn parts<'a>(user_code: &'a str) -> DocumentParts<'a> {
        DocumentParts {
            csp: "CSP",
            nonce: "N",
            user_code,
            defaults: "{}",
            p5_url: "URL",
        }
    }

    #[test]
    fn test_render_substitutes_every_token() {
        let template = Template::parse(
            "<meta content=\"{{CSP}}\"><script nonce=\"{{NONCE}}\" src=\"{{P5_URL}}\"></script>\
             <style nonce=\"{{NONCE}}\"></style><script nonce=\"{{NONCE}}\">{{DEFAULTS}};{{USER_CODE}}</script>",
        )
        .unwrap();

        let html = render_document(&template, &parts("circle(0, 0, 10);"));
        assert_eq!(
            html,
            "<meta content=\"CSP\"><script nonce=\"N\" src=\"URL\"></script>\
             <style nonce=\"N\"></style><script nonce=\"N\">{};circle(0, 0, 10);</script>"
        );
    }

    #[test]
    fn test_render_is_single_pass() {
        let template = Template::parse("{{CSP}}{{NONCE}}[{{USER_CODE}}]").unwrap();
        let html = render_document(&template, &parts("let s = '{{NONCE}}{{CSP}}';"));
        assert_eq!(html, "CSPN[let s = '{{NONCE}}{{CSP}}';]");
    }

    #[test]
    fn test_render_keeps_unknown_braces() {
        let template = Template::parse("{{CSP}}{{NONCE}}{{USER_CODE}} {{OTHER}} {{").unwrap();
        let html = render_document(&template, &parts("x"));
        assert_eq!(html, "CSPNx {{OTHER}} {{");
    }

    #[test]
    fn test_build_embeds_escaped_sketch() {
        let builder = DocumentBuilder::default();
        let sketch = "let s = '</script><script>alert(1)</script>';\nbackground(220);";
        let doc = builder.build(sketch, "panel:").unwrap();

        assert!(doc.html.contains("background(220);"));
        assert!(doc.html.contains("<\\/script><script>alert(1)<\\/script>"));

        // the template closes its own two script elements and nothing else
        let closes = doc.html.matches("</script>").count();
        assert_eq!(closes, 2);

        let code_start = doc.html.find("function runSketch()").unwrap();
        let code_end = doc.html.find("function setup()").unwrap();
        assert!(!contains_script_close(&doc.html[code_start..code_end]));
    }

    #[test]
    fn test_build_uses_nonce_everywhere() {
        let doc = DocumentBuilder::default().build("point(0, 0);", "panel:").unwrap();
        let attr = format!("nonce=\"{}\"", doc.nonce);
        assert_eq!(doc.html.matches(&attr).count(), 3);
        assert!(doc.csp.contains(&format!("'nonce-{}'", doc.nonce)));
        assert!(!doc.html.contains("{{"));
    }

    #[test]
    fn test_consecutive_builds_use_fresh_nonces() {
        let builder = DocumentBuilder::default();
        let a = builder.build("point(0, 0);", "panel:").unwrap();
        let b = builder.build("point(0, 0);", "panel:").unwrap();

        assert_ne!(a.nonce, b.nonce);
        assert!(a.csp.contains(a.nonce.as_str()));
        assert!(!a.csp.contains(b.nonce.as_str()));
        assert!(!b.html.contains(a.nonce.as_str()));
    }

    #[test]
    fn test_build_seeds_defaults() {
        let options = BuilderOptions::default().with_defaults(Preferences {
            rotation_speed: 45.0,
            refresh_rate: 60.0,
        });
        let doc = DocumentBuilder::new(options).build("", "").unwrap();
        assert!(
            doc.html
                .contains(r#"const defaultSettings = {"rotationSpeed":45.0,"refreshRate":60.0};"#)
        );
    }

    #[test]
    fn test_build_never_seeds_null_defaults() {
        let options = BuilderOptions::default().with_defaults(Preferences {
            rotation_speed: f64::INFINITY,
            refresh_rate: f64::NAN,
        });
        let doc = DocumentBuilder::new(options).build("", "").unwrap();
        assert!(
            doc.html
                .contains(r#"const defaultSettings = {"rotationSpeed":180.0,"refreshRate":30.0};"#)
        );
    }

    #[test]
    fn test_build_fails_on_missing_template() {
        let options = BuilderOptions::default()
            .with_template_file(std::env::temp_dir().join("phena_no_such_dir/preview.html"));
        let err = DocumentBuilder::new(options).build("", "").unwrap_err();
        assert!(matches!(err, crate::PreviewError::Template(_)));
    }
}
