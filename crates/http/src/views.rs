//! Tera-backed page rendering.

use anyhow::Context as _;
use axum::response::Html;
use std::path::Path;
use tera::{Context, Tera};

use crate::error::AppError;

/// Compiled template set.
pub struct Views {
    tera: Tera,
}

impl Views {
    /// Compile templates shipped inside the binary, given as `(name, source)` pairs.
    pub fn from_sources(sources: &[(&str, &str)]) -> anyhow::Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(sources.iter().copied())
            .context("failed to compile embedded templates")?;
        Ok(Self::finish(tera))
    }

    /// Compile every `*.html` file below `dir`.
    pub fn from_dir(dir: &Path) -> anyhow::Result<Self> {
        let pattern = dir.join("**").join("*.html");
        let pattern = pattern
            .to_str()
            .with_context(|| format!("template directory {} is not UTF-8", dir.display()))?;
        let tera = Tera::new(pattern)
            .with_context(|| format!("failed to compile templates in {}", dir.display()))?;
        Ok(Self::finish(tera))
    }

    fn finish(mut tera: Tera) -> Self {
        // Stored text is escaped when it is accepted, so escaping again would double it.
        tera.autoescape_on(vec![]);
        tracing::debug!(
            templates = tera.get_template_names().count(),
            "views compiled"
        );
        Self { tera }
    }

    pub fn render(&self, template: &str, context: &Context) -> Result<Html<String>, AppError> {
        let body = self.tera.render(template, context)?;
        Ok(Html(body))
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|known| known == name)
    }
}
