use std::{fs, path::Path};

use tera::{Context, Tera};

use crate::types::{NotificationError, NotificationRequest};

/// Renders a named email template with the request's fields.
pub trait TemplateRenderer: Send + Sync {
    /// Renders `template_name`, exposing `email` and every request field as variables.
    fn render(
        &self,
        template_name: &str,
        request: &NotificationRequest,
    ) -> Result<String, NotificationError>;
}

const BUILTIN_TEMPLATES: [(&str, &str); 3] = [
    (
        "email_verification",
        include_str!("../templates/email_verification.html"),
    ),
    ("password_reset", include_str!("../templates/password_reset.html")),
    ("account_locked", include_str!("../templates/account_locked.html")),
];

/// Tera-backed renderer. Templates are registered under their bare name
/// (e.g. `email_verification`), and every template is HTML-escaped.
pub struct TeraTemplateRenderer {
    tera: Tera,
}

impl TeraTemplateRenderer {
    fn empty() -> Self {
        let mut tera = Tera::default();
        // Names carry no extension, so escape everything.
        tera.autoescape_on(vec![""]);
        Self { tera }
    }

    /// Renderer with the templates shipped in this crate.
    pub fn with_builtin_templates() -> Result<Self, NotificationError> {
        let mut renderer = Self::empty();
        renderer.tera.add_raw_templates(BUILTIN_TEMPLATES)?;
        Ok(renderer)
    }

    /// Built-in templates overridden by every `*.html` file in `dir`,
    /// each registered under its file stem.
    pub fn from_directory(dir: impl AsRef<Path>) -> Result<Self, NotificationError> {
        let dir = dir.as_ref();
        let mut renderer = Self::with_builtin_templates()?;

        let entries = fs::read_dir(dir).map_err(|e| {
            tera::Error::msg(format!("Cannot read template directory {}: {}", dir.display(), e))
        })?;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("html") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            log::info!("📄 Loading email template {} from {}", name, path.display());
            renderer.tera.add_template_file(&path, Some(name))?;
        }

        Ok(renderer)
    }

    /// Registers or replaces a template from a string.
    pub fn add_template(&mut self, name: &str, content: &str) -> Result<(), NotificationError> {
        self.tera.add_raw_template(name, content)?;
        Ok(())
    }
}

impl TemplateRenderer for TeraTemplateRenderer {
    fn render(
        &self,
        template_name: &str,
        request: &NotificationRequest,
    ) -> Result<String, NotificationError> {
        let context = Context::from_serialize(request)?;
        Ok(self.tera.render(template_name, &context)?)
    }
}
