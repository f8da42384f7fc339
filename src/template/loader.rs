//! Template loader module.
//!
//! Page templates are compiled into the binary. A directory of `*.html`
//! files can override them by file stem.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{Result, TemplateEngine, TemplateError};

/// Name of the layout every page is rendered into.
pub const LAYOUT_TEMPLATE: &str = "base";

/// Templates shipped with the binary, as `(name, source)` pairs.
pub const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("base", include_str!("../../templates/base.html")),
    ("home", include_str!("../../templates/home.html")),
    ("signup", include_str!("../../templates/signup.html")),
    ("login", include_str!("../../templates/login.html")),
    ("password_reset", include_str!("../../templates/password_reset.html")),
    (
        "password_reset_done",
        include_str!("../../templates/password_reset_done.html"),
    ),
    (
        "password_reset_confirm",
        include_str!("../../templates/password_reset_confirm.html"),
    ),
    (
        "password_reset_complete",
        include_str!("../../templates/password_reset_complete.html"),
    ),
    ("password_change", include_str!("../../templates/password_change.html")),
    (
        "password_change_done",
        include_str!("../../templates/password_change_done.html"),
    ),
    ("my_account", include_str!("../../templates/my_account.html")),
    ("topics", include_str!("../../templates/topics.html")),
    ("new_topic", include_str!("../../templates/new_topic.html")),
    ("topic_posts", include_str!("../../templates/topic_posts.html")),
    ("reply_topic", include_str!("../../templates/reply_topic.html")),
    ("edit_post", include_str!("../../templates/edit_post.html")),
    ("404", include_str!("../../templates/404.html")),
    ("error", include_str!("../../templates/error.html")),
];

/// Builds a [`TemplateEngine`] from the built-in templates and an optional
/// override directory.
#[derive(Debug, Default)]
pub struct TemplateLoader {
    override_dir: Option<PathBuf>,
}

impl TemplateLoader {
    /// Create a loader using only the built-in templates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `*.html` files in `dir` in place of built-ins with the same name.
    pub fn with_override_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.override_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Parse every template into a new engine.
    pub fn load(&self) -> Result<TemplateEngine> {
        let mut engine = TemplateEngine::new();

        for (name, source) in BUILTIN_TEMPLATES {
            engine.load(*name, source)?;
        }

        if let Some(dir) = &self.override_dir {
            for (name, path) in list_templates(dir)? {
                let source = fs::read_to_string(&path).map_err(|e| {
                    TemplateError::Render(format!("Failed to read template '{name}': {e}"))
                })?;
                debug!(template = %name, path = %path.display(), "Template overridden");
                engine.load(name, &source)?;
            }
        }

        if !engine.has_template(LAYOUT_TEMPLATE) {
            return Err(TemplateError::NotFound(LAYOUT_TEMPLATE.to_string()));
        }
        Ok(engine)
    }
}

/// List `*.html` files of a directory as `(stem, path)` pairs, sorted by name.
fn list_templates(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(dir)
        .map_err(|e| TemplateError::Render(format!("Failed to read directory {dir:?}: {e}")))?;

    let mut templates = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| TemplateError::Render(format!("Failed to read entry: {e}")))?
            .path();
        if !path.is_file() || !path.extension().is_some_and(|ext| ext == "html") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            templates.push((stem.to_string(), path.clone()));
        }
    }

    templates.sort();
    Ok(templates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateContext;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_templates_parse() {
        let engine = TemplateLoader::new().load().unwrap();
        for (name, _) in BUILTIN_TEMPLATES {
            assert!(engine.has_template(name), "missing {name}");
        }
    }

    #[test]
    fn test_layout_has_no_inputs() {
        // Forms count their inputs; the layout must not add any.
        let (_, base) = BUILTIN_TEMPLATES
            .iter()
            .find(|(name, _)| *name == LAYOUT_TEMPLATE)
            .unwrap();
        assert!(!base.contains("<input"));
    }

    #[test]
    fn test_override_dir_replaces_builtin() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("home.html"), "custom {{site_name}}").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let engine = TemplateLoader::new()
            .with_override_dir(dir.path())
            .load()
            .unwrap();
        let context = TemplateContext::new().with("site_name", "Boards");
        assert_eq!(engine.render("home", &context).unwrap(), "custom Boards");
        assert!(!engine.has_template("notes"));
    }

    #[test]
    fn test_missing_override_dir_is_ignored() {
        let engine = TemplateLoader::new()
            .with_override_dir("/nonexistent/templates")
            .load()
            .unwrap();
        assert!(engine.has_template("home"));
    }

    #[test]
    fn test_broken_override_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("home.html"), "{{#if open}}").unwrap();

        let result = TemplateLoader::new().with_override_dir(dir.path()).load();
        assert!(matches!(result, Err(TemplateError::Parse(_))));
    }
}
