//! Template engine module for Boards.
//!
//! Provides a Handlebars-style template engine for rendering HTML pages.
//!
//! # Features
//!
//! - Escaped variable expansion: `{{variable}}`
//! - Raw variable expansion: `{{{variable}}}`
//! - Conditionals: `{{#if condition}}...{{else}}...{{/if}}`
//! - Loops: `{{#each items}}...{{/each}}`
//! - Escaping: `\{{` to output literal `{{`
//!
//! # Example
//!
//! ```
//! use boards::template::{TemplateEngine, TemplateContext, Value};
//!
//! let mut engine = TemplateEngine::new();
//! engine.load("greeting", "Hello, {{name}}!").unwrap();
//!
//! let mut context = TemplateContext::new();
//! context.set("name", Value::String("<World>".to_string()));
//!
//! let result = engine.render("greeting", &context).unwrap();
//! assert_eq!(result, "Hello, &lt;World&gt;!");
//! ```

mod loader;
mod parser;
mod renderer;

use std::collections::HashMap;

use thiserror::Error;

pub use loader::{TemplateLoader, BUILTIN_TEMPLATES, LAYOUT_TEMPLATE};
pub use parser::{Node, Parser};
pub use renderer::Renderer;

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Template-related errors.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// Template not found.
    #[error("Template not found: {0}")]
    NotFound(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Render error.
    #[error("Render error: {0}")]
    Render(String),
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// A value that can be used in templates.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Number(i64),
    Bool(bool),
    List(Vec<Value>),
    /// An object (key-value pairs).
    Object(HashMap<String, Value>),
    Null,
}

impl Value {
    /// Convert the value to a string for display.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::List(_) => "[list]".to_string(),
            Value::Object(_) => "[object]".to_string(),
            Value::Null => String::new(),
        }
    }

    /// Check if the value is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::String(s) => !s.is_empty(),
            Value::Number(n) => *n != 0,
            Value::Bool(b) => *b,
            Value::List(l) => !l.is_empty(),
            Value::Object(o) => !o.is_empty(),
            Value::Null => false,
        }
    }

    /// Get a nested value by dot-separated path.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut current = self;

        for part in path.split('.') {
            match current {
                Value::Object(map) => {
                    current = map.get(part)?;
                }
                Value::List(list) => {
                    let index: usize = part.parse().ok()?;
                    current = list.get(index)?;
                }
                _ => return None,
            }
        }

        Some(current)
    }

    /// Build an object value from `(key, value)` pairs.
    pub fn object<K, V, I>(items: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Object(
            items
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

/// Context for template rendering.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    variables: HashMap<String, Value>,
}

impl TemplateContext {
    /// Create an empty template context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable in the context.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Builder-style variant of [`TemplateContext::set`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Get a variable from the context.
    pub fn get(&self, name: &str) -> Option<&Value> {
        if let Some(value) = self.variables.get(name) {
            return Some(value);
        }

        let (root, rest) = name.split_once('.')?;
        self.variables.get(root)?.get_path(rest)
    }

    /// Create a child context inheriting all variables of this one.
    pub fn child(&self) -> Self {
        self.clone()
    }
}

/// Template engine for parsing and rendering templates.
#[derive(Debug, Default)]
pub struct TemplateEngine {
    /// Parsed templates.
    templates: HashMap<String, Vec<Node>>,
}

impl TemplateEngine {
    /// Create a new template engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and register a template, replacing any with the same name.
    pub fn load(&mut self, name: impl Into<String>, content: &str) -> Result<()> {
        let name = name.into();
        let nodes = Parser::new(content)
            .parse()
            .map_err(|e| TemplateError::Parse(format!("{name}: {e}")))?;
        self.templates.insert(name, nodes);
        Ok(())
    }

    /// Render a template with the given context.
    pub fn render(&self, name: &str, context: &TemplateContext) -> Result<String> {
        let nodes = self
            .templates
            .get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;

        Renderer::new(context).render(nodes)
    }

    /// Render a page template inside the layout.
    ///
    /// The page output is handed to the layout as the raw `content` variable.
    pub fn render_page(&self, name: &str, context: &TemplateContext) -> Result<String> {
        let content = self.render(name, context)?;
        let mut page = context.child();
        page.set("content", content);
        self.render(LAYOUT_TEMPLATE, &page)
    }

    /// Check if a template is loaded.
    pub fn has_template(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_value_is_truthy() {
        assert!(Value::from("hello").is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::Number(1).is_truthy());
        assert!(!Value::Number(0).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::List(vec![]).is_truthy());
        assert!(!Value::Null.is_truthy());
    }

    #[test]
    fn test_value_from_option() {
        assert_eq!(Value::from(None::<String>), Value::Null);
        assert_eq!(Value::from(Some(3i64)), Value::Number(3));
    }

    #[test]
    fn test_value_get_path() {
        let value = Value::object([("user", Value::object([("name", "test")]))]);

        assert_eq!(value.get_path("user.name"), Some(&Value::from("test")));
        assert_eq!(value.get_path("user.missing"), None);
        assert_eq!(value.get_path("missing"), None);
    }

    #[test]
    fn test_context_get_nested() {
        let context = TemplateContext::new().with(
            "user",
            Value::object([("name", Value::from("Bob")), ("age", Value::Number(25))]),
        );

        assert_eq!(context.get("user.name"), Some(&Value::from("Bob")));
        assert_eq!(context.get("user.age"), Some(&Value::Number(25)));
        assert_eq!(context.get("user.missing"), None);
    }

    #[test]
    fn test_context_child_does_not_leak() {
        let context = TemplateContext::new().with("parent", "p");
        let child = context.child().with("child", "c");

        assert_eq!(child.get("parent"), Some(&Value::from("p")));
        assert_eq!(context.get("child"), None);
    }

    #[test]
    fn test_engine_load_and_render() {
        let mut engine = TemplateEngine::new();
        engine.load("test", "Hello, {{name}}!").unwrap();

        let context = TemplateContext::new().with("name", "World");
        assert_eq!(engine.render("test", &context).unwrap(), "Hello, World!");
    }

    #[test]
    fn test_engine_render_not_found() {
        let engine = TemplateEngine::new();
        let result = engine.render("missing", &TemplateContext::new());
        assert!(matches!(result, Err(TemplateError::NotFound(_))));
    }

    #[test]
    fn test_engine_load_reports_template_name() {
        let mut engine = TemplateEngine::new();
        let err = engine.load("broken", "{{#if x}}").unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_render_page_wraps_in_layout() {
        let mut engine = TemplateEngine::new();
        engine
            .load(LAYOUT_TEMPLATE, "<title>{{title}}</title><main>{{{content}}}</main>")
            .unwrap();
        engine.load("page", "<p>{{msg}}</p>").unwrap();

        let context = TemplateContext::new()
            .with("title", "Home")
            .with("msg", "a < b");
        let html = engine.render_page("page", &context).unwrap();
        assert_eq!(html, "<title>Home</title><main><p>a &lt; b</p></main>");
    }
}
