//! Template renderer module.
//!
//! Renders parsed template nodes with the given context.

use super::parser::Node;
use super::{escape_html, Result, TemplateContext, TemplateError, Value};

/// Template renderer.
pub struct Renderer<'a> {
    context: &'a TemplateContext,
}

impl<'a> Renderer<'a> {
    /// Create a new renderer with the given context.
    pub fn new(context: &'a TemplateContext) -> Self {
        Self { context }
    }

    /// Render a list of nodes to a string.
    pub fn render(&self, nodes: &[Node]) -> Result<String> {
        let mut output = String::new();

        for node in nodes {
            self.render_node(node, &mut output)?;
        }

        Ok(output)
    }

    fn render_node(&self, node: &Node, out: &mut String) -> Result<()> {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Variable(name) => out.push_str(&escape_html(&self.lookup(name))),
            Node::RawVariable(name) => out.push_str(&self.lookup(name)),
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let branch = if self.is_truthy(condition) {
                    then_branch
                } else {
                    else_branch
                };
                out.push_str(&self.render(branch)?);
            }
            Node::Each {
                variable,
                item_name,
                body,
            } => out.push_str(&self.render_each(variable, item_name.as_deref(), body)?),
            Node::Unless { condition, body } => {
                if !self.is_truthy(condition) {
                    out.push_str(&self.render(body)?);
                }
            }
            Node::With { variable, body } => out.push_str(&self.render_with(variable, body)?),
        }
        Ok(())
    }

    /// Missing variables render as the empty string, like Handlebars.
    fn lookup(&self, name: &str) -> String {
        self.context
            .get(name)
            .map(Value::to_display_string)
            .unwrap_or_default()
    }

    fn is_truthy(&self, name: &str) -> bool {
        self.context.get(name).is_some_and(Value::is_truthy)
    }

    fn render_each(&self, variable: &str, item_name: Option<&str>, body: &[Node]) -> Result<String> {
        let list = match self.context.get(variable) {
            Some(Value::List(items)) => items,
            Some(Value::Null) | None => return Ok(String::new()),
            Some(_) => {
                return Err(TemplateError::Render(format!("'{variable}' is not a list")));
            }
        };

        let mut output = String::new();
        let item_var_name = item_name.unwrap_or("this");

        for (index, item) in list.iter().enumerate() {
            let mut child_context = self.context.child();
            child_context.set(item_var_name, item.clone());
            child_context.set("@index", Value::Number(index as i64));
            child_context.set("@first", Value::Bool(index == 0));
            child_context.set("@last", Value::Bool(index == list.len() - 1));

            // Fields of object items are also reachable unqualified.
            if let Value::Object(obj) = item {
                for (key, value) in obj {
                    child_context.set(key.clone(), value.clone());
                }
            }

            output.push_str(&Renderer::new(&child_context).render(body)?);
        }

        Ok(output)
    }

    fn render_with(&self, variable: &str, body: &[Node]) -> Result<String> {
        let value = match self.context.get(variable) {
            Some(v) if v.is_truthy() => v.clone(),
            _ => return Ok(String::new()),
        };

        let mut child_context = self.context.child();
        if let Value::Object(obj) = &value {
            for (key, val) in obj {
                child_context.set(key.clone(), val.clone());
            }
        }
        child_context.set("this", value);

        Renderer::new(&child_context).render(body)
    }
}
