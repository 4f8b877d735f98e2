use std::collections::BTreeMap;
use std::error::Error;

use minijinja::{AutoEscape, Environment};
use serde::Serialize;
use serde_json::{to_value, Value};
use thiserror::Error;

#[remain::sorted]
#[derive(Debug, Error)]
pub enum TemplatingError {
    #[error("json serialize/deserialize error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// Error that may occur while template operations such as parse and render.
    #[error("Template error: `{0}`")]
    TemplateError(#[from] minijinja::Error),

    /// Error that may occur while parsing the template.
    #[error("Template parse error:\n{0}")]
    TemplateParseError(String),
}

pub type TemplatingResult<T> = Result<T, TemplatingError>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TemplateContext {
    pub data: BTreeMap<String, Value>,
}

impl TemplateContext {
    /// Initializes an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts the `val` parameter to `Value` and insert it into the context.
    pub fn insert<T: Serialize + ?Sized, S: Into<String>>(
        &mut self,
        key: S,
        val: &T,
    ) -> TemplatingResult<()> {
        self.data.insert(key.into(), to_value(val)?);
        Ok(())
    }
}

/// A single named template compiled once and rendered many times.
#[derive(Debug)]
pub struct Templates<'a> {
    env: Environment<'a>,
}

impl<'a> Templates<'a> {
    pub fn new_with_template(name: &'a str, source: String) -> TemplatingResult<Self> {
        let mut env = Environment::new();
        // markdown output, HTML escaping would mangle link syntax
        env.set_auto_escape_callback(|_| AutoEscape::None);
        if let Err(e) = env.add_template_owned(name, source) {
            return if let Some(error_source) = e.source() {
                Err(TemplatingError::TemplateParseError(
                    error_source.to_string(),
                ))
            } else {
                Err(TemplatingError::TemplateError(e))
            };
        }

        Ok(Self { env })
    }

    /// Renders the template.
    pub fn render(&self, template: &str, context: &TemplateContext) -> TemplatingResult<String> {
        let tmpl = self.env.get_template(template)?;
        Ok(tmpl.render(&context.data)?)
    }
}
