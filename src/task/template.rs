// src/task/template.rs

//! Template rendering strategies for task bodies.
//!
//! Task files may contain square-bracket interpolations such as
//! `DROP TABLE [=table];`. Parameters come from the `[template]` table of
//! the runner config, overridden per task by the task's own config file.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::{Arc, LazyLock};

use regex::{Captures, Regex};
use serde::Deserialize;

use crate::errors::TaskError;

static INTERPOLATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[=\s*([A-Za-z_][A-Za-z0-9_.\-]*)\s*\]").expect("interpolation regex is valid")
});

/// Renders a task's raw content into what is actually executed.
pub trait TemplateRenderer: Send + Sync + Debug {
    /// `id` is only used for error reporting.
    fn render(
        &self,
        id: &str,
        content: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<String, TaskError>;
}

/// Interpolation syntax of a task type's bodies, `template = "..."` in its
/// `[task_type.<name>]` table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateSyntax {
    /// `[=name]` interpolations.
    #[default]
    Bracket,
    /// No templating; bodies run as written.
    Plain,
}

impl TemplateSyntax {
    pub fn renderer(self) -> Arc<dyn TemplateRenderer> {
        match self {
            TemplateSyntax::Bracket => Arc::new(BracketRenderer),
            TemplateSyntax::Plain => Arc::new(PlainRenderer),
        }
    }
}

/// Returns content unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRenderer;

impl TemplateRenderer for PlainRenderer {
    fn render(
        &self,
        _id: &str,
        content: &str,
        _params: &BTreeMap<String, String>,
    ) -> Result<String, TaskError> {
        Ok(content.to_string())
    }
}

/// Substitutes `[=name]` interpolations from the parameter map.
///
/// With no parameters the content passes through untouched, so task bodies
/// that happen to contain `[=` are safe as long as they are not templated.
#[derive(Debug, Clone, Copy, Default)]
pub struct BracketRenderer;

impl TemplateRenderer for BracketRenderer {
    fn render(
        &self,
        id: &str,
        content: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<String, TaskError> {
        if params.is_empty() {
            return Ok(content.to_string());
        }

        let mut missing: Vec<String> = Vec::new();
        let rendered = INTERPOLATION.replace_all(content, |caps: &Captures| {
            let name = &caps[1];
            match params.get(name) {
                Some(value) => value.clone(),
                None => {
                    missing.push(name.to_string());
                    caps[0].to_string()
                }
            }
        });

        if !missing.is_empty() {
            return Err(TaskError::Template(format!(
                "{id}: undefined template field(s) {missing:?}"
            )));
        }

        Ok(rendered.into_owned())
    }
}
