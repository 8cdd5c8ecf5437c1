//! Placeholder rendering.
//!
//! Templates use `{name}` placeholders. `{{` and `}}` produce literal braces,
//! which keeps Python dict and set literals expressible in a template.

use std::collections::HashMap;

use regex::Regex;
use tracing::debug;

use crate::error::{TemplateError, TemplateResult};

const TOKEN_PATTERN: &str = r"\{\{|\}\}|\{([^{}]*)\}|[{}]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Placeholder(&'a str),
}

/// Template renderer for substituting named parameters.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    token_pattern: Regex,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    /// Create a new template renderer.
    pub fn new() -> Self {
        Self {
            token_pattern: Regex::new(TOKEN_PATTERN).expect("static token pattern compiles"),
        }
    }

    /// Render `template`, requiring a parameter for every placeholder.
    ///
    /// Parameters without a matching placeholder are ignored.
    pub fn render(
        &self,
        template: &str,
        params: &HashMap<String, String>,
    ) -> TemplateResult<String> {
        let mut rendered = String::with_capacity(template.len());

        for segment in self.segments(template)? {
            match segment {
                Segment::Text(text) => rendered.push_str(text),
                Segment::Placeholder(name) => {
                    let value = params
                        .get(name)
                        .ok_or_else(|| TemplateError::MissingParameter(name.to_string()))?;
                    rendered.push_str(value);
                }
            }
        }

        debug!("Rendered template ({} bytes)", rendered.len());
        Ok(rendered)
    }

    /// Distinct placeholder names in order of first appearance.
    pub fn placeholders(&self, template: &str) -> TemplateResult<Vec<String>> {
        let mut names: Vec<String> = Vec::new();
        for segment in self.segments(template)? {
            if let Segment::Placeholder(name) = segment {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }

    /// Placeholders in `template` that `params` does not cover.
    pub fn missing_parameters(
        &self,
        template: &str,
        params: &HashMap<String, String>,
    ) -> TemplateResult<Vec<String>> {
        Ok(self
            .placeholders(template)?
            .into_iter()
            .filter(|name| !params.contains_key(name))
            .collect())
    }

    fn segments<'a>(&self, template: &'a str) -> TemplateResult<Vec<Segment<'a>>> {
        let mut segments = Vec::new();
        let mut last = 0;

        for caps in self.token_pattern.captures_iter(template) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if whole.start() > last {
                segments.push(Segment::Text(&template[last..whole.start()]));
            }
            last = whole.end();

            match whole.as_str() {
                "{{" => segments.push(Segment::Text("{")),
                "}}" => segments.push(Segment::Text("}")),
                single @ ("{" | "}") => {
                    return Err(TemplateError::MalformedTemplate {
                        position: whole.start(),
                        message: format!("single '{}' encountered", single),
                    });
                }
                _ => {
                    let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                    if !is_identifier(name) {
                        return Err(TemplateError::MalformedTemplate {
                            position: whole.start(),
                            message: format!("invalid placeholder '{}'", whole.as_str()),
                        });
                    }
                    segments.push(Segment::Placeholder(name));
                }
            }
        }

        if last < template.len() {
            segments.push(Segment::Text(&template[last..]));
        }

        Ok(segments)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_alphabetic() => {
            chars.all(|c| c == '_' || c.is_alphanumeric())
        }
        _ => false,
    }
}
