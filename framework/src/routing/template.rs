//! Conventional route templates
//!
//! A template is a `/`-separated list of segments. Each segment is either a
//! literal (`api`) or a parameter: `{name}` (required), `{name=Default}` (uses
//! the default when the path is too short) or `{name?}` (may be absent, last
//! segment only). Literals compare case-insensitively.

use std::collections::HashMap;
use thiserror::Error;

/// Why a template could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteTemplateError {
    #[error("route template '{template}': parameter name is empty")]
    EmptyParameter { template: String },

    #[error("route template '{template}': unbalanced braces in segment '{segment}'")]
    UnbalancedBraces { template: String, segment: String },

    #[error("route template '{template}': segment '{segment}' mixes text and a parameter")]
    MixedSegment { template: String, segment: String },

    #[error("route template '{template}': parameter '{name}' appears twice")]
    DuplicateParameter { template: String, name: String },

    #[error("route template '{template}': parameter '{name}' cannot be optional and have a default")]
    OptionalWithDefault { template: String, name: String },

    #[error("route template '{template}': optional parameter '{name}' must be the last segment")]
    OptionalNotLast { template: String, name: String },

    #[error("route template '{template}': empty segment")]
    EmptySegment { template: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Parameter {
        name: String,
        default: Option<String>,
        optional: bool,
    },
}

/// A parsed route template, e.g. `{controller=Home}/{action=Index}/{id?}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate {
    text: String,
    segments: Vec<Segment>,
}

/// Values captured by a template match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteValues {
    values: HashMap<String, String>,
}

impl RouteValues {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_map(self) -> HashMap<String, String> {
        self.values
    }
}

impl RouteTemplate {
    pub fn parse(text: &str) -> Result<Self, RouteTemplateError> {
        let template = text.to_string();
        let trimmed = text.trim_matches('/');
        let mut segments: Vec<Segment> = Vec::new();

        if trimmed.is_empty() {
            return Ok(Self { text: template, segments });
        }

        for raw in trimmed.split('/') {
            if raw.is_empty() {
                return Err(RouteTemplateError::EmptySegment { template });
            }

            if let Some(Segment::Parameter { name, optional: true, .. }) = segments.last() {
                return Err(RouteTemplateError::OptionalNotLast {
                    template,
                    name: name.clone(),
                });
            }

            let opens = raw.matches('{').count();
            let closes = raw.matches('}').count();
            if opens != closes || opens > 1 {
                return Err(RouteTemplateError::UnbalancedBraces {
                    template,
                    segment: raw.to_string(),
                });
            }

            if opens == 0 {
                segments.push(Segment::Literal(raw.to_string()));
                continue;
            }

            let inner = match raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(inner) => inner,
                None => {
                    return Err(RouteTemplateError::MixedSegment {
                        template,
                        segment: raw.to_string(),
                    })
                }
            };

            let segment = parse_parameter(&template, inner)?;
            if let Segment::Parameter { name, .. } = &segment {
                let duplicate = segments.iter().any(|existing| {
                    matches!(existing, Segment::Parameter { name: other, .. } if other.eq_ignore_ascii_case(name))
                });
                if duplicate {
                    return Err(RouteTemplateError::DuplicateParameter {
                        template,
                        name: name.clone(),
                    });
                }
            }
            segments.push(segment);
        }

        Ok(Self { text: template, segments })
    }

    /// The template as written
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Match a request path, filling defaults for missing trailing segments
    pub fn match_path(&self, path: &str) -> Option<RouteValues> {
        let parts: Vec<&str> = path
            .trim_matches('/')
            .split('/')
            .filter(|part| !part.is_empty())
            .collect();

        if parts.len() > self.segments.len() {
            return None;
        }

        let mut values = HashMap::new();
        for (index, segment) in self.segments.iter().enumerate() {
            let part = parts.get(index);
            match (segment, part) {
                (Segment::Literal(literal), Some(part)) => {
                    if !literal.eq_ignore_ascii_case(part) {
                        return None;
                    }
                }
                (Segment::Literal(_), None) => return None,
                (Segment::Parameter { name, .. }, Some(part)) => {
                    values.insert(name.clone(), (*part).to_string());
                }
                (Segment::Parameter { name, default, optional }, None) => match default {
                    Some(default) => {
                        values.insert(name.clone(), default.clone());
                    }
                    None if *optional => {}
                    None => return None,
                },
            }
        }

        Some(RouteValues { values })
    }
}

fn parse_parameter(template: &str, inner: &str) -> Result<Segment, RouteTemplateError> {
    let (body, optional) = match inner.strip_suffix('?') {
        Some(body) => (body, true),
        None => (inner, false),
    };
    let (name, default) = match body.split_once('=') {
        Some((name, default)) => (name.trim(), Some(default.trim().to_string())),
        None => (body.trim(), None),
    };

    if name.is_empty() {
        return Err(RouteTemplateError::EmptyParameter {
            template: template.to_string(),
        });
    }
    if optional && default.is_some() {
        return Err(RouteTemplateError::OptionalWithDefault {
            template: template.to_string(),
            name: name.to_string(),
        });
    }

    Ok(Segment::Parameter {
        name: name.to_string(),
        default,
        optional,
    })
}

impl std::fmt::Display for RouteTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
