//! Path template module
//!
//! Parses templates like `/items/{item_id:int}` and matches request paths
//! against them.

use std::borrow::Cow;

use super::RouteError;
use crate::schema::{FieldType, Schema};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param { name: String, ty: FieldType },
}

/// Parsed path template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse a template.
    ///
    /// Parameter segments are `{name}` (string) or `{name:type}` where type is
    /// `int`, `float` or `str`.
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        let invalid = |reason: &str| RouteError::InvalidTemplate {
            template: raw.to_string(),
            reason: reason.to_string(),
        };

        let Some(rest) = raw.strip_prefix('/') else {
            return Err(invalid("must start with '/'"));
        };

        let mut segments = Vec::new();
        for part in split_segments(rest) {
            let segment = if let Some(inner) = part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                let (name, ty) = match inner.split_once(':') {
                    Some((name, ty)) => (
                        name,
                        FieldType::parse(ty).ok_or_else(|| invalid(&format!("unknown type '{ty}'")))?,
                    ),
                    None => (inner, FieldType::Str),
                };
                if !is_identifier(name) {
                    return Err(invalid(&format!("invalid parameter name '{name}'")));
                }
                if segments
                    .iter()
                    .any(|s| matches!(s, Segment::Param { name: n, .. } if n == name))
                {
                    return Err(invalid(&format!("duplicate parameter '{name}'")));
                }
                Segment::Param {
                    name: name.to_string(),
                    ty,
                }
            } else if part.is_empty() {
                return Err(invalid("empty segment"));
            } else if part.contains(['{', '}']) {
                return Err(invalid(&format!("unbalanced braces in '{part}'")));
            } else {
                Segment::Literal(part.to_string())
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// Template with parameter names and types erased, e.g. `/items/{}`
    pub fn shape(&self) -> String {
        let mut shape = String::new();
        for segment in &self.segments {
            shape.push('/');
            match segment {
                Segment::Literal(lit) => shape.push_str(lit),
                Segment::Param { .. } => shape.push_str("{}"),
            }
        }
        if shape.is_empty() {
            shape.push('/');
        }
        shape
    }

    pub fn literal_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count()
    }

    /// Schema for the path parameters; every parameter is required
    pub fn params_schema(&self) -> Schema {
        self.segments
            .iter()
            .fold(Schema::new(), |schema, segment| match segment {
                Segment::Param { name, ty } => schema.required(name.clone(), *ty),
                Segment::Literal(_) => schema,
            })
    }

    /// Match a request path, returning the percent-decoded raw parameter values
    pub fn match_path(&self, path: &str) -> Option<Vec<(String, String)>> {
        let rest = path.strip_prefix('/')?;
        let parts: Vec<&str> = split_segments(rest).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = Vec::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Param { name, .. } if !part.is_empty() => {
                    params.push((name.clone(), decode_segment(part)));
                }
                _ => return None,
            }
        }
        Some(params)
    }
}

/// Split the part after the leading '/'; the root path has no segments
fn split_segments(rest: &str) -> impl Iterator<Item = &str> {
    let parts = if rest.is_empty() { None } else { Some(rest.split('/')) };
    parts.into_iter().flatten()
}

fn decode_segment(part: &str) -> String {
    urlencoding::decode(part).map_or_else(|_| part.to_string(), Cow::into_owned)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
