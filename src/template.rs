use serde_json::{Map, Value};

use crate::types::DispatchError;

/// A parsed resource URI template such as `db://{database}/{table}`.
///
/// Decomposed into a literal scheme and an ordered sequence of path
/// segments, each either a literal or a named capture. Capture names are
/// unique within one template.
#[derive(Debug, Clone)]
pub struct ResourceTemplate {
    raw: String,
    scheme: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Capture(String),
}

impl ResourceTemplate {
    /// Parse a template string of the form `scheme://seg/{capture}/seg2`.
    pub fn parse(template: &str) -> Result<Self, DispatchError> {
        let invalid = |reason: String| DispatchError::InvalidTemplate {
            template: template.to_string(),
            reason,
        };

        let (scheme, rest) = template
            .split_once("://")
            .ok_or_else(|| invalid("missing '://' separator".into()))?;
        if scheme.is_empty() {
            return Err(invalid("empty scheme".into()));
        }
        if rest.is_empty() {
            return Err(invalid("empty path".into()));
        }

        let mut segments = Vec::new();
        let mut seen: Vec<&str> = Vec::new();
        for part in rest.split('/') {
            if part.is_empty() {
                return Err(invalid("empty path segment".into()));
            }
            if let Some(inner) = part.strip_prefix('{') {
                let name = inner
                    .strip_suffix('}')
                    .ok_or_else(|| invalid("unbalanced braces".into()))?;
                if name.is_empty() {
                    return Err(invalid("empty capture name".into()));
                }
                if name.contains('{') || name.contains('}') {
                    return Err(invalid("unbalanced braces".into()));
                }
                if seen.contains(&name) {
                    return Err(invalid(format!("duplicate capture name '{name}'")));
                }
                seen.push(name);
                segments.push(Segment::Capture(name.to_string()));
            } else if part.contains('{') || part.contains('}') {
                return Err(invalid("unbalanced braces".into()));
            } else {
                segments.push(Segment::Literal(part.to_string()));
            }
        }

        Ok(ResourceTemplate {
            raw: template.to_string(),
            scheme: scheme.to_string(),
            segments,
        })
    }

    /// The template string exactly as registered.
    pub fn uri_template(&self) -> &str {
        &self.raw
    }

    /// Capture names in declaration order.
    pub fn capture_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|seg| match seg {
            Segment::Capture(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Match a concrete URI against this template.
    ///
    /// Matches when the scheme is equal, the segment counts are equal, and
    /// every literal segment equals the corresponding URI segment. Capture
    /// segments bind to the URI segment value as a string.
    pub fn match_uri(&self, uri: &str) -> Option<Captures> {
        let (scheme, rest) = uri.split_once("://")?;
        if scheme != self.scheme {
            return None;
        }
        let parts: Vec<&str> = rest.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }
        let mut captures = Vec::new();
        for (segment, part) in self.segments.iter().zip(&parts) {
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Capture(name) => {
                    captures.push((name.clone(), (*part).to_string()));
                }
            }
        }
        Some(Captures(captures))
    }
}

/// Named segment values bound during template matching, kept in the
/// template's declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures(Vec<(String, String)>);

impl Captures {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(capture, _)| capture == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The captures as a JSON object, for handlers that want a `Value`.
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        for (name, value) in &self.0 {
            obj.insert(name.clone(), Value::String(value.clone()));
        }
        Value::Object(obj)
    }
}
