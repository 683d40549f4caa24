//! Property Paths
//!
//! A path is a dotted expression such as `user.name` or `items.0.done`.
//! Evaluating it indexes into the root one segment at a time. A segment that
//! is missing yields `Undefined`, and every later segment then yields
//! `Undefined` too; it is never an error.

use std::fmt;
use std::str::FromStr;

use smallvec::SmallVec;

use crate::object::Object;
use crate::reactive::EvalContext;
use crate::value::Value;

/// A parsed dotted path.
///
/// Parsing never fails: an empty string is a single empty segment, and
/// empty segments simply never match anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    raw: String,
    segments: SmallVec<[String; 4]>,
}

impl Path {
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            segments: raw.split('.').map(str::to_string).collect(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Everything but the last segment, and the last segment.
    pub fn parent_and_key(&self) -> Option<(&[String], &str)> {
        self.segments
            .split_last()
            .map(|(key, parent)| (parent, key.as_str()))
    }

    /// Evaluate against `root`. Every observed slot read on the way
    /// registers the context's collector.
    pub fn evaluate(&self, root: &Object, ctx: &EvalContext) -> Value {
        resolve(Value::Object(root.clone()), &self.segments, ctx)
    }
}

/// Walk `segments` starting from `start`.
pub(crate) fn resolve(start: Value, segments: &[String], ctx: &EvalContext) -> Value {
    segments
        .iter()
        .fold(start, |value, segment| value.member(segment, ctx))
}

impl FromStr for Path {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Path::parse(s))
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        Path::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
