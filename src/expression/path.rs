//! Dotted path grammar.
//!
//! A path is an ordered list of segments such as `paintings+.gallery.name`.
//! A trailing `+` on a segment requests an outer join for the hop it
//! produces. The whole path may carry a [`PathMarker`] which namespaces the
//! joins it spawns, so a prefetch join never collides with an ordinary
//! qualifier join of the same shape.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const OUTER_JOIN_INDICATOR: char = '+';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PathMarker {
    #[default]
    None,
    /// Joins spawned while materializing a joint prefetch.
    Prefetch,
    /// Stands for whatever table node is active while rendering a join.
    CurrentAlias,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSegment {
    pub name: String,
    pub outer: bool,
}

impl PathSegment {
    pub fn new(name: impl Into<String>) -> Self {
        PathSegment {
            name: name.into(),
            outer: false,
        }
    }

    pub fn outer(name: impl Into<String>) -> Self {
        PathSegment {
            name: name.into(),
            outer: true,
        }
    }

    fn parse(text: &str) -> Self {
        match text.strip_suffix(OUTER_JOIN_INDICATOR) {
            Some(name) => PathSegment::outer(name),
            None => PathSegment::new(text),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.outer {
            write!(f, "{}{}", self.name, OUTER_JOIN_INDICATOR)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Immutable path value. Equality and hashing include the marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path {
    segments: Vec<PathSegment>,
    marker: PathMarker,
}

impl Path {
    pub fn root() -> Self {
        Path::default()
    }

    pub fn parse(text: &str) -> Self {
        let segments = text
            .split('.')
            .filter(|s| !s.is_empty())
            .map(PathSegment::parse)
            .collect();
        Path {
            segments,
            marker: PathMarker::None,
        }
    }

    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Path {
            segments,
            marker: PathMarker::None,
        }
    }

    pub fn with_marker(mut self, marker: PathMarker) -> Self {
        self.marker = marker;
        self
    }

    pub fn marker(&self) -> PathMarker {
        self.marker
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn first(&self) -> Option<&PathSegment> {
        self.segments.first()
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Appends one segment, keeping the marker.
    pub fn child(&self, segment: PathSegment) -> Path {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Path {
            segments,
            marker: self.marker,
        }
    }

    /// Concatenates `other` below this path. The marker of `self` wins unless
    /// it is `None`.
    pub fn join(&self, other: &Path) -> Path {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        let marker = match self.marker {
            PathMarker::None => other.marker,
            marker => marker,
        };
        Path { segments, marker }
    }

    /// Everything after the first segment.
    pub fn tail(&self) -> Path {
        Path {
            segments: self.segments.iter().skip(1).cloned().collect(),
            marker: self.marker,
        }
    }

    pub fn parent(&self) -> Option<Path> {
        if self.segments.is_empty() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Path {
            segments,
            marker: self.marker,
        })
    }

    /// Segment names joined by dots, without outer-join indicators.
    pub fn dotted(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.segments {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{}", segment)?;
            first = false;
        }
        Ok(())
    }
}

impl From<&str> for Path {
    fn from(text: &str) -> Self {
        Path::parse(text)
    }
}
