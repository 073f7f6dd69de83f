//! Schema compiler and mock-data generation engine.
//!
//! Request flow: [`dispatcher`] looks up the endpoint, [`resolver`] expands
//! its schema into a [`resolver::ResolvedTree`] (through the
//! [`cache::ResolutionCache`]), [`synthesizer`] fills the tree with values
//! from the [`generators`] registry and [`compositor`] wraps the payload.

use std::fmt;

pub mod cache;
pub mod compositor;
pub mod dispatcher;
pub mod generators;
pub mod resolver;
pub mod synthesizer;


#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Field(String),
    Index(usize),
    AnyIndex,
}

/// Location of a field inside a payload, rendered as `user.addresses[2].zip`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn push_field(&mut self, name: &str) {
        self.segments.push(Segment::Field(name.to_string()));
    }

    pub fn push_index(&mut self, index: usize) {
        self.segments.push(Segment::Index(index));
    }

    /// Array element position not known yet (resolution time).
    pub fn push_any_index(&mut self) {
        self.segments.push(Segment::AnyIndex);
    }

    pub fn pop(&mut self) {
        self.segments.pop();
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Field(name) if i == 0 => write!(f, "{}", name)?,
                Segment::Field(name) => write!(f, ".{}", name)?,
                Segment::Index(idx) => write!(f, "[{}]", idx)?,
                Segment::AnyIndex => f.write_str("[]")?,
            }
        }
        Ok(())
    }
}
