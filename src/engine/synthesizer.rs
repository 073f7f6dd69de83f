//! Turns a resolved tree into a concrete JSON value.

use rand::{Rng, RngCore};
use serde_json::{Map, Value};

use super::generators::GeneratorRegistry;
use super::resolver::ResolvedNode;
use super::FieldPath;
use crate::domain::{ItemCount, MockError};

pub struct Synthesizer<'a> {
    registry: &'a GeneratorRegistry,
}

impl<'a> Synthesizer<'a> {
    pub fn new(registry: &'a GeneratorRegistry) -> Self {
        Self { registry }
    }

    /// Generate one instance of `node`. The only possible failure is a leaf
    /// generator rejecting its parameters; the error carries the field path.
    pub fn synthesize(&self, node: &ResolvedNode, rng: &mut dyn RngCore) -> Result<Value, MockError> {
        let mut path = FieldPath::root();
        self.synthesize_at(node, &mut path, rng)
    }

    fn synthesize_at(
        &self,
        node: &ResolvedNode,
        path: &mut FieldPath,
        rng: &mut dyn RngCore,
    ) -> Result<Value, MockError> {
        match node {
            ResolvedNode::Primitive(faker) => self
                .registry
                .generate(&faker.generator, &faker.params, rng)
                .map_err(|e| e.at(path)),
            ResolvedNode::Object { fields, .. } => {
                let mut object = Map::with_capacity(fields.len());
                for (name, child) in fields {
                    path.push_field(name);
                    let value = self.synthesize_at(child, path, rng);
                    path.pop();
                    object.insert(name.clone(), value?);
                }
                Ok(Value::Object(object))
            }
            ResolvedNode::Array { count, element } => {
                let len = item_count(*count, rng);
                let mut items = Vec::new();
                for idx in 0..len {
                    path.push_index(idx);
                    let value = self.synthesize_at(element, path, rng);
                    path.pop();
                    items.push(value?);
                }
                Ok(Value::Array(items))
            }
        }
    }
}

/// Number of elements to emit; ranges are inclusive and were validated at resolution.
pub fn item_count(count: ItemCount, rng: &mut dyn RngCore) -> usize {
    match count {
        ItemCount::Fixed(n) => n,
        ItemCount::Range { min, max } if min >= max => min,
        ItemCount::Range { min, max } => rng.gen_range(min..=max),
    }
}
