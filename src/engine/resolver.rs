//! Schema resolution.
//!
//! Expands a schema and every schema it references into a self-contained
//! [`ResolvedTree`]. The current ancestor path is tracked explicitly so a
//! reference cycle becomes a [`MockError::CyclicSchema`] instead of
//! unbounded recursion, and nesting is capped at a configurable depth.

use std::collections::BTreeMap;

use super::generators::GeneratorRegistry;
use super::FieldPath;
use crate::domain::{
    ArrayElement, FakerType, FieldKind, ItemCount, MockError, MockStore, SchemaId,
};

pub const DEFAULT_MAX_DEPTH: usize = 32;
/// Default upper bound for the item count of one array field.
pub const DEFAULT_MAX_ITEMS: usize = 1000;

/// One node of a fully materialized schema.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedNode {
    Primitive(FakerType),
    Object {
        schema_id: SchemaId,
        fields: Vec<(String, ResolvedNode)>,
    },
    Array {
        count: ItemCount,
        element: Box<ResolvedNode>,
    },
}

impl ResolvedNode {
    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        match self {
            ResolvedNode::Primitive(_) => 1,
            ResolvedNode::Object { fields, .. } => {
                1 + fields.iter().map(|(_, n)| n.node_count()).sum::<usize>()
            }
            ResolvedNode::Array { element, .. } => 1 + element.node_count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTree {
    pub schema_id: SchemaId,
    pub root: ResolvedNode,
    /// Version of every schema visited while resolving, for cache validation.
    pub dependencies: BTreeMap<SchemaId, u64>,
}

impl ResolvedTree {
    /// True while every schema this tree was built from is unchanged.
    pub fn is_current(&self, store: &dyn MockStore) -> bool {
        self.dependencies
            .iter()
            .all(|(id, version)| store.schema_version(id) == Some(*version))
    }

    pub fn depends_on(&self, schema_id: &str) -> bool {
        self.dependencies.contains_key(schema_id)
    }
}

pub struct SchemaResolver<'a> {
    store: &'a dyn MockStore,
    registry: &'a GeneratorRegistry,
    max_depth: usize,
    max_items: usize,
}

struct ResolutionContext {
    /// Schemas on the path from the root to the node being resolved.
    ancestors: Vec<SchemaId>,
    path: FieldPath,
    dependencies: BTreeMap<SchemaId, u64>,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(store: &'a dyn MockStore, registry: &'a GeneratorRegistry, max_depth: usize) -> Self {
        Self {
            store,
            registry,
            max_depth,
            max_items: DEFAULT_MAX_ITEMS,
        }
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    pub fn resolve(&self, schema_id: &str) -> Result<ResolvedTree, MockError> {
        let mut ctx = ResolutionContext {
            ancestors: Vec::new(),
            path: FieldPath::root(),
            dependencies: BTreeMap::new(),
        };
        let root = self.resolve_schema(schema_id, &mut ctx)?;
        tracing::debug!(
            schema = schema_id,
            nodes = root.node_count(),
            schemas = ctx.dependencies.len(),
            "Resolved schema"
        );
        Ok(ResolvedTree {
            schema_id: schema_id.to_string(),
            root,
            dependencies: ctx.dependencies,
        })
    }

    fn resolve_schema(
        &self,
        schema_id: &str,
        ctx: &mut ResolutionContext,
    ) -> Result<ResolvedNode, MockError> {
        if let Some(start) = ctx.ancestors.iter().position(|id| id == schema_id) {
            let mut cycle = ctx.ancestors[start..].to_vec();
            cycle.push(schema_id.to_string());
            return Err(MockError::CyclicSchema {
                cycle,
                path: ctx.path.to_string(),
            });
        }

        if ctx.ancestors.len() >= self.max_depth {
            return Err(MockError::MaxDepthExceeded {
                max_depth: self.max_depth,
                path: ctx.path.to_string(),
            });
        }

        let schema = self.store.get_schema(schema_id).ok_or_else(|| {
            let (referrer, path) = if ctx.path.is_root() {
                ("the endpoint".to_string(), None)
            } else {
                let path = ctx.path.to_string();
                (format!("field '{}'", path), Some(path))
            };
            MockError::DanglingReference {
                missing: schema_id.to_string(),
                referrer,
                path,
            }
        })?;
        ctx.dependencies.insert(schema.id.clone(), schema.version);

        ctx.ancestors.push(schema.id.clone());
        let mut fields = Vec::with_capacity(schema.fields.len());
        for field in &schema.fields {
            ctx.path.push_field(&field.name);
            let node = self.resolve_field(&field.kind, ctx);
            ctx.path.pop();
            fields.push((field.name.clone(), node?));
        }
        ctx.ancestors.pop();

        Ok(ResolvedNode::Object {
            schema_id: schema.id.clone(),
            fields,
        })
    }

    fn resolve_field(
        &self,
        kind: &FieldKind,
        ctx: &mut ResolutionContext,
    ) -> Result<ResolvedNode, MockError> {
        match kind {
            FieldKind::Primitive { faker } => self.resolve_primitive(faker, ctx),
            FieldKind::Object { schema } => self.resolve_schema(schema, ctx),
            FieldKind::Array { array } => {
                let upper = match array.count {
                    ItemCount::Fixed(n) => n,
                    ItemCount::Range { min, max } if min > max => {
                        return Err(MockError::InvalidArrayCount {
                            min,
                            max,
                            path: ctx.path.to_string(),
                        });
                    }
                    ItemCount::Range { max, .. } => max,
                };
                if upper > self.max_items {
                    return Err(MockError::ArrayTooLarge {
                        count: upper,
                        max_items: self.max_items,
                        path: ctx.path.to_string(),
                    });
                }
                ctx.path.push_any_index();
                let element = match &array.element {
                    ArrayElement::Primitive { faker } => self.resolve_primitive(faker, ctx),
                    ArrayElement::Object { schema } => self.resolve_schema(schema, ctx),
                };
                ctx.path.pop();
                Ok(ResolvedNode::Array {
                    count: array.count,
                    element: Box::new(element?),
                })
            }
        }
    }

    fn resolve_primitive(
        &self,
        faker: &FakerType,
        ctx: &ResolutionContext,
    ) -> Result<ResolvedNode, MockError> {
        if !self.registry.contains(&faker.generator) {
            return Err(MockError::UnknownGenerator {
                generator: faker.generator.clone(),
                path: ctx.path.to_string(),
            });
        }
        Ok(ResolvedNode::Primitive(faker.clone()))
    }
}
