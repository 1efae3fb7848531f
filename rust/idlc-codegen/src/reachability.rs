//! Which declarations a pruned service surface needs.
//!
//! Starting from the allow-listed operations of one service, walks the type
//! graph depth-first and records every struct-like declaration and enum it
//! reaches. Cycles terminate on the visited set; containers contribute only
//! their element, key, and value types.

use std::collections::BTreeSet;

use idlc_schema::{EnumId, Schema, SchemaType, ServiceId, ServiceMethod, StructId};
use tracing::{debug, trace};

use crate::error::GenError;

/// An operation is allow-listed when it carries the annotation with any
/// value other than `false`.
pub fn is_allow_listed(method: &ServiceMethod, annotation_key: &str) -> bool {
    method
        .annotations
        .get(annotation_key)
        .is_some_and(|value| value != "false")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reachability {
    /// Reached from parameters of the service's own allow-listed operations.
    pub via_parameters: BTreeSet<StructId>,
    /// Reached from results and declared exceptions of allow-listed
    /// operations anywhere in the service's inheritance chain.
    pub via_results: BTreeSet<StructId>,
    /// Enums reached from either side.
    pub enums: BTreeSet<EnumId>,
}

impl Reachability {
    /// Both struct sets together.
    pub fn structs(&self) -> BTreeSet<StructId> {
        self.via_parameters.union(&self.via_results).copied().collect()
    }

    pub fn parameter_names(&self, schema: &Schema) -> BTreeSet<String> {
        names(schema, &self.via_parameters)
    }

    pub fn result_names(&self, schema: &Schema) -> BTreeSet<String> {
        names(schema, &self.via_results)
    }

    /// Fold another analysis into this one.
    pub fn merge(&mut self, other: Reachability) {
        self.via_parameters.extend(other.via_parameters);
        self.via_results.extend(other.via_results);
        self.enums.extend(other.enums);
    }
}

fn names(schema: &Schema, ids: &BTreeSet<StructId>) -> BTreeSet<String> {
    ids.iter()
        .map(|id| schema.struct_type(*id).name.clone())
        .collect()
}

pub fn analyze(
    schema: &Schema,
    service: ServiceId,
    annotation_key: &str,
) -> Result<Reachability, GenError> {
    let mut parameters = Walker::new(schema);
    for method in &schema.service(service).methods {
        if !is_allow_listed(method, annotation_key) {
            continue;
        }
        for field in &method.parameters {
            parameters.walk(&field.ty)?;
        }
    }

    let mut results = Walker::new(schema);
    for ancestor in schema.service_chain(service) {
        for method in &schema.service(ancestor).methods {
            if !is_allow_listed(method, annotation_key) {
                continue;
            }
            results.walk(&method.return_type)?;
            for exception in &method.exceptions {
                results.walk(&exception.ty)?;
            }
        }
    }

    let mut enums = parameters.enums;
    enums.extend(results.enums);
    let reachability = Reachability {
        via_parameters: parameters.structs,
        via_results: results.structs,
        enums,
    };
    debug!(
        service = %schema.service(service).name,
        parameters = reachability.via_parameters.len(),
        results = reachability.via_results.len(),
        enums = reachability.enums.len(),
        "reachability computed"
    );
    Ok(reachability)
}

struct Walker<'s> {
    schema: &'s Schema,
    structs: BTreeSet<StructId>,
    enums: BTreeSet<EnumId>,
}

impl<'s> Walker<'s> {
    fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            structs: BTreeSet::new(),
            enums: BTreeSet::new(),
        }
    }

    fn walk(&mut self, root: &'s SchemaType) -> Result<(), GenError> {
        let mut stack = vec![root];
        while let Some(ty) = stack.pop() {
            match self.schema.true_type(ty)? {
                SchemaType::List(element) | SchemaType::Set(element) => stack.push(element),
                SchemaType::Map(key, value) => {
                    stack.push(key);
                    stack.push(value);
                }
                SchemaType::Enum(id) => {
                    self.enums.insert(*id);
                }
                SchemaType::Struct(id) | SchemaType::Union(id) | SchemaType::Exception(id) => {
                    if !self.structs.insert(*id) {
                        continue;
                    }
                    let decl = self.schema.struct_type(*id);
                    trace!(name = %decl.name, "reached");
                    stack.extend(decl.fields.iter().map(|field| &field.ty));
                }
                SchemaType::Void
                | SchemaType::Bool
                | SchemaType::Byte
                | SchemaType::I16
                | SchemaType::I32
                | SchemaType::I64
                | SchemaType::Double
                | SchemaType::String
                | SchemaType::Binary
                | SchemaType::Typedef(_)
                | SchemaType::Service(_) => {}
            }
        }
        Ok(())
    }
}
