//! Derived size data: the smallest possible encoding of each definition and
//! whether a type always encodes to the same number of bytes.

use std::collections::{HashMap, HashSet};

use crate::{
    environment::{DefId, Environment},
    schema::{BaseType, Definition, Type},
};

/// The smallest number of bytes a value of this definition can encode to.
/// Readers can reject anything shorter without looking at the contents.
pub fn minimal_encoded_size(env: &Environment, id: DefId) -> u32 {
    size_of_def(env, id, &mut HashMap::new())
}

/// Like [`minimal_encoded_size`], for field types.
pub fn minimal_encoded_size_of_type(env: &Environment, ty: &Type) -> u32 {
    size_of_type(env, ty, &mut HashMap::new())
}

fn size_of_def(env: &Environment, id: DefId, memo: &mut HashMap<DefId, u32>) -> u32 {
    if let Some(&size) = memo.get(&id) {
        return size;
    }
    // In-progress marker. Only reachable for infinitely recursive structs,
    // which have been diagnosed already; any value keeps this total.
    memo.insert(id, 0);
    let size = match env.get(id) {
        Definition::Enum(def) => def
            .base
            .fixed_size()
            .expect("enum backing type has a fixed size"),
        Definition::Struct(def) => def
            .fields
            .iter()
            .map(|field| size_of_type(env, &field.ty, memo))
            .sum(),
        // Length header plus the end-of-message marker; every field may be
        // absent.
        Definition::Message(_) => 4 + 1,
        // Length header, discriminator, then the cheapest branch.
        Definition::Union(def) => {
            4 + 1
                + def
                    .branches
                    .iter()
                    .map(|branch| size_of_def(env, branch.def, memo))
                    .min()
                    .unwrap_or(0)
        }
        Definition::Const(_) => 0,
    };
    memo.insert(id, size);
    size
}

fn size_of_type(env: &Environment, ty: &Type, memo: &mut HashMap<DefId, u32>) -> u32 {
    match ty {
        // A one-byte length prefix would not be enough; all containers use a
        // four-byte count and may be empty.
        Type::Base(BaseType::String) | Type::Array(_) | Type::Map(..) => 4,
        Type::Base(base) => base.fixed_size().expect("string is handled above"),
        // The absence tag alone.
        Type::Optional(_) => 1,
        Type::Defined(id) => size_of_def(env, *id, memo),
        Type::Error => 0,
    }
}

/// True if every value of the type encodes to exactly the same number of
/// bytes: scalars other than `string`, enums, and structs made of nothing
/// else.
pub fn is_fixed_size(env: &Environment, ty: &Type) -> bool {
    fixed(env, ty, &mut HashSet::new())
}

fn fixed(env: &Environment, ty: &Type, visiting: &mut HashSet<DefId>) -> bool {
    match ty {
        Type::Base(base) => base.fixed_size().is_some(),
        Type::Array(_) | Type::Map(..) | Type::Optional(_) | Type::Error => false,
        Type::Defined(id) => match env.get(*id) {
            Definition::Enum(_) => true,
            Definition::Struct(def) => {
                if !visiting.insert(*id) {
                    return false;
                }
                let result = def.fields.iter().all(|field| fixed(env, &field.ty, visiting));
                visiting.remove(id);
                result
            }
            Definition::Message(_) | Definition::Union(_) | Definition::Const(_) => false,
        },
    }
}
