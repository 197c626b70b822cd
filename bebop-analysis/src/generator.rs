//! The interface between the validated schema and code generation back ends.
//!
//! The compiler core never emits target-language code itself; it hands the
//! immutable IR to a [`Generator`] and stays out of the way. Back ends must
//! produce encodings that match the wire runtime byte for byte.

use std::fmt::Write;
use std::io;
use std::path::Path;

use crate::{
    environment::Environment,
    schema::{ConstValue, Definition, Schema, Type},
    size,
};

pub trait Generator {
    /// Produces the generated source for the whole schema as a single
    /// string. Targets that need several files can bundle them with their
    /// own framing and split in [`Generator::write_auxiliary_files`].
    fn emit(&mut self, schema: &Schema, env: &Environment) -> String;

    /// Copies any fixed-content runtime helpers the generated code needs
    /// into the output directory.
    fn write_auxiliary_files(&mut self, out_dir: &Path) -> io::Result<()>;
}

/// Renders a resolved type the way it was written in the schema.
pub fn display_type(env: &Environment, ty: &Type) -> String {
    match ty {
        Type::Base(base) => base.name().to_owned(),
        Type::Array(element) => format!("{}[]", display_type(env, element)),
        Type::Map(key, value) => format!(
            "map[{}, {}]",
            display_type(env, key),
            display_type(env, value)
        ),
        Type::Optional(inner) => format!("{}?", display_type(env, inner)),
        Type::Defined(id) => env.get(*id).name().to_owned(),
        Type::Error => "{unresolved}".to_owned(),
    }
}

/// Renders the analyzed schema as text: every definition with its resolved
/// types, computed minimal sizes, discriminators and opcodes. Not a code
/// generator in the target-language sense, but it implements the same
/// interface, and doubles as a way to inspect what the analyzer produced.
#[derive(Debug, Default)]
pub struct DumpGenerator;

impl Generator for DumpGenerator {
    fn emit(&mut self, schema: &Schema, env: &Environment) -> String {
        let mut out = String::new();
        if let Some(namespace) = &schema.namespace {
            _ = writeln!(out, "namespace {namespace}");
            _ = writeln!(out);
        }
        for (name, &id) in &schema.definitions {
            self.dump_definition(&mut out, schema, env, name, id, 0);
        }
        out
    }

    fn write_auxiliary_files(&mut self, _out_dir: &Path) -> io::Result<()> {
        Ok(())
    }
}

impl DumpGenerator {
    fn dump_definition(
        &self,
        out: &mut String,
        schema: &Schema,
        env: &Environment,
        name: &str,
        id: crate::environment::DefId,
        depth: usize,
    ) {
        let pad = "    ".repeat(depth);
        let def = env.get(id);
        let minimal = schema
            .minimal_sizes
            .get(&id)
            .copied()
            .unwrap_or_else(|| size::minimal_encoded_size(env, id));
        match def {
            Definition::Enum(def) => {
                _ = writeln!(
                    out,
                    "{pad}enum {name}: {} ({}{} bytes)",
                    def.base.name(),
                    if def.is_flags { "flags, " } else { "" },
                    minimal
                );
                for member in &def.members {
                    _ = writeln!(out, "{pad}    {} = {}", member.name, member.value);
                }
            }
            Definition::Struct(def) => {
                _ = writeln!(
                    out,
                    "{pad}{}struct {name}{} (at least {minimal} bytes)",
                    if def.is_readonly { "readonly " } else { "" },
                    opcode_suffix(def.opcode),
                );
                for field in &def.fields {
                    _ = writeln!(
                        out,
                        "{pad}    {} {}",
                        display_type(env, &field.ty),
                        field.name
                    );
                }
            }
            Definition::Message(def) => {
                _ = writeln!(
                    out,
                    "{pad}message {name}{} (at least {minimal} bytes)",
                    opcode_suffix(def.opcode),
                );
                for field in &def.fields {
                    _ = writeln!(
                        out,
                        "{pad}    {} -> {} {}",
                        field.index,
                        display_type(env, &field.field.ty),
                        field.field.name
                    );
                }
            }
            Definition::Union(def) => {
                _ = writeln!(
                    out,
                    "{pad}union {name}{} (at least {minimal} bytes)",
                    opcode_suffix(def.opcode),
                );
                for branch in &def.branches {
                    _ = writeln!(out, "{pad}    {} ->", branch.discriminator);
                    let branch_def = env.get(branch.def);
                    self.dump_definition(
                        out,
                        schema,
                        env,
                        branch_def.name(),
                        branch.def,
                        depth + 2,
                    );
                }
            }
            Definition::Const(def) => {
                let value = match &def.value {
                    ConstValue::Bool(value) => value.to_string(),
                    ConstValue::Integer(value) => value.to_string(),
                    ConstValue::Float(value) => value.to_string(),
                    ConstValue::String(value) => format!("{value:?}"),
                    ConstValue::Guid(value) => value.to_string(),
                };
                _ = writeln!(out, "{pad}const {} {name} = {value}", def.ty.name());
            }
        }
    }
}

fn opcode_suffix(opcode: Option<crate::schema::Opcode>) -> String {
    opcode
        .map(|opcode| format!(" [opcode {:#010x}]", opcode.value))
        .unwrap_or_default()
}
