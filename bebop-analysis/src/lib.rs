//! The compiler core: turns schema text into a validated, analyzed
//! intermediate representation, or a list of diagnostics explaining why it
//! could not.
//!
//! The pipeline is strictly one-way: text is lexed and parsed by
//! `bebop-syntax`, then [`compile`] resolves names, checks every structural
//! invariant, and computes the derived data generators need. Diagnostics are
//! collected in the [`Environment`], never thrown; later passes keep running
//! after errors so one compile surfaces as much as possible.

pub mod environment;
pub mod generator;
pub mod schema;

mod attributes;
mod check;
mod consts;
mod recursion;
mod resolve;
mod size;

use std::collections::{HashMap, HashSet};

use bebop_foundation::source::{SourceFileId, SourceFileSet};
use bebop_syntax::ast::{self, SchemaFile};
use indexmap::IndexMap;
use tracing::debug;

pub use environment::{DefId, Environment};
pub use schema::Schema;
pub use size::{is_fixed_size, minimal_encoded_size, minimal_encoded_size_of_type};

use crate::schema::{Definition, Type};

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Optional dotted namespace recorded on the schema for generators.
    /// Schema text itself has no namespace syntax; the host supplies this.
    pub namespace: Option<String>,
}

/// Compilation failed. The environment holds the diagnostics explaining why;
/// no schema was produced.
#[derive(Debug)]
pub struct CompileError;

/// Parses and analyzes every file in the set. A pure function of its inputs:
/// the same sources produce the same schema and the same diagnostics in the
/// same order.
pub fn compile(
    env: &mut Environment,
    sources: &SourceFileSet,
    options: &CompileOptions,
) -> Result<Schema, CompileError> {
    let mut files = Vec::with_capacity(sources.len());
    for (id, file) in sources.iter() {
        files.push((id, ast::parse_source(id, &file.source, env)));
    }
    compile_parsed(env, &files, options)
}

/// Analyzes already-parsed files. Hosts that parse during import resolution
/// use this to avoid parsing twice.
pub fn compile_parsed(
    env: &mut Environment,
    files: &[(SourceFileId, SchemaFile)],
    options: &CompileOptions,
) -> Result<Schema, CompileError> {
    let mut resolver = resolve::Resolver::new();
    resolver.declare_all(env, files);
    resolver.lower_all(env);

    check::check_opcodes(env);
    recursion::run(env);

    let mut minimal_sizes = HashMap::new();
    for (id, _) in env.defs() {
        minimal_sizes.insert(id, size::minimal_encoded_size(env, id));
    }

    let mut definitions = IndexMap::new();
    for (id, def) in env.defs() {
        if def.header().parent.is_none() {
            definitions.entry(def.name().to_owned()).or_insert(id);
        }
    }
    let referenced = collect_referenced(env);
    let roots = definitions
        .values()
        .filter(|&id| !referenced.contains(id))
        .copied()
        .collect();

    let schema = Schema {
        namespace: options.namespace.clone(),
        definitions,
        roots,
        minimal_sizes,
    };

    if env.has_errors() {
        debug!(
            diagnostics = env.diagnostics.len(),
            "compilation failed with errors"
        );
        Err(CompileError)
    } else {
        Ok(schema)
    }
}

/// Every definition referenced from some other definition's fields or
/// branches. Top-level definitions outside this set are the schema's roots.
fn collect_referenced(env: &Environment) -> HashSet<DefId> {
    fn collect_type(ty: &Type, into: &mut HashSet<DefId>) {
        match ty {
            Type::Defined(id) => {
                into.insert(*id);
            }
            Type::Array(element) | Type::Optional(element) => collect_type(element, into),
            Type::Map(key, value) => {
                collect_type(key, into);
                collect_type(value, into);
            }
            Type::Base(_) | Type::Error => {}
        }
    }

    let mut referenced = HashSet::new();
    for (_, def) in env.defs() {
        match def {
            Definition::Struct(def) => {
                for field in &def.fields {
                    collect_type(&field.ty, &mut referenced);
                }
            }
            Definition::Message(def) => {
                for field in &def.fields {
                    collect_type(&field.field.ty, &mut referenced);
                }
            }
            Definition::Union(def) => {
                for branch in &def.branches {
                    referenced.insert(branch.def);
                }
            }
            Definition::Enum(_) | Definition::Const(_) => {}
        }
    }
    referenced
}

#[cfg(test)]
mod tests {
    use bebop_foundation::source::{SourceFile, SourceFileSet};
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    use super::*;
    use crate::schema::{BaseType, ConstValue, Definition, Type};

    fn compile_text(input: &str) -> (Environment, Result<Schema, CompileError>) {
        compile_files(&[("schema.bop", input)])
    }

    fn compile_files(inputs: &[(&str, &str)]) -> (Environment, Result<Schema, CompileError>) {
        let mut sources = SourceFileSet::new();
        for (name, input) in inputs {
            sources.add(SourceFile::new(
                (*name).to_owned(),
                (*name).into(),
                (*input).to_owned(),
            ));
        }
        let mut env = Environment::new();
        let result = compile(&mut env, &sources, &CompileOptions::default());
        (env, result)
    }

    fn compile_ok(input: &str) -> (Environment, Schema) {
        let (env, result) = compile_text(input);
        let schema = match result {
            Ok(schema) => schema,
            Err(_) => panic!(
                "expected successful compilation, got: {:?}",
                env.diagnostics
                    .iter()
                    .map(|d| d.message.clone())
                    .collect::<Vec<_>>()
            ),
        };
        (env, schema)
    }

    fn error_codes(env: &Environment) -> Vec<&str> {
        env.diagnostics
            .iter()
            .filter_map(|d| d.code.as_deref())
            .collect()
    }

    #[test]
    fn definitions_keep_source_order() {
        let (_, schema) = compile_ok("struct B {}\nstruct A {}\nenum C { X = 1; }");
        let names: Vec<&str> = schema.definitions.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[test]
    fn named_references_resolve() {
        let (env, schema) = compile_ok(
            "enum Kind { A = 1; }\nstruct Inner { Kind kind; }\nstruct Outer { Inner inner; Inner[] more; }",
        );
        let outer = schema.definitions["Outer"];
        let Definition::Struct(def) = env.get(outer) else {
            panic!("struct expected");
        };
        assert_eq!(def.fields[0].ty, Type::Defined(schema.definitions["Inner"]));
    }

    #[test]
    fn unknown_type_is_reported_and_poisons() {
        let (env, result) = compile_text("struct S { Missing x; }");
        assert!(result.is_err());
        assert_eq!(error_codes(&env), vec!["unknown-type"]);
    }

    #[test]
    fn duplicate_definitions_are_reported_across_files() {
        let (env, result) =
            compile_files(&[("a.bop", "struct S {}"), ("b.bop", "enum S { A = 1; }")]);
        assert!(result.is_err());
        assert_eq!(error_codes(&env), vec!["duplicate-definition"]);
    }

    #[test]
    fn base_type_names_are_reserved() {
        let (env, result) = compile_text("struct string {}");
        assert!(result.is_err());
        assert_eq!(error_codes(&env), vec!["duplicate-definition"]);
    }

    #[test]
    fn union_scope_shadows_top_level() {
        let (env, schema) = compile_ok(
            "struct Leaf { int32 n; }\nunion U { 1 -> struct Leaf { bool b; }; 2 -> struct Pair { Leaf left; }; }",
        );
        let u = schema.definitions["U"];
        let Definition::Union(union_def) = env.get(u) else {
            panic!("union expected");
        };
        let inner_leaf = union_def.branches[0].def;
        let Definition::Struct(pair) = env.get(union_def.branches[1].def) else {
            panic!("struct expected");
        };
        // `Leaf` inside the union resolves to the branch definition, not the
        // top-level one.
        assert_eq!(pair.fields[0].ty, Type::Defined(inner_leaf));
        assert_ne!(inner_leaf, schema.definitions["Leaf"]);
    }

    #[test]
    fn nested_definitions_are_not_visible_outside() {
        let (env, result) = compile_text(
            "union U { 1 -> struct Hidden { bool b; }; }\nstruct S { Hidden h; }",
        );
        assert!(result.is_err());
        assert_eq!(error_codes(&env), vec!["unknown-type"]);
    }

    #[test]
    fn message_index_rules() {
        let (env, result) = compile_text(
            "message M { 0 -> int32 a; 256 -> int32 b; 3 -> int32 c; 3 -> int32 d; 2 -> int32 e; }",
        );
        assert!(result.is_err());
        assert_eq!(
            error_codes(&env),
            vec![
                "reserved-field-index-zero",
                "field-index-out-of-range",
                "duplicate-field-index",
                "field-index-not-increasing",
            ]
        );
    }

    #[test]
    fn message_index_gaps_are_reserved_and_fine() {
        let (env, schema) = compile_ok("message M { 1 -> int32 a; 200 -> int32 b; 255 -> int32 c; }");
        let Definition::Message(def) = env.get(schema.definitions["M"]) else {
            panic!("message expected");
        };
        assert_eq!(
            def.fields.iter().map(|f| f.index).collect::<Vec<_>>(),
            vec![1, 200, 255]
        );
    }

    #[test]
    fn union_discriminator_rules() {
        let (env, result) = compile_text(
            "union U { 0 -> struct A {}; 2 -> struct B {}; 2 -> struct C {}; 1 -> struct D {}; }",
        );
        assert!(result.is_err());
        assert_eq!(
            error_codes(&env),
            vec![
                "invalid-union-branch",
                "invalid-union-branch",
                "invalid-union-branch",
            ]
        );
    }

    #[test]
    fn empty_union_is_rejected() {
        let (env, result) = compile_text("union U {}");
        assert!(result.is_err());
        assert!(error_codes(&env).contains(&"invalid-union-branch"));
    }

    #[test]
    fn enum_values_must_fit_the_backing_type() {
        let (env, result) = compile_text("enum E : byte { Big = 300; Negative = -1; }");
        assert!(result.is_err());
        assert_eq!(
            error_codes(&env),
            vec!["enum-value-out-of-range", "enum-value-out-of-range"]
        );
    }

    #[test]
    fn enum_duplicate_values_need_flags() {
        let (env, result) = compile_text("enum E { A = 1; B = 1; }");
        assert!(result.is_err());
        assert_eq!(error_codes(&env), vec!["duplicate-enum-value"]);

        let (env, _) = compile_ok("[flags] enum F : uint16 { A = 1; B = 2; Both = 3; Alias = 3; }");
        assert!(env.diagnostics.is_empty());
    }

    #[test]
    fn const_evaluation() {
        let (env, schema) = compile_ok(
            "const int32 answer = -42;\nconst uint32 mask = 0xFF00;\nconst float64 half = 0.5;\nconst float32 weird = -inf;\nconst bool yes = true;\nconst string greeting = 'hello';\nconst guid id = \"81c6987b-48b7-495f-ad01-ec20cc5f5be1\";",
        );
        let value = |name: &str| {
            let Definition::Const(def) = env.get(schema.definitions[name]) else {
                panic!("const expected");
            };
            def.value.clone()
        };
        assert_eq!(value("answer"), ConstValue::Integer(-42));
        assert_eq!(value("mask"), ConstValue::Integer(0xFF00));
        assert_eq!(value("half"), ConstValue::Float(0.5));
        assert_eq!(value("weird"), ConstValue::Float(f64::NEG_INFINITY));
        assert_eq!(value("yes"), ConstValue::Bool(true));
        assert_eq!(value("greeting"), ConstValue::String("hello".into()));
        assert_eq!(
            value("id"),
            ConstValue::Guid(Uuid::parse_str("81c6987b-48b7-495f-ad01-ec20cc5f5be1").unwrap())
        );
    }

    #[test]
    fn const_range_and_type_errors() {
        let (env, result) = compile_text(
            "const byte big = 300;\nconst uint32 negative = -1;\nconst int32 wrong = \"text\";\nconst guid bad = \"not-a-guid\";",
        );
        assert!(result.is_err());
        assert_eq!(
            error_codes(&env),
            vec![
                "const-out-of-range",
                "const-out-of-range",
                "const-type-mismatch",
                "invalid-guid",
            ]
        );
    }

    #[test]
    fn direct_struct_recursion_is_rejected() {
        let (env, result) = compile_text("struct Node { int32 value; Node next; }");
        assert!(result.is_err());
        assert_eq!(error_codes(&env), vec!["infinite-struct"]);
    }

    #[test]
    fn mutual_struct_recursion_is_rejected_once() {
        let (env, result) =
            compile_text("struct A { B b; }\nstruct B { A a; }");
        assert!(result.is_err());
        assert_eq!(error_codes(&env), vec!["infinite-struct"]);
    }

    #[test]
    fn indirect_recursion_is_fine() {
        let (env, _) = compile_ok(
            "struct Tree { int32 value; Tree? left; Tree[] children; }\nmessage ListNode { 1 -> ListNode next; }",
        );
        assert!(env.diagnostics.is_empty());
    }

    #[test]
    fn opcodes_must_be_globally_unique() {
        // "JAZZ" read as a little-endian u32 is 0x5A5A414A, so these two
        // spellings collide even across files.
        let (env, result) = compile_files(&[
            ("a.bop", "[opcode(0x5A5A414A)] struct A {}"),
            ("b.bop", "[opcode(\"JAZZ\")] struct B {}"),
        ]);
        assert!(result.is_err());
        assert_eq!(error_codes(&env), vec!["duplicate-opcode"]);
    }

    #[test]
    fn minimal_sizes() {
        let (env, schema) = compile_ok(
            "struct Empty {}\n\
             struct Point { int32 x; int32 y; }\n\
             struct Mixed { string name; byte[] data; int32?? maybe; guid id; date when; }\n\
             enum Small : byte { A = 1; }\n\
             message M { 1 -> int32 a; }\n\
             union U { 1 -> struct Big { float64 a; float64 b; }; 2 -> struct Tiny { byte t; }; }",
        );
        let size = |name: &str| schema.minimal_sizes[&schema.definitions[name]];
        assert_eq!(size("Empty"), 0);
        assert_eq!(size("Point"), 8);
        // string 4 + byte array 4 + optional 1 + guid 16 + date 8
        assert_eq!(size("Mixed"), 33);
        assert_eq!(size("Small"), 1);
        assert_eq!(size("M"), 5);
        // length 4 + discriminator 1 + cheapest branch (Tiny, 1 byte)
        assert_eq!(size("U"), 6);

        let point = schema.definitions["Point"];
        assert!(is_fixed_size(&env, &Type::Defined(point)));
        let mixed = schema.definitions["Mixed"];
        assert!(!is_fixed_size(&env, &Type::Defined(mixed)));
        assert!(!is_fixed_size(&env, &Type::Base(BaseType::String)));
        assert!(is_fixed_size(&env, &Type::Base(BaseType::Guid)));
    }

    #[test]
    fn roots_are_unreferenced_top_level_definitions() {
        let (_, schema) = compile_ok(
            "struct Inner { int32 n; }\nstruct Outer { Inner inner; }\nmessage Standalone {}",
        );
        let names: Vec<&str> = schema
            .roots
            .iter()
            .map(|&id| schema.definitions.iter().find(|(_, &d)| d == id).unwrap().0.as_str())
            .collect();
        assert_eq!(names, vec!["Outer", "Standalone"]);
    }

    #[test]
    fn documentation_reaches_the_ir() {
        let (env, schema) = compile_ok(
            "/* Identifies a musician. */\nstruct Musician {\n    /* Stage name. */\n    string name;\n}",
        );
        let Definition::Struct(def) = env.get(schema.definitions["Musician"]) else {
            panic!("struct expected");
        };
        assert_eq!(def.header.doc.as_deref(), Some("Identifies a musician."));
        assert_eq!(def.fields[0].doc.as_deref(), Some("Stage name."));
    }

    #[test]
    fn deprecated_and_readonly_reach_the_ir() {
        let (env, schema) = compile_ok(
            "readonly struct S { [deprecated(\"use b\")] int32 a; int32 b; }",
        );
        let Definition::Struct(def) = env.get(schema.definitions["S"]) else {
            panic!("struct expected");
        };
        assert!(def.is_readonly);
        assert_eq!(def.fields[0].deprecated.as_deref(), Some("use b"));
        assert_eq!(def.fields[1].deprecated, None);
    }

    #[test]
    fn diagnostics_are_deterministic() {
        let input = "struct S { Missing x; Alsomissing y; }\nenum E { A = 1; B = 1; }";
        let (env_a, _) = compile_text(input);
        let (env_b, _) = compile_text(input);
        let messages = |env: &Environment| {
            env.diagnostics
                .iter()
                .map(|d| d.message.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(messages(&env_a), messages(&env_b));
    }

    #[test]
    fn dump_generator_exercises_the_interface() {
        use crate::generator::{DumpGenerator, Generator};
        let (env, schema) = compile_ok(
            "enum Instrument { Sax = 0; Trumpet = 1; }\nstruct Musician { string name; Instrument plays; }",
        );
        let mut generator = DumpGenerator;
        let output = generator.emit(&schema, &env);
        assert!(output.contains("enum Instrument"));
        assert!(output.contains("struct Musician"));
        assert!(output.contains("Instrument plays"));
    }
}
