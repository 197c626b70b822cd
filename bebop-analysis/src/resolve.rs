//! Scope construction and reference resolution: the two passes that turn the
//! parser's output into arena-allocated definitions with direct references.
//!
//! Declaration walks every file in input order, giving each definition an id
//! and a scope. Lowering then rewrites every named type reference into a
//! [`Type::Defined`] id, looking names up innermost scope first. A name that
//! does not resolve becomes [`Type::Error`], which poisons the compilation
//! but keeps later passes running so more problems surface in one compile.

use std::collections::HashMap;

use bebop_foundation::{
    errors::{Diagnostic, DiagnosticSink, Label},
    source::{SourceFileId, Span, Spanned},
};
use bebop_syntax::ast::{self, Item, SchemaFile, TypeExpr};

use crate::{
    attributes::{self, KnownAttributes},
    check, consts,
    environment::{DefId, Environment},
    schema::{
        BaseType, ConstDef, ConstValue, DefHeader, Definition, EnumDef, EnumMemberDef, FieldDef,
        MessageDef, MessageFieldDef, Opcode, StructDef, Type, UnionBranchDef, UnionDef,
    },
};

pub(crate) struct Resolver<'a> {
    scopes: Vec<Scope>,
    declared: Vec<Declared<'a>>,
}

struct Scope {
    names: HashMap<String, DefId>,
    parent: Option<usize>,
}

struct Declared<'a> {
    item: &'a Item,
    file: SourceFileId,
    /// The scope the definition's name lives in; lookups from inside the
    /// definition also start here.
    scope: usize,
    parent: Option<DefId>,
    /// For unions: the pre-assigned ids of the branch definitions.
    branch_ids: Vec<DefId>,
}

const TOP_SCOPE: usize = 0;

impl<'a> Resolver<'a> {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                names: HashMap::new(),
                parent: None,
            }],
            declared: vec![],
        }
    }

    pub fn declare_all(
        &mut self,
        env: &mut Environment,
        files: &'a [(SourceFileId, SchemaFile)],
    ) {
        for (file, schema) in files {
            for item in &schema.items {
                self.declare(env, item, *file, TOP_SCOPE, None);
            }
        }
    }

    fn declare(
        &mut self,
        env: &mut Environment,
        item: &'a Item,
        file: SourceFileId,
        scope: usize,
        parent: Option<DefId>,
    ) -> DefId {
        let id = DefId::new(self.declared.len());
        let name = item.name();
        if BaseType::from_name(&name.text).is_some() {
            env.emit(
                Diagnostic::error(
                    file,
                    format!("`{}` is the name of a built-in type", name.text),
                )
                .with_code("duplicate-definition")
                .with_label(Label::primary(name.span, "choose a different name")),
            );
        } else if let Some(&existing) = self.scopes[scope].names.get(&name.text) {
            let existing = &self.declared[existing.index()];
            env.emit(
                Diagnostic::error(
                    file,
                    format!("the name `{}` is defined multiple times", name.text),
                )
                .with_code("duplicate-definition")
                .with_label(Label::primary(name.span, "redefined here"))
                .with_label(
                    Label::secondary(existing.item.name().span, "previous definition here")
                        .in_file(existing.file),
                ),
            );
        } else {
            self.scopes[scope].names.insert(name.text.clone(), id);
        }

        self.declared.push(Declared {
            item,
            file,
            scope,
            parent,
            branch_ids: vec![],
        });

        // A union's branches are definitions in a scope of their own; they
        // shadow the enclosing scope but stay invisible outside the union.
        if let Item::Union(item) = item {
            let child = self.scopes.len();
            self.scopes.push(Scope {
                names: HashMap::new(),
                parent: Some(scope),
            });
            let branch_ids = item
                .branches
                .iter()
                .map(|branch| self.declare(env, &branch.item, file, child, Some(id)))
                .collect();
            self.declared[id.index()].branch_ids = branch_ids;
        }

        id
    }

    pub fn lower_all(&self, env: &mut Environment) {
        for index in 0..self.declared.len() {
            let def = self.lower(env, &self.declared[index]);
            let id = env.register(def);
            debug_assert_eq!(
                id.index(),
                index,
                "the arena must line up with declaration order"
            );
        }
    }

    fn lookup(&self, mut scope: usize, name: &str) -> Option<DefId> {
        loop {
            if let Some(&id) = self.scopes[scope].names.get(name) {
                return Some(id);
            }
            scope = self.scopes[scope].parent?;
        }
    }

    fn resolve_type(
        &self,
        env: &mut Environment,
        file: SourceFileId,
        scope: usize,
        ty: &TypeExpr,
    ) -> Type {
        match ty {
            TypeExpr::Named(name) => {
                if let Some(base) = BaseType::from_name(&name.text) {
                    return Type::Base(base);
                }
                match self.lookup(scope, &name.text) {
                    Some(id) => {
                        if let Item::Const(_) = self.declared[id.index()].item {
                            env.emit(
                                Diagnostic::error(
                                    file,
                                    format!("`{}` is a constant, not a type", name.text),
                                )
                                .with_code("unknown-type")
                                .with_label(Label::primary(name.span, "constants cannot be used as types")),
                            );
                            return Type::Error;
                        }
                        Type::Defined(id)
                    }
                    None => {
                        env.emit(
                            Diagnostic::error(file, format!("unknown type `{}`", name.text))
                                .with_code("unknown-type")
                                .with_label(Label::primary(name.span, "not defined anywhere")),
                        );
                        Type::Error
                    }
                }
            }
            TypeExpr::Array { element, .. } => {
                Type::Array(Box::new(self.resolve_type(env, file, scope, element)))
            }
            TypeExpr::Map { key, value, .. } => Type::Map(
                Box::new(self.resolve_type(env, file, scope, key)),
                Box::new(self.resolve_type(env, file, scope, value)),
            ),
            TypeExpr::Option { inner, .. } => {
                Type::Optional(Box::new(self.resolve_type(env, file, scope, inner)))
            }
        }
    }

    fn lower(&self, env: &mut Environment, d: &Declared<'a>) -> Definition {
        match d.item {
            Item::Enum(item) => self.lower_enum(env, d, item),
            Item::Struct(item) => self.lower_struct(env, d, item),
            Item::Message(item) => self.lower_message(env, d, item),
            Item::Union(item) => self.lower_union(env, d, item),
            Item::Const(item) => self.lower_const(env, d, item),
        }
    }

    fn header(&self, d: &Declared, name: &ast::Ident, doc: &Option<String>) -> DefHeader {
        DefHeader {
            name: name.text.clone(),
            file: d.file,
            span: name.span,
            doc: doc.clone(),
            parent: d.parent,
        }
    }

    fn lower_enum(&self, env: &mut Environment, d: &Declared, item: &ast::ItemEnum) -> Definition {
        let attrs = attributes::interpret(&item.attributes, d.file, env);
        reject_opcode(&attrs, "an enum", d.file, env);
        warn_deprecated_on_definition(&attrs, d.file, env);

        let base = match &item.base {
            Some(ident) => match BaseType::from_name(&ident.text) {
                Some(base) if base.is_integer() => base,
                _ => {
                    env.emit(
                        Diagnostic::error(d.file, "enums must be backed by an integer type")
                            .with_code("enum-value-out-of-range")
                            .with_label(Label::primary(
                                ident.span,
                                format!("`{}` cannot back an enum", ident.text),
                            )),
                    );
                    BaseType::UInt32
                }
            },
            None => BaseType::UInt32,
        };
        let is_flags = attrs.flags.is_some();

        let mut members: Vec<EnumMemberDef> = vec![];
        let mut seen_values: HashMap<i128, Span> = HashMap::new();
        for member in &item.members {
            let member_attrs = attributes::interpret(&member.attributes, d.file, env);
            reject_opcode(&member_attrs, "an enum member", d.file, env);
            reject_flags(&member_attrs, "an enum member", d.file, env);

            if let Some(existing) = members.iter().find(|m| m.name == member.name.text) {
                emit_duplicate_member(
                    env,
                    d.file,
                    "enum member",
                    &member.name.text,
                    member.name.span,
                    existing.span,
                );
                continue;
            }
            let Some(value) = consts::eval_integer(&member.value, d.file, env) else {
                continue;
            };
            let (min, max) = base
                .integer_range()
                .expect("enum backing type must be an integer");
            if value < min || value > max {
                env.emit(
                    Diagnostic::error(
                        d.file,
                        format!("enum value {value} does not fit in `{}`", base.name()),
                    )
                    .with_code("enum-value-out-of-range")
                    .with_label(Label::primary(
                        member.value.span(),
                        format!("`{}` can only hold values from {min} to {max}", base.name()),
                    )),
                );
                continue;
            }
            // Flags enums routinely alias combinations of other members, so
            // uniqueness is only enforced for plain enums.
            if !is_flags {
                if let Some(&existing_span) = seen_values.get(&value) {
                    env.emit(
                        Diagnostic::error(
                            d.file,
                            format!("enum value {value} is used by more than one member"),
                        )
                        .with_code("duplicate-enum-value")
                        .with_label(Label::primary(member.value.span(), "value reused here"))
                        .with_label(Label::secondary(existing_span, "first used here"))
                        .with_note("note: mark the enum with `[flags]` if members are meant to combine"),
                    );
                    continue;
                }
            }
            seen_values.insert(value, member.value.span());
            members.push(EnumMemberDef {
                name: member.name.text.clone(),
                value,
                doc: member.doc.clone(),
                deprecated: member_attrs.deprecated.map(|(reason, _)| reason),
                span: member.name.span,
            });
        }

        Definition::Enum(EnumDef {
            header: self.header(d, &item.name, &item.doc),
            base,
            is_flags,
            members,
        })
    }

    fn lower_fields<'f>(
        &self,
        env: &mut Environment,
        file: SourceFileId,
        scope: usize,
        fields: impl Iterator<Item = &'f ast::Field>,
    ) -> Vec<FieldDef> {
        let mut lowered: Vec<FieldDef> = vec![];
        for field in fields {
            let field_attrs = attributes::interpret(&field.attributes, file, env);
            reject_opcode(&field_attrs, "a field", file, env);
            reject_flags(&field_attrs, "a field", file, env);
            if let Some(existing) = lowered.iter().find(|f| f.name == field.name.text) {
                emit_duplicate_member(
                    env,
                    file,
                    "field",
                    &field.name.text,
                    field.name.span,
                    existing.span,
                );
                continue;
            }
            let ty = self.resolve_type(env, file, scope, &field.ty);
            lowered.push(FieldDef {
                name: field.name.text.clone(),
                ty,
                doc: field.doc.clone(),
                deprecated: field_attrs.deprecated.map(|(reason, _)| reason),
                span: field.name.span,
            });
        }
        lowered
    }

    fn lower_struct(
        &self,
        env: &mut Environment,
        d: &Declared,
        item: &ast::ItemStruct,
    ) -> Definition {
        let attrs = attributes::interpret(&item.attributes, d.file, env);
        reject_flags(&attrs, "a struct", d.file, env);
        warn_deprecated_on_definition(&attrs, d.file, env);
        let opcode = take_opcode(attrs, d, env);
        let fields = self.lower_fields(env, d.file, d.scope, item.fields.iter());
        Definition::Struct(StructDef {
            header: self.header(d, &item.name, &item.doc),
            is_readonly: item.readonly.is_some(),
            opcode,
            fields,
        })
    }

    fn lower_message(
        &self,
        env: &mut Environment,
        d: &Declared,
        item: &ast::ItemMessage,
    ) -> Definition {
        let attrs = attributes::interpret(&item.attributes, d.file, env);
        reject_flags(&attrs, "a message", d.file, env);
        warn_deprecated_on_definition(&attrs, d.file, env);
        let opcode = take_opcode(attrs, d, env);

        let mut fields: Vec<MessageFieldDef> = vec![];
        let mut previous = None;
        for field in &item.fields {
            let field_attrs = attributes::interpret(&field.attributes, d.file, env);
            reject_opcode(&field_attrs, "a field", d.file, env);
            reject_flags(&field_attrs, "a field", d.file, env);
            if let Some(existing) = fields.iter().find(|f| f.field.name == field.name.text) {
                emit_duplicate_member(
                    env,
                    d.file,
                    "field",
                    &field.name.text,
                    field.name.span,
                    existing.field.span,
                );
                continue;
            }
            let Some(value) = consts::eval_integer(&field.index, d.file, env) else {
                continue;
            };
            let Some(index) =
                check::check_message_index(previous, value, field.index.span(), d.file, env)
            else {
                continue;
            };
            previous = Some(index);
            let ty = self.resolve_type(env, d.file, d.scope, &field.ty);
            fields.push(MessageFieldDef {
                index,
                field: FieldDef {
                    name: field.name.text.clone(),
                    ty,
                    doc: field.doc.clone(),
                    deprecated: field_attrs.deprecated.map(|(reason, _)| reason),
                    span: field.name.span,
                },
            });
        }

        Definition::Message(MessageDef {
            header: self.header(d, &item.name, &item.doc),
            opcode,
            fields,
        })
    }

    fn lower_union(
        &self,
        env: &mut Environment,
        d: &Declared,
        item: &ast::ItemUnion,
    ) -> Definition {
        let attrs = attributes::interpret(&item.attributes, d.file, env);
        reject_flags(&attrs, "a union", d.file, env);
        warn_deprecated_on_definition(&attrs, d.file, env);
        let opcode = take_opcode(attrs, d, env);

        if item.branches.is_empty() {
            env.emit(
                Diagnostic::error(d.file, "a union must have at least one branch")
                    .with_code("invalid-union-branch")
                    .with_label(Label::primary(
                        item.name.span,
                        "no value of this union could ever be constructed",
                    )),
            );
        }

        let mut branches: Vec<UnionBranchDef> = vec![];
        let mut previous = None;
        for (branch, &branch_id) in item.branches.iter().zip(&d.branch_ids) {
            let Some(value) = consts::eval_integer(&branch.discriminator, d.file, env) else {
                continue;
            };
            let Some(discriminator) = check::check_union_discriminator(
                previous,
                value,
                branch.discriminator.span(),
                d.file,
                env,
            ) else {
                continue;
            };
            previous = Some(discriminator);
            branches.push(UnionBranchDef {
                discriminator,
                def: branch_id,
                doc: branch.doc.clone(),
                span: branch.span,
            });
        }

        Definition::Union(UnionDef {
            header: self.header(d, &item.name, &item.doc),
            opcode,
            branches,
        })
    }

    fn lower_const(
        &self,
        env: &mut Environment,
        d: &Declared,
        item: &ast::ItemConst,
    ) -> Definition {
        let attrs = attributes::interpret(&item.attributes, d.file, env);
        reject_opcode(&attrs, "a constant", d.file, env);
        reject_flags(&attrs, "a constant", d.file, env);
        warn_deprecated_on_definition(&attrs, d.file, env);

        let ty = match BaseType::from_name(&item.ty.text) {
            Some(ty) => ty,
            None => {
                env.emit(
                    Diagnostic::error(d.file, "constants must use a built-in scalar type")
                        .with_code("const-type-mismatch")
                        .with_label(Label::primary(
                            item.ty.span,
                            format!("`{}` is not a built-in type", item.ty.text),
                        )),
                );
                BaseType::UInt32
            }
        };
        let value = consts::eval_literal(&item.value, ty, d.file, env)
            .unwrap_or_else(|| placeholder_const_value(ty));

        Definition::Const(ConstDef {
            header: self.header(d, &item.name, &item.doc),
            ty,
            value,
        })
    }
}

/// Stands in for a constant whose literal failed to evaluate. By then an
/// error has been recorded, so this value is never surfaced as a success.
fn placeholder_const_value(ty: BaseType) -> ConstValue {
    match ty {
        BaseType::Bool => ConstValue::Bool(false),
        BaseType::String => ConstValue::String(String::new()),
        BaseType::Guid => ConstValue::Guid(uuid::Uuid::nil()),
        _ if ty.is_float() => ConstValue::Float(0.0),
        _ => ConstValue::Integer(0),
    }
}

fn take_opcode(attrs: KnownAttributes, d: &Declared, env: &mut Environment) -> Option<Opcode> {
    let opcode = attrs.opcode?;
    if d.parent.is_some() {
        env.emit(
            Diagnostic::error(
                d.file,
                "opcodes are not allowed on definitions nested in a union",
            )
            .with_code("malformed-attribute")
            .with_label(Label::primary(
                opcode.span,
                "the enclosing union can carry the opcode instead",
            )),
        );
        return None;
    }
    Some(opcode)
}

fn reject_opcode(attrs: &KnownAttributes, what: &str, file: SourceFileId, env: &mut Environment) {
    if let Some(opcode) = attrs.opcode {
        env.emit(
            Diagnostic::error(
                file,
                format!("only structs, messages and unions can carry an opcode, not {what}"),
            )
            .with_code("malformed-attribute")
            .with_label(Label::primary(opcode.span, "remove this attribute")),
        );
    }
}

fn reject_flags(attrs: &KnownAttributes, what: &str, file: SourceFileId, env: &mut Environment) {
    if let Some(span) = attrs.flags {
        env.emit(
            Diagnostic::error(file, format!("`flags` cannot be applied to {what}"))
                .with_code("malformed-attribute")
                .with_label(Label::primary(span, "only enums can be flags")),
        );
    }
}

fn warn_deprecated_on_definition(attrs: &KnownAttributes, file: SourceFileId, env: &mut Environment) {
    if let Some((_, span)) = &attrs.deprecated {
        env.emit(
            Diagnostic::warning(file, "`deprecated` on a definition has no effect")
                .with_label(Label::primary(*span, "only fields and enum members can be deprecated")),
        );
    }
}

fn emit_duplicate_member(
    env: &mut Environment,
    file: SourceFileId,
    what: &str,
    name: &str,
    span: Span,
    existing: Span,
) {
    env.emit(
        Diagnostic::error(file, format!("a {what} named `{name}` already exists"))
            .with_code("duplicate-definition")
            .with_label(Label::primary(span, "redefined here"))
            .with_label(Label::secondary(existing, "previous definition here")),
    );
}
