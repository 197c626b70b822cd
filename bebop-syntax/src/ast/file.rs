use bebop_foundation::{
    errors::{Diagnostic, DiagnosticSink, Label},
    source::{SourceFileId, Span, Spanned},
};

use crate::{
    ast::{Item, Lit},
    lexis::{token::TokenKind, Lexer, TokenStream},
    Parser,
};

/// `import "other.bop";` - resolved to an actual source file by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub path: String,
    pub span: Span,
}

/// One parsed schema source file. Parsing never fails as a whole: erroneous
/// definitions are skipped and reported, and whatever parsed cleanly is kept
/// so analysis can diagnose as much as possible in one go.
#[derive(Debug, Clone, Default)]
pub struct SchemaFile {
    pub imports: Vec<Import>,
    pub items: Vec<Item>,
}

impl SchemaFile {
    pub fn parse(parser: &mut Parser<'_, impl TokenStream>) -> SchemaFile {
        let mut schema = SchemaFile::default();

        loop {
            match parser.peek_token() {
                Ok(token) if token.kind == TokenKind::KImport => {
                    if let Some(import) = parse_import(parser) {
                        schema.imports.push(import);
                    }
                }
                _ => break,
            }
        }

        loop {
            let doc = parser.take_docs();
            match parser.peek_token() {
                Ok(token) if token.kind == TokenKind::EndOfFile => break,
                Ok(token) if token.kind == TokenKind::KImport => {
                    parser.emit_diagnostic(
                        Diagnostic::error(
                            parser.file,
                            "imports must appear before any definition",
                        )
                        .with_label(Label::primary(token.span, "move this import to the top")),
                    );
                    if let Some(import) = parse_import(parser) {
                        schema.imports.push(import);
                    }
                    continue;
                }
                _ => (),
            }
            match Item::parse_with_doc(parser, doc) {
                Ok(item) => schema.items.push(item),
                Err(_) => parser.skip_to_next_definition(),
            }
        }

        schema
    }
}

fn parse_import(parser: &mut Parser<'_, impl TokenStream>) -> Option<Import> {
    let kimport = parser.expect(TokenKind::KImport).ok()?;
    let path = match parser.parse::<Lit>() {
        Ok(Lit::String { value, .. }) => value,
        Ok(other) => {
            parser.emit_diagnostic(
                Diagnostic::error(parser.file, "import path must be a string literal")
                    .with_label(Label::primary(other.span(), "string literal expected here")),
            );
            parser.skip_to_next_definition();
            return None;
        }
        Err(_) => {
            parser.skip_to_next_definition();
            return None;
        }
    };
    let semi = match parser.expect(TokenKind::Semi) {
        Ok(semi) => semi,
        Err(_) => {
            parser.skip_to_next_definition();
            return None;
        }
    };
    Some(Import {
        path,
        span: kimport.span.join(&semi.span),
    })
}

/// Lexes and parses a whole source file, piping all diagnostics into `sink`.
pub fn parse_source(
    file: SourceFileId,
    input: &str,
    sink: &mut dyn DiagnosticSink,
) -> SchemaFile {
    let lexer = Lexer::new(file, input);
    let mut parser = Parser::new(file, input, lexer);
    let schema = SchemaFile::parse(&mut parser);
    for diagnostic in parser.errors {
        sink.emit(diagnostic);
    }
    schema
}

#[cfg(test)]
mod tests {
    use bebop_foundation::{
        errors::Diagnostic,
        source::{SourceFile, SourceFileSet, Spanned},
    };
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::{FloatLit, Radix, TypeExpr};

    fn parse_ok(input: &str) -> SchemaFile {
        let (schema, diagnostics) = parse_with_diagnostics(input);
        assert!(
            diagnostics.is_empty(),
            "unexpected diagnostics: {:?}",
            diagnostics
                .iter()
                .map(|d| d.message.clone())
                .collect::<Vec<_>>()
        );
        schema
    }

    fn parse_with_diagnostics(input: &str) -> (SchemaFile, Vec<Diagnostic>) {
        let mut sources = SourceFileSet::new();
        let file = sources.add(SourceFile::new(
            "test.bop".into(),
            "test.bop".into(),
            input.to_owned(),
        ));
        let mut diagnostics = vec![];
        let schema = parse_source(file, input, &mut diagnostics);
        (schema, diagnostics)
    }

    #[test]
    fn empty_struct() {
        let schema = parse_ok("struct Empty {}");
        assert_eq!(schema.items.len(), 1);
        let Item::Struct(item) = &schema.items[0] else {
            panic!("struct expected");
        };
        assert_eq!(item.name.text, "Empty");
        assert!(item.fields.is_empty());
        assert!(item.readonly.is_none());
    }

    #[test]
    fn struct_with_fields() {
        let schema = parse_ok("readonly struct Point { int32 x; int32 y; }");
        let Item::Struct(item) = &schema.items[0] else {
            panic!("struct expected");
        };
        assert!(item.readonly.is_some());
        assert_eq!(item.fields.len(), 2);
        assert_eq!(item.fields[0].name.text, "x");
        let TypeExpr::Named(ty) = &item.fields[0].ty else {
            panic!("named type expected");
        };
        assert_eq!(ty.text, "int32");
    }

    #[test]
    fn compound_types() {
        let schema = parse_ok("struct S { map[string, int32[]] m; byte[]? maybe; int32?? opt; }");
        let Item::Struct(item) = &schema.items[0] else {
            panic!("struct expected");
        };
        assert!(matches!(&item.fields[0].ty, TypeExpr::Map { .. }));
        let TypeExpr::Option { inner, .. } = &item.fields[1].ty else {
            panic!("optional expected");
        };
        assert!(matches!(&**inner, TypeExpr::Array { .. }));
        let TypeExpr::Option { inner, .. } = &item.fields[2].ty else {
            panic!("optional expected");
        };
        assert!(matches!(&**inner, TypeExpr::Option { .. }));
    }

    #[test]
    fn enum_with_base_and_attributes() {
        let schema = parse_ok(
            "[flags] enum Permissions : uint16 { Read = 1; Write = 2; All = 0x3; }",
        );
        let Item::Enum(item) = &schema.items[0] else {
            panic!("enum expected");
        };
        assert_eq!(item.attributes.len(), 1);
        assert_eq!(item.attributes[0].name.text, "flags");
        assert_eq!(item.base.as_ref().unwrap().text, "uint16");
        assert_eq!(item.members.len(), 3);
        assert_eq!(
            item.members[2].value,
            Lit::Int {
                digits: "3".into(),
                negative: false,
                radix: Radix::Hex,
                span: item.members[2].value.span(),
            }
        );
    }

    #[test]
    fn message_fields_have_indices() {
        let schema = parse_ok("message Song { 1 -> string title; 2 -> uint16 year; }");
        let Item::Message(item) = &schema.items[0] else {
            panic!("message expected");
        };
        assert_eq!(item.fields.len(), 2);
        assert_eq!(
            item.fields[0].index,
            Lit::Int {
                digits: "1".into(),
                negative: false,
                radix: Radix::Decimal,
                span: item.fields[0].index.span(),
            }
        );
        assert_eq!(item.fields[1].name.text, "year");
    }

    #[test]
    fn union_with_inline_definitions() {
        let schema = parse_ok(
            "union Shape { 1 -> struct Circle { float64 radius; }; 2 -> message Poly { 1 -> uint32 sides; }; }",
        );
        let Item::Union(item) = &schema.items[0] else {
            panic!("union expected");
        };
        assert_eq!(item.branches.len(), 2);
        assert!(matches!(&*item.branches[0].item, Item::Struct(_)));
        assert!(matches!(&*item.branches[1].item, Item::Message(_)));
    }

    #[test]
    fn union_branch_must_be_struct_or_message() {
        let (_, diagnostics) = parse_with_diagnostics("union U { 1 -> enum E { A = 1; }; }");
        assert!(diagnostics
            .iter()
            .any(|d| d.message.contains("must be a struct or message")));
    }

    #[test]
    fn const_definitions() {
        let schema = parse_ok("const float64 pi = 3.14159;\nconst guid id = \"81c6987b-48b7-495f-ad01-ec20cc5f5be1\";");
        let Item::Const(pi) = &schema.items[0] else {
            panic!("const expected");
        };
        assert_eq!(pi.ty.text, "float64");
        assert_eq!(
            pi.value,
            Lit::Float {
                value: FloatLit::Digits("3.14159".into()),
                span: pi.value.span(),
            }
        );
    }

    #[test]
    fn doc_comments_attach_to_definitions_and_fields() {
        let schema = parse_ok(
            "/* The point. */\nstruct Point {\n    /* Horizontal. */\n    int32 x;\n    // not documentation\n    int32 y;\n}",
        );
        let Item::Struct(item) = &schema.items[0] else {
            panic!("struct expected");
        };
        assert_eq!(item.doc.as_deref(), Some("The point."));
        assert_eq!(item.fields[0].doc.as_deref(), Some("Horizontal."));
        assert_eq!(item.fields[1].doc, None);
    }

    #[test]
    fn imports_come_first() {
        let schema = parse_ok("import \"a.bop\";\nimport 'b.bop';\nstruct S {}");
        assert_eq!(
            schema.imports,
            vec![
                Import {
                    path: "a.bop".into(),
                    span: schema.imports[0].span,
                },
                Import {
                    path: "b.bop".into(),
                    span: schema.imports[1].span,
                },
            ]
        );

        let (_, diagnostics) = parse_with_diagnostics("struct S {}\nimport \"late.bop\";");
        assert!(diagnostics
            .iter()
            .any(|d| d.message.contains("imports must appear before")));
    }

    #[test]
    fn recovery_continues_after_a_bad_definition() {
        let (schema, diagnostics) =
            parse_with_diagnostics("struct Bad { int32 }\nstruct Good { int32 x; }");
        assert!(!diagnostics.is_empty());
        assert!(schema
            .items
            .iter()
            .any(|item| item.name().text == "Good"));
    }

    #[test]
    fn recovery_continues_after_a_bad_field() {
        let (schema, diagnostics) =
            parse_with_diagnostics("struct S { int32 x y; int32 z; }");
        assert!(!diagnostics.is_empty());
        let Item::Struct(item) = &schema.items[0] else {
            panic!("struct expected");
        };
        assert_eq!(item.fields.len(), 1);
        assert_eq!(item.fields[0].name.text, "z");
    }

    #[test]
    fn deprecated_attribute_with_value() {
        let schema = parse_ok("struct S { [deprecated(\"use y\")] int32 x; int32 y; }");
        let Item::Struct(item) = &schema.items[0] else {
            panic!("struct expected");
        };
        assert_eq!(item.fields[0].attributes.len(), 1);
        assert_eq!(item.fields[0].attributes[0].name.text, "deprecated");
        assert!(item.fields[0].attributes[0].value.is_some());
    }
}
