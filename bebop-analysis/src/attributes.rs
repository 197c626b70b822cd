use bebop_foundation::{
    errors::{Diagnostic, DiagnosticSink, Label},
    source::{SourceFileId, Span, Spanned},
};
use bebop_syntax::ast::{Attribute, Lit};

use crate::{consts, schema::Opcode};

/// The attributes the compiler understands, extracted from the open-ended
/// attribute list the parser produces.
#[derive(Debug, Default)]
pub(crate) struct KnownAttributes {
    pub opcode: Option<Opcode>,
    pub deprecated: Option<(String, Span)>,
    pub flags: Option<Span>,
}

pub(crate) fn interpret(
    attributes: &[Attribute],
    file: SourceFileId,
    sink: &mut dyn DiagnosticSink,
) -> KnownAttributes {
    let mut known = KnownAttributes::default();
    for attribute in attributes {
        match attribute.name.text.as_str() {
            "opcode" => {
                if known.opcode.is_some() {
                    duplicate(attribute, file, sink);
                    continue;
                }
                known.opcode = eval_opcode(attribute, file, sink);
            }
            "deprecated" => {
                if known.deprecated.is_some() {
                    duplicate(attribute, file, sink);
                    continue;
                }
                match &attribute.value {
                    Some(Lit::String { value, .. }) => {
                        known.deprecated = Some((value.clone(), attribute.span))
                    }
                    _ => sink.emit(
                        Diagnostic::error(file, "`deprecated` requires a reason string")
                            .with_code("malformed-attribute")
                            .with_label(Label::primary(
                                attribute.span,
                                "write this as `[deprecated(\"reason\")]`",
                            )),
                    ),
                }
            }
            "flags" => {
                if let Some(value) = &attribute.value {
                    sink.emit(
                        Diagnostic::error(file, "`flags` does not take a value")
                            .with_code("malformed-attribute")
                            .with_label(Label::primary(value.span(), "remove this value")),
                    );
                }
                known.flags = Some(attribute.span);
            }
            unknown => sink.emit(
                Diagnostic::warning(file, format!("unknown attribute `{unknown}` is ignored"))
                    .with_label(Label::primary(attribute.span, "this attribute has no effect")),
            ),
        }
    }
    known
}

/// `[opcode(0x12345678)]` or `[opcode("JAZZ")]` - a four-character ASCII tag
/// is the little-endian `u32` built from its bytes, so both spellings share
/// one value space.
fn eval_opcode(
    attribute: &Attribute,
    file: SourceFileId,
    sink: &mut dyn DiagnosticSink,
) -> Option<Opcode> {
    match &attribute.value {
        Some(lit @ Lit::Int { .. }) => {
            let value = consts::eval_integer(lit, file, sink)?;
            if value < 0 || value > u32::MAX as i128 {
                sink.emit(
                    Diagnostic::error(file, "opcode does not fit in 32 bits")
                        .with_code("malformed-attribute")
                        .with_label(Label::primary(
                            lit.span(),
                            format!("{value} is not a valid opcode"),
                        )),
                );
                return None;
            }
            Some(Opcode {
                value: value as u32,
                span: attribute.span,
            })
        }
        Some(Lit::String { value, span }) => {
            let bytes = value.as_bytes();
            if bytes.len() != 4 || !value.is_ascii() {
                sink.emit(
                    Diagnostic::error(file, "opcode tags must be exactly four ASCII characters")
                        .with_code("malformed-attribute")
                        .with_label(Label::primary(*span, format!("`{value}` is not a valid tag"))),
                );
                return None;
            }
            Some(Opcode {
                value: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
                span: attribute.span,
            })
        }
        _ => {
            sink.emit(
                Diagnostic::error(
                    file,
                    "`opcode` requires a 32-bit integer or a four-character ASCII tag",
                )
                .with_code("malformed-attribute")
                .with_label(Label::primary(
                    attribute.span,
                    "write this as `[opcode(0x1234)]` or `[opcode(\"ABCD\")]`",
                )),
            );
            None
        }
    }
}

fn duplicate(attribute: &Attribute, file: SourceFileId, sink: &mut dyn DiagnosticSink) {
    sink.emit(
        Diagnostic::error(
            file,
            format!("attribute `{}` given more than once", attribute.name.text),
        )
        .with_code("malformed-attribute")
        .with_label(Label::primary(attribute.span, "second occurrence here")),
    );
}
