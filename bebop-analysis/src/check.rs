//! Structural invariants: message field indices, union discriminators, and
//! global opcode uniqueness.

use std::collections::HashMap;

use bebop_foundation::{
    errors::{Diagnostic, DiagnosticSink, Label},
    source::{SourceFileId, Span},
};

use crate::environment::Environment;

/// Validates one message field index against the indices seen so far.
/// Returns the index only if it obeys all the rules; the caller drops the
/// field otherwise.
pub(crate) fn check_message_index(
    previous: Option<u8>,
    value: i128,
    span: Span,
    file: SourceFileId,
    sink: &mut dyn DiagnosticSink,
) -> Option<u8> {
    if value == 0 {
        sink.emit(
            Diagnostic::error(file, "message field index 0 is reserved")
                .with_code("reserved-field-index-zero")
                .with_label(Label::primary(span, "0 marks the end of a message on the wire")),
        );
        return None;
    }
    if !(1..=255).contains(&value) {
        sink.emit(
            Diagnostic::error(file, format!("message field index {value} is out of range"))
                .with_code("field-index-out-of-range")
                .with_label(Label::primary(span, "indices must be between 1 and 255")),
        );
        return None;
    }
    let value = value as u8;
    match previous {
        Some(previous) if value == previous => {
            sink.emit(
                Diagnostic::error(file, format!("duplicate message field index {value}"))
                    .with_code("duplicate-field-index")
                    .with_label(Label::primary(span, "this index was already used")),
            );
            None
        }
        Some(previous) if value < previous => {
            sink.emit(
                Diagnostic::error(
                    file,
                    format!("message field index {value} is out of order"),
                )
                .with_code("field-index-not-increasing")
                .with_label(Label::primary(
                    span,
                    format!("indices must increase; the previous field used {previous}"),
                )),
            );
            None
        }
        _ => Some(value),
    }
}

/// Same shape as [`check_message_index`], for union discriminators. The rules
/// match, but the wording and the diagnostic code differ.
pub(crate) fn check_union_discriminator(
    previous: Option<u8>,
    value: i128,
    span: Span,
    file: SourceFileId,
    sink: &mut dyn DiagnosticSink,
) -> Option<u8> {
    if !(1..=255).contains(&value) {
        sink.emit(
            Diagnostic::error(
                file,
                format!("union discriminator {value} is out of range"),
            )
            .with_code("invalid-union-branch")
            .with_label(Label::primary(span, "discriminators must be between 1 and 255")),
        );
        return None;
    }
    let value = value as u8;
    match previous {
        Some(previous) if value == previous => {
            sink.emit(
                Diagnostic::error(file, format!("duplicate union discriminator {value}"))
                    .with_code("invalid-union-branch")
                    .with_label(Label::primary(span, "this discriminator was already used")),
            );
            None
        }
        Some(previous) if value < previous => {
            sink.emit(
                Diagnostic::error(
                    file,
                    format!("union discriminator {value} is out of order"),
                )
                .with_code("invalid-union-branch")
                .with_label(Label::primary(
                    span,
                    format!("discriminators must increase; the previous branch used {previous}"),
                )),
            );
            None
        }
        _ => Some(value),
    }
}

/// Opcodes identify packet types to hosts, so they are unique across the
/// whole schema, not per file.
pub(crate) fn check_opcodes(env: &mut Environment) {
    let mut seen: HashMap<u32, (SourceFileId, Span)> = HashMap::new();
    let mut duplicates = vec![];
    for (_, def) in env.defs() {
        let Some(opcode) = def.opcode() else { continue };
        let header = def.header();
        match seen.get(&opcode.value) {
            Some(&(first_file, first_span)) => {
                duplicates.push(
                    Diagnostic::error(
                        header.file,
                        format!("opcode {:#010x} is used more than once", opcode.value),
                    )
                    .with_code("duplicate-opcode")
                    .with_label(Label::primary(opcode.span, "second use here"))
                    .with_label(
                        Label::secondary(first_span, "first use here").in_file(first_file),
                    ),
                );
            }
            None => {
                seen.insert(opcode.value, (header.file, opcode.span));
            }
        }
    }
    for diagnostic in duplicates {
        env.emit(diagnostic);
    }
}
