//! Literal evaluation. Every literal in a schema has a target type decided by
//! its context (a constant's declared type, an enum's backing scalar, a
//! message field index); this module folds the literal into that type and
//! range-checks it.

use bebop_foundation::{
    errors::{Diagnostic, DiagnosticSink, Label},
    source::{SourceFileId, Spanned},
};
use bebop_syntax::ast::{FloatLit, Lit, Radix};
use uuid::Uuid;

use crate::schema::{BaseType, ConstValue};

/// Evaluates a literal that must be an integer, of any width. The caller is
/// responsible for range-checking the result against its target.
pub(crate) fn eval_integer(
    lit: &Lit,
    file: SourceFileId,
    sink: &mut dyn DiagnosticSink,
) -> Option<i128> {
    match lit {
        Lit::Int {
            digits,
            negative,
            radix,
            span,
        } => {
            let radix = match radix {
                Radix::Decimal => 10,
                Radix::Hex => 16,
            };
            match i128::from_str_radix(digits, radix) {
                Ok(magnitude) => Some(if *negative { -magnitude } else { magnitude }),
                // i128 holds far more than any encodable integer; overflowing
                // it is a malformed literal, not a range error.
                Err(_) => {
                    sink.emit(
                        Diagnostic::error(file, "integer literal is too large")
                            .with_code("malformed-literal")
                            .with_label(Label::primary(*span, "this does not fit any integer type")),
                    );
                    None
                }
            }
        }
        _ => {
            sink.emit(
                Diagnostic::error(
                    file,
                    format!("integer literal expected, but found {}", lit.describe()),
                )
                .with_code("malformed-literal")
                .with_label(Label::primary(lit.span(), "integer literal expected here")),
            );
            None
        }
    }
}

/// Evaluates a literal in the given base type, as used by `const`
/// definitions. Emits a diagnostic and returns `None` when the literal is not
/// assignment-compatible.
pub(crate) fn eval_literal(
    lit: &Lit,
    ty: BaseType,
    file: SourceFileId,
    sink: &mut dyn DiagnosticSink,
) -> Option<ConstValue> {
    match ty {
        BaseType::Bool => match lit {
            Lit::Bool { value, .. } => Some(ConstValue::Bool(*value)),
            _ => mismatch(lit, ty, file, sink),
        },
        _ if ty.is_integer() => {
            let Lit::Int { .. } = lit else {
                return mismatch(lit, ty, file, sink);
            };
            let value = eval_integer(lit, file, sink)?;
            let (min, max) = ty.integer_range().expect("integer type must have a range");
            if value < min || value > max {
                let detail = if value < 0 && min == 0 {
                    format!("`{}` is unsigned and cannot hold a negative value", ty.name())
                } else {
                    format!("`{}` can only hold values from {min} to {max}", ty.name())
                };
                sink.emit(
                    Diagnostic::error(file, format!("value {value} is out of range"))
                        .with_code("const-out-of-range")
                        .with_label(Label::primary(lit.span(), detail)),
                );
                return None;
            }
            Some(ConstValue::Integer(value))
        }
        _ if ty.is_float() => match lit {
            Lit::Float { value, .. } => Some(ConstValue::Float(match value {
                FloatLit::Digits(digits) => match digits.parse::<f64>() {
                    Ok(value) => value,
                    Err(_) => {
                        sink.emit(
                            Diagnostic::error(file, "malformed float literal")
                                .with_code("malformed-literal")
                                .with_label(Label::primary(lit.span(), "cannot parse this float")),
                        );
                        return None;
                    }
                },
                FloatLit::Inf => f64::INFINITY,
                FloatLit::NegInf => f64::NEG_INFINITY,
                FloatLit::Nan => f64::NAN,
            })),
            // Integer literals promote to float.
            Lit::Int { .. } => eval_integer(lit, file, sink).map(|value| ConstValue::Float(value as f64)),
            _ => mismatch(lit, ty, file, sink),
        },
        BaseType::String => match lit {
            Lit::String { value, .. } => Some(ConstValue::String(value.clone())),
            _ => mismatch(lit, ty, file, sink),
        },
        BaseType::Guid => match lit {
            Lit::String { value, .. } => {
                // Only the 36-character hyphenated form is accepted; `uuid`
                // alone would also admit braced and compact spellings.
                let parsed = (value.len() == 36)
                    .then(|| Uuid::parse_str(value).ok())
                    .flatten();
                match parsed {
                    Some(guid) => Some(ConstValue::Guid(guid)),
                    None => {
                        sink.emit(
                            Diagnostic::error(file, format!("`{value}` is not a valid GUID"))
                                .with_code("invalid-guid")
                                .with_label(Label::primary(
                                    lit.span(),
                                    "canonical form is xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx",
                                )),
                        );
                        None
                    }
                }
            }
            _ => mismatch(lit, ty, file, sink),
        },
        BaseType::Date => {
            sink.emit(
                Diagnostic::error(file, "`date` cannot be the type of a constant")
                    .with_code("const-type-mismatch")
                    .with_label(Label::primary(lit.span(), "dates have no literal form")),
            );
            None
        }
        _ => unreachable!("all base types are handled above"),
    }
}

fn mismatch(
    lit: &Lit,
    ty: BaseType,
    file: SourceFileId,
    sink: &mut dyn DiagnosticSink,
) -> Option<ConstValue> {
    sink.emit(
        Diagnostic::error(
            file,
            format!(
                "a {} cannot initialize a constant of type `{}`",
                lit.describe(),
                ty.name()
            ),
        )
        .with_code("const-type-mismatch")
        .with_label(Label::primary(lit.span(), "the literal is written here")),
    );
    None
}
