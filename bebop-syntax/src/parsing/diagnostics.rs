pub mod labels {
    use bebop_foundation::{errors::Label, source::Span};

    pub fn invalid_identifier(span: Span, input: &str) -> Label {
        Label::primary(
            span,
            format!("`{}` is not a valid identifier", span.get_input(input)),
        )
    }
}

pub mod notes {
    use indoc::indoc;

    pub const IDENTIFIER_CHARS: &str = "note: identifiers are made up of characters a-z, A-Z, 0-9 and _, and must not start with a digit";
    pub const MESSAGE_FIELD_SYNTAX: &str = indoc! {"
        note: message fields are written as `index -> type name;`,
              where index is an integer between 1 and 255
    "};
    pub const UNION_BRANCH_SYNTAX: &str = indoc! {"
        note: union branches are written as `discriminator -> struct Name { .. }`
              or `discriminator -> message Name { .. }`
    "};
    pub const MAP_TYPE_SYNTAX: &str = "note: map types are written as `map[keyType, valueType]`";
}
