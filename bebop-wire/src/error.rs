use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of buffer at offset {offset}")]
    UnexpectedEnd { offset: usize },

    #[error("string at offset {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: usize },

    /// Returned by decoders that hit a discriminator their schema version
    /// does not know. The reader has already been moved past the union body
    /// by then, so a caller that can tolerate the gap may continue.
    #[error("unknown union discriminator {discriminator}")]
    UnknownDiscriminator { discriminator: u8 },
}
