//! The binary wire format, as a pair of runtime helpers.
//!
//! This crate is the authoritative, executable form of the encoding contract
//! that every code generator must honor. Generated encoders drive a
//! [`Writer`]; generated decoders drive a [`Reader`]. The layer is
//! deliberately thin: framing decisions (field order, indices,
//! discriminators) belong to the generated code, and the helpers only know
//! how individual values become bytes.
//!
//! The rules, in brief:
//!
//! - All integers are little-endian two's-complement; floats are IEEE 754.
//! - `bool` is one byte, zero or one on encode; any nonzero byte decodes to
//!   `true`.
//! - `string` is a `u32` byte length followed by that many UTF-8 bytes.
//!   Arrays and maps use the same four-byte count followed by their
//!   elements; `byte[]` is written as one raw run.
//! - An optional value is a one-byte presence tag, `1` followed by the value
//!   or `0` alone.
//! - A `guid` is 16 bytes in mixed-endian layout: the three leading groups
//!   little-endian, the trailing eight bytes as written.
//! - A `date` is a signed 64-bit count of 100-nanosecond ticks since the
//!   runtime's fixed epoch.
//! - Messages and unions start with a `u32` byte length of the body (the
//!   length itself excluded), which is what lets readers skip content they
//!   do not understand. Message bodies are `index, value` pairs closed by a
//!   zero byte; union bodies are a one-byte discriminator followed by the
//!   chosen branch.
//!
//! Structs have no framing at all: their fields are concatenated in source
//! order, which is also why they are not extensible.

mod error;
mod read;
mod write;

pub use error::*;
pub use read::*;
pub use write::*;

/// A moment in time: a signed count of 100-nanosecond ticks since the fixed
/// epoch shared by all generator runtimes. Kept opaque so the compiler never
/// depends on a calendar library; hosts convert at the edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date {
    ticks: i64,
}

impl Date {
    pub const fn from_ticks(ticks: i64) -> Date {
        Date { ticks }
    }

    pub const fn ticks(self) -> i64 {
        self.ticks
    }
}
