use std::fmt;
use std::io::{Read, Write};

pub const HEADER_LEN: u64 = 8;

/// Lead byte of the built-in iTunes item codes (`©nam`, `©ART`, ...).
pub const BUILTIN_MARK: u8 = 0xA9;

/// Four-byte record type code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fourcc(pub [u8; 4]);

impl Fourcc {
    pub const MOOV: Fourcc = Fourcc(*b"moov");
    pub const UDTA: Fourcc = Fourcc(*b"udta");
    pub const META: Fourcc = Fourcc(*b"meta");
    pub const ILST: Fourcc = Fourcc(*b"ilst");
    pub const FREE: Fourcc = Fourcc(*b"free");
    pub const DATA: Fourcc = Fourcc(*b"data");

    /// Built-in item code: the 0xA9 mark followed by three ASCII characters.
    pub const fn builtin(code: &[u8; 3]) -> Self {
        Fourcc([BUILTIN_MARK, code[0], code[1], code[2]])
    }

    /// Byte offset of the first child inside a container of this type.
    /// `meta` is a full box and carries 4 bytes of version/flags first.
    pub fn children_offset(self) -> u64 {
        if self == Fourcc::META {
            HEADER_LEN + 4
        } else {
            HEADER_LEN
        }
    }
}

impl fmt::Display for Fourcc {
    // Latin-1: every byte maps to one char, so decoding never fails.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{}", b as char)?;
        }
        Ok(())
    }
}

/// One record's framing: 32-bit big-endian total length (header included)
/// followed by the type code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoxHeader {
    pub len: u32,
    pub kind: Fourcc,
}

impl BoxHeader {
    pub fn new(len: u32, kind: Fourcc) -> Self {
        Self { len, kind }
    }

    pub fn parse(b: &[u8; 8]) -> Self {
        Self {
            len: u32::from_be_bytes([b[0], b[1], b[2], b[3]]),
            kind: Fourcc([b[4], b[5], b[6], b[7]]),
        }
    }

    pub fn to_bytes(self) -> [u8; 8] {
        let mut b = [0u8; 8];
        b[..4].copy_from_slice(&self.len.to_be_bytes());
        b[4..].copy_from_slice(&self.kind.0);
        b
    }

    pub fn read_from(mut r: impl Read) -> std::io::Result<Self> {
        let mut b = [0u8; 8];
        r.read_exact(&mut b)?;
        Ok(Self::parse(&b))
    }

    pub fn write_to(self, mut w: impl Write) -> std::io::Result<()> {
        w.write_all(&self.to_bytes())
    }

    /// Body length, or `None` when the declared length cannot even hold the header.
    pub fn body_len(self) -> Option<u64> {
        (self.len as u64).checked_sub(HEADER_LEN)
    }
}
