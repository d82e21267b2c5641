use std::io::{Read, Seek, SeekFrom};

use crate::atom::header::{BoxHeader, Fourcc, HEADER_LEN};
use crate::error::{IlstError, Result};

/// Records whose body is a plain sequence of child records.
pub const CONTAINERS: [Fourcc; 10] = [
    Fourcc::MOOV,
    Fourcc(*b"trak"),
    Fourcc(*b"mdia"),
    Fourcc(*b"minf"),
    Fourcc(*b"stbl"),
    Fourcc(*b"edts"),
    Fourcc(*b"dinf"),
    Fourcc::UDTA,
    Fourcc::META,
    Fourcc::ILST,
];

/// A record located in a file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Node {
    pub offset: u64,
    pub len: u64,
    pub kind: Fourcc,
    /// 8, or 16 when the record uses a 64-bit size.
    pub header_len: u64,
}

impl Node {
    pub fn end(&self) -> u64 {
        self.offset + self.len
    }

    pub fn children_start(&self) -> u64 {
        self.offset + self.header_len + (self.kind.children_offset() - HEADER_LEN)
    }

    pub fn contains(&self, pos: u64) -> bool {
        self.offset <= pos && pos < self.end()
    }

    /// 32-bit size as stored in the header; records with 64-bit sizes have none.
    pub fn len_u32(&self) -> Result<u32> {
        if self.header_len != HEADER_LEN {
            return Err(IlstError::Format(format!(
                "'{}' at {} uses a 64-bit size",
                self.kind, self.offset
            )));
        }
        Ok(self.len as u32)
    }
}

/// Read the record header at `offset`. The record must end at or before
/// `limit`, which is also the end of records declared with size 0.
pub fn read_node<R: Read + Seek>(r: &mut R, offset: u64, limit: u64) -> Result<Node> {
    r.seek(SeekFrom::Start(offset))?;
    let h = BoxHeader::read_from(&mut *r)?;
    let (len, header_len) = match h.len {
        0 => (limit.saturating_sub(offset), HEADER_LEN),
        1 => {
            let mut b = [0u8; 8];
            r.read_exact(&mut b)?;
            (u64::from_be_bytes(b), HEADER_LEN + 8)
        }
        n => (n as u64, HEADER_LEN),
    };
    if len < header_len {
        return Err(IlstError::Format(format!(
            "'{}' at {} declares length {}",
            h.kind, offset, len
        )));
    }
    match offset.checked_add(len) {
        Some(end) if end <= limit => {}
        _ => {
            return Err(IlstError::Format(format!(
                "'{}' at {} overruns its parent ending at {}",
                h.kind, offset, limit
            )));
        }
    }
    Ok(Node {
        offset,
        len,
        kind: h.kind,
        header_len,
    })
}

/// Sibling records filling `[start, end)`.
pub fn children<R: Read + Seek>(r: &mut R, start: u64, end: u64) -> Result<Vec<Node>> {
    let mut out = Vec::new();
    let mut pos = start;
    while pos < end {
        if end - pos < HEADER_LEN {
            return Err(IlstError::Format(format!(
                "{} stray bytes at {}",
                end - pos,
                pos
            )));
        }
        let n = read_node(r, pos, end)?;
        pos = n.end();
        out.push(n);
    }
    Ok(out)
}

/// The records enclosing the record that starts at `target`, outermost
/// first, followed by that record itself.
pub fn enclosing_chain<R: Read + Seek>(r: &mut R, target: u64) -> Result<Vec<Node>> {
    let file_len = r.seek(SeekFrom::End(0))?;
    let mut level = children(r, 0, file_len)?;
    let mut chain = Vec::new();
    loop {
        if let Some(n) = level.iter().find(|n| n.offset == target) {
            chain.push(*n);
            return Ok(chain);
        }
        let parent = level
            .iter()
            .find(|n| n.contains(target))
            .copied()
            .ok_or_else(|| IlstError::Format(format!("no record starts at {target}")))?;
        chain.push(parent);
        level = children(r, parent.children_start(), parent.end())?;
    }
}

/// Depth-first listing of every record, descending into known containers.
pub fn walk<R: Read + Seek>(r: &mut R) -> Result<Vec<(usize, Node)>> {
    fn go<R: Read + Seek>(
        r: &mut R,
        start: u64,
        end: u64,
        depth: usize,
        out: &mut Vec<(usize, Node)>,
    ) -> Result<()> {
        for n in children(r, start, end)? {
            out.push((depth, n));
            if CONTAINERS.contains(&n.kind) {
                go(r, n.children_start(), n.end(), depth + 1, out)?;
            }
        }
        Ok(())
    }

    let file_len = r.seek(SeekFrom::End(0))?;
    let mut out = Vec::new();
    go(r, 0, file_len, 0, &mut out)?;
    Ok(out)
}
