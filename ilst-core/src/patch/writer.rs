use std::collections::BTreeSet;
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::atom::field::{APPEND_SPACER, encode};
use crate::atom::header::{BoxHeader, Fourcc, HEADER_LEN};
use crate::atom::tree::{Node, enclosing_chain};
use crate::error::{IlstError, Result};
use crate::patch::copy::{copy_exact, copy_to_end, patch_u32, skip, write_zeros};
use crate::patch::region::MetaRegion;
use crate::tag::{Field, TagSource};

/// Smallest trailing room whose 2/3 + 1/3 split still leaves two whole headers.
const MIN_SPLIT_ROOM: i64 = 22;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PatchOptions {
    /// Chunk size for streaming unchanged bytes.
    pub buffer_size: usize,
    /// Re-read the result and check ancestor sizes before it replaces the original.
    pub verify: bool,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            buffer_size: 16 * 1024,
            verify: false,
        }
    }
}

/// How the list's size change was absorbed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reconciliation {
    /// The list kept its size.
    Unneeded,
    /// An existing padding record was resized in place.
    Padding { offset: u64, old_len: u32, new_len: u32 },
    /// The padding record after the outer boundary was split in two; the
    /// first part now sits inside the enclosing records.
    Split {
        offset: u64,
        old_len: u32,
        first: u32,
        second: u32,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PatchReport {
    /// Net change of the list's length.
    pub delta: i64,
    pub replaced: Vec<Field>,
    pub appended: Vec<Field>,
    pub reconciliation: Reconciliation,
    /// Length of the destination after the patch.
    pub bytes_written: u64,
}

impl PatchReport {
    /// Change in padding bytes made to absorb `delta`.
    pub fn padding_change(&self) -> i64 {
        match self.reconciliation {
            Reconciliation::Unneeded => 0,
            Reconciliation::Padding {
                old_len, new_len, ..
            } => new_len as i64 - old_len as i64,
            Reconciliation::Split {
                old_len,
                first,
                second,
                ..
            } => first as i64 + second as i64 - old_len as i64,
        }
    }

    /// Destination length minus source length.
    pub fn file_growth(&self) -> i64 {
        self.delta + self.padding_change()
    }
}

/// Running state of one list rewrite.
#[derive(Default)]
struct ListEdit {
    delta: i64,
    seen: BTreeSet<Field>,
    replaced: Vec<Field>,
    appended: Vec<Field>,
}

/// Patch `tags` into the metadata list described by `region`, streaming
/// `src` into the empty `dst`.
///
/// Only the list, the size fields of the records enclosing it and one
/// padding record change; everything else is copied byte for byte. On error
/// `dst` holds a partial file and must be discarded by the caller.
pub fn patch<R, W, T>(
    src: &mut R,
    dst: &mut W,
    region: MetaRegion,
    tags: &T,
    opts: &PatchOptions,
) -> Result<PatchReport>
where
    R: Read + Seek,
    W: Write + Seek,
    T: TagSource + ?Sized,
{
    if !region.is_usable() {
        return Err(IlstError::UnsupportedRegion);
    }

    let chain = enclosing_chain(src, region.list_offset())?;
    let (list, ancestors) = chain
        .split_last()
        .ok_or_else(|| IlstError::Format("empty record chain".into()))?;
    if ancestors.is_empty() {
        return Err(IlstError::Format(
            "metadata list is not inside a top-level record".into(),
        ));
    }
    if list.len != region.list_len() {
        return Err(IlstError::Format(format!(
            "list record declares {} bytes, region spans {}",
            list.len,
            region.list_len()
        )));
    }
    list.len_u32()?;
    for a in ancestors {
        a.len_u32()?;
    }
    debug!(
        position = region.position,
        length = region.length,
        outer_end = ancestors[0].end(),
        depth = ancestors.len(),
        "patching metadata list"
    );

    let mut buf = vec![0u8; opts.buffer_size.max(HEADER_LEN as usize)];
    src.seek(SeekFrom::Start(0))?;
    dst.seek(SeekFrom::Start(0))?;

    copy_exact(src, dst, region.position, &mut buf)?;
    let mut edit = rewrite_list(src, dst, &region, tags, &mut buf)?;
    append_missing(dst, tags, &mut edit)?;
    debug!(delta = edit.delta, "list rewritten");

    patch_list_size(dst, list, edit.delta)?;
    let reconciliation = reconcile(src, dst, ancestors, region.end(), edit.delta, &mut buf)?;
    debug!(?reconciliation, "sizes reconciled");

    copy_to_end(src, dst, &mut buf)?;
    dst.flush()?;
    let bytes_written = dst.stream_position()?;

    Ok(PatchReport {
        delta: edit.delta,
        replaced: edit.replaced,
        appended: edit.appended,
        reconciliation,
        bytes_written,
    })
}

fn replacement_for<T: TagSource + ?Sized>(
    code: Fourcc,
    tags: &T,
) -> Result<Option<(Field, Vec<u8>)>> {
    if tags.values_of(code).is_empty() {
        return Ok(None);
    }
    let Some(field) = Field::from_code(code) else {
        return Ok(None);
    };
    match tags.replacement(field) {
        Some(value) => Ok(Some((field, encode(field, value)?))),
        None => Ok(None),
    }
}

/// Walk the list item by item, consuming exactly `region.length` source bytes.
fn rewrite_list<R, W, T>(
    src: &mut R,
    dst: &mut W,
    region: &MetaRegion,
    tags: &T,
    buf: &mut [u8],
) -> Result<ListEdit>
where
    R: Read + Seek,
    W: Write,
    T: TagSource + ?Sized,
{
    let mut edit = ListEdit::default();
    let mut consumed = 0u64;
    while consumed < region.length {
        let left = region.length - consumed;
        let at = region.position + consumed;
        if left < HEADER_LEN {
            return Err(IlstError::Format(format!("{left} stray bytes at {at}")));
        }
        let h = BoxHeader::read_from(&mut *src)?;
        let old_len = h.len as u64;
        if old_len < HEADER_LEN || old_len > left {
            return Err(IlstError::Format(format!(
                "item '{}' at {at} declares {old_len} bytes with {left} left in the list",
                h.kind
            )));
        }

        match replacement_for(h.kind, tags)? {
            Some((field, atom)) => {
                skip(src, old_len - HEADER_LEN)?;
                dst.write_all(&atom)?;
                edit.delta += atom.len() as i64 - old_len as i64;
                edit.seen.insert(field);
                edit.replaced.push(field);
                trace!(%field, at, old_len, new_len = atom.len(), "replaced item");
            }
            None => {
                h.write_to(&mut *dst)?;
                copy_exact(src, dst, old_len - HEADER_LEN, buf)?;
                trace!(kind = %h.kind, at, old_len, "kept item");
            }
        }
        consumed += old_len;
    }
    Ok(edit)
}

/// Append every field with a value that the list did not already hold.
/// Each appended item is followed by an empty padding record, so the list
/// grows by the item length plus 8.
fn append_missing<W, T>(dst: &mut W, tags: &T, edit: &mut ListEdit) -> Result<()>
where
    W: Write,
    T: TagSource + ?Sized,
{
    for field in Field::ALL {
        if edit.seen.contains(&field) {
            continue;
        }
        let Some(value) = tags.replacement(field) else {
            continue;
        };
        let atom = encode(field, value)?;
        dst.write_all(&atom)?;
        dst.write_all(&APPEND_SPACER)?;
        edit.delta += (atom.len() + APPEND_SPACER.len()) as i64;
        edit.appended.push(field);
        trace!(%field, len = atom.len(), "appended item");
    }
    Ok(())
}

fn resized(node: &Node, by: i64) -> Result<u32> {
    let new_len = node.len as i64 + by;
    if new_len < HEADER_LEN as i64 {
        return Err(IlstError::Format(format!(
            "'{}' would shrink to {new_len} bytes",
            node.kind
        )));
    }
    u32::try_from(new_len).map_err(|_| {
        IlstError::Format(format!("'{}' would grow past 4 GiB", node.kind))
    })
}

fn patch_list_size<W: Write + Seek>(dst: &mut W, list: &Node, delta: i64) -> Result<()> {
    let new_len = resized(list, delta)?;
    patch_u32(dst, list.offset, new_len)?;
    Ok(())
}

fn grow_ancestors<W: Write + Seek>(dst: &mut W, nodes: &[Node], by: impl Fn(&Node) -> i64) -> Result<()> {
    for n in nodes {
        let new_len = resized(n, by(n))?;
        patch_u32(dst, n.offset, new_len)?;
        trace!(kind = %n.kind, offset = n.offset, new_len, "resized ancestor");
    }
    Ok(())
}

/// Absorb `delta` into padding that follows the list.
///
/// Records after the list are copied until a padding record is met inside
/// the outermost ancestor. That record is resized by `-delta`, and every
/// ancestor already closed on the way there grows by `delta`. When the
/// outer boundary is reached first, the padding record right after it is
/// split instead.
fn reconcile<R, W>(
    src: &mut R,
    dst: &mut W,
    ancestors: &[Node],
    list_end: u64,
    delta: i64,
    buf: &mut [u8],
) -> Result<Reconciliation>
where
    R: Read + Seek,
    W: Write + Seek,
{
    if delta == 0 {
        return Ok(Reconciliation::Unneeded);
    }

    let mut depth = ancestors.len();
    let mut pos = list_end;
    loop {
        while depth > 0 && pos == ancestors[depth - 1].end() {
            depth -= 1;
        }
        if depth == 0 {
            break;
        }
        let parent_end = ancestors[depth - 1].end();
        if parent_end - pos < HEADER_LEN {
            return Err(IlstError::Format(format!(
                "{} stray bytes at {pos}",
                parent_end - pos
            )));
        }
        let h = BoxHeader::read_from(&mut *src)?;
        let len = h.len as u64;
        if len < HEADER_LEN || pos + len > parent_end {
            return Err(IlstError::Format(format!(
                "'{}' at {pos} overruns its parent ending at {parent_end}",
                h.kind
            )));
        }

        if h.kind == Fourcc::FREE {
            let new_len = len as i64 - delta;
            if new_len < HEADER_LEN as i64 {
                return Err(IlstError::PaddingInsufficient {
                    needed: delta,
                    available: len as i64 - HEADER_LEN as i64,
                });
            }
            let new_len = u32::try_from(new_len)
                .map_err(|_| IlstError::Format("padding would grow past 4 GiB".into()))?;
            BoxHeader::new(new_len, Fourcc::FREE).write_to(&mut *dst)?;
            let old_body = len - HEADER_LEN;
            let new_body = new_len as u64 - HEADER_LEN;
            copy_exact(src, dst, old_body.min(new_body), buf)?;
            if old_body > new_body {
                skip(src, old_body - new_body)?;
            } else {
                write_zeros(dst, new_body - old_body)?;
            }
            grow_ancestors(dst, &ancestors[depth..], |_| delta)?;
            return Ok(Reconciliation::Padding {
                offset: pos,
                old_len: h.len,
                new_len,
            });
        }

        h.write_to(&mut *dst)?;
        copy_exact(src, dst, len - HEADER_LEN, buf)?;
        pos += len;
    }

    split_trailing_padding(src, dst, ancestors, pos, delta)
}

/// Split the padding record that follows the outermost ancestor into two
/// records totalling `len - delta`: the first (2/3) becomes the last child
/// of the ancestors ending at the boundary, the second stays outside.
fn split_trailing_padding<R, W>(
    src: &mut R,
    dst: &mut W,
    ancestors: &[Node],
    outer_end: u64,
    delta: i64,
) -> Result<Reconciliation>
where
    R: Read + Seek,
    W: Write + Seek,
{
    let h = match BoxHeader::read_from(&mut *src) {
        Ok(h) => h,
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
            return Err(IlstError::PaddingInsufficient {
                needed: delta,
                available: 0,
            });
        }
        Err(e) => return Err(e.into()),
    };
    if h.kind != Fourcc::FREE {
        return Err(IlstError::PaddingInsufficient {
            needed: delta,
            available: 0,
        });
    }
    let len = h.len as i64;
    if len < HEADER_LEN as i64 {
        return Err(IlstError::Format(format!(
            "padding at {outer_end} declares {len} bytes"
        )));
    }
    let room = len - delta;
    if room < MIN_SPLIT_ROOM {
        return Err(IlstError::PaddingInsufficient {
            needed: delta,
            available: (len - MIN_SPLIT_ROOM).max(0),
        });
    }
    let first = room * 2 / 3;
    let second = room - first;
    let (first, second) = match (u32::try_from(first), u32::try_from(second)) {
        (Ok(a), Ok(b)) => (a, b),
        _ => return Err(IlstError::Format("padding would grow past 4 GiB".into())),
    };
    skip(src, len as u64 - HEADER_LEN)?;

    BoxHeader::new(first, Fourcc::FREE).write_to(&mut *dst)?;
    write_zeros(dst, first as u64 - HEADER_LEN)?;
    BoxHeader::new(second, Fourcc::FREE).write_to(&mut *dst)?;
    write_zeros(dst, second as u64 - HEADER_LEN)?;

    grow_ancestors(dst, ancestors, |n| {
        if n.end() == outer_end {
            delta + first as i64
        } else {
            delta
        }
    })?;
    Ok(Reconciliation::Split {
        offset: outer_end,
        old_len: h.len,
        first,
        second,
    })
}
