use std::io::{Read, Seek, SeekFrom};

use tracing::debug;

use crate::atom::header::{Fourcc, HEADER_LEN};
use crate::atom::tree::{Node, children};
use crate::error::Result;
use crate::patch::region::MetaRegion;

/// Path from the top level down to the metadata list.
const LIST_PATH: [Fourcc; 4] = [Fourcc::MOOV, Fourcc::UDTA, Fourcc::META, Fourcc::ILST];

/// Find `moov/udta/meta/ilst` and return its content region. A file without
/// a list yields the zeroed region.
pub fn locate_region<R: Read + Seek>(r: &mut R) -> Result<MetaRegion> {
    let file_len = r.seek(SeekFrom::End(0))?;
    let mut start = 0u64;
    let mut end = file_len;
    let mut found: Option<Node> = None;
    for kind in LIST_PATH {
        let Some(n) = children(r, start, end)?.into_iter().find(|n| n.kind == kind) else {
            debug!(missing = %kind, "no metadata list");
            return Ok(MetaRegion::default());
        };
        start = n.children_start();
        end = n.end();
        found = Some(n);
    }
    let region = match found {
        Some(ilst) => MetaRegion::new(ilst.offset + HEADER_LEN, ilst.len - HEADER_LEN),
        None => MetaRegion::default(),
    };
    debug!(position = region.position, length = region.length, "located metadata list");
    Ok(region)
}
