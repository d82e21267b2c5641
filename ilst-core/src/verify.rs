use std::io::{Read, Seek};

use tracing::warn;

use crate::atom::tree::{Node, children, enclosing_chain};
use crate::error::{IlstError, Result};
use crate::patch::region::MetaRegion;

/// Check that every record from the top level down to the list at `region`
/// declares exactly its header plus the lengths of its children.
pub fn check_sizes<R: Read + Seek>(r: &mut R, region: MetaRegion) -> Result<Vec<Node>> {
    if !region.is_usable() {
        return Err(IlstError::UnsupportedRegion);
    }
    let chain = enclosing_chain(r, region.list_offset()).inspect_err(|e| {
        warn!(error = %e, "top-level records do not tile the file");
    })?;
    for n in &chain {
        children(r, n.children_start(), n.end()).inspect_err(|e| {
            warn!(kind = %n.kind, offset = n.offset, error = %e, "size mismatch");
        })?;
    }
    Ok(chain)
}
