use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Seek, SeekFrom};
use std::path::Path;

use tracing::{debug, info};

use crate::error::{IlstError, Result};
use crate::locate::locate_region;
use crate::patch::writer::{PatchOptions, PatchReport, patch};
use crate::read::read_tag;
use crate::tag::{Tag, TagSource};
use crate::verify::check_sizes;

/// Read the metadata list of the file at `path`.
pub fn read_tags(path: &Path) -> Result<Tag> {
    let mut r = BufReader::new(File::open(path)?);
    let region = locate_region(&mut r)?;
    read_tag(&mut r, region)
}

/// Patch `tags` into the file at `path`.
///
/// The new file is built in a temporary file next to the original and
/// renamed over it only when the patch (and the optional verification)
/// succeeded; on failure the original is left untouched.
pub fn write_tags<T: TagSource + ?Sized>(
    path: &Path,
    tags: &T,
    opts: &PatchOptions,
) -> Result<PatchReport> {
    let src_file = File::open(path)?;
    let src_meta = src_file.metadata()?;
    let mut src = BufReader::with_capacity(opts.buffer_size.max(8), src_file);
    let region = locate_region(&mut src)?;
    if !region.is_usable() {
        return Err(IlstError::UnsupportedRegion);
    }

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new().prefix(".ilst").tempfile_in(dir)?;
    debug!(tmp = %tmp.path().display(), "writing patched copy");

    let report = {
        let mut dst = BufWriter::with_capacity(opts.buffer_size.max(8), tmp.as_file_mut());
        let report = patch(&mut src, &mut dst, region, tags, opts)?;
        dst.into_inner().map_err(|e| e.into_error())?;
        report
    };

    if opts.verify {
        let f = tmp.as_file_mut();
        let len = f.seek(SeekFrom::End(0))?;
        let expected = src_meta.len() as i64 + report.file_growth();
        if len as i64 != expected {
            return Err(IlstError::Format(format!(
                "patched file is {len} bytes, expected {expected}"
            )));
        }
        let new_region = locate_region(f)?;
        check_sizes(f, new_region)?;
    }

    tmp.as_file().sync_all()?;
    fs::set_permissions(tmp.path(), src_meta.permissions())?;
    drop(src);
    tmp.persist(path).map_err(|e| IlstError::Io(e.error))?;
    info!(
        path = %path.display(),
        delta = report.delta,
        replaced = report.replaced.len(),
        appended = report.appended.len(),
        "tags written"
    );
    Ok(report)
}
