use std::io::{Read, Seek, SeekFrom};

use crate::atom::header::{BoxHeader, Fourcc, HEADER_LEN};
use crate::atom::tree::children;
use crate::error::{IlstError, Result};
use crate::genre::genre_name;
use crate::patch::region::MetaRegion;
use crate::tag::{Field, GNRE, TRKN, Tag, TrackNumber};

/// Decoded `data` record of one item.
struct DataValue<'a> {
    payload: &'a [u8],
}

fn data_of(body: &[u8]) -> Option<DataValue<'_>> {
    if body.len() < 16 {
        return None;
    }
    let mut hb = [0u8; 8];
    hb.copy_from_slice(&body[..8]);
    let h = BoxHeader::parse(&hb);
    if h.kind != Fourcc::DATA || (h.len as usize) < 16 || h.len as usize > body.len() {
        return None;
    }
    Some(DataValue {
        payload: &body[16..h.len as usize],
    })
}

fn decode(code: Fourcc, v: &DataValue<'_>) -> Option<String> {
    if code == GNRE {
        let id = match v.payload {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [b] => *b as u16,
            _ => return None,
        };
        return u8::try_from(id).ok().and_then(genre_name).map(str::to_string);
    }
    if code == TRKN {
        if v.payload.len() < 4 {
            return None;
        }
        let number = u32::from_be_bytes([v.payload[0], v.payload[1], v.payload[2], v.payload[3]]);
        let total = match v.payload.get(4..6) {
            Some([hi, lo]) => Some(u16::from_be_bytes([*hi, *lo])).filter(|t| *t != 0),
            _ => None,
        };
        return Some(TrackNumber { number, total }.to_string());
    }
    Some(String::from_utf8_lossy(v.payload).into_owned())
}

/// Read the known fields of the list at `region` back into a `Tag`.
pub fn read_tag<R: Read + Seek>(r: &mut R, region: MetaRegion) -> Result<Tag> {
    if !region.is_usable() {
        return Err(IlstError::UnsupportedRegion);
    }
    let mut tag = Tag::new();
    for item in children(r, region.position, region.end())? {
        let Some(field) = Field::from_code(item.kind) else {
            continue;
        };
        let mut body = vec![0u8; (item.len - HEADER_LEN) as usize];
        r.seek(SeekFrom::Start(item.offset + HEADER_LEN))?;
        r.read_exact(&mut body)?;
        if let Some(value) = data_of(&body).and_then(|v| decode(item.kind, &v)) {
            tag.add(field, value);
        }
    }
    Ok(tag)
}
