#![allow(dead_code)]

use std::io::Cursor;

use ilst_core::atom::field::{numeric_genre_atom, text_atom, track_atom};
use ilst_core::{Field, MetaRegion, PatchOptions, PatchReport, Result, TagSource, patch};

pub const MDAT_FILL: u8 = 0xAB;

pub fn rec(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut v = (8 + body.len() as u32).to_be_bytes().to_vec();
    v.extend_from_slice(kind);
    v.extend_from_slice(body);
    v
}

pub fn free(len: usize) -> Vec<u8> {
    rec(b"free", &vec![0u8; len - 8])
}

pub fn title(v: &str) -> Vec<u8> {
    text_atom(Field::Title, v).unwrap()
}

pub fn artist(v: &str) -> Vec<u8> {
    text_atom(Field::Artist, v).unwrap()
}

pub fn text_genre(v: &str) -> Vec<u8> {
    text_atom(Field::Genre, v).unwrap()
}

pub fn numeric_genre(v: &str) -> Vec<u8> {
    numeric_genre_atom(v).unwrap()
}

pub fn track(v: &str) -> Vec<u8> {
    track_atom(v.parse().unwrap())
}

/// Shape of a synthetic `ftyp / moov[mvhd udta[meta[hdlr ilst free?] free?]] free? / mdat` file.
#[derive(Default)]
pub struct Layout {
    pub items: Vec<Vec<u8>>,
    /// Padding after the list, inside `meta`.
    pub meta_free: Option<usize>,
    /// Padding after `meta`, inside `udta`.
    pub udta_free: Option<usize>,
    /// Padding after `moov`, at the top level.
    pub top_free: Option<usize>,
}

pub struct Fixture {
    pub bytes: Vec<u8>,
    pub region: MetaRegion,
}

impl Layout {
    pub fn build(&self) -> Fixture {
        let ftyp = rec(b"ftyp", b"M4A \0\0\0\0isomM4A ");
        let mvhd = rec(b"mvhd", &[0u8; 20]);
        let hdlr = rec(b"hdlr", &[0u8; 25]);

        let list_body: Vec<u8> = self.items.concat();
        let mut meta_body = vec![0u8; 4];
        meta_body.extend(&hdlr);
        meta_body.extend(rec(b"ilst", &list_body));
        if let Some(n) = self.meta_free {
            meta_body.extend(free(n));
        }
        let mut udta_body = rec(b"meta", &meta_body);
        if let Some(n) = self.udta_free {
            udta_body.extend(free(n));
        }
        let mut moov_body = mvhd.clone();
        moov_body.extend(rec(b"udta", &udta_body));

        let mut bytes = ftyp.clone();
        bytes.extend(rec(b"moov", &moov_body));
        if let Some(n) = self.top_free {
            bytes.extend(free(n));
        }
        bytes.extend(rec(b"mdat", &[MDAT_FILL; 64]));

        let position = (ftyp.len() + 8 + mvhd.len() + 8 + 12 + hdlr.len() + 8) as u64;
        Fixture {
            bytes,
            region: MetaRegion::new(position, list_body.len() as u64),
        }
    }
}

pub fn run<T: TagSource>(fx: &Fixture, tags: &T) -> Result<(Vec<u8>, PatchReport)> {
    let mut src = Cursor::new(fx.bytes.clone());
    let mut dst = Cursor::new(Vec::new());
    let report = patch(&mut src, &mut dst, fx.region, tags, &PatchOptions::default())?;
    Ok((dst.into_inner(), report))
}

pub fn u32_at(b: &[u8], off: usize) -> u32 {
    u32::from_be_bytes([b[off], b[off + 1], b[off + 2], b[off + 3]])
}

pub fn find(hay: &[u8], needle: &[u8]) -> Option<usize> {
    hay.windows(needle.len()).position(|w| w == needle)
}
