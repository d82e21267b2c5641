//! Encoders for single items of the metadata list.
//!
//! Every item is `header + data record`, where the data record is
//! `len | "data" | 3 zero bytes | kind | 4 zero bytes | payload`.

use crate::atom::header::{BoxHeader, Fourcc, HEADER_LEN};
use crate::error::{IlstError, Result};
use crate::genre::genre_id;
use crate::tag::{Field, GNRE, TrackNumber};

/// Item header + data header + kind/locale words.
pub const TEXT_OVERHEAD: usize = 24;
pub const TRACK_ATOM_LEN: usize = 32;
pub const GENRE_ATOM_LEN: usize = 26;

/// Data kind byte for UTF-8 text; binary payloads use 0.
pub const KIND_UTF8: u8 = 1;
pub const KIND_IMPLICIT: u8 = 0;

/// Empty padding record written after every appended item.
pub const APPEND_SPACER: [u8; 8] = [0, 0, 0, 8, b'f', b'r', b'e', b'e'];

fn put_data_header(b: &mut [u8], kind: u8) {
    let data_len = (b.len() - HEADER_LEN as usize) as u32;
    b[8..12].copy_from_slice(&data_len.to_be_bytes());
    b[12..16].copy_from_slice(&Fourcc::DATA.0);
    for x in &mut b[16..24] {
        *x = 0;
    }
    b[19] = kind;
}

fn put_item_header(b: &mut [u8], code: Fourcc) {
    let h = BoxHeader::new(b.len() as u32, code);
    b[..8].copy_from_slice(&h.to_bytes());
}

/// UTF-8 text item; total length is `24 + value.len()`.
pub fn text_atom(field: Field, value: &str) -> Result<Vec<u8>> {
    let total = TEXT_OVERHEAD + value.len();
    if u32::try_from(total).is_err() {
        return Err(IlstError::Unrepresentable {
            field,
            value: value.chars().take(32).collect(),
        });
    }
    let mut b = vec![0u8; total];
    put_item_header(&mut b, field.code());
    put_data_header(&mut b, KIND_UTF8);
    b[TEXT_OVERHEAD..].copy_from_slice(value.as_bytes());
    Ok(b)
}

/// `trkn` item: 4-byte big-endian number, 16-bit total, two zero bytes.
pub fn track_atom(track: TrackNumber) -> Vec<u8> {
    let mut b = vec![0u8; TRACK_ATOM_LEN];
    put_item_header(&mut b, Field::Track.code());
    put_data_header(&mut b, KIND_IMPLICIT);
    b[24..28].copy_from_slice(&track.number.to_be_bytes());
    b[28..30].copy_from_slice(&track.total.unwrap_or(0).to_be_bytes());
    b
}

/// `gnre` item holding the table index, or `None` when the name is not in the table.
pub fn numeric_genre_atom(name: &str) -> Option<Vec<u8>> {
    let id = genre_id(name)?;
    let mut b = vec![0u8; GENRE_ATOM_LEN];
    put_item_header(&mut b, GNRE);
    put_data_header(&mut b, KIND_IMPLICIT);
    b[GENRE_ATOM_LEN - 1] = id;
    Some(b)
}

/// Numeric genre when the name is canonical, free text otherwise.
pub fn genre_atom(name: &str) -> Result<Vec<u8>> {
    match numeric_genre_atom(name) {
        Some(b) => Ok(b),
        None => text_atom(Field::Genre, name),
    }
}

/// Encode one item for `field`.
pub fn encode(field: Field, value: &str) -> Result<Vec<u8>> {
    match field {
        Field::Track => Ok(track_atom(value.parse()?)),
        Field::Genre => genre_atom(value),
        _ => text_atom(field, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_item_layout() {
        let b = text_atom(Field::Title, "Hello").unwrap();
        assert_eq!(b.len(), 29);
        assert_eq!(&b[0..8], &[0, 0, 0, 29, 0xA9, b'n', b'a', b'm']);
        assert_eq!(&b[8..16], &[0, 0, 0, 21, b'd', b'a', b't', b'a']);
        assert_eq!(&b[16..24], &[0, 0, 0, 1, 0, 0, 0, 0]);
        assert_eq!(&b[24..], b"Hello");
    }

    #[test]
    fn text_length_counts_bytes_not_chars() {
        let b = text_atom(Field::Artist, "Björk").unwrap();
        assert_eq!(b.len(), 24 + "Björk".len());
        assert_eq!(b.len(), 30);
    }

    #[test]
    fn track_item_layout() {
        let b = track_atom("5/12".parse().unwrap());
        assert_eq!(b.len(), 32);
        assert_eq!(&b[0..8], &[0, 0, 0, 32, b't', b'r', b'k', b'n']);
        assert_eq!(&b[8..16], &[0, 0, 0, 0x18, b'd', b'a', b't', b'a']);
        assert_eq!(&b[16..24], &[0; 8]);
        assert_eq!(&b[24..32], &[0, 0, 0, 5, 0, 12, 0, 0]);
    }

    #[test]
    fn numeric_genre_layout() {
        let b = numeric_genre_atom("rock").unwrap();
        assert_eq!(b.len(), 26);
        assert_eq!(&b[0..8], &[0, 0, 0, 26, b'g', b'n', b'r', b'e']);
        assert_eq!(&b[8..16], &[0, 0, 0, 0x12, b'd', b'a', b't', b'a']);
        assert_eq!(b[24], 0);
        assert_eq!(b[25], 17);
    }

    #[test]
    fn unknown_genre_falls_back_to_text() {
        assert!(numeric_genre_atom("Not-A-Genre-Xyz").is_none());
        let b = genre_atom("Not-A-Genre-Xyz").unwrap();
        assert_eq!(&b[4..8], &[0xA9, b'g', b'e', b'n']);
        assert_eq!(&b[24..], b"Not-A-Genre-Xyz");
    }

    #[test]
    fn non_numeric_track_is_rejected() {
        let err = encode(Field::Track, "four").unwrap_err();
        assert!(matches!(err, IlstError::Unrepresentable { .. }));
    }
}
