use serde::{Deserialize, Serialize};

use crate::atom::header::HEADER_LEN;

/// Where the existing metadata list's content lives in the source file.
/// A zero in either field means there is no usable list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaRegion {
    /// Offset of the first item, right after the list's own header.
    pub position: u64,
    /// Byte length of the list content.
    pub length: u64,
}

impl MetaRegion {
    pub fn new(position: u64, length: u64) -> Self {
        Self { position, length }
    }

    pub fn is_usable(&self) -> bool {
        self.position >= HEADER_LEN && self.length != 0
    }

    /// Offset of the list record's header.
    pub fn list_offset(&self) -> u64 {
        self.position - HEADER_LEN
    }

    /// Offset of the 4-byte size field of the list record.
    pub fn parent_size_field_offset(&self) -> u64 {
        self.list_offset()
    }

    /// Declared length the list record must carry for this region.
    pub fn list_len(&self) -> u64 {
        self.length + HEADER_LEN
    }

    pub fn end(&self) -> u64 {
        self.position + self.length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_relative_to_list_header() {
        let r = MetaRegion::new(100, 40);
        assert_eq!(r.parent_size_field_offset(), 92);
        assert_eq!(r.list_len(), 48);
        assert_eq!(r.end(), 140);
    }

    #[test]
    fn zeroed_region_is_unusable() {
        assert!(!MetaRegion::default().is_usable());
        assert!(!MetaRegion::new(100, 0).is_usable());
        assert!(!MetaRegion::new(0, 40).is_usable());
        assert!(MetaRegion::new(8, 1).is_usable());
    }
}
