#![forbid(unsafe_code)]

pub mod error;
pub mod genre;
pub mod tag;

pub mod atom {
    pub mod field;
    pub mod header;
    pub mod tree;
}

pub mod patch {
    pub mod copy;
    pub mod region;
    pub mod writer;
}

pub mod file;
pub mod locate;
pub mod read;
pub mod verify;

// Re-exports: stable API surface
pub use error::{IlstError, Result};
pub use file::{read_tags, write_tags};
pub use locate::locate_region;
pub use patch::region::MetaRegion;
pub use patch::writer::{PatchOptions, PatchReport, Reconciliation, patch};
pub use read::read_tag;
pub use tag::{Field, Tag, TagSource, TrackNumber};
