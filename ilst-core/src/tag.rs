use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::atom::header::Fourcc;
use crate::error::{IlstError, Result};

/// Legacy numeric genre item (`gnre`).
pub const GNRE: Fourcc = Fourcc(*b"gnre");
/// Track number item (`trkn`).
pub const TRKN: Fourcc = Fourcc(*b"trkn");

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Album,
    Artist,
    Year,
    Comment,
    Track,
    Genre,
}

impl Field {
    /// Order in which missing fields are appended to the list.
    pub const ALL: [Field; 7] = [
        Field::Title,
        Field::Album,
        Field::Artist,
        Field::Year,
        Field::Comment,
        Field::Track,
        Field::Genre,
    ];

    /// Item code written for this field. Genre maps to the free-text code;
    /// the numeric `gnre` form is chosen by the encoder.
    pub fn code(self) -> Fourcc {
        match self {
            Field::Title => Fourcc::builtin(b"nam"),
            Field::Album => Fourcc::builtin(b"alb"),
            Field::Artist => Fourcc::builtin(b"ART"),
            Field::Year => Fourcc::builtin(b"day"),
            Field::Comment => Fourcc::builtin(b"cmt"),
            Field::Track => TRKN,
            Field::Genre => Fourcc::builtin(b"gen"),
        }
    }

    pub fn from_code(code: Fourcc) -> Option<Field> {
        if code == GNRE {
            return Some(Field::Genre);
        }
        Field::ALL.into_iter().find(|f| f.code() == code)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Field::Title => "title",
            Field::Album => "album",
            Field::Artist => "artist",
            Field::Year => "year",
            Field::Comment => "comment",
            Field::Track => "track",
            Field::Genre => "genre",
        };
        f.write_str(s)
    }
}

/// Track number with an optional album total, written as `"3"` or `"3/12"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackNumber {
    pub number: u32,
    pub total: Option<u16>,
}

impl FromStr for TrackNumber {
    type Err = IlstError;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || IlstError::Unrepresentable {
            field: Field::Track,
            value: s.to_string(),
        };
        let (num, total) = match s.split_once('/') {
            Some((n, t)) => (n, Some(t)),
            None => (s, None),
        };
        let number = num.trim().parse::<u32>().map_err(|_| bad())?;
        let total = total
            .map(|t| t.trim().parse::<u16>().map_err(|_| bad()))
            .transpose()?;
        Ok(Self { number, total })
    }
}

impl fmt::Display for TrackNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.total {
            Some(t) => write!(f, "{}/{}", self.number, t),
            None => write!(f, "{}", self.number),
        }
    }
}

/// Read-only view of the values a patch should write.
pub trait TagSource {
    /// First value stored for `field`, if any.
    fn first(&self, field: Field) -> Option<&str>;

    /// All values stored under an item code; empty when the code is unknown.
    fn values_of(&self, code: Fourcc) -> Vec<&str>;

    /// First value of `field` when it is present and non-empty.
    fn replacement(&self, field: Field) -> Option<&str> {
        self.first(field).filter(|v| !v.is_empty())
    }
}

/// Ordered multi-value field storage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag {
    fields: BTreeMap<Field, Vec<String>>,
}

impl Tag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every value of `field` with `value`.
    pub fn set(&mut self, field: Field, value: impl Into<String>) -> &mut Self {
        self.fields.insert(field, vec![value.into()]);
        self
    }

    pub fn add(&mut self, field: Field, value: impl Into<String>) -> &mut Self {
        self.fields.entry(field).or_default().push(value.into());
        self
    }

    pub fn get(&self, field: Field) -> &[String] {
        self.fields.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.fields.values().all(Vec::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> + '_ {
        self.fields
            .iter()
            .flat_map(|(f, vs)| vs.iter().map(move |v| (*f, v.as_str())))
    }
}

impl TagSource for Tag {
    fn first(&self, field: Field) -> Option<&str> {
        self.get(field).first().map(String::as_str)
    }

    fn values_of(&self, code: Fourcc) -> Vec<&str> {
        match Field::from_code(code) {
            Some(f) => self.get(f).iter().map(String::as_str).collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_field() {
        for f in Field::ALL {
            assert_eq!(Field::from_code(f.code()), Some(f));
        }
        assert_eq!(Field::from_code(GNRE), Some(Field::Genre));
        assert_eq!(Field::from_code(Fourcc(*b"covr")), None);
    }

    #[test]
    fn track_number_parses_pair() {
        let t: TrackNumber = "3/12".parse().unwrap();
        assert_eq!(t, TrackNumber { number: 3, total: Some(12) });
        assert_eq!(t.to_string(), "3/12");
        let t: TrackNumber = " 7 ".parse().unwrap();
        assert_eq!(t.total, None);
    }

    #[test]
    fn track_number_rejects_text() {
        let err = "seven".parse::<TrackNumber>().unwrap_err();
        assert!(matches!(err, IlstError::Unrepresentable { field: Field::Track, .. }));
        assert!("-1".parse::<TrackNumber>().is_err());
        assert!("1/70000".parse::<TrackNumber>().is_err());
    }

    #[test]
    fn empty_value_is_not_a_replacement() {
        let mut tag = Tag::new();
        tag.set(Field::Title, "").add(Field::Artist, "A").add(Field::Artist, "B");
        assert_eq!(tag.first(Field::Title), Some(""));
        assert_eq!(tag.replacement(Field::Title), None);
        assert_eq!(tag.values_of(Field::Artist.code()), vec!["A", "B"]);
        assert_eq!(tag.values_of(GNRE), Vec::<&str>::new());
    }
}
