//! Strongly typed identifiers used by the catalog.

use std::fmt;

macro_rules! catalog_id {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(pub $inner);

        impl $name {
            /// Raw numeric value as sent over the wire.
            pub fn get(self) -> $inner {
                self.0
            }
        }

        impl From<$inner> for $name {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

catalog_id!(
    /// Catalog id of a movie or TV show. Ids are only unique per media kind.
    MediaId(u64)
);
catalog_id!(
    /// Catalog id of a keyword (tag) usable as a discover facet.
    KeywordId(u64)
);
catalog_id!(
    /// Streaming/watch provider id.
    ProviderId(u32)
);
catalog_id!(
    /// Genre id.
    GenreId(u32)
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_order_by_value() {
        let mut ids = vec![KeywordId(9), KeywordId(2), KeywordId(5)];
        ids.sort();
        assert_eq!(ids, vec![KeywordId(2), KeywordId(5), KeywordId(9)]);
    }

    #[test]
    fn display_is_bare_number() {
        assert_eq!(ProviderId(8).to_string(), "8");
        assert_eq!(MediaId::from(550).get(), 550);
    }
}
