use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::ModelError;

/// The two kinds of title the catalog serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MediaKind {
    /// Feature films
    #[default]
    Movie,
    /// Television series
    Tv,
}

impl MediaKind {
    /// Both kinds, movies first.
    pub const ALL: [MediaKind; 2] = [MediaKind::Movie, MediaKind::Tv];

    /// Path segment / query value used by the catalog API.
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Tv => "tv",
        }
    }

    /// Human readable plural label.
    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Movie => "movies",
            MediaKind::Tv => "TV shows",
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" | "movies" => Ok(MediaKind::Movie),
            "tv" | "show" | "shows" | "series" => Ok(MediaKind::Tv),
            _ => Err(ModelError::UnknownMediaKind(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Movie".parse::<MediaKind>(), Ok(MediaKind::Movie));
        assert_eq!(" TV ".parse::<MediaKind>(), Ok(MediaKind::Tv));
        assert!(matches!(
            "person".parse::<MediaKind>(),
            Err(ModelError::UnknownMediaKind(_))
        ));
    }
}
