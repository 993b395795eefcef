use std::cmp::Ordering;

use crate::ids::KeywordId;

/// A catalog keyword. Keywords double as discover facets once activated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Keyword {
    pub id: KeywordId,
    pub name: String,
}

impl Keyword {
    pub fn new(id: impl Into<KeywordId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Case-insensitive display ordering, ties broken by id so the order is
    /// total.
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        self.name
            .to_lowercase()
            .cmp(&other.name.to_lowercase())
            .then(self.id.cmp(&other.id))
    }
}

/// Sort keywords for display (case-insensitive by name).
pub fn sort_by_name(keywords: &mut [Keyword]) {
    keywords.sort_by(Keyword::display_cmp);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_ignoring_case() {
        let mut keywords = vec![
            Keyword::new(1, "heist"),
            Keyword::new(2, "Alien"),
            Keyword::new(3, "based on novel"),
        ];
        sort_by_name(&mut keywords);
        let names: Vec<_> =
            keywords.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, ["Alien", "based on novel", "heist"]);
    }
}
