use serde::{Serialize, Serializer};
use std::fmt;

/// Genre labels the fallback can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Genre {
    Pop,
    Rock,
    Jazz,
    HipHop,
    Classical,
    Electronic,
}

/// Fixed category order. Fallback indices point into this list, so the order
/// is part of the wire contract with web clients.
pub const CATEGORIES: [Genre; 6] = [
    Genre::Pop,
    Genre::Rock,
    Genre::Jazz,
    Genre::HipHop,
    Genre::Classical,
    Genre::Electronic,
];

pub const FALLBACK_SOURCE: &str = "fallback";

impl Genre {
    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Pop => "Pop",
            Genre::Rock => "Rock",
            Genre::Jazz => "Jazz",
            Genre::HipHop => "Hip-Hop",
            Genre::Classical => "Classical",
            Genre::Electronic => "Electronic",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Genre {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Deterministic placeholder genre for a file: `(name length + size) mod 6`.
///
/// The name length is counted in UTF-16 code units so that browser clients
/// computing `name.length` land on the same category.
pub fn fallback_category(name: &str, size: u64) -> Genre {
    let n = CATEGORIES.len() as u64;
    let name_len = name.encode_utf16().count() as u64;
    let index = (name_len % n + size % n) % n;
    CATEGORIES[index as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_for_small_wav() {
        // 8 + 4 = 12, 12 % 6 = 0
        assert_eq!(fallback_category("test.wav", 4), Genre::Pop);
    }

    #[test]
    fn test_fallback_is_deterministic() {
        for size in [0u64, 1, 17, 4096, 20 * 1024 * 1024] {
            assert_eq!(
                fallback_category("track.mp3", size),
                fallback_category("track.mp3", size)
            );
        }
    }

    #[test]
    fn test_fallback_walks_categories_in_order() {
        // "a" has length 1
        let labels = (0..6)
            .map(|size| fallback_category("a", size).as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            labels,
            ["Rock", "Jazz", "Hip-Hop", "Classical", "Electronic", "Pop"]
        );
    }

    #[test]
    fn test_fallback_does_not_overflow() {
        // u64::MAX % 6 == 3, plus 1 → 4
        assert_eq!(fallback_category("x", u64::MAX), Genre::Classical);
    }

    #[test]
    fn test_fallback_counts_utf16_units() {
        // "é" is one UTF-16 unit but two UTF-8 bytes
        assert_eq!(fallback_category("é", 0), Genre::Rock);
        // "🎵" is a surrogate pair: two UTF-16 units
        assert_eq!(fallback_category("🎵", 0), Genre::Jazz);
    }

    #[test]
    fn test_genre_serializes_as_label() {
        let json = serde_json::to_string(&Genre::HipHop).unwrap();
        assert_eq!(json, "\"Hip-Hop\"");
    }
}
