//! Combined title parsing
//!
//! The remote catalog reports search hits as a combined "Artist - Album"
//! string (sometimes with a further " - " subtitle). Splitting happens on
//! the first literal " - " only, so hyphens inside either field survive.

/// Artist/album components split out of a combined title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTitle {
    pub artist: String,
    /// None when the combined string carries no " - " separator
    pub album: Option<String>,
}

/// Split a combined "Artist - Album" string on the first " - "
///
/// Never fails: with no separator the whole input becomes the artist and
/// the album is None. Downstream scoring tolerates the missing field.
pub fn parse_title(combined: &str) -> ParsedTitle {
    match combined.split_once(" - ") {
        Some((artist, album)) => ParsedTitle {
            artist: artist.trim().to_string(),
            album: Some(album.trim().to_string()),
        },
        None => ParsedTitle {
            artist: combined.trim().to_string(),
            album: None,
        },
    }
}

/// Strip the catalog's trailing numeric disambiguation from an artist name
///
/// The provider distinguishes same-named artists with a suffix like
/// "Nirvana (2)"; local comparisons want the bare name.
pub fn strip_artist_suffix(artist: &str) -> String {
    let trimmed = artist.trim_end();
    if let Some(open) = trimmed.rfind(" (") {
        let suffix = &trimmed[open + 2..];
        if let Some(inner) = suffix.strip_suffix(')') {
            if !inner.is_empty() && inner.chars().all(|c| c.is_ascii_digit()) {
                return trimmed[..open].trim_end().to_string();
            }
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_artist_and_album() {
        let parsed = parse_title("Pink Floyd - The Dark Side of the Moon");
        assert_eq!(parsed.artist, "Pink Floyd");
        assert_eq!(parsed.album.as_deref(), Some("The Dark Side of the Moon"));
    }

    #[test]
    fn test_parse_no_separator() {
        let parsed = parse_title("No Separator Here");
        assert_eq!(parsed.artist, "No Separator Here");
        assert_eq!(parsed.album, None);
    }

    #[test]
    fn test_parse_splits_on_first_separator_only() {
        let parsed = parse_title("Artist - Album - Deluxe Edition");
        assert_eq!(parsed.artist, "Artist");
        assert_eq!(parsed.album.as_deref(), Some("Album - Deluxe Edition"));
    }

    #[test]
    fn test_interior_hyphens_preserved() {
        let parsed = parse_title("Jay-Z - The Black Album");
        assert_eq!(parsed.artist, "Jay-Z");
        assert_eq!(parsed.album.as_deref(), Some("The Black Album"));

        // Hyphen without surrounding spaces is not the delimiter
        let parsed = parse_title("Ace of Base-The Sign");
        assert_eq!(parsed.artist, "Ace of Base-The Sign");
        assert_eq!(parsed.album, None);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let parsed = parse_title("  Radiohead - OK Computer  ");
        assert_eq!(parsed.artist, "Radiohead");
        assert_eq!(parsed.album.as_deref(), Some("OK Computer"));
    }

    #[test]
    fn test_strip_artist_suffix() {
        assert_eq!(strip_artist_suffix("Nirvana (2)"), "Nirvana");
        assert_eq!(strip_artist_suffix("Nirvana (23)"), "Nirvana");
        assert_eq!(strip_artist_suffix("Nirvana"), "Nirvana");
    }

    #[test]
    fn test_strip_artist_suffix_keeps_non_numeric_parens() {
        assert_eq!(strip_artist_suffix("Tortoise (band)"), "Tortoise (band)");
        assert_eq!(strip_artist_suffix("(2)"), "(2)");
    }
}
