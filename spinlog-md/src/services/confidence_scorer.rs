//! Match confidence scoring between requested and candidate metadata
//!
//! Computes normalized Jaro-Winkler similarity independently for the
//! artist pair and the album pair, then combines with equal weighting. A
//! missing field on either side contributes a neutral partial score rather
//! than disqualifying the candidate.

/// Score contributed by a field pair when either side is missing
const NEUTRAL_PARTIAL_SCORE: f64 = 0.5;

/// Equal fixed weighting between the artist and album pairs
const ARTIST_WEIGHT: f64 = 0.5;
const ALBUM_WEIGHT: f64 = 0.5;

/// Artist strings that mark various-artist / compilation releases
///
/// Compilations are a known source of false-positive high-confidence
/// matches: the nominal artist is not the requested performer.
const COMPILATION_MARKERS: &[&str] = &["various", "various artists", "v/a", "va", "soundtrack"];

/// Compute match confidence in [0.0, 1.0] between a requested and a
/// candidate (artist, album) pair
pub fn confidence(
    req_artist: Option<&str>,
    req_album: Option<&str>,
    cand_artist: Option<&str>,
    cand_album: Option<&str>,
) -> f64 {
    let artist_score = pair_similarity(req_artist, cand_artist);
    let album_score = pair_similarity(req_album, cand_album);

    (artist_score * ARTIST_WEIGHT + album_score * ALBUM_WEIGHT).clamp(0.0, 1.0)
}

/// Normalized similarity for one field pair, neutral when a side is missing
fn pair_similarity(requested: Option<&str>, candidate: Option<&str>) -> f64 {
    match (non_blank(requested), non_blank(candidate)) {
        (Some(req), Some(cand)) => fuzzy_similarity(req, cand),
        _ => NEUTRAL_PARTIAL_SCORE,
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Jaro-Winkler similarity on lowercased, trimmed strings
fn fuzzy_similarity(a: &str, b: &str) -> f64 {
    let a_normalized = a.to_lowercase();
    let b_normalized = b.to_lowercase();
    strsim::jaro_winkler(a_normalized.trim(), b_normalized.trim())
}

/// Whether an artist string names a various-artist / compilation release
///
/// Rankers use this to de-prioritize compilation candidates.
pub fn is_compilation_artist(artist: &str) -> bool {
    let normalized = artist.trim().to_lowercase();
    if COMPILATION_MARKERS.contains(&normalized.as_str()) {
        return true;
    }
    // Leading marker token ("Various (5)", "Soundtrack - ...")
    COMPILATION_MARKERS.iter().any(|marker| {
        normalized
            .strip_prefix(marker)
            .is_some_and(|rest| rest.starts_with(' ') || rest.starts_with('('))
    })
}
