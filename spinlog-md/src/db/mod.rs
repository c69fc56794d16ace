//! Read-only local store queries and the album metadata cache
//!
//! The three search sources (track index, on-air history, DJ bins) are
//! queried with `pg_trgm` trigram operators and each left-joined to the
//! active rotation list, filtered by a not-yet-expired kill-date. Failures
//! here are infrastructure failures and propagate; they must never be
//! conflated with an empty result set.

pub mod bins;
pub mod history;
pub mod metadata_cache;
pub mod track_index;

pub use bins::search_bins;
pub use history::search_history;
pub use metadata_cache::{load_album_metadata, upsert_album_metadata, StoredAlbumMetadata};
pub use track_index::search_track_index;
