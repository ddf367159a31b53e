use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use cuemix_core::json::canonical_edl_json;
use cuemix_core::{Clip, Edl};
use cuemix_media::{MediaCache, MediaInfo};

use crate::error::StoreError;

/// Supported timeline sample rates.
const SAMPLE_RATES: [i32; 3] = [44100, 48000, 96000];

/// Number of hex characters kept from the revision digest.
const REVISION_LEN: usize = 12;

/// Immutable record of a validated EDL plus identifying metadata.
///
/// `media_info` is the probe result for each entry of `edl.media`, in the
/// same order; the compiler and renderer read channel counts and lengths
/// from here instead of re-probing files.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub edl: Edl,
    /// First 12 lowercase hex chars of the canonical-JSON SHA-256.
    pub revision: String,
    pub track_count: u32,
    pub clip_count: u32,
    pub media_info: Vec<MediaInfo>,
}

/// Thread-safe holder of the current validated EDL snapshot.
///
/// `replace` is the only way a snapshot comes into existence; it either
/// commits a fully validated snapshot or fails without side effects.
/// Snapshots are immutable behind `Arc`, so `get` hands out a pointer
/// clone that no later `replace` can disturb.
pub struct EdlStore {
    media: Arc<MediaCache>,
    current: Mutex<Option<Arc<Snapshot>>>,
}

impl EdlStore {
    pub fn new(media: Arc<MediaCache>) -> Self {
        Self {
            media,
            current: Mutex::new(None),
        }
    }

    /// Validate `edl` and atomically install it as the current snapshot.
    ///
    /// Holds the store's critical section for the duration of validation,
    /// including the open probe of every referenced media file.
    pub fn replace(&self, edl: Edl) -> Result<Arc<Snapshot>, StoreError> {
        let mut current = self.current.lock().expect("edl store mutex poisoned");

        let media_info = validate(&edl, &self.media)?;
        let revision = revision_of(&edl)?;

        let mut stored = edl;
        if !stored.revision.is_empty() && stored.revision != revision {
            warn!(
                edl_id = %stored.id,
                client_revision = %stored.revision,
                revision = %revision,
                "client-supplied revision does not match content hash"
            );
        }
        stored.revision = revision.clone();

        let snapshot = Arc::new(Snapshot {
            track_count: stored.tracks.len() as u32,
            clip_count: stored.clip_count(),
            revision,
            media_info,
            edl: stored,
        });

        info!(
            edl_id = %snapshot.edl.id,
            revision = %snapshot.revision,
            tracks = snapshot.track_count,
            clips = snapshot.clip_count,
            "EDL snapshot replaced"
        );

        *current = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Current snapshot, if any.
    pub fn get(&self) -> Option<Arc<Snapshot>> {
        self.current.lock().expect("edl store mutex poisoned").clone()
    }

    pub fn has_edl(&self) -> bool {
        self.current
            .lock()
            .expect("edl store mutex poisoned")
            .is_some()
    }
}

/// Compute the content revision: SHA-256 over the canonical JSON form
/// with `revision` cleared, truncated to 12 lowercase hex chars.
fn revision_of(edl: &Edl) -> Result<String, StoreError> {
    let canonical = canonical_edl_json(edl).map_err(|source| StoreError::Canonical { source })?;
    let digest = Sha256::digest(canonical.as_bytes());
    let mut hash = hex::encode(digest);
    hash.truncate(REVISION_LEN);
    Ok(hash)
}

/// Apply every validation rule, returning the probe results for the
/// media table on success.
fn validate(edl: &Edl, media: &MediaCache) -> Result<Vec<MediaInfo>, StoreError> {
    if edl.id.is_empty() {
        return Err(StoreError::EmptyEdlId);
    }
    if !SAMPLE_RATES.contains(&edl.sample_rate) {
        return Err(StoreError::UnsupportedSampleRate {
            rate: edl.sample_rate,
        });
    }

    let media_info = validate_media(edl, media)?;

    let lengths: HashMap<&str, u64> = edl
        .media
        .iter()
        .zip(&media_info)
        .map(|(m, info)| (m.id.as_str(), info.length_in_samples))
        .collect();
    validate_tracks(edl, &lengths)?;

    Ok(media_info)
}

fn validate_media(edl: &Edl, media: &MediaCache) -> Result<Vec<MediaInfo>, StoreError> {
    if edl.media.is_empty() {
        return Err(StoreError::NoMedia);
    }

    let mut seen = HashMap::new();
    let mut infos = Vec::with_capacity(edl.media.len());
    for entry in &edl.media {
        if entry.id.is_empty() {
            return Err(StoreError::EmptyMediaId);
        }
        if seen.insert(entry.id.as_str(), ()).is_some() {
            return Err(StoreError::DuplicateMediaId {
                media_id: entry.id.clone(),
            });
        }
        if entry.path.is_empty() {
            return Err(StoreError::EmptyMediaPath {
                media_id: entry.id.clone(),
            });
        }

        let reader = media
            .open(&entry.path)
            .map_err(|source| StoreError::MediaOpen {
                media_id: entry.id.clone(),
                source,
            })?;
        let info = reader.info();

        if entry.sample_rate != 0 && entry.sample_rate != info.sample_rate as i32 {
            return Err(StoreError::DeclaredRateMismatch {
                media_id: entry.id.clone(),
                declared: entry.sample_rate,
                actual: info.sample_rate,
            });
        }
        if info.sample_rate as i32 != edl.sample_rate {
            return Err(StoreError::EdlRateMismatch {
                media_id: entry.id.clone(),
                actual: info.sample_rate,
                required: edl.sample_rate,
            });
        }

        infos.push(info);
    }
    Ok(infos)
}

fn validate_tracks(edl: &Edl, media_lengths: &HashMap<&str, u64>) -> Result<(), StoreError> {
    if edl.tracks.is_empty() {
        return Err(StoreError::NoTracks);
    }

    for track in &edl.tracks {
        if track.id.is_empty() {
            return Err(StoreError::EmptyTrackId);
        }
        for clip in &track.clips {
            validate_clip(clip, &track.id, media_lengths)?;
        }
    }
    Ok(())
}

fn validate_clip(
    clip: &Clip,
    track_id: &str,
    media_lengths: &HashMap<&str, u64>,
) -> Result<(), StoreError> {
    if clip.id.is_empty() {
        return Err(StoreError::EmptyClipId {
            track_id: track_id.to_string(),
        });
    }
    if clip.media_id.is_empty() {
        return Err(StoreError::EmptyClipMediaId {
            clip_id: clip.id.clone(),
        });
    }
    let Some(&length) = media_lengths.get(clip.media_id.as_str()) else {
        return Err(StoreError::ClipMediaMissing {
            clip_id: clip.id.clone(),
            media_id: clip.media_id.clone(),
        });
    };

    if clip.start_in_media < 0 {
        return Err(StoreError::NegativeStartInMedia {
            clip_id: clip.id.clone(),
        });
    }
    if clip.duration <= 0 {
        return Err(StoreError::NonPositiveDuration {
            clip_id: clip.id.clone(),
        });
    }
    if clip.start_in_timeline < 0 {
        return Err(StoreError::NegativeStartInTimeline {
            clip_id: clip.id.clone(),
        });
    }
    if clip.start_in_media as u64 + clip.duration as u64 > length {
        return Err(StoreError::ClipBeyondMedia {
            clip_id: clip.id.clone(),
            start: clip.start_in_media,
            duration: clip.duration,
            length,
        });
    }

    for (name, fade) in [("fade_in", &clip.fade_in), ("fade_out", &clip.fade_out)] {
        if let Some(fade) = fade
            && fade.duration_samples < 0
        {
            return Err(StoreError::NegativeFadeDuration {
                clip_id: clip.id.clone(),
                fade: name,
            });
        }
    }
    Ok(())
}
