use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::MediaError;
use crate::reader::MediaReader;

/// Process-lifetime cache of media readers, one per path.
///
/// The first open for a path probes the file; later callers receive the
/// existing handle. The working set is bounded by the media count of the
/// active EDL, so nothing is ever evicted.
#[derive(Default)]
pub struct MediaCache {
    readers: Mutex<HashMap<String, Arc<MediaReader>>>,
}

impl MediaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `path`, or return the already-open handle for it.
    pub fn open(&self, path: &str) -> Result<Arc<MediaReader>, MediaError> {
        let mut readers = self.readers.lock().expect("media cache mutex poisoned");
        if let Some(reader) = readers.get(path) {
            return Ok(Arc::clone(reader));
        }
        let reader = Arc::new(MediaReader::open(path)?);
        readers.insert(path.to_string(), Arc::clone(&reader));
        debug!(path, open_handles = readers.len(), "cached media reader");
        Ok(reader)
    }

    /// Number of open handles, for diagnostics.
    pub fn len(&self) -> usize {
        self.readers.lock().expect("media cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::MediaCache;
    use crate::error::MediaError;

    use crate::test_fixtures::write_f32_wav;

    #[test]
    fn open_missing_file_is_not_found() {
        let cache = MediaCache::new();
        let err = cache.open("/nonexistent/missing.wav").unwrap_err();
        assert!(matches!(err, MediaError::NotFound { .. }));
    }

    #[test]
    fn open_returns_shared_handle_per_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tone.wav");
        write_f32_wav(&path, 48000, 1, &[0.0, 0.25, 0.5, 0.75]);
        let path = path.to_str().expect("utf-8 path").to_string();

        let cache = MediaCache::new();
        let a = cache.open(&path).expect("first open");
        let b = cache.open(&path).expect("second open");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn reader_reports_probed_info() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stereo.wav");
        write_f32_wav(&path, 44100, 2, &[0.0, 0.0, 0.5, -0.5, 1.0, -1.0]);

        let cache = MediaCache::new();
        let reader = cache
            .open(path.to_str().expect("utf-8 path"))
            .expect("open");
        let info = reader.info();
        assert_eq!(info.sample_rate, 44100);
        assert_eq!(info.channels, 2);
        assert_eq!(info.length_in_samples, 3);
    }

    #[test]
    fn read_returns_exact_samples() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ramp.wav");
        let samples: Vec<f32> = (0..64).map(|i| i as f32 / 64.0).collect();
        write_f32_wav(&path, 48000, 1, &samples);

        let cache = MediaCache::new();
        let reader = cache
            .open(path.to_str().expect("utf-8 path"))
            .expect("open");

        let mut out = Vec::new();
        let got = reader.read(0, 8, &mut out).expect("read head");
        assert_eq!(got, 8);
        assert_eq!(out, &samples[..8]);

        // Non-sequential read forces a reposition.
        let got = reader.read(32, 8, &mut out).expect("read middle");
        assert_eq!(got, 8);
        assert_eq!(out, &samples[32..40]);

        // Sequential continuation reuses the cursor.
        let got = reader.read(40, 8, &mut out).expect("read continuation");
        assert_eq!(got, 8);
        assert_eq!(out, &samples[40..48]);
    }

    #[test]
    fn read_past_end_is_short() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("short.wav");
        write_f32_wav(&path, 48000, 1, &[0.1, 0.2, 0.3, 0.4]);

        let cache = MediaCache::new();
        let reader = cache
            .open(path.to_str().expect("utf-8 path"))
            .expect("open");

        let mut out = Vec::new();
        let got = reader.read(2, 16, &mut out).expect("short read");
        assert_eq!(got, 2);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn read_beyond_end_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bounds.wav");
        write_f32_wav(&path, 48000, 1, &[0.0; 4]);

        let cache = MediaCache::new();
        let reader = cache
            .open(path.to_str().expect("utf-8 path"))
            .expect("open");

        let mut out = Vec::new();
        let err = reader.read(4, 1, &mut out).unwrap_err();
        assert!(matches!(err, MediaError::ReadBeyondEnd { frame: 4, .. }));
    }
}
