use crate::import::{display_name, import_slice};
use crate::{AssetError, ModelData};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};

const CHUNK: usize = 64 * 1024;
/// Share of the progress bar spent reading bytes; parsing takes the rest.
const READ_SHARE: f32 = 0.8;

/// Load progress in `0.0..=1.0`, shared between loader thread and frame loop.
#[derive(Debug, Clone, Default)]
pub struct LoadProgress(Arc<AtomicU32>);

impl LoadProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn set(&self, fraction: f32) {
        self.0
            .store(fraction.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }

    /// Whole percent, as shown by loading indicators.
    pub fn percent(&self) -> u32 {
        (self.get() * 100.0).floor() as u32
    }
}

/// Starts model loads off the frame loop.
pub struct ModelLoader;

impl ModelLoader {
    /// Load synchronously, reporting into `progress`.
    pub fn load(path: impl AsRef<Path>, progress: &LoadProgress) -> Result<ModelData, AssetError> {
        let path = path.as_ref();
        let io_err = |source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut file = std::fs::File::open(path).map_err(io_err)?;
        let len = file.metadata().map_err(io_err)?.len() as usize;

        let mut bytes = Vec::with_capacity(len);
        let mut chunk = vec![0u8; CHUNK];
        loop {
            let n = file.read(&mut chunk).map_err(io_err)?;
            if n == 0 {
                break;
            }
            bytes.extend_from_slice(&chunk[..n]);
            if len > 0 {
                progress.set(READ_SHARE * bytes.len() as f32 / len as f32);
            }
        }
        progress.set(READ_SHARE);

        let model = import_slice(&bytes, &display_name(path), path.parent())?;
        progress.set(1.0);
        Ok(model)
    }

    /// Load on a background thread.
    pub fn spawn(path: impl Into<PathBuf>) -> Result<PendingModel, AssetError> {
        let path = path.into();
        let progress = LoadProgress::new();
        let (tx, rx) = mpsc::channel();

        let thread_path = path.clone();
        let thread_progress = progress.clone();
        std::thread::Builder::new()
            .name(format!("load {}", display_name(&path)))
            .spawn(move || {
                let result = Self::load(&thread_path, &thread_progress);
                // The receiver may be gone if the scene unmounted mid-load.
                let _ = tx.send(result);
            })
            .map_err(|source| AssetError::Io {
                path: path.clone(),
                source,
            })?;

        tracing::info!("loading model {}", path.display());
        Ok(PendingModel { path, progress, rx })
    }
}

/// A model load in flight.
pub struct PendingModel {
    path: PathBuf,
    progress: LoadProgress,
    rx: Receiver<Result<ModelData, AssetError>>,
}

impl PendingModel {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn progress(&self) -> &LoadProgress {
        &self.progress
    }

    /// Non-blocking: `None` while still loading. The result is yielded once;
    /// drop the pending load after receiving it.
    pub fn poll(&self) -> Option<Result<ModelData, AssetError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(AssetError::LoaderLost(
                self.path.display().to_string(),
            ))),
        }
    }

    /// Block until the load finishes.
    pub fn wait(self) -> Result<ModelData, AssetError> {
        self.rx
            .recv()
            .unwrap_or_else(|_| Err(AssetError::LoaderLost(self.path.display().to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use std::io::Write;

    fn fixture_file() -> tempfile::NamedTempFile {
        let mut tmp = tempfile::Builder::new().suffix(".glb").tempfile().unwrap();
        tmp.write_all(&fixtures::triangle_glb()).unwrap();
        tmp.flush().unwrap();
        tmp
    }

    #[test]
    fn sync_load_reports_full_progress() {
        let tmp = fixture_file();
        let progress = LoadProgress::new();
        assert_eq!(progress.percent(), 0);
        let model = ModelLoader::load(tmp.path(), &progress).unwrap();
        assert_eq!(progress.percent(), 100);
        assert_eq!(model.primitives.len(), 1);
    }

    #[test]
    fn background_load_completes() {
        let tmp = fixture_file();
        let pending = ModelLoader::spawn(tmp.path()).unwrap();
        assert_eq!(pending.path(), tmp.path());
        let model = pending.wait().unwrap();
        assert_eq!(model.clips.len(), 1);
    }

    #[test]
    fn poll_eventually_yields_result() {
        let tmp = fixture_file();
        let pending = ModelLoader::spawn(tmp.path()).unwrap();
        let result = loop {
            if let Some(result) = pending.poll() {
                break result;
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        };
        assert!(result.is_ok());
        assert!((pending.progress().get() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn missing_file_fails_in_background() {
        let pending = ModelLoader::spawn("/no/such/city.glb").unwrap();
        let err = pending.wait().unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }
}
