use crate::model::FitsImage;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;

/// Called from the worker thread when a batch finishes, so the UI wakes up.
pub type RepaintHook = Arc<dyn Fn() + Send + Sync>;

pub struct LoadedFile {
    pub path: PathBuf,
    pub result: Result<FitsImage, String>,
}

pub fn load_all(paths: &[PathBuf]) -> Vec<LoadedFile> {
    paths
        .iter()
        .map(|path| LoadedFile {
            path: path.clone(),
            result: FitsImage::load(path).map_err(|e| e.to_string()),
        })
        .collect()
}

/// Loads batches of files on a worker thread, one batch in flight at a time.
pub struct BackgroundLoader {
    rx: Option<mpsc::Receiver<Vec<LoadedFile>>>,
    pending: Vec<PathBuf>,
    repaint: Option<RepaintHook>,
}

impl BackgroundLoader {
    pub fn new(repaint: Option<RepaintHook>) -> Self {
        BackgroundLoader { rx: None, pending: Vec::new(), repaint }
    }

    /// Start loading `paths`. A batch still in flight is abandoned.
    pub fn spawn(&mut self, paths: Vec<PathBuf>) {
        let (tx, rx) = mpsc::channel();
        self.rx = Some(rx);
        self.pending = paths.clone();
        let repaint = self.repaint.clone();
        std::thread::spawn(move || {
            let _ = tx.send(load_all(&paths));
            if let Some(repaint) = repaint {
                repaint();
            }
        });
    }

    /// The finished batch, if any.
    pub fn try_recv(&mut self) -> Option<Vec<LoadedFile>> {
        let rx = self.rx.as_ref()?;
        match rx.try_recv() {
            Ok(batch) => {
                self.rx = None;
                self.pending.clear();
                Some(batch)
            }
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => {
                self.rx = None;
                self.pending.clear();
                None
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.rx.is_some()
    }

    pub fn pending(&self) -> &[PathBuf] {
        &self.pending
    }
}
