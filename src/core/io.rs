//! Image I/O collaborators.
//!
//! Source and sink nodes never touch the filesystem directly. They go through
//! an [`ImageIo`] implementation owned by the execution engine, which makes
//! the on-disk format someone else's problem and lets tests swap in
//! [`MemoryImageIo`].

use image::{DynamicImage, ImageError, ImageResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Blocking image load/save.
pub trait ImageIo: Send + Sync {
    /// Load an image from `path`.
    fn load(&self, path: &Path) -> ImageResult<DynamicImage>;

    /// Save `image` to `path`.
    fn save(&self, path: &Path, image: &DynamicImage) -> ImageResult<()>;
}

/// Filesystem-backed I/O using the `image` crate's codecs.
///
/// The output format is picked from the destination's extension.
#[derive(Debug, Clone)]
pub struct FsImageIo {
    base_dir: Option<PathBuf>,
    create_dirs: bool,
}

impl FsImageIo {
    /// I/O rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: None,
            create_dirs: true,
        }
    }

    /// Resolve relative paths against `base_dir`.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    /// Whether missing parent directories are created before saving.
    pub fn with_create_dirs(mut self, create_dirs: bool) -> Self {
        self.create_dirs = create_dirs;
        self
    }

    /// Resolve a node-configured path.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl Default for FsImageIo {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageIo for FsImageIo {
    fn load(&self, path: &Path) -> ImageResult<DynamicImage> {
        image::open(self.resolve(path))
    }

    fn save(&self, path: &Path, image: &DynamicImage) -> ImageResult<()> {
        let path = self.resolve(path);
        if self.create_dirs {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(ImageError::IoError)?;
            }
        }
        image.save(&path)
    }
}

/// In-memory image store.
///
/// Useful for embedding the engine behind a UI that already holds decoded
/// buffers, and for observing sink writes in tests.
#[derive(Debug, Default)]
pub struct MemoryImageIo {
    images: Mutex<HashMap<PathBuf, DynamicImage>>,
    loads: Mutex<Vec<PathBuf>>,
    saves: Mutex<Vec<PathBuf>>,
}

impl MemoryImageIo {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an image at `path`.
    pub fn insert(&self, path: impl Into<PathBuf>, image: DynamicImage) {
        self.images.lock().insert(path.into(), image);
    }

    /// Clone the image stored at `path`.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<DynamicImage> {
        self.images.lock().get(path.as_ref()).cloned()
    }

    /// Paths loaded so far, in call order.
    pub fn loads(&self) -> Vec<PathBuf> {
        self.loads.lock().clone()
    }

    /// Paths written so far, in call order.
    pub fn saves(&self) -> Vec<PathBuf> {
        self.saves.lock().clone()
    }
}

impl ImageIo for MemoryImageIo {
    fn load(&self, path: &Path) -> ImageResult<DynamicImage> {
        self.loads.lock().push(path.to_path_buf());
        self.get(path).ok_or_else(|| {
            ImageError::IoError(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no image stored at '{}'", path.display()),
            ))
        })
    }

    fn save(&self, path: &Path, image: &DynamicImage) -> ImageResult<()> {
        self.saves.lock().push(path.to_path_buf());
        self.insert(path, image.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn sample() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 2, Rgb([10, 20, 30])))
    }

    #[test]
    fn test_memory_round_trip() {
        let io = MemoryImageIo::new();
        io.save(Path::new("a.png"), &sample()).unwrap();

        let loaded = io.load(Path::new("a.png")).unwrap();
        assert_eq!(loaded.to_rgb8().get_pixel(0, 0), &Rgb([10, 20, 30]));
        assert_eq!(io.saves(), vec![PathBuf::from("a.png")]);
        assert_eq!(io.loads(), vec![PathBuf::from("a.png")]);
    }

    #[test]
    fn test_memory_missing() {
        let io = MemoryImageIo::new();
        assert!(io.load(Path::new("missing.png")).is_err());
    }

    #[test]
    fn test_fs_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let io = FsImageIo::new().with_base_dir(dir.path());

        io.save(Path::new("nested/out.png"), &sample()).unwrap();
        assert!(dir.path().join("nested/out.png").exists());

        let loaded = io.load(Path::new("nested/out.png")).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (3, 2));
        assert_eq!(loaded.to_rgb8().get_pixel(2, 1), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_fs_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let io = FsImageIo::new().with_base_dir(dir.path());
        assert!(io.load(Path::new("nope.png")).is_err());
    }

    #[test]
    fn test_resolve_absolute_path_untouched() {
        let io = FsImageIo::new().with_base_dir("/base");
        let absolute = std::env::temp_dir().join("x.png");
        assert_eq!(io.resolve(&absolute), absolute);
        assert_eq!(io.resolve(Path::new("x.png")), PathBuf::from("/base/x.png"));
    }
}
