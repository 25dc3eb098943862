//! 建议性文件锁
//!
//! 锁加在产物旁边的 `<产物>.lock` 标记文件上，而不是产物本身：
//! 产物会被整体重写并 rename 覆盖，inode 会变。

use crate::error::{PersistError, PersistResult};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// 持有期间独占（或共享）某个产物的锁，Drop 时释放
#[derive(Debug)]
pub struct ArtifactLock {
    file: File,
    marker: PathBuf,
}

impl ArtifactLock {
    /// 阻塞直到拿到独占锁
    pub fn exclusive(artifact: &Path) -> PersistResult<Self> {
        Self::acquire(artifact, true)
    }

    /// 阻塞直到拿到共享锁（只读场景）
    pub fn shared(artifact: &Path) -> PersistResult<Self> {
        Self::acquire(artifact, false)
    }

    fn acquire(artifact: &Path, exclusive: bool) -> PersistResult<Self> {
        let marker = marker_path(artifact);
        if let Some(parent) = marker.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PersistError::write(parent, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&marker)
            .map_err(|source| PersistError::LockFailed {
                path: marker.display().to_string(),
                source,
            })?;

        let locked = if exclusive {
            FileExt::lock_exclusive(&file)
        } else {
            FileExt::lock_shared(&file)
        };
        locked.map_err(|source| PersistError::LockFailed {
            path: marker.display().to_string(),
            source,
        })?;

        debug!(
            "已获取{}锁: {}",
            if exclusive { "独占" } else { "共享" },
            marker.display()
        );
        Ok(Self { file, marker })
    }

    pub fn marker(&self) -> &Path {
        &self.marker
    }
}

impl Drop for ArtifactLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            debug!("释放锁失败 {}: {}", self.marker.display(), e);
        }
    }
}

/// `<产物>.lock`
pub fn marker_path(artifact: &Path) -> PathBuf {
    let mut name = artifact
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    artifact.with_file_name(name)
}

/// 先写 `<产物>.tmp` 再 rename 覆盖，读者不会看到写了一半的文件
pub fn write_atomic(artifact: &Path, bytes: &[u8]) -> PersistResult<()> {
    let mut tmp_name = artifact
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = artifact.with_file_name(tmp_name);

    if let Some(parent) = artifact.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PersistError::write(parent, e))?;
    }
    std::fs::write(&tmp, bytes).map_err(|e| PersistError::write(&tmp, e))?;
    std::fs::rename(&tmp, artifact).map_err(|e| PersistError::write(artifact, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_marker_sits_next_to_artifact() {
        let marker = marker_path(Path::new("/tmp/out/games.csv"));
        assert_eq!(marker, PathBuf::from("/tmp/out/games.csv.lock"));
    }

    #[test]
    fn test_exclusive_lock_serializes_threads() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = Arc::new(dir.path().join("shared.csv"));
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let artifact = artifact.clone();
                let inside = inside.clone();
                let max_seen = max_seen.clone();
                std::thread::spawn(move || {
                    let _lock = ArtifactLock::exclusive(&artifact).unwrap();
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(std::time::Duration::from_millis(5));
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("a.json");
        write_atomic(&path, b"[1]").unwrap();
        write_atomic(&path, b"[1,2]").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[1,2]");
        assert!(!dir.path().join("nested").join("a.json.tmp").exists());
    }
}
