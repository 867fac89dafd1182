use crate::error::StoreError;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use uuid::Uuid;

/// Opaque reference to a stored signature image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignatureHandle(pub(crate) String);

impl SignatureHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SignatureHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait SignatureStore: Send + Sync {
    /// Persists `bytes` under a fresh unique name ending in `.{ext}`.
    fn put(&self, bytes: &[u8], ext: &str) -> Result<SignatureHandle, StoreError>;

    fn delete(&self, handle: &SignatureHandle) -> Result<(), StoreError>;
}

/// Keeps signatures as individual files in one directory.
pub struct FsSignatureStore {
    dir: PathBuf,
}

impl FsSignatureStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_of(&self, handle: &SignatureHandle) -> Result<PathBuf, StoreError> {
        let name = handle.as_str();
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
            && !name.starts_with('.');
        if !valid {
            return Err(StoreError::InvalidId(name.to_string()));
        }
        Ok(self.dir.join(name))
    }
}

impl SignatureStore for FsSignatureStore {
    fn put(&self, bytes: &[u8], ext: &str) -> Result<SignatureHandle, StoreError> {
        let handle = SignatureHandle(format!("{}.{}", Uuid::new_v4(), ext));
        let path = self.path_of(&handle)?;
        // create_new: a name is never reused
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        Ok(handle)
    }

    fn delete(&self, handle: &SignatureHandle) -> Result<(), StoreError> {
        std::fs::remove_file(self.path_of(handle)?)?;
        Ok(())
    }
}
