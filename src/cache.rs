use crate::model::Credentials;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

pub const CACHE_PATH_ENV: &str = "ENVOY_CACHE_PATH";
const CACHE_FILE: &str = "envoy.cache";

/// Credentials persisted between runs in `<dir>/envoy.cache`.
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

/// `$ENVOY_CACHE_PATH`, else `$HOME/.cache/envoy`, else the working directory.
pub fn default_dir() -> PathBuf {
    if let Some(path) = env::var_os(CACHE_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    match env::var_os("HOME").filter(|p| !p.is_empty()) {
        Some(home) => Path::new(&home).join(".cache").join("envoy"),
        None => PathBuf::from("./"),
    }
}

impl CacheStore {
    /// Open the store in `dir`, creating the directory if needed.
    pub fn new<P: AsRef<Path>>(dir: P) -> io::Result<Self> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(CacheStore {
            path: dir.as_ref().join(CACHE_FILE),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached credentials, `None` when there is no usable cache file.
    pub fn load(&self) -> Option<Credentials> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                log::debug!("no cache file at {}: {}", self.path.display(), e);
                return None;
            }
        };

        serde_json::from_str(&contents)
            .map_err(|e| log::debug!("unmarshal cache file failed: {}", e))
            .ok()
    }

    /// Write `credentials`; failures are logged and otherwise ignored.
    pub fn save(&self, credentials: &Credentials) {
        let result = serde_json::to_vec(credentials)
            .map_err(io::Error::from)
            .and_then(|contents| fs::write(&self.path, contents));

        if let Err(e) = result {
            log::warn!("Unable to write cache file {}: {}", self.path.display(), e);
        }
    }
}
