use anyhow::{Context, Result};
use blake3::Hasher;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs;

/// Disk cache for assembled assets, keyed by source location, asset name and
/// descriptor bytes.
#[derive(Clone, Debug)]
pub struct AssetCache {
    dir: PathBuf,
    ttl: Duration,
}

#[derive(Serialize, Deserialize, Debug)]
struct CacheEnvelope {
    created_ms: u64,
    len: u64,
    blake3: String,
}

impl AssetCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    fn paths(&self, key: &str) -> (PathBuf, PathBuf) {
        (
            self.dir.join(format!("{key}.bin")),
            self.dir.join(format!("{key}.json")),
        )
    }

    /// Cached bytes, or `None` when missing, stale or corrupted.
    pub async fn load(&self, key: &str) -> Option<Vec<u8>> {
        let (data_path, meta_path) = self.paths(key);
        let meta = fs::read(&meta_path).await.ok()?;
        let envelope: CacheEnvelope = match serde_json::from_slice(&meta) {
            Ok(envelope) => envelope,
            Err(err) => {
                log::warn!("Asset cache corrupted {}: {err}", meta_path.display());
                return None;
            }
        };

        let age = unix_ms_now().saturating_sub(envelope.created_ms);
        let ttl_ms = u64::try_from(self.ttl.as_millis()).unwrap_or(u64::MAX);
        if age > ttl_ms {
            log::debug!("Asset cache entry {key} expired");
            return None;
        }

        let bytes = fs::read(&data_path).await.ok()?;
        if bytes.len() as u64 != envelope.len || digest(&bytes) != envelope.blake3 {
            log::warn!("Asset cache entry {} failed verification", data_path.display());
            return None;
        }
        Some(bytes)
    }

    pub async fn store(&self, key: &str, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Cannot create cache dir {}", self.dir.display()))?;
        let (data_path, meta_path) = self.paths(key);
        let envelope = CacheEnvelope {
            created_ms: unix_ms_now(),
            len: bytes.len() as u64,
            blake3: digest(bytes),
        };
        fs::write(&data_path, bytes)
            .await
            .with_context(|| format!("Cannot write {}", data_path.display()))?;
        fs::write(&meta_path, serde_json::to_vec_pretty(&envelope)?)
            .await
            .with_context(|| format!("Cannot write {}", meta_path.display()))?;
        Ok(())
    }
}

/// Key for `asset` at `location`. Any change to the published descriptor
/// yields a new key, so a re-published source never reads an older entry.
pub fn asset_cache_key(location: &str, asset: &str, descriptor: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(location.as_bytes());
    hasher.update(b"|");
    hasher.update(asset.as_bytes());
    hasher.update(b"|");
    hasher.update(descriptor);
    hasher.finalize().to_hex().to_string()
}

fn digest(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}
