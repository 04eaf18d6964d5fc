use crate::cache::{asset_cache_key, AssetCache};
use crate::config::{AssetNames, HomeMapConfig};
use anyhow::{Context, Result};
use homemap_index::{ContentStore, IndexedContent, PathIndex, TagIndex};
use homemap_manifest::{ManifestAssembler, ManifestDescriptor, ManifestError, SourceLocation};
use homemap_search::SearchEngine;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One ingested source. Immutable; re-ingestion builds a new one.
pub struct Source {
    pub name: String,
    pub location: SourceLocation,
    pub index: PathIndex,
    pub tags: Option<TagIndex>,
    pub content: Option<ContentStore>,
}

impl Source {
    pub fn engine(&self) -> SearchEngine<'_> {
        SearchEngine::build(&self.index)
    }

    pub fn previews(&self) -> IndexedContent<'_> {
        IndexedContent::new(&self.index, self.content.as_ref())
    }
}

/// Named sources loaded in this process.
#[derive(Default)]
pub struct Session {
    sources: BTreeMap<String, Arc<Source>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `source`, replacing any previous snapshot under the same name.
    pub fn insert(&mut self, source: Source) -> Arc<Source> {
        let source = Arc::new(source);
        if let Some(old) = self.sources.insert(source.name.clone(), Arc::clone(&source)) {
            log::debug!("Replaced source {} ({} paths)", old.name, old.index.len());
        }
        source
    }

    pub fn get(&self, name: &str) -> Option<Arc<Source>> {
        self.sources.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.sources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }
}

/// Fetches and decodes a source's assets through the manifest assembler.
pub struct SourceLoader {
    location: SourceLocation,
    assembler: ManifestAssembler,
    assets: AssetNames,
    cache: Option<AssetCache>,
}

impl SourceLoader {
    pub fn new(location: SourceLocation, config: &HomeMapConfig, use_cache: bool) -> Result<Self> {
        let fetcher = location
            .fetcher()
            .with_context(|| format!("Cannot open source {location}"))?;
        let cache = (use_cache && config.cache.enabled)
            .then(|| AssetCache::new(config.cache.dir.clone(), config.cache.ttl()));
        Ok(Self {
            assembler: ManifestAssembler::with_config(fetcher, config.fetch),
            location,
            assets: config.assets.clone(),
            cache,
        })
    }

    /// Assemble `asset`; `None` when the source does not publish it.
    ///
    /// The descriptor is always fetched from the source; only the assembled
    /// parts are served from the cache.
    async fn fetch_optional(&self, asset: &str) -> Result<Option<Vec<u8>>> {
        let raw = match self.assembler.fetch_descriptor(asset).await {
            Ok(raw) => raw,
            Err(ManifestError::NotFound(_)) => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("Cannot assemble {asset}"));
            }
        };

        let key = asset_cache_key(&self.location.to_string(), asset, &raw);
        if let Some(cache) = &self.cache {
            if let Some(bytes) = cache.load(&key).await {
                log::debug!("Asset cache hit for {asset}");
                return Ok(Some(bytes));
            }
        }

        let descriptor = ManifestDescriptor::parse(asset, &raw)
            .with_context(|| format!("Cannot assemble {asset}"))?;
        let bytes = self
            .assembler
            .assemble_descriptor(&descriptor)
            .await
            .with_context(|| format!("Cannot assemble {asset}"))?;

        if let Some(cache) = &self.cache {
            if let Err(err) = cache.store(&key, &bytes).await {
                log::warn!("Failed to cache {asset}: {err:#}");
            }
        }
        Ok(Some(bytes))
    }

    async fn fetch_required(&self, asset: &str) -> Result<Vec<u8>> {
        self.fetch_optional(asset)
            .await?
            .ok_or_else(|| anyhow::Error::new(ManifestError::NotFound(asset.to_string())))
            .with_context(|| format!("Source {} has no {asset}", self.location))
    }

    pub async fn load(&self, name: &str) -> Result<Source> {
        let (index, tags, content) = tokio::try_join!(
            self.fetch_required(&self.assets.index),
            self.fetch_optional(&self.assets.tags),
            self.fetch_optional(&self.assets.content),
        )?;

        let index = PathIndex::decode(&index)
            .with_context(|| format!("Cannot decode {}", self.assets.index))?;
        let tags = tags.map(|bytes| TagIndex::parse(&bytes));
        let content = content.map(ContentStore::new);
        log::info!(
            "Loaded source {name}: {} paths, {} tags, content {}",
            index.len(),
            tags.as_ref().map_or(0, TagIndex::tag_count),
            if content.is_some() { "present" } else { "absent" }
        );

        Ok(Source {
            name: name.to_string(),
            location: self.location.clone(),
            index,
            tags,
            content,
        })
    }
}
