use crate::descriptor::{descriptor_reference, ManifestDescriptor};
use crate::error::{ManifestError, Result};
use crate::fetcher::PartFetcher;
use crate::limits::AssemblerConfig;
use futures::stream::{self, StreamExt};
use std::sync::Arc;

/// Reassembles a logical asset from the ordered parts its descriptor lists.
pub struct ManifestAssembler {
    fetcher: Arc<dyn PartFetcher>,
    config: AssemblerConfig,
}

impl ManifestAssembler {
    pub fn new(fetcher: Arc<dyn PartFetcher>) -> Self {
        Self::with_config(fetcher, AssemblerConfig::default())
    }

    pub fn with_config(fetcher: Arc<dyn PartFetcher>, config: AssemblerConfig) -> Self {
        Self {
            fetcher,
            config: config.normalized(),
        }
    }

    pub fn config(&self) -> AssemblerConfig {
        self.config
    }

    /// Fetch and parse the descriptor of `logical_name`.
    pub async fn load_descriptor(&self, logical_name: &str) -> Result<ManifestDescriptor> {
        let bytes = self.fetch_descriptor(logical_name).await?;
        ManifestDescriptor::parse(logical_name, &bytes)
    }

    /// Raw descriptor bytes of `logical_name`, unparsed.
    pub async fn fetch_descriptor(&self, logical_name: &str) -> Result<Vec<u8>> {
        let reference = descriptor_reference(logical_name);
        log::debug!(
            "Fetching descriptor {} from {}",
            reference,
            self.fetcher.describe()
        );
        match self.fetcher.fetch(&reference).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.is_not_found() => {
                Err(ManifestError::NotFound(logical_name.to_string()))
            }
            Err(err) => Err(ManifestError::part_failed(reference.as_str(), err)),
        }
    }

    /// Resolve `logical_name` and return the concatenation of its parts.
    pub async fn assemble(&self, logical_name: &str) -> Result<Vec<u8>> {
        let descriptor = self.load_descriptor(logical_name).await?;
        self.assemble_descriptor(&descriptor).await
    }

    /// Fetch every part of `descriptor` and concatenate them in manifest order.
    ///
    /// Fetches run with bounded concurrency and may complete in any order;
    /// nothing is written to the output until every part has arrived. The
    /// first failure aborts the call and drops the in-flight siblings.
    pub async fn assemble_descriptor(&self, descriptor: &ManifestDescriptor) -> Result<Vec<u8>> {
        let name = descriptor.logical_name();
        let parts = descriptor.parts();
        if parts.is_empty() {
            return Err(ManifestError::EmptyManifest(name.to_string()));
        }
        let total = parts.len();

        let mut fetches = stream::iter(parts.iter().enumerate())
            .map(|(idx, part)| {
                let fetcher = Arc::clone(&self.fetcher);
                async move {
                    let result = fetcher.fetch(part).await;
                    (idx, part, result)
                }
            })
            .buffer_unordered(self.config.fetch_concurrency);

        let mut slots: Vec<Option<Vec<u8>>> = vec![None; total];
        while let Some((idx, part, result)) = fetches.next().await {
            match result {
                Ok(bytes) => {
                    log::debug!(
                        "Fetched part {}/{} {} ({} bytes)",
                        idx + 1,
                        total,
                        part,
                        bytes.len()
                    );
                    slots[idx] = Some(bytes);
                }
                Err(err) => {
                    log::debug!("Part {part} of {name} failed, aborting assembly: {err}");
                    return Err(ManifestError::part_failed(part.as_str(), err));
                }
            }
        }
        drop(fetches);

        let assembled_len: usize = slots.iter().flatten().map(Vec::len).sum();
        if let Some(declared) = descriptor.total_size() {
            if declared != assembled_len as u64 {
                return Err(ManifestError::malformed(
                    name,
                    format!("declared total_size {declared} but parts sum to {assembled_len} bytes"),
                ));
            }
        }

        let mut buffer = Vec::with_capacity(assembled_len);
        for (idx, slot) in slots.into_iter().enumerate() {
            let Some(bytes) = slot else {
                // Every index is yielded exactly once by the stream above.
                return Err(ManifestError::malformed(
                    name,
                    format!("part #{idx} produced no data"),
                ));
            };
            buffer.extend_from_slice(&bytes);
        }

        if let Some(expected) = descriptor.digest() {
            let actual = blake3::hash(&buffer).to_hex();
            if actual.as_str() != expected {
                return Err(ManifestError::malformed(
                    name,
                    format!("blake3 digest {actual} does not match declared {expected}"),
                ));
            }
        }

        log::info!(
            "Assembled {name}: {total} parts, {} bytes",
            buffer.len()
        );
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::PartRef;
    use crate::error::FetchError;
    use crate::fetcher::{FetchResult, MemoryPartFetcher};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Serves parts after a per-part delay and records completion order.
    struct DelayedFetcher {
        parts: HashMap<String, (Vec<u8>, u64)>,
        failing: Option<String>,
        completed: Mutex<Vec<String>>,
    }

    impl DelayedFetcher {
        fn new(parts: &[(&str, &str, u64)]) -> Self {
            Self {
                parts: parts
                    .iter()
                    .map(|(name, body, delay)| ((*name).to_string(), (body.as_bytes().to_vec(), *delay)))
                    .collect(),
                failing: None,
                completed: Mutex::new(Vec::new()),
            }
        }

        fn failing_on(mut self, name: &str) -> Self {
            self.failing = Some(name.to_string());
            self
        }
    }

    #[async_trait]
    impl PartFetcher for DelayedFetcher {
        async fn fetch(&self, reference: &PartRef) -> FetchResult<Vec<u8>> {
            let (bytes, delay) = self
                .parts
                .get(reference.as_str())
                .cloned()
                .ok_or_else(|| FetchError::NotFound(reference.to_string()))?;
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.completed.lock().unwrap().push(reference.to_string());
            if self.failing.as_deref() == Some(reference.as_str()) {
                return Err(FetchError::Other("connection reset".to_string()));
            }
            Ok(bytes)
        }

        fn describe(&self) -> String {
            "delayed".to_string()
        }
    }

    fn descriptor(parts: &[&str], total_size: Option<u64>) -> ManifestDescriptor {
        ManifestDescriptor::new(
            "asset",
            parts.iter().map(|p| PartRef::from(*p)).collect(),
            total_size,
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn output_follows_manifest_order_not_completion_order() {
        let fetcher = Arc::new(DelayedFetcher::new(&[
            ("A", "aaa", 30),
            ("B", "bb", 20),
            ("C", "c", 10),
        ]));
        let assembler = ManifestAssembler::new(fetcher.clone());

        let bytes = assembler
            .assemble_descriptor(&descriptor(&["A", "B", "C"], Some(6)))
            .await
            .unwrap();

        assert_eq!(bytes, b"aaabbc");
        assert_eq!(*fetcher.completed.lock().unwrap(), vec!["C", "B", "A"]);
    }

    #[tokio::test(start_paused = true)]
    async fn serial_fetching_yields_identical_bytes() {
        let fetcher = Arc::new(DelayedFetcher::new(&[
            ("A", "aaa", 30),
            ("B", "bb", 20),
            ("C", "c", 10),
        ]));
        let assembler = ManifestAssembler::with_config(
            fetcher,
            AssemblerConfig {
                fetch_concurrency: 1,
            },
        );

        let bytes = assembler
            .assemble_descriptor(&descriptor(&["A", "B", "C"], None))
            .await
            .unwrap();
        assert_eq!(bytes, b"aaabbc");
    }

    #[tokio::test(start_paused = true)]
    async fn part_failure_aborts_whole_assembly() {
        let fetcher = Arc::new(
            DelayedFetcher::new(&[("A", "aaa", 30), ("B", "bb", 5), ("C", "c", 10)])
                .failing_on("B"),
        );
        let assembler = ManifestAssembler::new(fetcher);

        let err = assembler
            .assemble_descriptor(&descriptor(&["A", "B", "C"], None))
            .await
            .unwrap_err();
        match err {
            ManifestError::PartFetchFailed { part, .. } => assert_eq!(part, "B"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn total_size_mismatch_is_malformed() {
        let fetcher = Arc::new(
            MemoryPartFetcher::new()
                .with_part("A", b"aaa".to_vec())
                .with_part("B", b"b".to_vec()),
        );
        let assembler = ManifestAssembler::new(fetcher);

        let err = assembler
            .assemble_descriptor(&descriptor(&["A", "B"], Some(10)))
            .await
            .unwrap_err();
        assert!(matches!(err, ManifestError::MalformedManifest { .. }));
    }

    #[tokio::test]
    async fn digest_mismatch_is_malformed() {
        let fetcher = Arc::new(
            MemoryPartFetcher::new()
                .with_part("A", b"aaa".to_vec())
                .with_part("B", b"b".to_vec()),
        );
        let assembler = ManifestAssembler::new(fetcher);

        let good = descriptor(&["A", "B"], Some(4))
            .with_digest(blake3::hash(b"aaab").to_hex().as_str());
        assert_eq!(assembler.assemble_descriptor(&good).await.unwrap(), b"aaab");

        let stale = descriptor(&["A", "B"], Some(4))
            .with_digest(blake3::hash(b"aaac").to_hex().as_str());
        let err = assembler.assemble_descriptor(&stale).await.unwrap_err();
        assert!(matches!(err, ManifestError::MalformedManifest { .. }));
    }

    #[tokio::test]
    async fn fetch_descriptor_returns_raw_bytes() {
        let raw = br#"{"parts":["x.0"]}"#.to_vec();
        let fetcher = Arc::new(MemoryPartFetcher::new().with_part("x.manifest.json", raw.clone()));
        let assembler = ManifestAssembler::new(fetcher);

        assert_eq!(assembler.fetch_descriptor("x").await.unwrap(), raw);
        let err = assembler.fetch_descriptor("y").await.unwrap_err();
        assert!(matches!(err, ManifestError::NotFound(name) if name == "y"));
    }

    #[tokio::test]
    async fn assemble_resolves_descriptor_by_logical_name() {
        let fetcher = Arc::new(
            MemoryPartFetcher::new()
                .with_part(
                    "home.index.bin.manifest.json",
                    br#"{"parts":["home.index.bin.part_00","home.index.bin.part_01"]}"#.to_vec(),
                )
                .with_part("home.index.bin.part_00", b"hello ".to_vec())
                .with_part("home.index.bin.part_01", b"world".to_vec()),
        );
        let assembler = ManifestAssembler::new(fetcher);

        let bytes = assembler.assemble("home.index.bin").await.unwrap();
        assert_eq!(bytes, b"hello world");
    }

    #[tokio::test]
    async fn missing_descriptor_is_not_found() {
        let assembler = ManifestAssembler::new(Arc::new(MemoryPartFetcher::new()));
        let err = assembler.assemble("nope").await.unwrap_err();
        assert!(matches!(err, ManifestError::NotFound(name) if name == "nope"));
    }

    #[tokio::test]
    async fn zero_part_descriptor_is_empty_manifest() {
        let fetcher = Arc::new(
            MemoryPartFetcher::new().with_part("x.manifest.json", br#"{"parts":[]}"#.to_vec()),
        );
        let assembler = ManifestAssembler::new(fetcher);
        let err = assembler.assemble("x").await.unwrap_err();
        assert!(matches!(err, ManifestError::EmptyManifest(_)));
    }

    #[tokio::test]
    async fn missing_part_surfaces_reference() {
        let fetcher = Arc::new(
            MemoryPartFetcher::new()
                .with_part("x.manifest.json", br#"{"parts":["x.0","x.1"]}"#.to_vec())
                .with_part("x.0", b"a".to_vec()),
        );
        let assembler = ManifestAssembler::new(fetcher);
        let err = assembler.assemble("x").await.unwrap_err();
        match err {
            ManifestError::PartFetchFailed { part, source } => {
                assert_eq!(part, "x.1");
                assert!(source.is_not_found());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
