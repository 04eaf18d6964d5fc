use super::{print_json, Context};
use crate::config::AssetNames;
use crate::{AssembleArgs, BuildArgs, SplitArgs};
use anyhow::{anyhow, Context as AnyhowContext, Result};
use homemap_index::{PathIndexBuilder, TagIndex};
use homemap_manifest::{split_file, ManifestAssembler, ManifestDescriptor};
use ignore::WalkBuilder;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct SplitOutput {
    file: String,
    parts: Vec<String>,
    total_size: Option<u64>,
    part_size: Option<u64>,
}

impl From<&ManifestDescriptor> for SplitOutput {
    fn from(descriptor: &ManifestDescriptor) -> Self {
        Self {
            file: descriptor.logical_name().to_string(),
            parts: descriptor.parts().iter().map(|p| p.to_string()).collect(),
            total_size: descriptor.total_size(),
            part_size: descriptor.part_size(),
        }
    }
}

#[derive(Serialize)]
struct BuildOutput {
    paths: usize,
    content_bytes: usize,
    tags: usize,
    assets: Vec<SplitOutput>,
}

#[derive(Serialize)]
struct AssembleOutput {
    asset: String,
    bytes: usize,
    output: String,
}

pub fn split(args: SplitArgs) -> Result<()> {
    let name = match args.name {
        Some(name) => name,
        None => args
            .input
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Cannot derive a name from {}", args.input.display()))?,
    };
    let descriptor = split_file(&args.input, &args.out_dir, &name, args.part_size)
        .with_context(|| format!("Cannot split {}", args.input.display()))?;

    if args.json {
        return print_json(SplitOutput::from(&descriptor));
    }
    for part in descriptor.parts() {
        println!("{part}");
    }
    println!(
        "{} parts, {} bytes -> {}",
        descriptor.parts().len(),
        descriptor.total_size().unwrap_or(0),
        args.out_dir.display()
    );
    Ok(())
}

/// Index paths relative to `root`, always with `/` separators.
fn walk(root: &Path) -> Vec<(String, PathBuf)> {
    let mut files = Vec::new();
    for result in WalkBuilder::new(root).hidden(true).git_ignore(true).build() {
        match result {
            Ok(entry) => {
                if !entry.file_type().is_some_and(|t| t.is_file()) {
                    continue;
                }
                let Ok(relative) = entry.path().strip_prefix(root) else {
                    continue;
                };
                let Some(path) = relative.to_str() else {
                    log::warn!("Skipping non UTF-8 path {}", entry.path().display());
                    continue;
                };
                files.push((path.replace('\\', "/"), entry.path().to_path_buf()));
            }
            Err(err) => log::warn!("Failed to read entry: {err}"),
        }
    }
    files.sort();
    files
}

/// Write `bytes` as `asset` and replace it with its parts and manifest.
fn publish(out_dir: &Path, asset: &str, bytes: &[u8], part_size: u64) -> Result<ManifestDescriptor> {
    let raw = out_dir.join(asset);
    std::fs::write(&raw, bytes).with_context(|| format!("Cannot write {}", raw.display()))?;
    let descriptor = split_file(&raw, out_dir, asset, part_size)
        .with_context(|| format!("Cannot split {asset}"))?;
    std::fs::remove_file(&raw).with_context(|| format!("Cannot remove {}", raw.display()))?;
    Ok(descriptor)
}

pub fn build(args: BuildArgs) -> Result<()> {
    let names = AssetNames::default();
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Cannot create {}", args.out_dir.display()))?;

    let mut builder = PathIndexBuilder::new(args.capture_bytes);
    for (path, full) in walk(&args.root) {
        let content =
            std::fs::read(&full).with_context(|| format!("Cannot read {}", full.display()))?;
        builder.add(&path, &content)?;
    }
    if builder.is_empty() {
        log::warn!("No files found under {}", args.root.display());
    }
    let built = builder.finish()?;

    let mut assets = vec![publish(&args.out_dir, &names.index, &built.index_bytes, args.part_size)?];
    if !built.content.is_empty() {
        assets.push(publish(&args.out_dir, &names.content, &built.content, args.part_size)?);
    }

    let mut tag_count = 0;
    if let Some(tags_path) = &args.tags {
        let raw = std::fs::read(tags_path)
            .with_context(|| format!("Cannot read {}", tags_path.display()))?;
        tag_count = TagIndex::parse(&raw).tag_count();
        if !raw.is_empty() {
            assets.push(publish(&args.out_dir, &names.tags, &raw, args.part_size)?);
        }
    }

    log::info!(
        "Built source in {}: {} paths",
        args.out_dir.display(),
        built.records.len()
    );
    let output = BuildOutput {
        paths: built.records.len(),
        content_bytes: built.content.len(),
        tags: tag_count,
        assets: assets.iter().map(SplitOutput::from).collect(),
    };
    if args.json {
        return print_json(output);
    }
    println!(
        "Indexed {} paths ({} content bytes, {} tags) into {}",
        output.paths,
        output.content_bytes,
        output.tags,
        args.out_dir.display()
    );
    Ok(())
}

pub async fn assemble(ctx: &Context, args: AssembleArgs) -> Result<()> {
    let location = ctx.location()?;
    let fetcher = location.fetcher()?;
    let assembler = ManifestAssembler::with_config(fetcher, ctx.config.fetch);
    let bytes = assembler
        .assemble(&args.asset)
        .await
        .with_context(|| format!("Cannot assemble {} from {location}", args.asset))?;
    tokio::fs::write(&args.output, &bytes)
        .await
        .with_context(|| format!("Cannot write {}", args.output.display()))?;

    if args.json {
        return print_json(AssembleOutput {
            asset: args.asset,
            bytes: bytes.len(),
            output: args.output.display().to_string(),
        });
    }
    println!("{} bytes -> {}", bytes.len(), args.output.display());
    Ok(())
}
