use super::{print_json, Context};
use crate::{ChildrenArgs, FindArgs, LsArgs, TagsArgs, TreeArgs};
use anyhow::{Context as _, Result};
use homemap_protocol::path_filters::PathFilter;
use homemap_search::{SearchEngine, TreeNode};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
struct TagSummary<'a> {
    tag: &'a str,
    paths: usize,
}

pub async fn ls(ctx: &mut Context, args: LsArgs) -> Result<()> {
    let source = ctx.primary().await?;
    let engine = source.engine();
    let pattern = args.pattern.as_deref();
    let filter = PathFilter::new(&args.include, &args.exclude, pattern)
        .with_context(|| format!("Invalid --pattern {:?}", pattern.unwrap_or_default()))?;
    if filter.is_active() {
        log::debug!("Filtering listing of {:?}", args.prefix);
    }
    let paths: Vec<&str> = engine
        .list_prefix(&args.prefix)
        .into_iter()
        .filter(|p| filter.allows(p))
        .collect();

    if args.json {
        return print_json(paths);
    }
    for path in &paths {
        println!("{path}");
    }
    log::info!("{} paths", paths.len());
    Ok(())
}

pub async fn children(ctx: &mut Context, args: ChildrenArgs) -> Result<()> {
    let source = ctx.primary().await?;
    let children = source.engine().list_immediate_children(&args.folder);

    if args.json {
        return print_json(children);
    }
    for child in &children {
        if child.is_leaf {
            println!("{}", child.name);
        } else {
            println!("{}/", child.name);
        }
    }
    Ok(())
}

pub async fn find(ctx: &mut Context, args: FindArgs) -> Result<()> {
    let source = ctx.primary().await?;
    let matches = source.engine().substring_search(&args.term, args.limit);

    if args.json {
        return print_json(matches);
    }
    for path in &matches {
        println!("{path}");
    }
    Ok(())
}

fn child_path(folder: &str, name: &str) -> String {
    let parent = folder.trim_end_matches('/');
    if parent.is_empty() && !folder.starts_with('/') {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

fn expand_to_depth(
    node: &mut TreeNode,
    folder: &str,
    engine: &SearchEngine<'_>,
    depth: usize,
) -> Result<()> {
    node.expand(folder, engine)?;
    if depth <= 1 {
        return Ok(());
    }
    if let TreeNode::Folder { children, .. } = node {
        for (name, child) in children.iter_mut() {
            if child.is_folder() {
                expand_to_depth(child, &child_path(folder, name), engine, depth - 1)?;
            }
        }
    }
    Ok(())
}

fn render(node: &TreeNode, indent: usize, out: &mut String) {
    let Some(children) = node.children() else {
        return;
    };
    for (name, child) in children {
        out.push_str(&"  ".repeat(indent));
        out.push_str(name);
        match child {
            TreeNode::File => {}
            TreeNode::Folder { expanded, .. } => {
                out.push('/');
                if !expanded {
                    out.push_str(" ...");
                }
            }
        }
        out.push('\n');
        render(child, indent + 1, out);
    }
}

pub async fn tree(ctx: &mut Context, args: TreeArgs) -> Result<()> {
    let source = ctx.primary().await?;
    let engine = source.engine();
    let mut root = TreeNode::folder();
    expand_to_depth(&mut root, &args.folder, &engine, args.depth.max(1))?;

    let mut out = String::new();
    render(&root, 0, &mut out);
    print!("{out}");
    log::debug!("{} tree nodes materialized", root.materialized());
    Ok(())
}

pub async fn tags(ctx: &mut Context, args: TagsArgs) -> Result<()> {
    let source = ctx.primary().await?;
    let Some(tags) = source.tags.as_ref() else {
        log::warn!("Source publishes no tags");
        if args.json {
            return print_json(Vec::<String>::new());
        }
        return Ok(());
    };

    let lines: Vec<String> = match (&args.tag, &args.path) {
        (Some(tag), _) => tags.paths_for(tag).map(str::to_string).collect(),
        (None, Some(path)) => tags.tags_for(path).into_iter().map(str::to_string).collect(),
        (None, None) => {
            let all: BTreeMap<&str, usize> = tags.tags().collect();
            if args.json {
                let summary: Vec<TagSummary<'_>> = all
                    .into_iter()
                    .map(|(tag, paths)| TagSummary { tag, paths })
                    .collect();
                return print_json(summary);
            }
            all.into_iter()
                .map(|(tag, paths)| format!("{tag}\t{paths}"))
                .collect()
        }
    };

    if args.json {
        return print_json(lines);
    }
    for line in &lines {
        println!("{line}");
    }
    Ok(())
}
