use super::{print_json, Context, PRIMARY_SOURCE};
use crate::{AskArgs, CompareArgs, DescribeArgs};
use anyhow::Result;
use homemap_protocol::SourceSummary;
use homemap_search::{compare as compare_sources, describe_comparison, explain, summarize, Reasoner};
use std::collections::BTreeMap;

pub async fn ask(ctx: &mut Context, args: AskArgs) -> Result<()> {
    let source = ctx.primary().await?;
    let engine = source.engine();
    let reasoner = Reasoner::with_config(&engine, ctx.config.reasoner.clone());
    let query = args.query.join(" ");
    let answer = reasoner.answer(&query, &source.previews(), args.top_k);

    if args.json {
        return print_json(answer);
    }
    if answer.is_empty() {
        println!("No relevant paths found for {query:?}.");
    }
    for (rank, result) in answer.results.iter().enumerate() {
        println!("{:>2}. [{}] {}", rank + 1, result.score, result.path);
        if !result.snippet.is_empty() {
            println!("      {}", result.snippet);
        }
    }
    if !answer.synthesis.is_empty() {
        println!("\n{}", answer.synthesis.trim_end());
    }
    for line in &answer.trace {
        log::debug!("{line}");
    }
    Ok(())
}

pub async fn describe(ctx: &mut Context, args: DescribeArgs) -> Result<()> {
    ctx.primary().await?;
    let session = ctx.session();

    let mut summaries: BTreeMap<String, SourceSummary> = BTreeMap::new();
    for name in session.names() {
        if let Some(source) = session.get(name) {
            let summary = summarize(&source.engine(), source.tags.as_ref());
            summaries.insert(name.to_string(), summary);
        }
    }

    if args.json {
        return print_json(summaries);
    }
    for (name, summary) in &summaries {
        let location = session
            .get(name)
            .map(|s| s.location.to_string())
            .unwrap_or_default();
        println!("Source: {name} ({location})");
        print!("{}", explain(summary));
    }
    Ok(())
}

pub async fn compare(ctx: &mut Context, args: CompareArgs) -> Result<()> {
    let primary = ctx.primary().await?;
    let other = ctx.load_named("other", &args.other).await?;
    log::debug!("Comparing {} loaded sources", ctx.session().len());

    let comparison = compare_sources(
        PRIMARY_SOURCE,
        &primary.index,
        &args.other,
        &other.index,
    );
    if args.json {
        return print_json(comparison);
    }
    print!("{}", describe_comparison(&comparison));
    Ok(())
}
