use std::{fs, path::Path, sync::Arc};

use anyhow::{Context, Result};
use inlay_config::InlayConfig;
use inlay_core::{
    DiskStore, HttpFetcher, ImageHandle, RenderPass, Resolver,
    model::{BatchComplete, CacheKey, ImageReference, PlaceholderReason},
};
use tokio::{runtime::Handle, task::block_in_place};
use tracing::info;

use crate::{CacheArgs, ResolveArgs, scan::ReferenceScanner};

pub fn print_keys(references: &[String]) {
    for raw in references {
        let reference = ImageReference::from(raw.as_str());
        println!("{}  {}", CacheKey::derive(&reference), reference);
    }
}

pub fn scan(document: &Path) -> Result<()> {
    for reference in read_references(document)? {
        println!("{reference}");
    }
    Ok(())
}

pub fn load_config(args: &CacheArgs) -> Result<InlayConfig> {
    let mut config = match &args.config {
        Some(path) => InlayConfig::load_from_file(path)?,
        None => InlayConfig::load_from_env()?.0,
    };
    if let Some(cache_dir) = &args.cache_dir {
        config.resolver.cache_dir = cache_dir.clone();
    }
    config.resolver.validate()?;
    Ok(config)
}

pub async fn resolve(mut config: InlayConfig, args: &ResolveArgs) -> Result<()> {
    if let Some(width) = args.width {
        config.resolver.layout.render_width = width;
    }
    if let Some(base_url) = &args.base_url {
        config.resolver.fetch.base_url = Some(base_url.clone());
    }
    config.resolver.validate()?;

    let references = read_references(&args.document)?;
    let fetcher = Arc::new(HttpFetcher::new(&config.resolver.fetch)?);
    let mut resolver = Resolver::new(config.resolver, fetcher, Handle::current())?;
    info!(
        document = %args.document.display(),
        references = references.len(),
        "[inlayctl] resolving document"
    );

    // Cache hits read and decode synchronously; keep that off the reactor.
    let first = block_in_place(|| resolver.resolve_all(&references))?;
    print_pass("initial pass", &references, &first);

    let done = match first.completed {
        Some(done) => done,
        None => resolver.wait_for_completion().await?,
    };
    print_summary(&done);

    if done.needs_rerender() {
        let second = block_in_place(|| resolver.resolve_all(&references))?;
        print_pass("re-render", &references, &second);
    }

    resolver.close();
    Ok(())
}

pub fn entries(config: &InlayConfig) -> Result<()> {
    let store = DiskStore::new(&config.resolver.cache_dir);
    let entries = store.entries()?;
    let total: u64 = entries.iter().map(|entry| entry.byte_len).sum();

    for entry in &entries {
        println!("{}  {:>10}", entry.key, entry.byte_len);
    }
    println!(
        "{} entries, {} bytes in {}",
        entries.len(),
        total,
        store.root().display()
    );
    Ok(())
}

pub fn sweep(config: &InlayConfig) -> Result<()> {
    let store = DiskStore::new(&config.resolver.cache_dir);
    let removed = store.sweep_temp_files()?;
    println!("removed {removed} temp files from {}", store.root().display());
    Ok(())
}

fn read_references(document: &Path) -> Result<Vec<ImageReference>> {
    let text = fs::read_to_string(document)
        .with_context(|| format!("failed to read {}", document.display()))?;
    let scanner = ReferenceScanner::new()
        .context("failed to compile reference patterns")?;
    Ok(scanner
        .scan(&text)
        .into_iter()
        .map(ImageReference::from)
        .collect())
}

fn print_pass(label: &str, references: &[ImageReference], pass: &RenderPass) {
    println!(
        "{label} ({}): {} ready, {} placeholders",
        pass.generation,
        pass.ready_count(),
        pass.placeholder_count()
    );
    let rows = references.iter().zip(&pass.handles).enumerate();
    for (index, (reference, handle)) in rows {
        let size = handle.display_size();
        let status = match handle {
            ImageHandle::Ready(image) => {
                format!("ready/{:?}", image.source).to_lowercase()
            }
            ImageHandle::Placeholder(placeholder) => match placeholder.reason {
                PlaceholderReason::Loading => "loading".to_string(),
                PlaceholderReason::Failed(kind) => format!("failed/{kind}"),
            },
        };
        println!(
            "{:>3}  {:<16}  {:>5}x{:<5}  {}",
            index + 1,
            status,
            size.width,
            size.height,
            reference
        );
    }
}

fn print_summary(done: &BatchComplete) {
    println!(
        "batch {} complete: {} of {} succeeded, {} failed, {} fetched",
        done.generation, done.succeeded, done.expected, done.failed, done.fetched
    );
}
