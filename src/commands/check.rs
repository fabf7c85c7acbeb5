//! Corpus checks: validate, links, stats, and watching for changes

use anyhow::Result;
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode, DebouncedEvent};
use std::path::Path;
use std::time::Duration;

use super::print_json;
use crate::Blog;

/// Which checks `check --watch` re-runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Validate,
    Links,
    Stats,
}

pub fn run(blog: &Blog, check: Check, json: bool) -> Result<()> {
    match check {
        Check::Validate => validate(blog, json),
        Check::Links => links(blog, json),
        Check::Stats => stats(blog, json),
    }
}

pub fn validate(blog: &Blog, json: bool) -> Result<()> {
    let report = blog.validate()?;
    if json {
        return print_json(&report);
    }

    if report.is_clean() {
        println!("All posts and pages passed validation");
        return Ok(());
    }

    println!("Found {} problem(s):", report.total());
    for (category, items) in report.categories() {
        if items.is_empty() {
            continue;
        }
        println!("\n  {}:", category.replace('_', " "));
        for item in items {
            println!("    - {}", item);
        }
    }
    Ok(())
}

pub fn links(blog: &Blog, json: bool) -> Result<()> {
    let issues = blog.check_links()?;
    if json {
        return print_json(&issues);
    }

    if issues.is_empty() {
        println!("All links are fine");
        return Ok(());
    }

    println!("Found {} problem(s):", issues.len());
    for issue in &issues {
        println!("  - {}", issue);
    }
    Ok(())
}

pub fn stats(blog: &Blog, json: bool) -> Result<()> {
    let stats = blog.stats()?;
    if json {
        return print_json(&stats);
    }

    println!("Posts:        {}", stats.total_posts);
    println!("Pages:        {}", stats.total_pages);
    println!("Words:        {}", stats.word_count);
    println!("Tags:         {}", stats.tags.len());
    println!("Categories:   {}", stats.categories.len());
    if let Some(last) = &stats.last_updated {
        println!("Last updated: {}", last);
    }
    if !stats.tags.is_empty() {
        println!("\nTags: {}", stats.tags.join(", "));
    }
    if !stats.categories.is_empty() {
        println!("Categories: {}", stats.categories.join(", "));
    }
    Ok(())
}

/// Run `check` now and again whenever the sources or `_config.yml` change
pub fn watch(blog: &Blog, check: Check, json: bool) -> Result<()> {
    run(blog, check, json)?;

    let (tx, rx) = std::sync::mpsc::channel();
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    debouncer
        .watcher()
        .watch(&blog.source_dir, RecursiveMode::Recursive)?;
    tracing::debug!("Watching: {:?}", blog.source_dir);

    let config_path = blog.base_dir.join("_config.yml");
    if config_path.exists() {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
        tracing::debug!("Watching: {:?}", config_path);
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let changed: Vec<&DebouncedEvent> =
                    events.iter().filter(|e| is_relevant(&e.path)).collect();
                if changed.is_empty() {
                    continue;
                }

                println!();
                for event in &changed {
                    println!("File changed: {}", event.path.display());
                }
                if let Err(e) = run(blog, check, json) {
                    tracing::error!("Check failed: {}", e);
                }
            }
            Ok(Err(e)) => {
                tracing::error!("Watch error: {:?}", e);
            }
            Err(e) => {
                tracing::error!("Channel error: {:?}", e);
                break;
            }
        }
    }

    Ok(())
}

/// Editor swap files and VCS internals do not count as changes
fn is_relevant(path: &Path) -> bool {
    let ignored_dir = path
        .components()
        .any(|c| c.as_os_str() == ".git" || c.as_os_str() == "node_modules");
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    !ignored_dir && name != ".DS_Store" && !name.ends_with('~') && !name.ends_with(".swp")
}
