use crate::config::Config;
use crate::discovery::discover;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use viewcompose_composer::{generate_all, ComputedView, GeneratedView, PathCache, ViewCatalog};

#[derive(Debug, Args)]
pub struct ComposeArgs {
    /// Project directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: String,

    /// Only compose views with this name
    #[arg(long)]
    pub view: Option<String>,

    /// Output to stdout instead of files
    #[arg(long)]
    pub stdout: bool,

    /// Output directory (overrides config)
    #[arg(short, long)]
    pub out_dir: Option<String>,

    /// Worker threads (overrides config)
    #[arg(short, long)]
    pub workers: Option<usize>,
}

pub fn compose(args: ComposeArgs, cwd: &str) -> Result<()> {
    let root = PathBuf::from(cwd).join(&args.path);
    let mut config = Config::load(&root)?;
    if let Some(workers) = args.workers {
        config.workers = Some(workers);
    }
    if let Some(out_dir) = &args.out_dir {
        config.out_dir = out_dir.clone();
    }

    if config.modules.is_empty() {
        return Err(anyhow!("No modules configured in {}", root.display()));
    }

    println!("{}", "🔨 Composing views...".bright_blue().bold());

    let catalog: ViewCatalog = discover(&root, &config)?.into_iter().collect();
    for orphan in catalog.orphans() {
        println!(
            "  {} {} has extensions but no base view",
            "⚠️".yellow(),
            orphan.to_string().bright_white()
        );
    }

    let mut jobs = catalog.jobs(&config.module_names());
    if let Some(name) = &args.view {
        jobs.retain(|job| &job.base.name == name);
        if !catalog.has_view(name) {
            return Err(anyhow!("Unknown view: {}", name));
        }
    }

    if jobs.is_empty() {
        println!("{}", "⚠️  No extended views found".yellow());
        return Ok(());
    }

    println!("Found {} views with extensions", jobs.len());

    let guards = config.guards();
    let cache = Arc::new(PathCache::with_capacity(config.path_cache_capacity));
    let results = generate_all(&jobs, &guards, &cache, config.worker_count());
    info!(cached_paths = cache.len(), "Path cache");

    let out_dir = config.get_out_dir(&root);
    let mut success_count = 0;
    let mut error_count = 0;

    for generated in &results {
        match report(generated, &args, &out_dir) {
            Ok(Some(output)) => {
                success_count += 1;
                let skipped = if generated.skipped > 0 {
                    format!(" ({} skipped)", generated.skipped).yellow().to_string()
                } else {
                    String::new()
                };
                println!("  {} {} → {}{}", "✓".green(), generated.identity, output, skipped);
            }
            Ok(None) => {}
            Err(e) => {
                error_count += 1;
                eprintln!(
                    "  {} {} - {}",
                    "✗".red(),
                    generated.identity,
                    e.to_string().red()
                );
            }
        }
    }

    println!();
    if error_count == 0 {
        println!("{} Composed {} views successfully", "✅".green(), success_count);
        Ok(())
    } else {
        println!(
            "{} Composed {} views, {} errors",
            "⚠️".yellow(),
            success_count,
            error_count
        );
        Err(anyhow!("{} views failed to compose", error_count))
    }
}

fn report(generated: &GeneratedView, args: &ComposeArgs, out_dir: &Path) -> Result<Option<String>> {
    let view = match &generated.result {
        Ok(Some(view)) => view,
        Ok(None) => return Ok(None),
        Err(e) => return Err(anyhow!(e.clone())),
    };

    if args.stdout {
        println!("{}", view.xml);
        return Ok(Some("stdout".to_string()));
    }

    write_view(view, out_dir).map(Some)
}

/// Writes `<stem>.xml` and the `<stem>.json` record
fn write_view(view: &ComputedView, out_dir: &Path) -> Result<String> {
    let stem = file_stem(view)?;
    fs::create_dir_all(out_dir)?;

    let xml_file = out_dir.join(format!("{}.xml", stem));
    fs::write(&xml_file, format!("{}\n", view.xml))?;

    let json_file = out_dir.join(format!("{}.json", stem));
    fs::write(&json_file, serde_json::to_string_pretty(view)?)?;

    Ok(xml_file.display().to_string())
}

/// `<name>.<type>`, then `.<group+group>` for group restricted views
fn file_stem(view: &ComputedView) -> Result<String> {
    let groups = view.groups.join("+");
    let mut parts = vec![view.name.as_str(), view.view_type.as_str()];
    if !groups.is_empty() {
        parts.push(&groups);
    }

    for part in &parts {
        if part.is_empty() || part.contains(['/', '\\']) || part.contains("..") {
            return Err(anyhow!("Cannot use '{}' in an output file name", part));
        }
    }
    Ok(parts.join("."))
}
