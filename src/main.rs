//! Lookforge CLI
//!
//! Command-line front end for publishing character assets: geometry
//! caches, texture swaps, and look graph export.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use lookforge_core::AssetContext;
use lookforge_publish::texture::{optimized_candidates, texture_path};
use lookforge_publish::{
    next_version_path, AcceptAll, ConfirmPrompt, LookGraphWriter, PublishOptions, Publisher,
    SceneCacheWriter,
};
use lookforge_scene::{NodeId, SceneDescription, SceneGraph};

mod prefs;
use prefs::Prefs;

/// Lookforge - character asset publishing tool
#[derive(Parser)]
#[command(name = "lookforge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish a character asset from a scene description
    Publish(PublishArgs),

    /// Show the next free versioned path in a directory
    Version(VersionArgs),

    /// List texture nodes and their optimized-file candidates
    Textures(TexturesArgs),
}

#[derive(Args)]
struct PublishArgs {
    /// Path to the scene description (JSON)
    #[arg(short, long)]
    scene: PathBuf,

    /// Root nodes to publish (can be repeated)
    #[arg(short = 'r', long = "root")]
    roots: Vec<String>,

    /// Asset name (derived from the scene path when omitted)
    #[arg(long)]
    asset_name: Option<String>,

    /// Asset directory (derived from the scene path when omitted)
    #[arg(long)]
    asset_dir: Option<PathBuf>,

    /// Force the geometry (UV) publish step on
    #[arg(long, conflicts_with = "no_uv")]
    uv: bool,

    /// Skip the geometry (UV) publish step
    #[arg(long)]
    no_uv: bool,

    /// Force the look publish step on
    #[arg(long, conflicts_with = "no_look")]
    look: bool,

    /// Skip the look publish step
    #[arg(long)]
    no_look: bool,

    /// Look name; empty publishes the default look
    #[arg(long, default_value = "")]
    look_name: String,

    /// Render color space for optimized texture names
    #[arg(long, default_value = "ACEScg")]
    render_color_space: String,

    /// Expected color set name on publishable geometry
    #[arg(long, default_value = "Pref")]
    color_set: String,

    /// Answer yes to every confirmation
    #[arg(short, long)]
    yes: bool,

    /// Print the publish report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct VersionArgs {
    /// Directory to scan
    #[arg(short, long)]
    dir: PathBuf,

    /// Filename stem, including any trailing separator
    #[arg(short, long)]
    stem: String,

    /// File extension
    #[arg(short, long, default_value = "abc")]
    ext: String,
}

#[derive(Args)]
struct TexturesArgs {
    /// Path to the scene description (JSON)
    #[arg(short, long)]
    scene: PathBuf,

    /// Root nodes to inspect (can be repeated)
    #[arg(short = 'r', long = "root")]
    roots: Vec<String>,

    /// Render color space for optimized texture names
    #[arg(long, default_value = "ACEScg")]
    render_color_space: String,
}

/// Confirmation prompt reading from stdin
struct StdioConfirm;

impl ConfirmPrompt for StdioConfirm {
    fn confirm(&self, message: &str) -> bool {
        print!("{message} [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut line = String::new();
        if io::stdin().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Publish(args) => cmd_publish(args),
        Commands::Version(args) => cmd_version(args),
        Commands::Textures(args) => cmd_textures(args),
    }
}

/// Load a scene and resolve the requested root nodes
fn load_scene(path: &PathBuf, roots: &[String]) -> Result<(SceneGraph, Vec<NodeId>)> {
    let description = SceneDescription::load(path)
        .with_context(|| format!("Failed to load scene {}", path.display()))?;
    let graph = description.build().context("Failed to build scene")?;

    let selection = roots
        .iter()
        .map(|name| {
            graph
                .find(name)
                .ok_or_else(|| anyhow!("No node named '{name}' in the scene"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((graph, selection))
}

fn cmd_publish(args: PublishArgs) -> Result<()> {
    let mut prefs = Prefs::load();

    if args.roots.is_empty() {
        bail!("Nothing selected: pass at least one --root");
    }
    let (mut graph, selection) = load_scene(&args.scene, &args.roots)?;

    let asset = match (args.asset_name, args.asset_dir) {
        (Some(name), Some(dir)) => AssetContext::new(name, dir),
        _ => AssetContext::from_scene_path(&args.scene).ok_or_else(|| {
            anyhow!(
                "Scene {} is not under an assets directory; pass --asset-name and --asset-dir",
                args.scene.display()
            )
        })?,
    };
    info!(asset = %asset.name, dir = %asset.dir.display(), "publishing");

    let publish_uv = resolve_toggle(args.uv, args.no_uv, prefs.publish_uv());
    let publish_look = resolve_toggle(args.look, args.no_look, prefs.publish_look());

    let options = PublishOptions {
        publish_uv,
        publish_look,
        look_name: args.look_name,
        render_color_space: args.render_color_space,
        color_set_name: args.color_set,
    };
    let publisher = Publisher::new(SceneCacheWriter::new(), LookGraphWriter::new(), options);

    let report = if args.yes {
        publisher.publish(&mut graph, &asset, &selection, &AcceptAll)
    } else {
        publisher.publish(&mut graph, &asset, &selection, &StdioConfirm)
    }?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Publish complete for '{}':", asset.name);
        println!("  Textures swapped: {}", report.swapped_textures.len());
        match &report.cache_path {
            Some(path) => println!("  Geometry cache:   {}", path.display()),
            None => println!("  Geometry cache:   skipped"),
        }
        match &report.look_path {
            Some(path) => println!("  Look graph:       {}", path.display()),
            None => println!("  Look graph:       skipped"),
        }
    }

    // Written at shutdown, so the next run starts from this one's toggles
    prefs.publish_uv = Some(publish_uv);
    prefs.publish_look = Some(publish_look);
    if let Err(e) = prefs.save() {
        tracing::warn!(error = %e, "could not save preferences");
    }

    Ok(())
}

/// Explicit on/off flags win over the saved preference
fn resolve_toggle(on: bool, off: bool, saved: bool) -> bool {
    if off {
        false
    } else if on {
        true
    } else {
        saved
    }
}

fn cmd_version(args: VersionArgs) -> Result<()> {
    let out = next_version_path(&args.dir, &args.stem, &args.ext)
        .context("Failed to scan for versions")?;
    println!("{}", out.path.display());
    Ok(())
}

fn cmd_textures(args: TexturesArgs) -> Result<()> {
    if args.roots.is_empty() {
        bail!("Pass at least one --root");
    }
    let (graph, selection) = load_scene(&args.scene, &args.roots)?;

    let nodes = lookforge_publish::publisher::texture_nodes(&graph, &selection);
    if nodes.is_empty() {
        println!("No texture nodes in the selection's shading history");
        return Ok(());
    }

    println!("{:<20} {:<10} {}", "Node", "Swap", "Path");
    for node in nodes {
        let Some(path) = texture_path(&graph, node) else {
            println!("{:<20} {:<10} -", graph.name(node), "no-path");
            continue;
        };
        let status = if path.ends_with(".tx") {
            "done".to_string()
        } else {
            let color_space = graph
                .attr(node, "color_space")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let (current, legacy) = optimized_candidates(
                std::path::Path::new(&path),
                &color_space,
                &args.render_color_space,
            );
            if current.is_file() || legacy.is_file() {
                "ready".to_string()
            } else {
                "missing".to_string()
            }
        };
        println!("{:<20} {:<10} {}", graph.name(node), status, path);
    }

    Ok(())
}
