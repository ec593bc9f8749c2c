// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! scad-scene CLI

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use scad_scene::ast::from_json_str;
use scad_scene::convert::MirrorMode;
use scad_scene::io::metadata_json;
use scad_scene::{
    export_stl, import_scad_file, AstNode, ConversionConfig, Converter, MeshHandle, Scene,
};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "scad-scene")]
#[command(about = "Convert OpenSCAD sources and AST JSON into scene meshes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./scad-scene.toml when present)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert .scad or AST .json files into meshes
    Convert {
        /// Input files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Directory for STL output
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Emit one mesh per root statement instead of a single union
        #[arg(long)]
        separate: bool,

        /// Timeout per conversion in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Maximum operand triangles per boolean step
        #[arg(long)]
        max_complexity: Option<usize>,

        /// Skip mesh cleanup after boolean steps
        #[arg(long)]
        no_optimize: bool,

        /// How mirror() is applied
        #[arg(long, value_enum)]
        mirror: Option<MirrorArg>,

        /// Write mesh metadata as JSON
        #[arg(long, value_name = "FILE")]
        metadata: Option<PathBuf>,
    },

    /// Parse a .scad file and print its AST as JSON
    Parse {
        /// Input SCAD file
        input: PathBuf,

        /// Output JSON file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum MirrorArg {
    Reflection,
    AxisFlip,
}

impl From<MirrorArg> for MirrorMode {
    fn from(arg: MirrorArg) -> Self {
        match arg {
            MirrorArg::Reflection => MirrorMode::Reflection,
            MirrorArg::AxisFlip => MirrorMode::AxisFlip,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Convert {
            inputs,
            output,
            separate,
            timeout_ms,
            max_complexity,
            no_optimize,
            mirror,
            metadata,
        } => {
            let mut config = config;
            if let Some(timeout_ms) = timeout_ms {
                config = config.with_timeout_ms(timeout_ms);
            }
            if let Some(limit) = max_complexity {
                config = config.with_max_complexity(limit);
            }
            if no_optimize {
                config = config.with_optimization(false);
            }
            if let Some(mode) = mirror {
                config = config.with_mirror_mode(mode.into());
            }
            convert_command(&inputs, output.as_deref(), separate, metadata.as_deref(), &config)
                .await
        }
        Commands::Parse { input, output } => parse_command(&input, output.as_deref()),
        Commands::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_config(path: Option<&Path>) -> Result<ConversionConfig> {
    match path {
        Some(path) => {
            let mut config = ConversionConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            config.apply_overrides(|name| std::env::var(name).ok())?;
            Ok(config)
        }
        None => Ok(ConversionConfig::load()?),
    }
}

fn read_nodes(path: &Path) -> Result<Vec<AstNode>> {
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(from_json_str(&content).with_context(|| format!("Invalid AST in {}", path.display()))?)
    } else {
        Ok(import_scad_file(path).with_context(|| format!("Failed to parse {}", path.display()))?)
    }
}

async fn convert_command(
    inputs: &[PathBuf],
    output: Option<&Path>,
    separate: bool,
    metadata: Option<&Path>,
    config: &ConversionConfig,
) -> Result<()> {
    if let Some(dir) = output {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let converter = Converter::new();
    let mut scene = Scene::new();
    let mut failures = 0usize;
    let start = Instant::now();

    let progress = (inputs.len() > 1).then(|| {
        let pb = ProgressBar::new(inputs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    });

    for input in inputs {
        if let Some(pb) = &progress {
            pb.set_message(input.display().to_string());
        }

        match convert_input(&converter, input, separate, config).await {
            Ok(handles) => {
                for (i, handle) in handles.into_iter().enumerate() {
                    if let Some(dir) = output {
                        let path = stl_path(dir, input, separate.then_some(i));
                        export_stl(&handle, &path)
                            .with_context(|| format!("Failed to write {}", path.display()))?;
                    }
                    report_handle(input, &handle, progress.is_some());
                    scene.add(handle);
                }
            }
            Err(error) => {
                failures += 1;
                let line = format!("{} {}: {:#}", "Error:".red().bold(), input.display(), error);
                match &progress {
                    Some(pb) => pb.println(line),
                    None => eprintln!("{}", line),
                }
            }
        }

        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = &progress {
        pb.finish_with_message("done");
    }

    if let Some(path) = metadata {
        let json = metadata_json(scene.iter().map(MeshHandle::metadata))?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    print_summary(&scene, inputs.len(), failures, start);

    if failures > 0 {
        bail!("{} of {} inputs failed", failures, inputs.len());
    }
    Ok(())
}

async fn convert_input(
    converter: &Converter,
    input: &Path,
    separate: bool,
    config: &ConversionConfig,
) -> Result<Vec<MeshHandle>> {
    let nodes = read_nodes(input)?;
    log::info!("{}: {} root statement(s)", input.display(), nodes.len());

    if separate {
        Ok(converter.convert_all(&nodes, config).await?)
    } else {
        Ok(vec![converter.convert_nodes_to_union(&nodes, config).await?])
    }
}

fn stl_path(dir: &Path, input: &Path, index: Option<usize>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mesh".to_string());
    match index {
        Some(i) => dir.join(format!("{}-{}.stl", stem, i)),
        None => dir.join(format!("{}.stl", stem)),
    }
}

fn report_handle(input: &Path, handle: &MeshHandle, quiet: bool) {
    if quiet {
        return;
    }
    let meta = handle.metadata();
    let size = meta.bounding_box.size();
    println!(
        "{} {} {} {}",
        "✓".green(),
        input.display().to_string().bold(),
        format!("[{}]", meta.id).bright_black(),
        format!(
            "{} triangles, {} vertices, size {:.3} x {:.3} x {:.3}",
            meta.triangle_count, meta.vertex_count, size.x, size.y, size.z
        )
        .cyan()
    );
}

fn print_summary(scene: &Scene, inputs: usize, failures: usize, start: Instant) {
    println!("\n{}", "═".repeat(60).bright_black());
    println!(
        "{} {} mesh(es) from {} input(s) in {:.2?}",
        "Converted".green().bold(),
        scene.len(),
        inputs - failures,
        start.elapsed()
    );
    println!("  Triangles: {}", scene.triangle_count());
    if !scene.is_empty() {
        let bbox = scene.bounding_box();
        println!(
            "  Bounds:    [{:.3}, {:.3}, {:.3}] .. [{:.3}, {:.3}, {:.3}]",
            bbox.min.x, bbox.min.y, bbox.min.z, bbox.max.x, bbox.max.y, bbox.max.z
        );
    }
    if failures > 0 {
        println!("  {}", format!("Failed:    {}", failures).red());
    }
    println!("{}", "═".repeat(60).bright_black());
}

fn parse_command(input: &Path, output: Option<&Path>) -> Result<()> {
    let nodes = read_nodes(input)?;
    let json = serde_json::to_string_pretty(&nodes)?;

    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{} AST written to {}", "✓".green(), path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
