use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use glam::Vec3;
use meshpage_common::{LodTier, TextureRef};
use meshpage_generators::{FernConfig, FernGenerator, GroundPatchGenerator, StripeGenerator};
use meshpage_geom::{GeomRequirements, RenderState, RequirementCollection};
use meshpage_paging::{MeshManager, PagingConfig, SharedGenerator};
use meshpage_render::{DebugTextRenderer, DrawListRenderer, RenderView, Renderer};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "meshpage-cli", about = "CLI tool for paged procedural meshes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// YAML paging configuration; built-in defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    scene: SceneArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GeneratorKind {
    Fern,
    Ground,
    Stripes,
}

#[derive(clap::Args)]
struct SceneArgs {
    /// Generators to run, comma separated
    #[arg(
        long,
        global = true,
        value_enum,
        value_delimiter = ',',
        default_value = "stripes"
    )]
    generators: Vec<GeneratorKind>,

    /// Texture for fern leaves; untextured ferns use vertex colour
    #[arg(long, global = true)]
    leaf_texture: Option<String>,

    /// Texture for ground patches
    #[arg(long, global = true, default_value = "ground")]
    ground_texture: String,

    /// Seed for fern placement
    #[arg(long, global = true, default_value = "0")]
    seed: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Move the focus along a straight path and report what each step paged
    Walk {
        /// Start point as x,y
        #[arg(long, default_value = "0,0", value_parser = parse_point)]
        from: Vec3,
        /// End point as x,y
        #[arg(long, default_value = "10,10", value_parser = parse_point)]
        to: Vec3,
        /// Number of steps after the start point
        #[arg(short, long, default_value = "10")]
        steps: u32,
    },
    /// Show the merged requirements and batch plan of every tier
    Plan {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Page in around one focus point and dump the live blocks
    Render {
        /// Focus point as x,y
        #[arg(long, default_value = "0,0", value_parser = parse_point)]
        at: Vec3,
        /// Draw distance
        #[arg(long, default_value_t = f32::INFINITY)]
        far: f32,
        /// Include each block's batch node tree
        #[arg(long)]
        nodes: bool,
        /// Emit the draw list as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_point(text: &str) -> Result<Vec3, String> {
    let (x, y) = text
        .split_once(',')
        .ok_or_else(|| format!("expected x,y, got {text:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f32>()
            .map_err(|e| format!("bad coordinate {v:?}: {e}"))
    };
    Ok(Vec3::new(parse(x)?, parse(y)?, 0.0))
}

fn build_generators(scene: &SceneArgs) -> Vec<SharedGenerator> {
    scene
        .generators
        .iter()
        .map(|kind| -> SharedGenerator {
            match kind {
                GeneratorKind::Fern => Arc::new(FernGenerator::new(FernConfig {
                    leaf_texture: scene.leaf_texture.as_deref().map(TextureRef::new),
                    seed: scene.seed,
                    ..FernConfig::default()
                })),
                GeneratorKind::Ground => Arc::new(GroundPatchGenerator::new(TextureRef::new(
                    scene.ground_texture.as_str(),
                ))),
                GeneratorKind::Stripes => Arc::new(StripeGenerator),
            }
        })
        .collect()
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<PagingConfig> {
    match path {
        Some(path) => PagingConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(PagingConfig::default()),
    }
}

#[derive(Serialize)]
struct PlanNode {
    index: usize,
    parent: Option<usize>,
    state: RenderState,
}

#[derive(Serialize)]
struct TierPlan {
    lod: LodTier,
    requirements: Vec<GeomRequirements>,
    nodes: Vec<PlanNode>,
    assignment: Vec<usize>,
}

fn tier_plan(
    config: &meshpage_paging::LevelConfig,
    generators: &[SharedGenerator],
) -> anyhow::Result<TierPlan> {
    let mut collection =
        RequirementCollection::with_strategy(config.batching.strategy()).with_limits(config.limits);
    for g in generators {
        g.register_requirements(config.lod, &mut collection);
    }
    let layout = collection
        .draw_resource_factory()?
        .map(|factory| Arc::clone(factory.layout()));
    let Some(layout) = layout else {
        return Ok(TierPlan {
            lod: config.lod,
            requirements: Vec::new(),
            nodes: Vec::new(),
            assignment: Vec::new(),
        });
    };
    let plan = layout.plan();
    Ok(TierPlan {
        lod: config.lod,
        requirements: layout.requirements().to_vec(),
        nodes: plan
            .nodes()
            .iter()
            .enumerate()
            .map(|(index, n)| PlanNode {
                index,
                parent: n.parent,
                state: n.state.clone(),
            })
            .collect(),
        assignment: plan.assignment().to_vec(),
    })
}

fn print_plan(plan: &TierPlan) {
    println!("{}: {} requirements", plan.lod, plan.requirements.len());
    for (i, r) in plan.requirements.iter().enumerate() {
        let texture = r
            .texture
            .as_ref()
            .map_or_else(|| "-".to_string(), TextureRef::to_string);
        println!(
            "  req {i}: layout={} texture={texture} transparent={} settings={} -> node {}",
            r.vertex_layout,
            r.transparency,
            r.shader_settings.len(),
            plan.assignment[i]
        );
    }
    for n in &plan.nodes {
        let parent = n.parent.map_or_else(|| "root".to_string(), |p| p.to_string());
        println!(
            "  node {} parent={parent} texture={:?} transparent={}",
            n.index,
            n.state.texture.as_ref().map(TextureRef::name),
            n.state.transparency
        );
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = load_config(cli.config.as_ref())?;
    let generators = build_generators(&cli.scene);

    match cli.command {
        Commands::Info => {
            println!("meshpage-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", meshpage_common::crate_info());
            println!("geom: {}", meshpage_geom::crate_info());
            println!("cache: {}", meshpage_cache::crate_info());
            println!("paging: {}", meshpage_paging::crate_info());
            println!("generators: {}", meshpage_generators::crate_info());
            println!("render: {}", meshpage_render::crate_info());
            for level in &config.levels {
                println!(
                    "{}: block_size={} cells={}x{} hysteresis={} batching={:?}",
                    level.lod,
                    level.block_size,
                    level.cell_capacity,
                    level.cell_capacity,
                    level.hysteresis,
                    level.batching
                );
            }
        }
        Commands::Walk { from, to, steps } => {
            let mut manager = MeshManager::new(generators, &config)?;
            let steps = steps.max(1);
            println!("Walk: ({}, {}) -> ({}, {}) in {steps} steps", from.x, from.y, to.x, to.y);
            for i in 0..=steps {
                let focus = from.lerp(to, i as f32 / steps as f32);
                let stats = manager.update(focus)?;
                println!(
                    "step {i:>3} focus=({:.2}, {:.2}) recentered={} populated={} evicted={} \
                     blocks={} time={:?}",
                    focus.x,
                    focus.y,
                    stats.recentered(),
                    stats.populated(),
                    stats.evicted(),
                    stats.blocks,
                    stats.elapsed
                );
            }
            for level in manager.levels() {
                let t = level.cache().totals();
                println!(
                    "{}: recenters={} populated={} evicted={} failed={}",
                    level.lod(),
                    t.recenters,
                    t.populated,
                    t.evicted,
                    t.failed
                );
            }
        }
        Commands::Plan { json } => {
            let plans = config
                .levels
                .iter()
                .map(|level| tier_plan(level, &generators))
                .collect::<anyhow::Result<Vec<_>>>()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plans)?);
            } else {
                plans.iter().for_each(print_plan);
            }
        }
        Commands::Render {
            at,
            far,
            nodes,
            json,
        } => {
            let mut manager = MeshManager::new(generators, &config)?;
            manager.update(at)?;
            let view = RenderView { eye: at, far };
            if json {
                let list = DrawListRenderer.render(&manager, &view);
                println!("{}", serde_json::to_string_pretty(&list)?);
            } else {
                let renderer = DebugTextRenderer { show_nodes: nodes };
                print!("{}", renderer.render(&manager, &view));
            }
        }
    }

    Ok(())
}
