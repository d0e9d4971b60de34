use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use wingspan_animation::AnimationHandle;
use wingspan_assets::{ModelData, import_file};
use wingspan_common::{AppConfig, PositionFeed};
use wingspan_input::{Key, KeyEvent, KeyboardHub};
use wingspan_overlay::{DebugPanel, Instructions, loader_label};
use wingspan_render::{DebugTextRenderer, RenderView, Renderer};
use wingspan_scene::{FrameTick, SceneAssets, SceneKind, compose};

#[derive(Parser)]
#[command(name = "wingspan-cli", about = "Headless tools for the wingspan scenes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Import a glTF/GLB model and print its structure
    Inspect {
        /// Model file
        model: PathBuf,
    },
    /// Run a scene headless for a number of frames
    Simulate {
        /// Scene to run: butterfly or city
        #[arg(short, long, default_value = "butterfly")]
        scene: SceneKind,
        /// Number of frames to run
        #[arg(short, long, default_value = "120")]
        frames: u64,
        /// Simulated frame rate
        #[arg(long, default_value = "60")]
        fps: f32,
        /// Comma-separated keys (up, down, left, right). Key N is pressed on
        /// frame 2N+1 and released on the next frame.
        #[arg(short, long, value_delimiter = ',')]
        keys: Vec<String>,
        /// YAML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Asset root, overriding the configuration
        #[arg(long)]
        assets: Option<PathBuf>,
        /// Skip model loading
        #[arg(long)]
        no_models: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("wingspan-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("input: {}", wingspan_input::crate_info());
            println!("assets: {}", wingspan_assets::crate_info());
            println!("scene: {}", wingspan_scene::crate_info());
            println!("render: {}", wingspan_render::crate_info());
            println!("overlay: {}", wingspan_overlay::crate_info());
            let scenes: Vec<String> = SceneKind::ALL.iter().map(ToString::to_string).collect();
            println!("scenes: {}", scenes.join(", "));
        }
        Commands::Inspect { model } => {
            let data = import_file(&model)
                .with_context(|| format!("failed to import {}", model.display()))?;
            inspect(&data);
        }
        Commands::Simulate {
            scene,
            frames,
            fps,
            keys,
            config,
            assets,
            no_models,
        } => {
            anyhow::ensure!(fps > 0.0, "--fps must be positive");
            let mut config = AppConfig::load_or_default(config.as_deref())?;
            if let Some(root) = assets {
                config.assets.root = root;
            }
            let keys: Vec<Key> = keys.iter().map(|k| Key::from_name(k)).collect();
            simulate(scene, frames, fps, &keys, &config, !no_models);
        }
    }

    Ok(())
}

fn inspect(model: &ModelData) {
    println!("Model '{}' [{}]", model.name, model.id.short());
    println!(
        "Nodes: {} (roots: {})  Primitives: {}  Vertices: {}  Triangles: {}",
        model.nodes.len(),
        model.roots.len(),
        model.primitives.len(),
        model.vertex_count(),
        model.triangle_count()
    );
    let b = model.bounds;
    println!(
        "Bounds: min=({:.2}, {:.2}, {:.2}) max=({:.2}, {:.2}, {:.2})",
        b.min.x, b.min.y, b.min.z, b.max.x, b.max.y, b.max.z
    );
    for (i, node) in model.nodes.iter().enumerate() {
        let t = node.translation;
        println!(
            "  node {i} '{}' parent={:?} t=({:.2}, {:.2}, {:.2})",
            node.name.as_deref().unwrap_or("-"),
            node.parent,
            t.x,
            t.y,
            t.z
        );
    }
    for (i, prim) in model.primitives.iter().enumerate() {
        let [r, g, b, a] = prim.base_color;
        let color = format!("({r:.2}, {g:.2}, {b:.2}, {a:.2})");
        let skin = match &prim.skin {
            Some(binding) => format!(" skin={}", binding.skin),
            None => String::new(),
        };
        println!(
            "  primitive {i} node={} vertices={} triangles={}{skin} color={color}",
            prim.node,
            prim.vertices.len(),
            prim.indices.len() / 3
        );
    }
    for (i, skin) in model.skins.iter().enumerate() {
        println!(
            "  skin {i} '{}' joints={}",
            skin.name.as_deref().unwrap_or("-"),
            skin.joints.len()
        );
    }
    let shared = Arc::new(model.clone());
    for (i, clip) in model.clips.iter().enumerate() {
        println!(
            "  clip {i} '{}' duration={:.2}s tracks={}",
            clip.name,
            clip.duration,
            clip.track_count()
        );
        if let Some(mut handle) = AnimationHandle::new(Arc::clone(&shared), i) {
            handle.update(clip.duration * 0.5);
            if let Some(mid) = model.bounds_with(&handle.globals()) {
                let size = mid.size();
                println!(
                    "    mid-clip size=({:.2}, {:.2}, {:.2})",
                    size.x, size.y, size.z
                );
            }
        }
    }
}

fn simulate(
    kind: SceneKind,
    frames: u64,
    fps: f32,
    keys: &[Key],
    config: &AppConfig,
    load_models: bool,
) {
    let hub = KeyboardHub::new();
    let feed = PositionFeed::new();
    let mut scene = compose(kind, &hub, feed.clone(), &config.assets);

    if load_models {
        let mut loads = SceneAssets::request_all(scene.as_mut());
        while loads.is_loading() {
            if let Some(percent) = loads.percent() {
                tracing::debug!("{}", loader_label(percent));
            }
            loads.poll(scene.as_mut());
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    // Simulated wall clock, so the debug panel samples on frame time.
    let t0 = Instant::now();
    let mut panel = DebugPanel::start_at(feed, config.overlay.debug_interval(), t0);

    for frame in 1..=frames {
        let index = (frame - 1) as usize;
        if let Some(&key) = keys.get(index / 2) {
            if index % 2 == 0 {
                hub.dispatch(KeyEvent::down(key));
            } else {
                hub.dispatch(KeyEvent::up(key));
            }
        }
        let tick = FrameTick::fixed(frame, fps);
        scene.update(&tick);
        panel.poll_at(t0 + Duration::from_secs_f32(tick.elapsed));
    }

    let graph = scene.graph();
    let view = RenderView::from(scene.camera());
    print!("{}", DebugTextRenderer::new().render(&graph, &view));

    let overlays = scene.overlays();
    if overlays.instructions {
        for line in Instructions::BUTTERFLY.lines() {
            println!("{line}");
        }
    }
    if overlays.debug_panel {
        println!("{}", panel.text());
    }
    if let Some(message) = scene.load_failure() {
        println!("{message}");
    }
    println!("Simulated {frames} frames of the {kind} scene");
}
