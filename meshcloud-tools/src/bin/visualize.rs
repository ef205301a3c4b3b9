//! Render the extracted vertex table as 3D and 2D scatter plots

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use meshcloud_core::PointSet;
use meshcloud_io::{OutputLayout, VertexCsvReader, DEFAULT_OUTPUT_DIR};
use meshcloud_reduction::{embedding_rows, Reducer, TsneReducer, UmapReducer};
use meshcloud_visualization::{
    save_scatter_3d, AnimationConfig, Animator, DirectorySink, LiveWindow, PacedSink, PreviewSink,
    RenderConfig, Scatter2d,
};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Embedding used by `--reduce`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Method {
    Umap,
    Tsne,
}

/// Scatter plots of vertices.csv, optionally animated or reduced to 2D
#[derive(Parser, Debug)]
#[command(name = "visualize")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Vertex table to read [default: <output-dir>/vertices.csv]
    #[arg(long)]
    input: Option<PathBuf>,

    /// Play the settling animation instead of a static render
    #[arg(long)]
    animate: bool,

    /// Play the animation in real time in a window, or into a single
    /// preview image when no window can be opened
    #[arg(long, requires = "animate")]
    live: bool,

    /// Number of animation frames
    #[arg(long, default_value_t = 200)]
    frames: usize,

    /// Milliseconds between live frames
    #[arg(long, default_value_t = 50)]
    interval_ms: u64,

    /// View box zoom; values below 1 zoom out
    #[arg(long, default_value_t = 0.5)]
    zoom: f32,

    /// Draw the box, axes and ticks
    #[arg(long)]
    verbose: bool,

    /// Ignore per-point colours
    #[arg(long)]
    no_color: bool,

    /// Also project the points to 2D and plot them
    #[arg(long)]
    reduce: bool,

    /// Embedding used for the 2D projection
    #[arg(long, value_enum, default_value_t = Method::Umap)]
    method: Method,

    /// Directory receiving the renders
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,
}

fn main() -> Result<()> {
    meshcloud_tools::init_tracing();
    let args = Args::parse();
    let layout = OutputLayout::new(&args.output_dir);
    let input = args.input.clone().unwrap_or_else(|| layout.vertices_csv());

    let table = VertexCsvReader::read_table(&input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let with_colors = !args.no_color && table.is_colored();
    if !args.no_color && !with_colors {
        warn!("{} has no colour columns; using the default marker colour", input.display());
    }
    let points = table.to_point_set(with_colors)?;

    let render = RenderConfig {
        verbose: args.verbose,
        color_points: with_colors,
        zoom: args.zoom,
        ..RenderConfig::default()
    };

    if args.animate {
        let animation = AnimationConfig {
            frames: args.frames,
            interval: Duration::from_millis(args.interval_ms),
            zoom: args.zoom,
            ..AnimationConfig::default()
        };
        let animator = Animator::new(render.clone(), animation, &points)?;

        if args.live {
            play_live(&animator, &points, &render, &layout)?;
        } else {
            let mut sink = DirectorySink::new(layout.clone());
            animator.run(&points, &mut sink).context("animation failed")?;
        }
    } else {
        save_scatter_3d(&points, render.clone(), layout.static_render())
            .context("static render failed")?;
    }

    if args.reduce {
        let reducer: Box<dyn Reducer> = match args.method {
            Method::Umap => Box::new(UmapReducer::default()),
            Method::Tsne => Box::new(TsneReducer::default()),
        };
        let embedding = reducer
            .reduce(&points.positions)
            .context("dimensionality reduction failed")?;
        let rows = embedding_rows(&embedding)?;

        let title = format!("{} 2D Projection", reducer.name());
        let plot = Scatter2d::new(render)?.render(
            &rows,
            points.colors.as_deref(),
            &reducer.component_labels(),
            &title,
        )?;
        plot.canvas.save(layout.projection_render())?;
        info!("Saved {} to {}", plot.title, layout.projection_render().display());
    }

    Ok(())
}

/// Play the animation in a window, rendering on a worker thread. Falls back
/// to a paced preview image when the window cannot be opened.
fn play_live(animator: &Animator, points: &PointSet, render: &RenderConfig, layout: &OutputLayout) -> Result<()> {
    let config = animator.config().clone();
    let interval = config.interval;
    let (sink, window) = LiveWindow::channel("meshcloud", render.width, render.height, &config);

    let (worker_animator, worker_points) = (animator.clone(), points.clone());
    let worker = thread::Builder::new()
        .name("meshcloud-render".to_string())
        .spawn(move || {
            let mut sink = PacedSink::new(sink, interval);
            worker_animator.run(&worker_points, &mut sink).map(|_| ())
        })
        .context("failed to start the render thread")?;

    let shown = window.run();
    let played = worker
        .join()
        .map_err(|_| anyhow!("render thread panicked"))?;

    match shown {
        Ok(()) => {
            if let Err(e) = played {
                warn!("Playback stopped early: {e}");
            }
            Ok(())
        }
        Err(e) => {
            warn!("{e}; live preview at {} instead", layout.preview().display());
            let mut sink = PacedSink::new(PreviewSink::in_layout(layout), interval);
            animator.run(points, &mut sink).context("animation failed")?;
            Ok(())
        }
    }
}
