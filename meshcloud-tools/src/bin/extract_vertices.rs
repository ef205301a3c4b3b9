//! Extract per-loop vertex rows from an OBJ scene into `vertices.csv`

use anyhow::{Context, Result};
use clap::Parser;
use meshcloud_extract::{ExtractConfig, Extractor, ImageNodeResolver, MissingTexturePolicy, ObjScene};
use meshcloud_io::DEFAULT_OUTPUT_DIR;
use std::path::PathBuf;

/// Write one CSV row per retained (face, vertex) pair of a mesh scene
#[derive(Parser, Debug)]
#[command(name = "extract_vertices")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// OBJ file to read; its materials supply the textures
    #[arg(long)]
    obj: PathBuf,

    /// Root object; the file stem selects every object in the file
    #[arg(long)]
    root: Option<String>,

    /// Texture name for each mesh under the root, in order
    #[arg(long = "texture")]
    textures: Vec<String>,

    /// Probability of keeping each (face, vertex) pair
    #[arg(long, default_value_t = 1.0)]
    keep_prob: f64,

    /// Seed for reproducible thinning
    #[arg(long)]
    seed: Option<u64>,

    /// Write positions only, without sampling textures
    #[arg(long)]
    no_color: bool,

    /// Abort instead of skipping objects whose texture is missing
    #[arg(long)]
    fail_on_missing_texture: bool,

    /// Directory receiving vertices.csv and texture copies
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,
}

impl Args {
    fn config(&self) -> ExtractConfig {
        let defaults = ExtractConfig::default();
        ExtractConfig {
            root_object: self.root.clone().unwrap_or(defaults.root_object),
            texture_names: self.textures.clone(),
            keep_prob: self.keep_prob,
            seed: self.seed,
            sample_colors: !self.no_color,
            missing_texture: if self.fail_on_missing_texture {
                MissingTexturePolicy::Fail
            } else {
                MissingTexturePolicy::SkipObject
            },
            output_dir: self.output_dir.clone(),
        }
    }
}

fn main() -> Result<()> {
    meshcloud_tools::init_tracing();
    let args = Args::parse();

    let scene = ObjScene::load(&args.obj)
        .with_context(|| format!("failed to load scene {}", args.obj.display()))?;
    let extractor = Extractor::new(args.config()).context("invalid extraction settings")?;
    let resolver = ImageNodeResolver::exporting_to(extractor.config().layout().root());

    let path = extractor
        .run(&scene, &resolver)
        .context("vertex extraction failed")?;

    println!("CSV saved: {}", path.display());
    Ok(())
}
