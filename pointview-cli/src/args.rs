use anyhow::{Context, Result};
use clap::Parser;
use pointview_pipeline::{ColorMode, ViewerConfig};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "pointview", version, about, long_about = None)]
pub struct Args {
    /// `.pcd` or `.xyz` files to load, in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Colour points by altitude or draw them all white
    #[arg(short, long)]
    pub color_mode: Option<ColorMode>,

    /// Point size handed to the render surface
    #[arg(short, long)]
    pub point_size: Option<f32>,

    /// JSON viewer configuration; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print one JSON report per file instead of text
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging for pointview crates
    #[arg(short, long)]
    pub debug: bool,
}

impl Args {
    /// Build the viewer configuration from `--config` and the flag overrides
    pub fn viewer_config(&self) -> Result<ViewerConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                serde_json::from_str::<ViewerConfig>(&text)
                    .with_context(|| format!("failed to parse config {}", path.display()))?
            }
            None => ViewerConfig::default(),
        };
        if let Some(mode) = self.color_mode {
            config = config.with_color_mode(mode);
        }
        if let Some(size) = self.point_size {
            config = config.with_point_size(size);
        }
        config.validate()?;
        Ok(config)
    }
}
