use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use rayon::prelude::*;

use heattree::input::InputFormat;
use heattree::render::{ColorMode, UIBox};
use heattree::{render_document, Config};

/// Render weighted path lists (CSV or coverage profiles) as treemap box trees.
#[derive(Debug, Parser)]
#[command(name = "heattree", version, about)]
struct Cli {
    /// Input files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Input format; `auto` detects coverage profiles by their `mode:` header
    #[arg(long, value_enum, default_value = "auto")]
    format: InputFormat,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<f64>,

    #[arg(long)]
    height: Option<f64>,

    #[arg(long, value_enum)]
    color: Option<ColorMode>,

    /// Built-in palette name (RdYlGn, RdBu)
    #[arg(long)]
    palette: Option<String>,

    /// Rescale heat to [0,1] before coloring
    #[arg(long)]
    normalize_heat: bool,

    /// Write one `<input name>.json` per input here (required for several inputs)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Pretty-print JSON
    #[arg(long)]
    pretty: bool,
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref()).context("Failed to load configuration")?;
        if let Some(width) = self.width {
            config.layout.width = width;
        }
        if let Some(height) = self.height {
            config.layout.height = height;
        }
        if let Some(mode) = self.color {
            config.color.mode = mode;
        }
        if let Some(palette) = &self.palette {
            config.color.palette = palette.clone();
            config.color.palette_file = None;
        }
        if self.normalize_heat {
            config.impute.normalize_heat = true;
        }
        config.validate().context("Invalid command-line overrides")?;
        Ok(config)
    }
}

fn render_file(path: &Path, format: InputFormat, config: &Config) -> Result<UIBox> {
    let document =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let root = render_document(&document, format, config)
        .with_context(|| format!("Failed to render {}", path.display()))?;
    Ok(root)
}

fn output_path(dir: &Path, input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "treemap".to_string());
    dir.join(format!("{name}.json"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("heattree=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;

    let Some(output_dir) = &cli.output_dir else {
        if cli.inputs.len() > 1 {
            bail!("--output-dir is required when rendering several inputs");
        }
        let root = render_file(&cli.inputs[0], cli.format, &config)?;
        println!("{}", root.to_json(cli.pretty)?);
        return Ok(());
    };

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    tracing::info!("Rendering {} inputs into {}", cli.inputs.len(), output_dir.display());

    let failures: Vec<(PathBuf, anyhow::Error)> = cli
        .inputs
        .par_iter()
        .filter_map(|input| {
            let result = render_file(input, cli.format, &config).and_then(|root| {
                let out = output_path(output_dir, input);
                let json = root.to_json(cli.pretty)?;
                fs::write(&out, json).with_context(|| format!("Failed to write {}", out.display()))?;
                tracing::info!("{} -> {}", input.display(), out.display());
                Ok(())
            });
            result.err().map(|e| (input.clone(), e))
        })
        .collect();

    for (input, err) in &failures {
        tracing::error!("{}: {:#}", input.display(), err);
    }
    if !failures.is_empty() {
        bail!("{} of {} inputs failed", failures.len(), cli.inputs.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "heattree",
            "--width",
            "300",
            "--color",
            "hue",
            "--palette",
            "RdBu",
            "--normalize-heat",
            "in.csv",
        ]);
        let config = cli.load_config().unwrap();
        assert_eq!(config.layout.width, 300.0);
        assert_eq!(config.layout.height, 360.0);
        assert_eq!(config.color.mode, ColorMode::Hue);
        assert_eq!(config.color.palette, "RdBu");
        assert!(config.impute.normalize_heat);
    }

    #[test]
    fn output_names_keep_input_file_name() {
        let out = output_path(Path::new("/tmp/out"), Path::new("data/cover.out"));
        assert_eq!(out, PathBuf::from("/tmp/out/cover.out.json"));
    }
}
