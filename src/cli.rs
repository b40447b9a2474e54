use crate::config::{Config, load_config};
use crate::layout::compute_routes;
use crate::parser::parse_diagram;
use crate::render::{RouteStates, bind_route_states, render_svg, write_output_svg};
use crate::route_dump::{RouteDump, write_route_dump};
use crate::templates::TemplateCatalog;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "schrt", version, about = "Route connectors of a schematic diagram")]
pub struct Args {
    /// Diagram definition (JSON5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for JSON and SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "json")]
    pub output_format: OutputFormat,

    /// Config JSON file (router defaults, theme)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Live-state JSON mapping route keys to {active, moving}
    #[arg(short = 's', long = "state")]
    pub state: Option<PathBuf>,

    /// Width of the preview when the diagram has no view box
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Height of the preview when the diagram has no view box
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    apply_size_overrides(&mut config, &args);

    let input = read_input(args.input.as_deref())?;
    let diagram = parse_diagram(&input)?;
    let catalog = TemplateCatalog::with_overrides(&diagram.templates);
    let routes = compute_routes(&diagram, &catalog, &config.layout)?;

    if args.output_format == OutputFormat::Json {
        return write_route_dump(args.output.as_deref(), &RouteDump::from_routes(&routes));
    }

    let states = match args.state.as_deref() {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading state file {}", path.display()))?;
            bind_route_states(&raw, &routes)?
        }
        None => RouteStates::new(),
    };
    let svg = render_svg(
        &diagram,
        &routes,
        &catalog,
        &config.theme,
        &config.render,
        &states,
    );
    match args.output_format {
        OutputFormat::Svg => write_output_svg(&svg, args.output.as_deref()),
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_png(&svg, &output, &config)
        }
        OutputFormat::Json => unreachable!("handled above"),
    }
}

fn apply_size_overrides(config: &mut Config, args: &Args) {
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, config: &Config) -> Result<()> {
    crate::render::write_output_png(svg, output, &config.render)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _config: &Config) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the 'png' feature"))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("reading diagram {}", path.display()));
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let args = Args::try_parse_from([
            "schrt",
            "-i",
            "plant.json5",
            "-e",
            "svg",
            "--state",
            "live.json",
            "-w",
            "640",
        ])
        .unwrap();
        assert_eq!(args.output_format, OutputFormat::Svg);
        assert_eq!(args.state.as_deref(), Some(Path::new("live.json")));
        let mut config = Config::default();
        apply_size_overrides(&mut config, &args);
        assert_eq!(config.render.width, 640.0);
        assert_eq!(config.render.height, Config::default().render.height);
    }

    #[test]
    fn png_needs_an_output_path() {
        assert!(ensure_output(&None, "png").is_err());
        assert_eq!(
            ensure_output(&Some(PathBuf::from("out.png")), "png").unwrap(),
            PathBuf::from("out.png")
        );
    }
}
