use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use wmtscaps::layers::LAYER;
use wmtscaps::{
    convert_bytes, extract_layers_with_config, present, Basemaps, ConvertOptions, ExtractConfig,
    MapView, Recorder, XmlConfig,
};

#[derive(Debug, Parser)]
#[command(
    name = "wmtscaps",
    version,
    about = "Turn a WMTS capabilities document into tile-layer descriptors"
)]
struct Args {
    /// Input file (defaults to stdin)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,
    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,
    /// What to emit
    #[arg(short, long, value_enum, default_value_t = Mode::Layers)]
    mode: Mode,
    /// Tag that always becomes a list (repeatable)
    #[arg(short = 'a', long = "force-array", value_name = "TAG")]
    force_array: Vec<String>,
    /// Attribution attached to every layer
    #[arg(long)]
    attribution: Option<String>,
    /// URL substring that moves a layer to the front
    #[arg(long, value_name = "MARKER")]
    priority_marker: Option<String>,
    /// Maximum element nesting depth (unlimited by default, 0 = unlimited)
    #[arg(long)]
    max_depth: Option<usize>,
    /// Maximum input size in bytes (unlimited by default, 0 = unlimited)
    #[arg(long)]
    max_size: Option<usize>,
    /// Index of the initially selected layer (map mode)
    #[arg(long, value_name = "ID", default_value_t = 0)]
    select: usize,
    /// Initial map center as LAT,LNG (map mode)
    #[arg(long, value_name = "LAT,LNG", value_parser = parse_center, allow_hyphen_values = true)]
    center: Option<[f64; 2]>,
    /// Initial zoom level (map mode)
    #[arg(long)]
    zoom: Option<u8>,
    /// Emit compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Ordered layer descriptors
    Layers,
    /// The converted tree
    Tree,
    /// Renderer calls that set up the basemap viewer
    Map,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let input_data = read_input(args.input.as_ref())?;
    info!(bytes = input_data.len(), mode = ?args.mode, "read input");

    let output = run(&args, &input_data)?;
    write_output(args.output.as_ref(), output.as_bytes())?;
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .init();
}

fn run(args: &Args, input: &[u8]) -> Result<String> {
    let options = convert_options(args);
    let tree = convert_bytes(input, &options).context("failed to convert XML document")?;

    if args.mode == Mode::Tree {
        return to_json(&tree, args.compact);
    }

    let layers = extract_layers_with_config(&tree, &extract_config(args))
        .context("failed to extract layers")?;
    debug!(layers = layers.len(), "extracted layers");

    match args.mode {
        Mode::Map => {
            let mut basemaps = Basemaps::new(layers);
            if !basemaps.layers().is_empty() && !basemaps.select(args.select) {
                bail!(
                    "layer {} does not exist; {} layers available",
                    args.select,
                    basemaps.layers().len()
                );
            }
            let mut recorder = Recorder::new();
            present(&basemaps, &map_view(args), &mut recorder)
                .context("failed to present basemaps")?;
            to_json(recorder.commands(), args.compact)
        }
        _ => to_json(&layers, args.compact),
    }
}

fn convert_options(args: &Args) -> ConvertOptions {
    let defaults = XmlConfig::default();
    let parser = XmlConfig::new(
        args.max_depth.unwrap_or(defaults.max_depth),
        args.max_size.unwrap_or(defaults.max_size),
    );
    let mut options = ConvertOptions::new().with_parser_config(parser);
    if args.mode != Mode::Tree {
        options = options.force_array(LAYER);
    }
    args.force_array
        .iter()
        .fold(options, |options, tag| options.force_array(tag.as_str()))
}

fn extract_config(args: &Args) -> ExtractConfig {
    let mut config = ExtractConfig::default();
    if let Some(attribution) = &args.attribution {
        config = config.with_attribution(attribution.as_str());
    }
    if let Some(marker) = &args.priority_marker {
        config = config.with_priority_marker(marker.as_str());
    }
    config
}

fn map_view(args: &Args) -> MapView {
    let mut view = MapView::default();
    if let Some([lat, lng]) = args.center {
        view = view.with_center(lat, lng);
    }
    if let Some(zoom) = args.zoom {
        view = view.with_zoom(zoom);
    }
    view
}

fn parse_center(value: &str) -> Result<[f64; 2], String> {
    let (lat, lng) = value
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LNG, got {value:?}"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<f64>()
            .map_err(|err| format!("invalid coordinate {part:?}: {err}"))
    };
    Ok([parse(lat)?, parse(lng)?])
}

fn to_json<T: Serialize + ?Sized>(value: &T, compact: bool) -> Result<String> {
    let mut json = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
    .context("failed to serialize output")?;
    json.push('\n');
    Ok(json)
}

fn read_input(path: Option<&PathBuf>) -> Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("failed to read input file {}", path.display())),
        None => {
            let mut buffer = Vec::new();
            io::stdin()
                .read_to_end(&mut buffer)
                .context("failed to read stdin")?;
            if buffer.iter().all(u8::is_ascii_whitespace) {
                bail!("no input provided on stdin");
            }
            Ok(buffer)
        }
    }
}

fn write_output(path: Option<&PathBuf>, data: &[u8]) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, data)
            .with_context(|| format!("failed to write output file {}", path.display())),
        None => {
            let mut stdout = io::stdout();
            stdout.write_all(data).context("failed to write stdout")?;
            Ok(())
        }
    }
}
