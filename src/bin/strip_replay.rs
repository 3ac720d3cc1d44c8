use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use stripchart_rs::api::{StreamConfig, Window, WindowConfig};
use stripchart_rs::telemetry::init_default_tracing;

const USAGE: &str = "usage: strip_replay <records-file> [--width <px>] [--height <px>] [--time-window <secs>] [--title <text>] [--config <json>] [--verbose]";

#[derive(Debug)]
struct CliArgs {
    input: PathBuf,
    config: Option<PathBuf>,
    title: Option<String>,
    width_px: f64,
    height_px: f64,
    time_window_secs: Option<f64>,
    verbose: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = parse_args()?;
    let _ = init_default_tracing(if args.verbose { "debug" } else { "info" });

    let config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|err| format!("failed to read `{}`: {err}", path.display()))?;
            WindowConfig::from_json_str(&raw).map_err(|err| err.to_string())?
        }
        None => WindowConfig::default(),
    };
    let mut window = Window::new(config).map_err(|err| err.to_string())?;

    let mut stream_config = StreamConfig::new();
    if let Some(title) = &args.title {
        stream_config = stream_config.with_title(title.clone());
    }
    if let Some(seconds) = args.time_window_secs {
        stream_config = stream_config.with_time_window_secs(seconds);
    }
    let stream = window.create_stream(stream_config);
    window.resize(args.width_px, args.height_px);

    let file = File::open(&args.input)
        .map_err(|err| format!("failed to open `{}`: {err}", args.input.display()))?;
    let mut reader = BufReader::new(file);
    let summary = window
        .load_records(stream, &mut reader)
        .map_err(|err| format!("failed to load `{}`: {err}", args.input.display()))?;
    if args.verbose {
        eprintln!(
            "loaded {} lines: {} declarations, {} samples, {} skipped",
            summary.lines,
            summary.declarations,
            summary.samples,
            summary.skipped_unknown_channels + summary.skipped_duplicate_declarations
        );
    }

    window.prepare_artists();
    let json = window
        .snapshot()
        .to_json_contract_v1_pretty()
        .map_err(|err| err.to_string())?;
    println!("{json}");
    window.destroy();
    Ok(())
}

fn parse_args() -> Result<CliArgs, String> {
    let mut args = std::env::args().skip(1);
    let mut input = None::<PathBuf>;
    let mut config = None::<PathBuf>;
    let mut title = None::<String>;
    let mut width_px = 1200.0;
    let mut height_px = 800.0;
    let mut time_window_secs = None::<f64>;
    let mut verbose = false;

    while let Some(flag) = args.next() {
        match flag.as_str() {
            "--width" => width_px = parse_number(&flag, args.next())?,
            "--height" => height_px = parse_number(&flag, args.next())?,
            "--time-window" => time_window_secs = Some(parse_number(&flag, args.next())?),
            "--title" => {
                title = Some(
                    args.next()
                        .ok_or_else(|| "missing value for --title".to_owned())?,
                );
            }
            "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --config".to_owned())?;
                config = Some(PathBuf::from(value));
            }
            "--verbose" | "-v" => verbose = true,
            "--help" | "-h" => return Err(USAGE.to_owned()),
            other if other.starts_with('-') => {
                return Err(format!("unknown flag `{other}`\n{USAGE}"));
            }
            path => {
                if input.is_some() {
                    return Err(format!("unexpected argument `{path}`\n{USAGE}"));
                }
                input = Some(PathBuf::from(path));
            }
        }
    }

    Ok(CliArgs {
        input: input.ok_or_else(|| USAGE.to_owned())?,
        config,
        title,
        width_px,
        height_px,
        time_window_secs,
        verbose,
    })
}

fn parse_number(flag: &str, value: Option<String>) -> Result<f64, String> {
    let value = value.ok_or_else(|| format!("missing value for {flag}"))?;
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
        .ok_or_else(|| format!("invalid value for {flag}: `{value}`"))
}
