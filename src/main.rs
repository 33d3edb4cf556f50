//! Pixelflow CLI - Node-graph Image Processing
//!
//! A small front end over the library: list the node catalog, describe a
//! node kind, or run a linear load -> transforms -> save pipeline.

use anyhow::{anyhow, bail, Context, Result};
use pixelflow::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("pixelflow");

    let Some(command) = args.get(1) else {
        init_logging(&Config::default());
        print_usage(program);
        return Ok(());
    };

    match command.as_str() {
        "list" => {
            init_logging(&Config::default());
            list_filters(args[2..].iter().any(|a| a == "--json"))
        }
        "info" => {
            init_logging(&Config::default());
            let tag = args
                .get(2)
                .ok_or_else(|| anyhow!("please specify a node kind, e.g. `info box_blur`"))?;
            filter_info(tag)
        }
        "process" => {
            if args.len() < 4 {
                bail!(
                    "please specify input and output paths\nUsage: {} process <input> <output> [options]",
                    program
                );
            }
            let options = ProcessOptions::parse(&args[4..])?;
            let config = match &options.config {
                Some(path) => Config::load(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?,
                None => Config::default(),
            };
            init_logging(&config);
            process_image(&args[2], &args[3], &options, &config)
        }
        "help" | "--help" | "-h" => {
            print_usage(program);
            Ok(())
        }
        other => {
            print_usage(program);
            bail!("unknown command: {}", other)
        }
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_logging(config: &Config) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();
}

fn print_usage(program: &str) {
    println!("Pixelflow v{}", pixelflow::VERSION);
    println!();
    println!("Usage: {} <command> [options]", program);
    println!();
    println!("Commands:");
    println!("  list [--json]                 List all node kinds");
    println!("  info <kind>                   Show details about a node kind");
    println!("  process <in> <out> [options]  Process an image");
    println!("  help                          Show this help message");
    println!();
    println!("Process options (applied in this order):");
    println!("  --brightness <b>    Add to every channel, -100 to 100");
    println!("  --contrast <c>      Multiply every channel, 0 to 3");
    println!("  --blur <radius>     Box blur, radius 1 to 20");
    println!("  --threshold <t>     Binarize at t, 0 to 255");
    println!("  --edges             Sobel edge map");
    println!("  --channel <n>       Extract channel 0-3 (R, G, B, A)");
    println!("  --config <file>     Read settings from a TOML file");
}

fn list_filters(json: bool) -> Result<()> {
    let registry = FilterRegistry::with_builtins();

    if json {
        let all: Vec<&NodeMetadata> = registry.metadata().collect();
        println!("{}", serde_json::to_string_pretty(&all)?);
        return Ok(());
    }

    println!("Available node kinds ({} total):", registry.len());
    println!();
    for (category, filters) in registry.grouped_by_category() {
        println!("  {}", category);
        for metadata in filters {
            println!("      {:<20} {}", metadata.id, metadata.description);
        }
        println!();
    }
    Ok(())
}

fn filter_info(tag: &str) -> Result<()> {
    let registry = FilterRegistry::with_builtins();
    let metadata = registry
        .get_metadata(tag)
        .ok_or_else(|| anyhow!("unknown node kind '{}'; use `list` to see them", tag))?;

    println!("Node: {}", metadata.name);
    println!("Kind: {}", metadata.kind());
    println!();
    println!("Description:");
    println!("  {}", metadata.description);
    if metadata.takes_path {
        println!();
        println!("Configured with a file path.");
    }

    if !metadata.parameters.is_empty() {
        println!();
        println!("Parameters:");
        for param in &metadata.parameters {
            println!(
                "  {} = {} [{}, {}]",
                param.name, param.default_value, param.min, param.max
            );
            if !param.description.is_empty() {
                println!("    {}", param.description);
            }
        }
    }
    Ok(())
}

/// Options for the `process` command.
#[derive(Debug, Default)]
struct ProcessOptions {
    brightness: Option<f64>,
    contrast: Option<f64>,
    blur: Option<f64>,
    threshold: Option<f64>,
    edges: bool,
    channel: Option<f64>,
    config: Option<PathBuf>,
}

impl ProcessOptions {
    fn parse(args: &[String]) -> Result<Self> {
        let mut options = Self::default();
        let mut iter = args.iter();

        while let Some(flag) = iter.next() {
            let flag = flag.as_str();
            let mut value = |name: &str| -> Result<String> {
                iter.next()
                    .cloned()
                    .ok_or_else(|| anyhow!("{} needs a value", name))
            };
            let number = |text: String, name: &str| -> Result<f64> {
                text.parse()
                    .with_context(|| format!("invalid number '{}' for {}", text, name))
            };

            match flag {
                "--brightness" => options.brightness = Some(number(value(flag)?, flag)?),
                "--contrast" => options.contrast = Some(number(value(flag)?, flag)?),
                "--blur" => options.blur = Some(number(value(flag)?, flag)?),
                "--threshold" => options.threshold = Some(number(value(flag)?, flag)?),
                "--channel" => options.channel = Some(number(value(flag)?, flag)?),
                "--edges" => options.edges = true,
                "--config" => options.config = Some(PathBuf::from(value(flag)?)),
                other => bail!("unknown option: {}", other),
            }
        }
        Ok(options)
    }

    /// Transform steps as `(tag, params)`, in pipeline order.
    fn steps(&self) -> Vec<(&'static str, Params)> {
        let mut steps = Vec::new();
        if self.brightness.is_some() || self.contrast.is_some() {
            steps.push((
                "brightness_contrast",
                params([
                    ("brightness", self.brightness.unwrap_or(0.0)),
                    ("contrast", self.contrast.unwrap_or(1.0)),
                ]),
            ));
        }
        if let Some(radius) = self.blur {
            steps.push(("box_blur", params([("radius", radius)])));
        }
        if let Some(threshold) = self.threshold {
            steps.push(("threshold", params([("threshold", threshold)])));
        }
        if self.edges {
            steps.push(("edge_detect", Params::new()));
        }
        if let Some(channel) = self.channel {
            steps.push(("channel_extract", params([("channel", channel)])));
        }
        steps
    }
}

fn process_image(input: &str, output: &str, options: &ProcessOptions, config: &Config) -> Result<()> {
    let registry = FilterRegistry::with_builtins();
    let mut graph = ProcessingGraph::new();

    let load = graph.add_filter(registry.create_node("load_image")?);
    graph.set_path(load, input)?;

    let mut previous = load;
    for (tag, step_params) in options.steps() {
        let node = graph.add_filter(registry.create_node(tag)?);
        graph.set_params(node, &step_params)?;
        graph.connect(previous, node)?;
        previous = node;
    }

    let save = graph.add_filter(registry.create_node("save_image")?);
    graph.set_path(save, output)?;
    graph.connect(previous, save)?;

    println!("Processing {} -> {}", input, output);
    let engine = ExecutionEngine::new()
        .with_io(Arc::new(config.fs_io()))
        .with_options(config.execution_options().with_progress(|update| {
            if let ProgressUpdate::NodeStarted { node_name, .. } = update {
                println!("   Running: {}", node_name);
            }
        }));

    let report = engine.execute(&mut graph)?;

    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }
    if graph.output(save)?.is_empty() {
        bail!("no image was written to {}", output);
    }

    println!(
        "Done in {}ms ({} nodes)",
        report.stats.total_duration.as_millis(),
        report.stats.nodes_executed
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_options() {
        let options = ProcessOptions::parse(&args(&[
            "--contrast", "1.5", "--blur", "3.4", "--edges", "--config", "p.toml",
        ]))
        .unwrap();

        assert_eq!(options.contrast, Some(1.5));
        assert_eq!(options.blur, Some(3.4));
        assert!(options.edges);
        assert_eq!(options.config, Some(PathBuf::from("p.toml")));

        let tags: Vec<&str> = options.steps().iter().map(|(tag, _)| *tag).collect();
        assert_eq!(tags, vec!["brightness_contrast", "box_blur", "edge_detect"]);
        assert_eq!(options.steps()[0].1["brightness"], 0.0);
    }

    #[test]
    fn test_parse_errors() {
        assert!(ProcessOptions::parse(&args(&["--blur"])).is_err());
        assert!(ProcessOptions::parse(&args(&["--blur", "wide"])).is_err());
        assert!(ProcessOptions::parse(&args(&["--sharpen"])).is_err());
    }

    #[test]
    fn test_process_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out").join("result.png");
        image::DynamicImage::new_rgb8(5, 5).save(&input).unwrap();

        let options = ProcessOptions::parse(&args(&["--brightness", "40"])).unwrap();
        process_image(
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            &options,
            &Config::default(),
        )
        .unwrap();

        let written = image::open(&output).unwrap().to_rgb8();
        assert_eq!(written.get_pixel(2, 2).0, [40, 40, 40]);
    }
}
