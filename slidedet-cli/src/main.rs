use clap::Parser;
use serde::{Deserialize, Serialize};
use slidedet::detect::rect::PadRect;
use slidedet::eval::{ValSet, ValidateConfig};
use slidedet::feature::{Extend, Margin, Pad, Transform};
use slidedet::image::io::load_rgb_image;
use slidedet::kernel::scorer::CorrOp;
use slidedet::{
    detect_multi_scale, validate, AffineScorer, Algo, Det, DetectConfig, FeatTemplate, Interp,
    MultiImage, MultiScaleConfig, Overlap, Rect,
};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "slidedet CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum OpConfig {
    Dot,
    Cos,
}

impl From<OpConfig> for CorrOp {
    fn from(value: OpConfig) -> Self {
        match value {
            OpConfig::Dot => CorrOp::Dot,
            OpConfig::Cos => CorrOp::Cos,
        }
    }
}

/// Template file: interleaved feature weights plus pixel geometry.
#[derive(Debug, Deserialize)]
struct TemplateJson {
    width: usize,
    height: usize,
    channels: usize,
    weights: Vec<f64>,
    #[serde(default)]
    bias: f64,
    #[serde(default = "default_op")]
    op: OpConfig,
    /// Pixel size `[width, height]` of the training window.
    size: [i64; 2],
    /// Object box inside the window.
    interior: Rect,
}

fn default_op() -> OpConfig {
    OpConfig::Dot
}

impl TemplateJson {
    fn compile(self, algo: Algo) -> Result<FeatTemplate, Box<dyn std::error::Error>> {
        let weights = MultiImage::from_vec(self.weights, self.width, self.height, self.channels)?;
        let scorer = AffineScorer::new(weights, self.bias)
            .with_op(self.op.into())
            .with_algo(algo);
        let shape = PadRect::new((self.size[0], self.size[1]), self.interior);
        Ok(FeatTemplate::new(scorer, shape))
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SearchConfigJson {
    max_scale: f64,
    scale_step: f64,
    interp: Interp,
    margin: usize,
    extend: Extend,
    algo: Algo,
    local_max: bool,
    min_score: Option<f64>,
    max_num: Option<usize>,
    overlap: Overlap,
    indexed_nms: bool,
    parallel: bool,
}

impl Default for SearchConfigJson {
    fn default() -> Self {
        let cfg = MultiScaleConfig::default();
        Self {
            max_scale: cfg.max_scale,
            scale_step: cfg.scale_step,
            interp: cfg.interp,
            margin: cfg.pad.margin.top,
            extend: cfg.pad.extend,
            algo: Algo::Auto,
            local_max: cfg.detect.local_max,
            min_score: None,
            max_num: cfg.detect.max_num,
            overlap: cfg.detect.overlap,
            indexed_nms: cfg.detect.indexed_nms,
            parallel: cfg.detect.parallel,
        }
    }
}

impl From<&SearchConfigJson> for MultiScaleConfig {
    fn from(value: &SearchConfigJson) -> Self {
        Self {
            max_scale: value.max_scale,
            scale_step: value.scale_step,
            interp: value.interp,
            pad: Pad::new(Margin::uniform(value.margin), value.extend),
            detect: DetectConfig {
                local_max: value.local_max,
                min_score: value.min_score.unwrap_or(f64::NEG_INFINITY),
                max_num: value.max_num,
                overlap: value.overlap,
                indexed_nms: value.indexed_nms,
                parallel: value.parallel,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    image_path: String,
    template_path: String,
    output_path: Option<String>,
    transform: Transform,
    search: SearchConfigJson,
    /// Ground truth boxes; validation runs when present.
    refs: Option<Vec<Rect>>,
    ignore: Vec<Rect>,
    validate: ValidateConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_path: String::new(),
            template_path: String::new(),
            output_path: None,
            transform: Transform::GradHist { cell: 8, bins: 9 },
            search: SearchConfigJson::default(),
            refs: None,
            ignore: Vec::new(),
            validate: ValidateConfig::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DetRecord {
    x: i64,
    y: i64,
    width: i64,
    height: i64,
    score: f64,
}

impl From<Det> for DetRecord {
    fn from(value: Det) -> Self {
        Self {
            x: value.rect.x0,
            y: value.rect.y0,
            width: value.rect.width(),
            height: value.rect.height(),
            score: value.score,
        }
    }
}

#[derive(Debug, Serialize)]
struct ValidationRecord {
    true_pos: usize,
    false_pos: usize,
    misses: usize,
    average_precision: f64,
}

#[derive(Debug, Serialize)]
struct Output {
    detections: Vec<DetRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    validation: Option<ValidationRecord>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("slidedet=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.image_path.is_empty() || config.template_path.is_empty() {
        return Err("image_path and template_path must be set in the config".into());
    }
    if config.search.scale_step <= 1.0 {
        return Err("search.scale_step must be greater than 1".into());
    }

    let image = load_rgb_image(&config.image_path)?;
    let template_text = fs::read_to_string(&config.template_path)?;
    let template: TemplateJson = serde_json::from_str(&template_text)?;
    let tmpl = template.compile(config.search.algo)?;

    let search = MultiScaleConfig::from(&config.search);
    let dets = detect_multi_scale(&image, &tmpl, &config.transform, &search)?;
    tracing::info!(detections = dets.len(), "detection finished");

    let validation = match &config.refs {
        Some(refs) => {
            let val = validate(
                &dets,
                refs,
                &config.ignore,
                config.validate.min_iou,
                config.validate.min_ignore_cover,
            )?;
            let set = ValSet::from(&val);
            Some(ValidationRecord {
                true_pos: val.num_true(),
                false_pos: val.num_false(),
                misses: val.misses.len(),
                average_precision: set.average_precision()?,
            })
        }
        None => None,
    };

    let output = Output {
        detections: dets.into_iter().map(DetRecord::from).collect(),
        validation,
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
