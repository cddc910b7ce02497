use chrono::Local;
use clap::{Parser, Subcommand};
use constellation::io::load_raster;
use constellation::{
    compare_strands_with, extract_signature_with, extract_strands, open_store, parse_reference,
    score_with, verify_signature, CompareConfig, ConstellationConfig, DimensionCheck,
    ExtractConfig, Luminance, ReferenceCapture, ReferenceMetadata, RegistrationRequest, Signature,
    StoreConfig,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Constellation image fingerprint CLI")]
struct Cli {
    /// Optional JSON configuration file.
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output.
    #[arg(long, global = true)]
    trace: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract a grid signature as JSON.
    Signature {
        image: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Score an image against a signature JSON file.
    Verify {
        image: PathBuf,
        #[arg(short, long)]
        reference: PathBuf,
    },
    /// Write the reference strand report for an image.
    Strands {
        image: PathBuf,
        #[arg(long, default_value = "")]
        image_id: String,
        #[arg(long, default_value = "Anonymous")]
        captured_by: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compare an image's strands against a reference strand report.
    Compare {
        image: PathBuf,
        #[arg(short, long)]
        reference: PathBuf,
    },
    /// Register an image's signature in the configured store.
    Register {
        image: PathBuf,
        #[arg(long)]
        image_id: String,
        #[arg(long, default_value = "Anonymous")]
        author: String,
        #[arg(long, default_value = "unknown")]
        device_model: String,
        /// Capture time; defaults to now.
        #[arg(long)]
        timestamp: Option<String>,
    },
    /// Search the configured store for an image's best match.
    Search { image: PathBuf },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum LuminanceConfig {
    Weighted,
    Mean,
}

impl From<LuminanceConfig> for Luminance {
    fn from(value: LuminanceConfig) -> Self {
        match value {
            LuminanceConfig::Weighted => Luminance::Weighted,
            LuminanceConfig::Mean => Luminance::Mean,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ExtractConfigJson {
    grid_size: usize,
    luminance: LuminanceConfig,
    parallel: bool,
}

impl Default for ExtractConfigJson {
    fn default() -> Self {
        let cfg = ExtractConfig::default();
        Self {
            grid_size: cfg.grid_size,
            luminance: LuminanceConfig::Weighted,
            parallel: cfg.parallel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ConstellationConfigJson {
    global_threshold: f64,
    local_threshold: f64,
    tight_radius: f64,
    parallel: bool,
}

impl Default for ConstellationConfigJson {
    fn default() -> Self {
        let cfg = ConstellationConfig::default();
        Self {
            global_threshold: cfg.global_threshold,
            local_threshold: cfg.local_threshold,
            tight_radius: cfg.tight_radius,
            parallel: cfg.parallel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct StrandConfigJson {
    tolerance: u8,
    strand_match_threshold: f64,
    max_samples: usize,
    dimension_slack: usize,
    authentic_threshold: f64,
    modified_threshold: f64,
}

impl Default for StrandConfigJson {
    fn default() -> Self {
        let cfg = CompareConfig::default();
        Self {
            tolerance: cfg.tolerance,
            strand_match_threshold: cfg.strand_match_threshold,
            max_samples: cfg.max_samples,
            dimension_slack: cfg.dimension_slack,
            authentic_threshold: cfg.authentic_threshold,
            modified_threshold: cfg.modified_threshold,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    extract: ExtractConfigJson,
    constellation: ConstellationConfigJson,
    strands: StrandConfigJson,
    store: StoreConfig,
}

impl Config {
    fn load(path: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        match path {
            Some(path) => Ok(serde_json::from_str(&fs::read_to_string(path)?)?),
            None => Ok(Self::default()),
        }
    }
}

impl From<ExtractConfigJson> for ExtractConfig {
    fn from(value: ExtractConfigJson) -> Self {
        Self {
            grid_size: value.grid_size,
            luminance: value.luminance.into(),
            parallel: value.parallel,
        }
    }
}

impl From<ConstellationConfigJson> for ConstellationConfig {
    fn from(value: ConstellationConfigJson) -> Self {
        Self {
            global_threshold: value.global_threshold,
            local_threshold: value.local_threshold,
            tight_radius: value.tight_radius,
            parallel: value.parallel,
        }
    }
}

impl From<StrandConfigJson> for CompareConfig {
    fn from(value: StrandConfigJson) -> Self {
        Self {
            tolerance: value.tolerance,
            strand_match_threshold: value.strand_match_threshold,
            max_samples: value.max_samples,
            dimension_slack: value.dimension_slack,
            authentic_threshold: value.authentic_threshold,
            modified_threshold: value.modified_threshold,
        }
    }
}

#[derive(Debug, Serialize)]
struct LocalVerification {
    #[serde(rename = "match")]
    is_match: bool,
    score: f64,
    avg_distance: f64,
    tight_matches: usize,
    missing_cells: usize,
    threshold: f64,
}

#[derive(Debug, Serialize)]
struct StrictVerification {
    verdict: constellation::Verdict,
    dimensions: DimensionCheck,
    report: constellation::ComparisonReport,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("constellation=info".parse()?),
            )
            .with_target(false)
            .init();
    }

    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }
    let Some(command) = cli.command else {
        return Err("no command given (try --help)".into());
    };

    let config = Config::load(cli.config.as_deref())?;
    let extract_cfg = ExtractConfig::from(config.extract);
    let constellation_cfg = ConstellationConfig::from(config.constellation);
    let compare_cfg = CompareConfig::from(config.strands);

    match command {
        Command::Signature { image, output } => {
            let raster = load_raster(&image)?;
            let signature = extract_signature_with(raster.view(), &extract_cfg)?;
            emit(output.as_deref(), &signature.to_json_pretty())?;
        }
        Command::Verify { image, reference } => {
            let reference = Signature::from_json(&fs::read_to_string(&reference)?)?;
            let raster = load_raster(&image)?;
            let signature = extract_signature_with(raster.view(), &extract_cfg)?;
            let report = score_with(&signature, &reference, &constellation_cfg)?;
            let out = LocalVerification {
                is_match: report.is_match(constellation_cfg.local_threshold),
                score: report.score,
                avg_distance: report.avg_distance,
                tight_matches: report.tight_matches,
                missing_cells: report.missing_cells,
                threshold: constellation_cfg.local_threshold,
            };
            emit(None, &serde_json::to_string_pretty(&out)?)?;
        }
        Command::Strands {
            image,
            image_id,
            captured_by,
            output,
        } => {
            let raster = load_raster(&image)?;
            let file_size = fs::metadata(&image)?.len();
            let metadata = ReferenceMetadata {
                image_id,
                file_name: image
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                file_size_mb: Some(file_size as f64 / (1024.0 * 1024.0)),
                uri: None,
                captured_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                captured_by,
                ..ReferenceMetadata::default()
            };
            let capture = ReferenceCapture::capture(raster.view(), metadata)?;
            emit(output.as_deref(), &capture.to_text())?;
        }
        Command::Compare { image, reference } => {
            let reference = parse_reference(&fs::read_to_string(&reference)?)?;
            let raster = load_raster(&image)?;
            let dimensions = reference
                .metadata
                .check_dimensions(raster.width(), raster.height());
            match dimensions {
                DimensionCheck::Exact => {}
                DimensionCheck::Rotated => tracing::warn!(
                    expected_width = reference.metadata.width,
                    expected_height = reference.metadata.height,
                    "image appears rotated; fix orientation for best results"
                ),
                DimensionCheck::Mismatch => tracing::warn!(
                    expected_width = reference.metadata.width,
                    expected_height = reference.metadata.height,
                    width = raster.width(),
                    height = raster.height(),
                    "dimension mismatch; image may have been cropped or resized"
                ),
            }
            let candidate = extract_strands(raster.view())?;
            let report = compare_strands_with(&reference.strands, &candidate, &compare_cfg);
            let out = StrictVerification {
                verdict: report.verdict(&compare_cfg),
                dimensions,
                report,
            };
            emit(None, &serde_json::to_string_pretty(&out)?)?;
        }
        Command::Register {
            image,
            image_id,
            author,
            device_model,
            timestamp,
        } => {
            let raster = load_raster(&image)?;
            let signature = extract_signature_with(raster.view(), &extract_cfg)?;
            let mut store = open_store(&config.store)?;
            let id = store.register_signature(RegistrationRequest {
                image_id,
                author,
                device_model,
                timestamp: timestamp
                    .unwrap_or_else(|| Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()),
                signature,
            })?;
            store.close()?;
            tracing::info!(id, "signature registered");
            emit(None, &serde_json::json!({ "success": true, "id": id }).to_string())?;
        }
        Command::Search { image } => {
            let raster = load_raster(&image)?;
            let signature = extract_signature_with(raster.view(), &extract_cfg)?;
            let mut store = open_store(&config.store)?;
            let response = verify_signature(store.as_ref(), &signature, &constellation_cfg)?;
            store.close()?;
            emit(None, &serde_json::to_string_pretty(&response)?)?;
        }
    }

    Ok(())
}

fn emit(path: Option<&Path>, text: &str) -> std::io::Result<()> {
    match path {
        Some(path) => fs::write(path, text),
        None => {
            println!("{text}");
            Ok(())
        }
    }
}
