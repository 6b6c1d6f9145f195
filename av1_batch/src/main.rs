use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;

use av1_batch::conversion_api::base_dir_for;
use av1_batch::{convert_file, plan_file, EncodeConfig, EncodePlan};
use shared_utils::batch::{collect_files, SUPPORTED_VIDEO_EXTENSIONS};
use shared_utils::cli_runner::{run_auto_command, CliRunnerConfig};
use shared_utils::crf_constants::{
    AV1_CRF_DEFAULT, AV1_CRF_MAX, AV1_CRF_MIN, FILM_GRAIN_DEFAULT, FILM_GRAIN_MAX,
    FILM_GRAIN_MIN, SVT_PRESET_DEFAULT, SVT_PRESET_MAX, SVT_PRESET_MIN,
};
use shared_utils::encode_params::DEFAULT_AUDIO_CODEC;
use shared_utils::ffprobe::{self, StreamKind};
use shared_utils::logging::LogConfig;

#[derive(Parser)]
#[command(name = "av1-batch")]
#[command(version, about = "Batch AV1 (SVT-AV1) + Opus transcoder driven by ffprobe metadata", long_about = None)]
struct Cli {
    /// Debug-level logging on the console
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a file, or every supported video in a directory
    Run {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output directory (default: next to each input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        encode: EncodeArgs,

        #[arg(short, long)]
        recursive: bool,

        /// Overwrite existing outputs
        #[arg(short, long)]
        force: bool,

        /// Resolve parameters and log the ffmpeg command without encoding
        #[arg(long)]
        dry_run: bool,

        /// Delete the original after a verified encode
        #[arg(long)]
        delete_original: bool,
    },

    /// Print the resolved parameters and ffmpeg arguments
    Plan {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[arg(long, default_value = "human")]
        output: OutputFormat,

        #[command(flatten)]
        encode: EncodeArgs,

        #[arg(short, long)]
        recursive: bool,
    },

    /// Print the raw ffprobe text for the first video or audio stream
    Probe {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[arg(long, default_value = "video")]
        stream: StreamKind,
    },
}

#[derive(Args)]
struct EncodeArgs {
    /// SVT-AV1 CRF (lower = higher quality)
    #[arg(long, default_value_t = AV1_CRF_DEFAULT,
          value_parser = clap::value_parser!(u8).range(AV1_CRF_MIN as i64..=AV1_CRF_MAX as i64))]
    crf: u8,

    /// SVT-AV1 preset (lower = slower, better)
    #[arg(long, default_value_t = SVT_PRESET_DEFAULT,
          value_parser = clap::value_parser!(u8).range(SVT_PRESET_MIN as i64..=SVT_PRESET_MAX as i64))]
    preset: u8,

    /// Film grain synthesis strength (0 = off)
    #[arg(long, default_value_t = FILM_GRAIN_DEFAULT,
          value_parser = clap::value_parser!(u8).range(FILM_GRAIN_MIN as i64..=FILM_GRAIN_MAX as i64))]
    film_grain: u8,

    /// Target audio codec; matching sources are copied
    #[arg(long, default_value = DEFAULT_AUDIO_CODEC)]
    audio_codec: String,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _ = shared_utils::logging::init_logging(
        "av1_batch",
        LogConfig::default().verbose(cli.verbose),
    );

    match cli.command {
        Commands::Run {
            input,
            output,
            encode,
            recursive,
            force,
            dry_run,
            delete_original,
        } => {
            let config = EncodeConfig {
                output_dir: output,
                base_dir: base_dir_for(&input),
                crf: encode.crf,
                preset: encode.preset,
                film_grain: encode.film_grain,
                audio_codec: encode.audio_codec,
                force,
                dry_run,
                delete_original,
            };
            config.encode_settings().validate()?;

            info!("🎬 AV1 Batch Encode (SVT-AV1 → MKV)");
            info!(
                "   CRF {} • preset {} • film grain {}",
                config.crf, config.preset, config.film_grain
            );
            info!("   🎵 Audio target: {}", config.audio_codec);
            if let Some(dir) = &config.output_dir {
                info!("   📁 Output dir: {}", dir.display());
            }
            if recursive {
                info!("   📂 Recursive: ENABLED");
            }
            if force {
                info!("   ♻️  Overwrite existing outputs: ENABLED");
            }
            if dry_run {
                info!("   🧪 Dry run: nothing will be encoded");
            }
            if config.should_delete_original() {
                info!("   🗑️  Delete original after verified encode: ENABLED");
            }
            info!("");

            run_auto_command(
                CliRunnerConfig {
                    input,
                    recursive,
                    label: "AV1 Video".to_string(),
                },
                |file| convert_file(file, &config),
            )?;
        }

        Commands::Plan {
            input,
            output,
            encode,
            recursive,
        } => {
            let config = EncodeConfig {
                base_dir: base_dir_for(&input),
                crf: encode.crf,
                preset: encode.preset,
                film_grain: encode.film_grain,
                audio_codec: encode.audio_codec,
                ..EncodeConfig::default()
            };
            let files = plan_inputs(&input, recursive)?;

            let mut plans = Vec::new();
            for file in &files {
                match plan_file(file, &config) {
                    Ok(plan) => plans.push(plan),
                    Err(e) if files.len() > 1 && e.is_per_file() => {
                        eprintln!("❌ {}: {}", file.display(), e);
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            match output {
                OutputFormat::Human => plans.iter().for_each(print_plan_human),
                OutputFormat::Json if input.is_dir() => {
                    println!("{}", serde_json::to_string_pretty(&plans)?);
                }
                OutputFormat::Json => {
                    if let Some(plan) = plans.first() {
                        println!("{}", serde_json::to_string_pretty(plan)?);
                    }
                }
            }
        }

        Commands::Probe { input, stream } => {
            if !input.is_file() {
                anyhow::bail!("❌ Input not found: {}", input.display());
            }
            let text = ffprobe::probe_stream(&input, stream)?;
            if text.trim().is_empty() {
                eprintln!("⚠️  No {:?} stream in {}", stream, input.display());
            } else {
                print!("{}", text);
            }
        }
    }

    Ok(())
}

fn plan_inputs(input: &Path, recursive: bool) -> anyhow::Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        anyhow::bail!("❌ Input not found: {}", input.display());
    }
    let files = collect_files(input, SUPPORTED_VIDEO_EXTENSIONS, recursive);
    if files.is_empty() {
        anyhow::bail!("❌ No video files found in directory: {}", input.display());
    }
    Ok(files)
}

fn print_plan_human(plan: &EncodePlan) {
    let params = &plan.parameters;
    println!("\n🎯 Encode Plan (AV1)");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📁 Input:  {}", plan.input_path);
    println!("📦 Output: {}", plan.output_path);
    println!();
    println!(
        "🎬 Video: libsvtav1 CRF {} • preset {} • film grain {}",
        params.crf, params.preset, params.film_grain
    );
    println!("🔑 GOP: {} frames", params.gop);
    println!("🌈 Color range: {}", params.color.range);
    println!("🎨 Color space: {}", params.color.space);
    println!("💡 Transfer: {}", params.color.transfer);
    println!("🔴 Primaries: {}", params.color.primaries);
    println!("🎵 Audio: {}", params.audio.describe());
    println!();
    println!("⚙️  ffmpeg {}", plan.ffmpeg_args.join(" "));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
