use crate::error::CliError;
use crate::util::{existing_input_path, parse_block_footprint, parse_preset, prepare_output_path};
use argh::FromArgs;
use astc_encoder_api::{
    CompressionOutcome, CompressionSession, CompressionSettingsBuilder, QualityPreset,
    write_astc_file,
};
use astc_encoder_image::raw_image_from_dynamic;
use log::info;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(FromArgs, Debug)]
/// Compress an image file into an .astc file
#[argh(subcommand, name = "compress")]
pub struct CompressCmd {
    /// input image path (any format the image crate reads; PNG by default)
    #[argh(option, from_str_fn(existing_input_path))]
    pub input: PathBuf,

    /// output .astc path
    #[argh(option, from_str_fn(prepare_output_path))]
    pub output: PathBuf,

    /// block footprint, e.g. 4x4, 6x6, 8x8 [default: 4x4]
    #[argh(option, from_str_fn(parse_block_footprint), default = "(4, 4)")]
    pub block: (usize, usize),

    /// encoder effort between 0.0 and 1.0; overrides --preset
    #[argh(option)]
    pub quality: Option<f32>,

    /// quality preset (fastest, fast, medium, thorough, exhaustive) [default: medium]
    #[argh(option, from_str_fn(parse_preset))]
    pub preset: Option<QualityPreset>,

    /// treat colour values as linear rather than sRGB
    #[argh(switch)]
    pub linear: bool,

    /// cancel the compression after this many milliseconds
    #[argh(option)]
    pub timeout_ms: Option<u64>,
}

pub fn handle_compress_command(cmd: CompressCmd) -> Result<(), CliError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(compress(cmd))
}

async fn compress(cmd: CompressCmd) -> Result<(), CliError> {
    let source = image::open(&cmd.input)?;
    let raw = raw_image_from_dynamic(&source, cmd.linear)?;

    let mut settings = CompressionSettingsBuilder::new()
        .block_footprint(cmd.block.0, cmd.block.1)
        .preset(cmd.preset.unwrap_or_default());
    if let Some(quality) = cmd.quality {
        settings = settings.quality(quality);
    }
    let settings = settings.build();

    info!(
        "Compressing {} ({}x{}) with {}x{} blocks at quality {}",
        cmd.input.display(),
        raw.width(),
        raw.height(),
        settings.block_width,
        settings.block_height,
        settings.quality
    );

    let session = CompressionSession::new(raw, settings);
    let token = session.cancellation_token();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nCancelling...");
            token.cancel();
        }
    });

    let start = Instant::now();
    let on_progress = |progress: f32| {
        eprint!("\rCompressing: {:>5.1}%", progress * 100.0);
        let _ = std::io::stderr().flush();
    };
    let outcome = match cmd.timeout_ms {
        Some(timeout) => {
            session
                .run_with_deadline(Duration::from_millis(timeout), on_progress)
                .await
        }
        None => session.run(on_progress).await,
    };
    ctrl_c.abort();
    eprintln!();

    let compressed = match outcome? {
        CompressionOutcome::Completed(compressed) => compressed,
        CompressionOutcome::Cancelled => return Err(CliError::Cancelled),
    };

    let file = write_astc_file(&compressed)?;
    std::fs::write(&cmd.output, &file)?;
    println!(
        "Wrote {} ({} bytes) in {:.2?}",
        cmd.output.display(),
        file.len(),
        start.elapsed()
    );
    Ok(())
}
