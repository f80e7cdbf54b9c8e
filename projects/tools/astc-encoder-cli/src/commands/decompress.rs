use crate::error::CliError;
use crate::util::{existing_input_path, prepare_output_path};
use argh::FromArgs;
use astc_encoder_api::{PixelFormat, read_astc_file};
use astc_encoder_image::to_dynamic_image;
use log::info;
use std::path::PathBuf;
use std::time::Instant;

#[derive(FromArgs, Debug)]
/// Decompress an .astc file into an image file
#[argh(subcommand, name = "decompress")]
pub struct DecompressCmd {
    /// input .astc path
    #[argh(option, from_str_fn(existing_input_path))]
    pub input: PathBuf,

    /// output image path; the extension picks the format (PNG by default)
    #[argh(option, from_str_fn(prepare_output_path))]
    pub output: PathBuf,

    /// decode colour values as linear rather than sRGB
    #[argh(switch)]
    pub linear: bool,
}

pub fn handle_decompress_command(cmd: DecompressCmd) -> Result<(), CliError> {
    let start = Instant::now();
    let bytes = std::fs::read(&cmd.input)?;
    let format = PixelFormat {
        linear: cmd.linear,
        ..PixelFormat::default()
    };
    let compressed = read_astc_file(&bytes, format)?;
    info!(
        "Decompressing {} ({}x{}, {}x{} blocks)",
        cmd.input.display(),
        compressed.width(),
        compressed.height(),
        compressed.block_width(),
        compressed.block_height()
    );

    let raw = compressed.decompress()?;
    to_dynamic_image(&raw)?.save(&cmd.output)?;
    println!(
        "Wrote {} in {:.2?}",
        cmd.output.display(),
        start.elapsed()
    );
    Ok(())
}
