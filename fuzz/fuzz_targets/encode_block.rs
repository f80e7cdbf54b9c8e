#![no_main]

// Encodes arbitrary texels. Whatever the encoder emits must be accepted by the decoder.

use astc_encoder_codec::block::endpoints::ColourEndpointMode;
use astc_encoder_codec::block::{
    decode_block, BlockEncoder, ColourSpace, EncoderEffort, MAX_TEXELS_PER_BLOCK,
};
use astc_encoder_codec::BlockFootprint;
use libfuzzer_sys::{arbitrary, fuzz_target};

#[derive(Clone, Debug, arbitrary::Arbitrary)]
pub struct Input {
    pub footprint: u8,
    pub num_components: u8,
    pub quality: u8,
    pub linear: bool,
    pub texels: Vec<[u8; 4]>,
}

fuzz_target!(|input: Input| {
    if input.texels.is_empty() {
        return;
    }

    let footprints = BlockFootprint::all_values();
    let footprint = footprints[input.footprint as usize % footprints.len()];
    let colour_space = ColourSpace::from_linear(input.linear);
    let mode = ColourEndpointMode::for_components(input.num_components as usize % 4 + 1);
    let effort = EncoderEffort::from_quality(input.quality as f32 / 255.0);

    let texels: Vec<[f32; 4]> = input
        .texels
        .iter()
        .cycle()
        .take(footprint.texel_count())
        .map(|texel| texel.map(|c| c as f32 / 255.0))
        .collect();

    let block = BlockEncoder::new(footprint, mode, colour_space, effort).encode(&texels);

    let mut decoded = [[0u16; 4]; MAX_TEXELS_PER_BLOCK];
    assert!(decode_block(&block, footprint, colour_space, &mut decoded).is_ok());
});
