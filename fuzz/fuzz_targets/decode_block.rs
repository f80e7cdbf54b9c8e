#![no_main]

// Decodes arbitrary 128-bit blocks. Any block must decode without panicking, and a
// rejected block must come out as the error colour.

use astc_encoder_codec::block::{decode_block, ColourSpace, ERROR_COLOUR, MAX_TEXELS_PER_BLOCK};
use astc_encoder_codec::BlockFootprint;
use libfuzzer_sys::{arbitrary, fuzz_target};

#[derive(Clone, Debug, arbitrary::Arbitrary)]
pub struct Input {
    pub bytes: [u8; 16],
    pub footprint: u8,
    pub linear: bool,
}

fuzz_target!(|input: Input| {
    let footprints = BlockFootprint::all_values();
    let footprint = footprints[input.footprint as usize % footprints.len()];
    let colour_space = ColourSpace::from_linear(input.linear);

    let mut texels = [[0u16; 4]; MAX_TEXELS_PER_BLOCK];
    let result = decode_block(&input.bytes, footprint, colour_space, &mut texels);

    if result.is_err() {
        assert!(texels[..footprint.texel_count()]
            .iter()
            .all(|texel| *texel == ERROR_COLOUR));
    }
});
