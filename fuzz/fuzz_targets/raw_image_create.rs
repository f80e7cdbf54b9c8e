#![no_main]

// Drives the C surface with arbitrary shapes. Every call must return either an object
// with a clear error descriptor or null with a message, never both and never neither.

use astc_encoder_codec::{
    astc_image_decompress, astc_image_release, astc_raw_image_compress, astc_raw_image_create,
    astc_raw_image_release, AstcErrorInfo, AstcErrorKind,
};
use libfuzzer_sys::{arbitrary, fuzz_target};

#[derive(Clone, Debug, arbitrary::Arbitrary)]
pub struct Input {
    pub width: u8,
    pub height: u8,
    pub num_components: u8,
    pub component_size: u8,
    pub block_width: u8,
    pub block_height: u8,
    pub quality: u8,
    pub linear: bool,
    pub hdr: bool,
    pub data: Vec<u8>,
}

fn check(is_null: bool, error: &AstcErrorInfo) {
    if is_null {
        assert_ne!(error.kind(), AstcErrorKind::None);
        assert!(error.message().is_some());
    } else {
        assert_eq!(error.kind(), AstcErrorKind::None);
        assert!(error.message().is_none());
    }
}

fuzz_target!(|input: Input| {
    let mut error = AstcErrorInfo::new();
    let raw = unsafe {
        astc_raw_image_create(
            input.data.as_ptr(),
            input.data.len(),
            (input.width % 32) as usize,
            (input.height % 32) as usize,
            input.num_components as usize,
            input.component_size as usize,
            input.linear,
            input.hdr,
            &mut error,
        )
    };
    check(raw.is_null(), &error);
    if raw.is_null() {
        return;
    }

    let mut error = AstcErrorInfo::new();
    let compressed = unsafe {
        astc_raw_image_compress(
            raw,
            (input.block_width % 13) as usize,
            (input.block_height % 13) as usize,
            input.quality as f32 / 200.0,
            &mut error,
            core::ptr::null_mut(),
            None,
        )
    };
    check(compressed.is_null(), &error);

    if !compressed.is_null() {
        let mut error = AstcErrorInfo::new();
        let restored =
            unsafe { astc_image_decompress(compressed, &mut error, core::ptr::null_mut(), None) };
        check(restored.is_null(), &error);
        unsafe {
            astc_raw_image_release(restored);
            astc_image_release(compressed);
        }
    }
    unsafe { astc_raw_image_release(raw) };
});
