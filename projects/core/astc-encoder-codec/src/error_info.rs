//! Error descriptor passed through the C-shaped surface.
//!
//! Every fallible call clears the descriptor on entry, then either returns an object
//! or returns null and fills in the descriptor. A descriptor with no message after a
//! null return means the failure cause is unknown.

use crate::error::CodecError;
use core::ffi::c_char;
use core::fmt::{self, Write};
use core::ptr;

/// Capacity of the message buffer in [`AstcErrorInfo`], including the NUL terminator.
pub const ASTC_ENCODER_ERROR_SIZE: usize = 128;

/// Broad category of a failure reported through [`AstcErrorInfo`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AstcErrorKind {
    /// No error has been recorded.
    #[default]
    None = 0,
    /// The arguments describe an invalid image or footprint.
    InvalidInput = 1,
    /// The codec failed internally.
    CodecFailure = 2,
    /// The progress callback asked the codec to stop.
    Cancelled = 3,
}

/// Fixed size error descriptor filled in by fallible codec calls.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct AstcErrorInfo {
    kind: AstcErrorKind,
    message: [u8; ASTC_ENCODER_ERROR_SIZE],
}

impl Default for AstcErrorInfo {
    fn default() -> Self {
        Self {
            kind: AstcErrorKind::None,
            message: [0; ASTC_ENCODER_ERROR_SIZE],
        }
    }
}

impl AstcErrorInfo {
    /// Creates an empty descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// The category of the recorded error.
    pub fn kind(&self) -> AstcErrorKind {
        self.kind
    }

    /// The recorded message, or [`None`] if no message was set.
    pub fn message(&self) -> Option<&str> {
        let length = self
            .message
            .iter()
            .position(|&byte| byte == 0)
            .unwrap_or(ASTC_ENCODER_ERROR_SIZE - 1);
        if length == 0 {
            return None;
        }

        // Messages are truncated on character boundaries, so this never fails in practice.
        core::str::from_utf8(&self.message[..length]).ok()
    }

    /// Clears the kind and the message.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Records `error`, truncating its message to fit the buffer.
    pub fn set(&mut self, error: &CodecError) {
        self.set_message(error.kind(), format_args!("{error}"));
    }

    /// Records an arbitrary message under `kind`.
    pub fn set_message(&mut self, kind: AstcErrorKind, message: fmt::Arguments<'_>) {
        self.clear();
        self.kind = kind;
        let mut writer = MessageWriter {
            buffer: &mut self.message,
            length: 0,
        };
        // The writer truncates instead of failing.
        let _ = writer.write_fmt(message);
    }

    /// Borrows the descriptor behind a raw out-slot pointer.
    ///
    /// # Safety
    ///
    /// `error` must be null or valid for writes for the lifetime `'a`.
    pub(crate) unsafe fn from_ptr<'a>(error: *mut AstcErrorInfo) -> Option<&'a mut AstcErrorInfo> {
        unsafe { error.as_mut() }
    }
}

impl fmt::Debug for AstcErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AstcErrorInfo")
            .field("kind", &self.kind)
            .field("message", &self.message())
            .finish()
    }
}

/// Writes into the fixed message buffer, always leaving room for the NUL terminator.
struct MessageWriter<'a> {
    buffer: &'a mut [u8; ASTC_ENCODER_ERROR_SIZE],
    length: usize,
}

impl Write for MessageWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let available = ASTC_ENCODER_ERROR_SIZE - 1 - self.length;
        let mut take = s.len().min(available);
        while !s.is_char_boundary(take) {
            take -= 1;
        }

        self.buffer[self.length..self.length + take].copy_from_slice(&s.as_bytes()[..take]);
        self.length += take;
        self.buffer[self.length] = 0;
        Ok(())
    }
}

/// Returns the message stored in `error`, or null if there is none.
///
/// The returned pointer borrows from `error` and is valid while `error` is alive and unmodified.
///
/// # Safety
///
/// `error` must be null or point to a valid [`AstcErrorInfo`].
#[cfg_attr(feature = "c-exports", unsafe(no_mangle))]
pub unsafe extern "C" fn astc_error_info_message(error: *const AstcErrorInfo) -> *const c_char {
    let Some(error) = (unsafe { error.as_ref() }) else {
        return ptr::null();
    };

    match error.message() {
        Some(_) => error.message.as_ptr() as *const c_char,
        None => ptr::null(),
    }
}

/// Returns the kind of error stored in `error`.
///
/// # Safety
///
/// `error` must be null or point to a valid [`AstcErrorInfo`].
#[cfg_attr(feature = "c-exports", unsafe(no_mangle))]
pub unsafe extern "C" fn astc_error_info_kind(error: *const AstcErrorInfo) -> AstcErrorKind {
    match unsafe { error.as_ref() } {
        Some(error) => error.kind,
        None => AstcErrorKind::None,
    }
}
