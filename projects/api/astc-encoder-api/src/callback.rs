//! Bridges Rust progress closures to the codec's plain function pointer callback.

use astc_encoder_codec::AstcProgressCallback;
use core::ffi::c_void;
use log::trace;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Per call record whose address is handed to the codec as `user_info`.
///
/// Lives on the stack of [`ProgressContext::with`], so the codec cannot hold on to it
/// once the call returns.
pub(crate) struct ProgressContext<'a> {
    on_progress: &'a mut dyn FnMut(f32) -> bool,
    last: f32,
    panic: Option<Box<dyn Any + Send>>,
}

impl ProgressContext<'_> {
    /// Runs `call` with a `user_info` handle and trampoline that forward to `on_progress`.
    ///
    /// Progress values reach `on_progress` clamped to `[0, 1]` and never decreasing.
    /// A panic inside `on_progress` stops the codec and is resumed here once `call`
    /// has returned.
    pub(crate) fn with<R>(
        on_progress: &mut dyn FnMut(f32) -> bool,
        call: impl FnOnce(*mut c_void, Option<AstcProgressCallback>) -> R,
    ) -> R {
        let mut context = ProgressContext {
            on_progress,
            last: 0.0,
            panic: None,
        };

        let result = call(
            &mut context as *mut ProgressContext<'_> as *mut c_void,
            Some(progress_trampoline),
        );

        if let Some(payload) = context.panic.take() {
            panic::resume_unwind(payload);
        }
        result
    }
}

unsafe extern "C" fn progress_trampoline(user_info: *mut c_void, progress: f32) -> bool {
    // SAFETY: `user_info` is the context created by `ProgressContext::with`, which outlives the call.
    let context = unsafe { &mut *(user_info as *mut ProgressContext<'_>) };
    if context.panic.is_some() {
        return true;
    }

    let progress = if progress.is_nan() {
        context.last
    } else {
        progress.clamp(context.last, 1.0)
    };
    context.last = progress;
    trace!("Progress {:.1}%", progress * 100.0);

    let on_progress = &mut context.on_progress;
    match panic::catch_unwind(AssertUnwindSafe(|| on_progress(progress))) {
        Ok(cancel) => cancel,
        Err(payload) => {
            context.panic = Some(payload);
            true
        }
    }
}
