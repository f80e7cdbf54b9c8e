use arbitrary::{Arbitrary, Unstructured};
use astc_encoder_api::{
    AstcError, CompressionSession, CompressionSettings, CompressionSettingsBuilder, QualityPreset,
    RawImage,
};
use astc_encoder_codec::{
    AstcErrorInfo, AstcErrorKind, astc_image_decompress, astc_image_release,
    astc_raw_image_compress, astc_raw_image_create, astc_raw_image_release,
};
use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

fn gradient_image(width: usize, height: usize) -> RawImage {
    let span = (width + height - 2).max(1) as f32;
    let pixels: Vec<u8> = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x + y) as f32 / span))
        .flat_map(|t| [t, 0.5 * t + 0.25, 1.0 - t, 1.0].map(|c| (c * 255.0).round() as u8))
        .collect();
    RawImage::create(&pixels, width, height, 4, 1, false, false).unwrap()
}

fn recorder() -> (Arc<Mutex<Vec<f32>>>, impl FnMut(f32) + Send + 'static) {
    let values = Arc::new(Mutex::new(Vec::new()));
    let sink = values.clone();
    (values, move |progress| sink.lock().unwrap().push(progress))
}

#[tokio::test]
async fn compresses_the_documented_example() {
    let image = RawImage::create(&[0u8; 4 * 4 * 4], 4, 4, 4, 1, false, false).unwrap();
    assert_eq!(image.data().len(), 64);

    let settings = CompressionSettingsBuilder::new()
        .block_footprint(4, 4)
        .quality(0.5)
        .build();
    let compressed = CompressionSession::new(image, settings)
        .run(|_| {})
        .await
        .unwrap()
        .completed()
        .unwrap();

    assert_eq!(compressed.width(), 4);
    assert_eq!(compressed.height(), 4);
    assert_eq!(compressed.block_width(), 4);
    assert_eq!(compressed.block_height(), 4);
}

#[tokio::test]
async fn progress_is_monotonic_and_bounded() {
    let (values, on_progress) = recorder();
    let outcome = CompressionSession::new(gradient_image(40, 36), CompressionSettings::default())
        .run(on_progress)
        .await
        .unwrap();
    assert!(!outcome.is_cancelled());

    let values = values.lock().unwrap();
    assert_eq!(values.len(), 9);
    assert!(values.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(values.iter().all(|&value| (0.0..=1.0).contains(&value)));
}

#[tokio::test]
async fn cancelled_before_dispatch() {
    let session = CompressionSession::new(gradient_image(16, 16), CompressionSettings::default());
    session.cancellation_token().cancel();

    let (values, on_progress) = recorder();
    let outcome = session.run(on_progress).await.unwrap();
    assert!(outcome.is_cancelled());
    assert!(values.lock().unwrap().is_empty());
}

#[tokio::test]
async fn cancelled_at_a_codec_checkpoint() {
    let session = CompressionSession::new(gradient_image(64, 64), CompressionSettings::default());
    let token = session.cancellation_token();
    let (values, mut record) = recorder();

    let outcome = session
        .run(move |progress| {
            record(progress);
            token.cancel();
        })
        .await
        .unwrap();

    assert!(outcome.is_cancelled());
    assert!(outcome.completed().is_none());
    assert_eq!(*values.lock().unwrap(), [1.0 / 16.0]);
}

#[test]
fn cancelled_while_queued_for_a_worker() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .max_blocking_threads(1)
        .enable_time()
        .build()
        .unwrap();

    runtime.block_on(async {
        let (release, wait) = mpsc::channel::<()>();
        let blocker = tokio::task::spawn_blocking(move || wait.recv());

        let session =
            CompressionSession::new(gradient_image(16, 16), CompressionSettings::default());
        let token = session.cancellation_token();
        let (values, on_progress) = recorder();
        let run = session.run(on_progress);
        tokio::pin!(run);

        // Dispatch the worker behind the blocker without completing the run.
        tokio::select! {
            biased;
            _ = &mut run => panic!("run finished while the blocking pool was full"),
            _ = std::future::ready(()) => {}
        }

        token.cancel();
        release.send(()).unwrap();
        blocker.await.unwrap().unwrap();

        let outcome = run.await.unwrap();
        assert!(outcome.is_cancelled());
        assert!(values.lock().unwrap().is_empty());
    });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dropping_a_running_session_stops_the_codec() {
    let settings = CompressionSettingsBuilder::new()
        .preset(QualityPreset::Exhaustive)
        .build();
    let session = CompressionSession::new(gradient_image(256, 256), settings);
    let (sender, receiver) = mpsc::channel();
    let handle = tokio::spawn(session.run(move |progress| {
        let _ = sender.send(progress);
    }));

    let first = receiver.recv().unwrap();
    handle.abort();
    assert!(handle.await.unwrap_err().is_cancelled());

    // The sender is dropped once the worker returns.
    let later: Vec<f32> = receiver.iter().collect();
    assert!(later.len() <= 1, "{} checkpoints after the abort", later.len());
    assert!(later.iter().all(|&progress| progress > first && progress < 1.0));
}

#[tokio::test]
async fn expired_deadline_cancels() {
    let settings = CompressionSettingsBuilder::new()
        .preset(QualityPreset::Exhaustive)
        .build();
    let outcome = CompressionSession::new(gradient_image(256, 256), settings)
        .run_with_deadline(Duration::ZERO, |_| {})
        .await
        .unwrap();
    assert!(outcome.is_cancelled());
}

#[tokio::test]
async fn generous_deadline_completes() {
    let outcome = CompressionSession::new(gradient_image(8, 8), CompressionSettings::default())
        .run_with_deadline(Duration::from_secs(600), |_| {})
        .await
        .unwrap();
    assert!(outcome.completed().is_some());
}

#[tokio::test]
async fn codec_errors_are_not_cancellation() {
    let settings = CompressionSettingsBuilder::new().quality(1.5).build();
    let error = CompressionSession::new(gradient_image(8, 8), settings)
        .run(|_| {})
        .await
        .unwrap_err();
    assert!(matches!(error, AstcError::InvalidInput(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sessions_run_concurrently_and_round_trip() {
    let footprints = [(4, 4), (6, 6)];
    let sessions = footprints.map(|(block_width, block_height)| {
        let settings = CompressionSettingsBuilder::new()
            .block_footprint(block_width, block_height)
            .build();
        tokio::spawn(CompressionSession::new(gradient_image(30, 20), settings).run(|_| {}))
    });

    let source = gradient_image(30, 20);
    for (session, (block_width, _)) in sessions.into_iter().zip(footprints) {
        let compressed = session.await.unwrap().unwrap().completed().unwrap();
        assert_eq!(compressed.block_width(), block_width);

        let restored = compressed.decompress().unwrap();
        assert_eq!((restored.width(), restored.height()), (30, 20));

        let total: u64 = restored
            .data()
            .iter()
            .zip(source.data())
            .map(|(&a, &b)| u64::from(a.abs_diff(b)))
            .sum();
        let mean = total as f64 / source.data().len() as f64;
        assert!(mean < 6.0, "mean error {mean} with {block_width}px blocks");
    }
}

#[derive(Debug, Arbitrary)]
struct ImageCall {
    width: u8,
    height: u8,
    num_components: u8,
    component_size: u8,
    resize: i8,
    linear: bool,
    hdr: bool,
    block: u8,
    quality: u8,
}

/// Either a live object with an untouched descriptor, or null with a message.
fn assert_exactly_one(is_null: bool, error: &AstcErrorInfo) {
    if is_null {
        assert_ne!(error.kind(), AstcErrorKind::None);
        assert!(error.message().is_some(), "null result without a message");
    } else {
        assert_eq!(error.kind(), AstcErrorKind::None);
        assert!(error.message().is_none(), "result with a message: {error:?}");
    }
}

#[test]
fn every_fallible_call_returns_exactly_one_of_result_or_error() {
    const BLOCKS: [(usize, usize); 6] = [(4, 4), (5, 4), (6, 6), (8, 5), (3, 3), (7, 7)];

    let mut state = 0x2545_F491_4F6C_DD1Du64;
    let bytes: Vec<u8> = (0..64 * 1024)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 32) as u8
        })
        .collect();
    let mut input = Unstructured::new(&bytes);

    let (mut successes, mut failures) = (0, 0);
    for _ in 0..1000 {
        let call = ImageCall::arbitrary(&mut input).unwrap();
        let width = usize::from(call.width % 13);
        let height = usize::from(call.height % 13);
        let num_components = usize::from(call.num_components % 6);
        let component_size = usize::from(call.component_size % 5);
        let expected = width * height * num_components * component_size;
        let length = if call.resize % 4 == 0 {
            expected.saturating_add_signed(isize::from(call.resize % 3))
        } else {
            expected
        };
        let pixels = vec![0x5Au8; length];

        let mut error = AstcErrorInfo::new();
        let raw = unsafe {
            astc_raw_image_create(
                pixels.as_ptr(),
                pixels.len(),
                width,
                height,
                num_components,
                component_size,
                call.linear,
                call.hdr,
                &mut error,
            )
        };
        assert_exactly_one(raw.is_null(), &error);

        let safe = RawImage::create(
            &pixels,
            width,
            height,
            num_components,
            component_size,
            call.linear,
            call.hdr,
        );
        assert_eq!(safe.is_ok(), !raw.is_null());

        if raw.is_null() {
            failures += 1;
            continue;
        }
        successes += 1;

        let (block_width, block_height) = BLOCKS[usize::from(call.block) % BLOCKS.len()];
        let quality = f32::from(call.quality) / 200.0;
        let mut error = AstcErrorInfo::new();
        let compressed = unsafe {
            astc_raw_image_compress(
                raw,
                block_width,
                block_height,
                quality,
                &mut error,
                core::ptr::null_mut(),
                None,
            )
        };
        assert_exactly_one(compressed.is_null(), &error);

        if !compressed.is_null() {
            let mut error = AstcErrorInfo::new();
            let restored = unsafe {
                astc_image_decompress(compressed, &mut error, core::ptr::null_mut(), None)
            };
            assert_exactly_one(restored.is_null(), &error);
            unsafe {
                astc_raw_image_release(restored);
                astc_image_release(compressed);
            }
        }
        unsafe { astc_raw_image_release(raw) };
    }

    assert!(successes > 0 && failures > 0);
}
