//! Integration tests for normalization wiring and soundbit playback


use soundbit_core::{AudioBuffer, SampleRate};
use soundbit_loudness::{estimate_loudness, gain_for_loudness, LoudnessError, PROCESSOR_NAME};
use soundbit_playback::{
    AudioHost, CaptureDestination, LocalHost, NormalizerSettings, Normalizer, NullDestination,
    PlaybackError, ProcessorRegistry, RenderOptions, Soundboard, ToggleOutcome,
};
use std::sync::Arc;
use test_helpers::{init_tracing, sine_buffer, FlakyHost, MockSound};

fn offline_host() -> Arc<LocalHost> {
    Arc::new(LocalHost::new(RenderOptions::offline()))
}

fn offline_settings() -> NormalizerSettings {
    NormalizerSettings {
        realtime: false,
        ..NormalizerSettings::default()
    }
}

fn offline_board(settings: NormalizerSettings) -> (Arc<LocalHost>, Soundboard) {
    let host = Arc::new(LocalHost::from_settings(&settings));
    let board = Soundboard::new(host.clone(), settings).unwrap();
    (host, board)
}

// ===== Registration =====

#[tokio::test]
async fn test_registration_happens_once() {
    init_tracing();
    let host = offline_host();
    let registry = ProcessorRegistry::default();

    let (a, b) = tokio::join!(
        registry.ensure_registered(&*host),
        registry.ensure_registered(&*host)
    );
    a.unwrap();
    b.unwrap();
    registry.ensure_registered(&*host).await.unwrap();

    assert!(registry.is_registered());
    assert_eq!(host.registration_calls(), 1);
    assert!(host.is_registered(PROCESSOR_NAME));
}

#[tokio::test]
async fn test_normalizers_share_host_registration() {
    init_tracing();
    let host = offline_host();
    let first = Normalizer::new(host.clone());
    let second = Normalizer::new(host.clone());

    let a = host.load("a", sine_buffer(0.1, 0.2), Box::new(NullDestination)).unwrap();
    let b = host.load("b", sine_buffer(0.2, 0.2), Box::new(NullDestination)).unwrap();
    first.normalize_audio(&*a).await.unwrap();
    second.normalize_audio(&*b).await.unwrap();

    assert_eq!(host.registration_calls(), 1);
    assert!(first.registry().is_registered());
    assert!(second.registry().is_registered());
}

#[tokio::test]
async fn test_unavailable_host_is_reported() {
    init_tracing();
    let host: Arc<dyn AudioHost> = Arc::new(LocalHost::unavailable());
    let normalizer = Normalizer::new(host);
    let sound = MockSound::new(sine_buffer(0.1, 0.5));

    let result = normalizer.normalize_audio(&sound).await;

    assert!(matches!(result, Err(PlaybackError::HostUnavailable)));
    assert!(!normalizer.registry().is_registered());
    assert_eq!(sound.node_count(), 0);
}

#[tokio::test]
async fn test_failed_registration_is_not_cached() {
    init_tracing();
    let host = Arc::new(FlakyHost::new(1));
    let normalizer = Normalizer::new(host.clone());
    let sound = MockSound::new(sine_buffer(0.1, 0.5));

    let first = normalizer.normalize_audio(&sound).await;
    assert!(matches!(first, Err(PlaybackError::Registration { .. })));
    assert_eq!(host.calls(), 1);
    assert_eq!(sound.node_count(), 0);

    normalizer.normalize_audio(&sound).await.unwrap();
    normalizer.normalize_audio(&sound).await.unwrap();
    assert_eq!(host.calls(), 2);
    assert_eq!(sound.node_count(), 2);
}

// ===== normalize_audio =====

#[tokio::test]
async fn test_normalize_posts_measured_loudness() {
    init_tracing();
    let buffer = sine_buffer(0.1, 1.0);
    let normalizer = Normalizer::new(Arc::new(FlakyHost::new(0)));
    let sound = MockSound::new(buffer.clone());

    let normalized = normalizer.normalize_audio(&sound).await.unwrap();

    let expected = estimate_loudness(&buffer).unwrap();
    assert!((normalized.report().integrated_lufs - expected).abs() < 1e-9);
    assert_eq!(normalized.port().target_lufs(), -14.0);
    assert!((normalized.gain() - gain_for_loudness(-14.0, expected)).abs() < 1e-12);
    assert!(normalized.connection().is_connected());
}

#[tokio::test]
async fn test_node_disconnected_when_sound_ends() {
    init_tracing();
    let normalizer = Normalizer::new(Arc::new(FlakyHost::new(0)));
    let sound = MockSound::new(sine_buffer(0.1, 0.5));

    let normalized = normalizer.normalize_audio(&sound).await.unwrap();
    sound.end();

    assert!(!normalized.connection().is_connected());
    assert_eq!(sound.disconnects(), 1);

    // A manual disconnect afterwards is a no-op
    normalized.disconnect();
    assert_eq!(sound.disconnects(), 1);
}

#[tokio::test]
async fn test_empty_buffer_aborts_normalization_only() {
    init_tracing();
    let normalizer = Normalizer::new(Arc::new(FlakyHost::new(0)));
    let empty = Arc::new(AudioBuffer::mono(SampleRate::DVD_QUALITY, Vec::new()).unwrap());
    let sound = MockSound::new(empty);

    let result = normalizer.normalize_audio(&sound).await;

    assert!(matches!(
        result,
        Err(PlaybackError::Loudness(LoudnessError::EmptyBuffer))
    ));
    assert_eq!(sound.node_count(), 0);
}

#[tokio::test]
async fn test_custom_target_from_settings() {
    init_tracing();
    let settings = NormalizerSettings {
        target_lufs: -23.0,
        ..NormalizerSettings::default()
    };
    let normalizer = Normalizer::with_settings(Arc::new(FlakyHost::new(0)), &settings).unwrap();
    let sound = MockSound::new(sine_buffer(0.1, 0.5));

    let normalized = normalizer.normalize_audio(&sound).await.unwrap();

    assert_eq!(normalizer.target_lufs(), -23.0);
    assert_eq!(normalized.port().target_lufs(), -23.0);
}

#[tokio::test]
async fn test_invalid_settings_rejected() {
    let settings = NormalizerSettings {
        frame_size: 0,
        ..NormalizerSettings::default()
    };
    let result = Normalizer::with_settings(Arc::new(FlakyHost::new(0)), &settings);
    assert!(matches!(result, Err(PlaybackError::InvalidSettings(_))));
}

// ===== End to end on the local host =====

#[tokio::test]
async fn test_rendered_output_is_gain_corrected() {
    init_tracing();
    let host = offline_host();
    let normalizer = Normalizer::new(host.clone());
    let buffer = sine_buffer(0.1, 1.0);
    let capture = CaptureDestination::new();

    let sound = host.load("sine", buffer.clone(), Box::new(capture.clone())).unwrap();
    let normalized = normalizer.normalize_audio(&*sound).await.unwrap();
    sound.play().unwrap();
    sound.wait().unwrap();

    let gain = normalized.gain();
    let output = &capture.captured()[0];
    assert_eq!(output.len(), buffer.len());
    for (out, input) in output.iter().zip(buffer.channel(0)) {
        let expected = (f64::from(*input) * gain) as f32;
        assert!((out - expected).abs() < 1e-6);
    }

    // Ending the sound removed the processor
    assert!(sound.has_ended());
    assert!(!normalized.connection().is_connected());
}

#[tokio::test]
async fn test_normalized_render_measures_at_target() {
    init_tracing();
    let host = offline_host();
    let normalizer = Normalizer::new(host.clone());
    let capture = CaptureDestination::new();

    let sound = host
        .load("quiet", sine_buffer(0.05, 1.0), Box::new(capture.clone()))
        .unwrap();
    normalizer.normalize_audio(&*sound).await.unwrap();
    sound.play().unwrap();
    sound.wait().unwrap();

    let rendered = AudioBuffer::new(SampleRate::DVD_QUALITY, capture.captured()).unwrap();
    let loudness = estimate_loudness(&rendered).unwrap();
    assert!((loudness - -14.0).abs() < 0.01, "got {loudness}");
}

#[tokio::test]
async fn test_connect_after_end_fails() {
    init_tracing();
    let host = offline_host();
    let normalizer = Normalizer::new(host.clone());

    let sound = host
        .load("gone", sine_buffer(0.1, 0.1), Box::new(NullDestination))
        .unwrap();
    sound.stop();

    let result = normalizer.normalize_audio(&*sound).await;
    assert!(matches!(result, Err(PlaybackError::SoundEnded(_))));
}

// ===== Soundboard =====

#[tokio::test]
async fn test_toggle_starts_then_stops() {
    init_tracing();
    let host = Arc::new(LocalHost::default());
    let board = Soundboard::new(host.clone(), NormalizerSettings::default()).unwrap();

    let started = board
        .toggle("rain", sine_buffer(0.1, 10.0), Box::new(NullDestination))
        .await
        .unwrap();
    let ToggleOutcome::Started(sound) = started else {
        panic!("expected a new session");
    };
    assert!(board.is_playing("rain"));
    assert_eq!(board.playing_count(), 1);
    assert_eq!(host.registration_calls(), 1);

    let stopped = board
        .toggle("rain", sine_buffer(0.1, 10.0), Box::new(NullDestination))
        .await
        .unwrap();
    assert!(matches!(stopped, ToggleOutcome::Stopped));
    assert!(!board.is_playing("rain"));

    sound.wait().unwrap();
    assert!(sound.has_ended());
}

#[tokio::test]
async fn test_ended_soundbit_leaves_board() {
    init_tracing();
    let (_host, board) = offline_board(offline_settings());

    let ToggleOutcome::Started(sound) = board
        .toggle("click", sine_buffer(0.1, 0.05), Box::new(NullDestination))
        .await
        .unwrap()
    else {
        panic!("expected a new session");
    };
    sound.wait().unwrap();

    assert!(!board.is_playing("click"));
    assert_eq!(board.playing_count(), 0);
}

#[tokio::test]
async fn test_each_session_gets_fresh_processor() {
    init_tracing();
    let (host, board) = offline_board(offline_settings());

    for _ in 0..3 {
        let ToggleOutcome::Started(sound) = board
            .toggle("wind", sine_buffer(0.2, 0.05), Box::new(NullDestination))
            .await
            .unwrap()
        else {
            panic!("expected a new session");
        };
        sound.wait().unwrap();
    }

    assert_eq!(host.registration_calls(), 1);
    assert_eq!(board.playing_count(), 0);
}

#[tokio::test]
async fn test_failed_normalization_still_plays() {
    init_tracing();
    let (_host, board) = offline_board(offline_settings());
    let capture = CaptureDestination::new();
    let empty = Arc::new(AudioBuffer::mono(SampleRate::DVD_QUALITY, Vec::new()).unwrap());

    let outcome = board.toggle("empty", empty, Box::new(capture.clone())).await.unwrap();
    let ToggleOutcome::Started(sound) = outcome else {
        panic!("expected a new session");
    };
    sound.wait().unwrap();

    assert!(sound.has_ended());
    assert_eq!(capture.frames(), 0);
}

#[tokio::test]
async fn test_disabled_normalization_skips_registration() {
    init_tracing();
    let (host, board) = offline_board(NormalizerSettings {
        enabled: false,
        ..offline_settings()
    });
    let buffer = sine_buffer(0.1, 0.1);
    let capture = CaptureDestination::new();

    let ToggleOutcome::Started(sound) = board
        .toggle("raw", buffer.clone(), Box::new(capture.clone()))
        .await
        .unwrap()
    else {
        panic!("expected a new session");
    };
    sound.wait().unwrap();

    assert_eq!(host.registration_calls(), 0);
    assert_eq!(capture.captured()[0], buffer.channel(0));
}

#[tokio::test]
async fn test_stop_all() {
    init_tracing();
    let host = Arc::new(LocalHost::default());
    let board = Soundboard::new(host, NormalizerSettings::default()).unwrap();

    for id in ["a", "b"] {
        board
            .toggle(id, sine_buffer(0.1, 10.0), Box::new(NullDestination))
            .await
            .unwrap();
    }
    assert_eq!(board.playing_count(), 2);

    board.stop_all();
    assert_eq!(board.playing_count(), 0);
}
