#![cfg(unix)]

use narrator_types::{VoiceKind, VoiceProfile};
use narrator_voice::{InvocationShape, ProcessBackend, SynthesisBackend, VoiceError};
use std::path::Path;
use std::time::Duration;

fn profile(name: &str) -> VoiceProfile {
    VoiceProfile {
        kind: VoiceKind::Narrator,
        name: name.to_string(),
        pitch: 0,
        rate: 0,
        volume: 100,
    }
}

/// Writes a shell script that the backend runs as `sh <script> <text>`.
fn script(dir: &Path, body: &str) -> String {
    let path = dir.join("speak.sh");
    std::fs::write(&path, body).unwrap();
    path.display().to_string()
}

#[tokio::test]
async fn passes_sanitized_text_as_single_argument() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("spoken.txt");
    let script = script(
        dir.path(),
        &format!("printf '%s|%s' \"$#\" \"$1\" > '{}'\n", out.display()),
    );

    let backend = ProcessBackend::new("sh")
        .with_shape(InvocationShape::VoiceAndText)
        .with_command_logging(true);
    backend
        .render("Fine; rm -rf $HOME `x` \"quoted\"", &profile(&script))
        .await
        .unwrap();

    let spoken = std::fs::read_to_string(&out).unwrap();
    assert_eq!(spoken, "1|Fine  rm -rf HOME x quoted");
}

#[tokio::test]
async fn blank_text_does_not_start_process() {
    let backend = ProcessBackend::new("/definitely/not/a/program");
    backend.render("  \"\" ", &profile("Daniel")).await.unwrap();
}

#[tokio::test]
async fn non_zero_exit_is_reported_and_not_fatal() {
    let backend = ProcessBackend::new("false").with_shape(InvocationShape::VoiceAndText);
    let err = backend.render("hello", &profile("Daniel")).await.unwrap_err();
    assert!(matches!(err, VoiceError::NonZeroExit { .. }), "{err:?}");
    assert!(!err.is_fatal());
}

#[tokio::test]
async fn missing_program_is_fatal() {
    let backend = ProcessBackend::new("/definitely/not/a/program");
    let err = backend.render("hello", &profile("Daniel")).await.unwrap_err();
    assert!(matches!(err, VoiceError::BackendUnavailable { .. }), "{err:?}");
    assert!(err.is_fatal());
}

#[tokio::test]
async fn slow_render_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let script = script(dir.path(), "sleep 5\n");
    let backend = ProcessBackend::new("sh")
        .with_shape(InvocationShape::VoiceAndText)
        .with_timeout(Duration::from_millis(200));

    let err = backend.render("hello", &profile(&script)).await.unwrap_err();
    assert!(matches!(err, VoiceError::Timeout(_)), "{err:?}");
    assert!(!err.is_fatal());
}
