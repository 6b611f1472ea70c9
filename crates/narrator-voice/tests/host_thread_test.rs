//! Entry points called from plain host threads, outside any runtime.

mod common;

use common::{assert_levels_restored, mixer, RecordingBackend};
use narrator_types::Gender;
use narrator_voice::{
    DictionaryStore, MemoryMixer, PhoneticDictionary, SettingsHandle, SpeechEngine,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap()
}

fn engine(backend: Arc<RecordingBackend>, mixer: Arc<MemoryMixer>) -> SpeechEngine {
    SpeechEngine::new(
        SettingsHandle::default(),
        DictionaryStore::with_dictionary(PhoneticDictionary::empty()),
        backend,
        mixer,
    )
}

#[test]
fn speak_from_host_thread_runs_on_given_runtime() {
    let runtime = runtime();
    let backend = Arc::new(RecordingBackend::new(Duration::from_millis(5)));
    let mixer = mixer();
    let engine = engine(backend.clone(), mixer.clone()).with_runtime(runtime.handle().clone());

    let handle = engine
        .speak("Hello there", Gender::Male, Duration::ZERO)
        .expect("scheduled");
    let report = runtime.block_on(handle).unwrap();

    assert_eq!(report.rendered, 1);
    assert_eq!(backend.rendered_texts(), ["Hello there"]);
    assert_levels_restored(&mixer);
}

#[test]
fn engine_built_inside_runtime_serves_other_threads() {
    let runtime = runtime();
    let backend = Arc::new(RecordingBackend::new(Duration::from_millis(5)));
    let mixer = mixer();
    let engine = {
        let _entered = runtime.enter();
        engine(backend.clone(), mixer.clone())
    };

    let handle = std::thread::spawn(move || engine.speak_bark(None, "A door creaks."))
        .join()
        .unwrap()
        .expect("scheduled");
    runtime.block_on(handle).unwrap();

    assert_eq!(backend.rendered_texts(), ["A door creaks."]);
}

#[test]
fn speak_without_runtime_does_not_panic() {
    let backend = Arc::new(RecordingBackend::new(Duration::from_millis(5)));
    let mixer = mixer();
    let engine = engine(backend.clone(), mixer.clone());

    assert!(engine
        .speak("Hello there", Gender::Male, Duration::ZERO)
        .is_none());
    assert!(backend.calls().is_empty());
    assert_levels_restored(&mixer);
}
