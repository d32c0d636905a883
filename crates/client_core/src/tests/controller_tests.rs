use super::*;
use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use shared::{assessment, domain::RawPrediction};

/// Responds per file name with a scripted delay and outcome. An
/// `Err(status)` entry becomes a RemoteService failure.
struct ScriptedClassifier {
    calls: AtomicUsize,
    script: HashMap<String, (Duration, Result<ClassificationResult, u16>)>,
}

impl ScriptedClassifier {
    fn new(
        entries: Vec<(&str, Duration, Result<ClassificationResult, u16>)>,
    ) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script: entries
                .into_iter()
                .map(|(name, delay, outcome)| (name.to_string(), (delay, outcome)))
                .collect(),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, file: &UploadedFile) -> Result<ClassificationResult, ClassifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (delay, outcome) = self
            .script
            .get(&file.file_name)
            .expect("unscripted classify call");
        tokio::time::sleep(*delay).await;
        outcome
            .clone()
            .map_err(|status| ClassifyError::RemoteService {
                status,
                body: "scripted failure".to_string(),
            })
    }
}

fn result_with_confidence(percent: f64) -> ClassificationResult {
    assessment::assess(&RawPrediction {
        prediction: "New".to_string(),
        confidence: percent,
    })
}

fn image_file(name: &str) -> UploadedFile {
    UploadedFile::new(name.as_bytes().to_vec(), "image/png", name)
}

#[tokio::test]
async fn non_image_selection_fails_without_a_classifier_call() {
    let classifier = ScriptedClassifier::new(Vec::new());
    let controller = UploadController::new(classifier.clone());

    controller
        .select_file(UploadedFile::new(
            b"%PDF-1.7".to_vec(),
            "application/pdf",
            "book.pdf",
        ))
        .await;

    assert_eq!(
        controller.current_state().await,
        RequestState::Failed(ErrorKind::InvalidFileType)
    );
    assert_eq!(
        ErrorKind::InvalidFileType.user_message(),
        "Please upload a valid image file"
    );
    assert_eq!(classifier.calls(), 0);
    assert!(controller.current_preview().await.is_none());
}

#[tokio::test]
async fn successful_attempt_walks_previewing_analyzing_succeeded() {
    let expected = result_with_confidence(92.0);
    let classifier = ScriptedClassifier::new(vec![(
        "book.png",
        Duration::from_millis(10),
        Ok(expected.clone()),
    )]);
    let controller = UploadController::new(classifier);
    let mut states = controller.subscribe_states();

    let file = image_file("book.png");
    controller.select_file(file.clone()).await;

    assert_eq!(states.recv().await.expect("state"), RequestState::Previewing);
    assert_eq!(states.recv().await.expect("state"), RequestState::Analyzing);
    assert_eq!(
        states.recv().await.expect("state"),
        RequestState::Succeeded(expected)
    );
    assert_eq!(
        controller.current_preview().await.expect("preview"),
        PreviewHandle::derive(&file)
    );
}

#[tokio::test]
async fn failed_attempt_exposes_error_kind_with_status() {
    let classifier =
        ScriptedClassifier::new(vec![("book.png", Duration::from_millis(10), Err(503))]);
    let controller = UploadController::new(classifier);
    let mut states = controller.subscribe_states();

    controller.select_file(image_file("book.png")).await;

    let terminal = loop {
        let state = states.recv().await.expect("state");
        if state.is_terminal() {
            break state;
        }
    };
    assert_eq!(
        terminal,
        RequestState::Failed(ErrorKind::RemoteService { status: 503 })
    );
}

#[tokio::test]
async fn slow_first_response_cannot_overwrite_the_newer_result() {
    let first = result_with_confidence(10.0);
    let second = result_with_confidence(90.0);
    let classifier = ScriptedClassifier::new(vec![
        ("first.png", Duration::from_millis(250), Ok(first)),
        ("second.png", Duration::from_millis(10), Ok(second.clone())),
    ]);
    let controller = UploadController::new(classifier.clone());

    controller.select_file(image_file("first.png")).await;
    controller.select_file(image_file("second.png")).await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(
        controller.current_state().await,
        RequestState::Succeeded(second)
    );
    assert_eq!(classifier.calls(), 2);
}

#[tokio::test]
async fn reset_suppresses_an_in_flight_response() {
    let classifier = ScriptedClassifier::new(vec![(
        "book.png",
        Duration::from_millis(200),
        Ok(result_with_confidence(75.0)),
    )]);
    let controller = UploadController::new(classifier);

    controller.select_file(image_file("book.png")).await;
    assert_eq!(controller.current_state().await, RequestState::Analyzing);

    controller.reset().await;
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(controller.current_state().await, RequestState::Idle);
    assert!(controller.current_preview().await.is_none());
}

#[tokio::test]
async fn new_selection_replaces_the_preview() {
    let classifier = ScriptedClassifier::new(vec![
        (
            "first.png",
            Duration::from_millis(10),
            Ok(result_with_confidence(50.0)),
        ),
        (
            "second.png",
            Duration::from_millis(10),
            Ok(result_with_confidence(60.0)),
        ),
    ]);
    let controller = UploadController::new(classifier);

    controller.select_file(image_file("first.png")).await;
    let replacement = image_file("second.png");
    controller.select_file(replacement.clone()).await;

    assert_eq!(
        controller.current_preview().await.expect("preview"),
        PreviewHandle::derive(&replacement)
    );
}
