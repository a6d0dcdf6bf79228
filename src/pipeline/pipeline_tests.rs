use super::*;
use crate::capture::CaptureOutcome;
use crate::capture::CaptureError;
use crate::config::ConfirmMode;
use crate::storage::StorageResult;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::{TempDir, tempdir};

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 1, 2, 3];

struct FakeCapture {
    image: Option<Vec<u8>>,
    calls: AtomicUsize,
}

impl FakeCapture {
    fn with_image() -> Arc<Self> {
        Arc::new(Self {
            image: Some(PNG.to_vec()),
            calls: AtomicUsize::new(0),
        })
    }

    fn empty() -> Arc<Self> {
        Arc::new(Self {
            image: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClipboardCapture for FakeCapture {
    async fn save_to_file(&self, target: &Path) -> CaptureOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.image {
            Some(bytes) => {
                std::fs::write(target, bytes).unwrap();
                CaptureOutcome::Saved(target.to_path_buf())
            }
            None => CaptureOutcome::NoImage,
        }
    }

    async fn read_png(&self) -> CaptureOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.image {
            Some(bytes) => CaptureOutcome::Encoded(bytes.clone()),
            None => CaptureOutcome::NoImage,
        }
    }
}

#[derive(Default)]
struct ScriptedPrompter {
    confirms: Mutex<VecDeque<bool>>,
    inputs: Mutex<VecDeque<Option<String>>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    fn confirming(answers: &[bool]) -> Arc<Self> {
        Arc::new(Self {
            confirms: Mutex::new(answers.iter().copied().collect()),
            ..Default::default()
        })
    }

    fn answering(answers: Vec<Option<&str>>) -> Arc<Self> {
        Arc::new(Self {
            inputs: Mutex::new(answers.into_iter().map(|a| a.map(str::to_string)).collect()),
            ..Default::default()
        })
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn confirm(&self, message: &str, _accept_label: &str) -> bool {
        self.asked.lock().unwrap().push(message.to_string());
        self.confirms.lock().unwrap().pop_front().unwrap_or(false)
    }

    async fn input(&self, prompt: &str, default: &str) -> Option<String> {
        self.asked.lock().unwrap().push(format!("{} [{}]", prompt, default));
        self.inputs.lock().unwrap().pop_front().flatten()
    }
}

#[derive(Default)]
struct RecordingEditor {
    inserted: Mutex<Vec<String>>,
}

#[async_trait]
impl DocumentEditor for RecordingEditor {
    async fn insert(&self, _document: &DocumentContext, text: &str) -> PasteResult<()> {
        self.inserted.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct FakeStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl BlobStore for FakeStore {
    async fn container_exists(&self, _container: &str) -> StorageResult<bool> {
        Ok(true)
    }

    async fn create_container(&self, _container: &str, _public_blobs: bool) -> StorageResult<()> {
        Ok(())
    }

    async fn list_blobs(&self, _container: &str, prefix: &str) -> StorageResult<Vec<String>> {
        Ok(self
            .blobs
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn delete_blob(&self, _container: &str, key: &str) -> StorageResult<()> {
        self.blobs.lock().unwrap().remove(key);
        Ok(())
    }

    async fn upload_blob(
        &self,
        container: &str,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        self.blobs.lock().unwrap().insert(key.to_string(), bytes);
        Ok(format!("https://acct.blob.core.windows.net/{}/{}", container, key))
    }
}

struct Fixture {
    dir: TempDir,
    document: DocumentContext,
}

impl Fixture {
    fn new(selected: &str) -> Self {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.md");
        std::fs::write(&path, "# Notes\n").unwrap();
        let document = DocumentContext::new(&path)
            .with_project_root(Some(dir.path().to_path_buf()))
            .with_selected_text(selected);
        Self { dir, document }
    }

    fn assets(&self) -> PathBuf {
        self.dir.path().join("assets")
    }
}

fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.path = "assets".to_string();
    config.base_path = "${currentFileDir}".to_string();
    config
}

fn pipeline(
    capture: Arc<FakeCapture>,
    prompter: Arc<ScriptedPrompter>,
    editor: Arc<RecordingEditor>,
) -> (PastePipeline, mpsc::UnboundedReceiver<PasteEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let pipeline = PastePipeline::new(capture, prompter, editor).with_event_sender(tx);
    (pipeline, rx)
}

fn stages(rx: &mut mpsc::UnboundedReceiver<PasteEvent>) -> Vec<Stage> {
    let mut stages = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let PasteEvent::StageEntered(stage) = event {
            stages.push(stage);
        }
    }
    stages
}

#[tokio::test]
async fn pastes_selection_named_image_as_markdown() {
    let fixture = Fixture::new("diagram");
    let capture = FakeCapture::with_image();
    let editor = Arc::new(RecordingEditor::default());
    let (pipeline, mut rx) = pipeline(capture.clone(), Arc::default(), editor.clone());

    let outcome = pipeline.run(&config(), &fixture.document).await.unwrap();

    let image = fixture.assets().join("diagram.png");
    assert_eq!(
        outcome,
        PasteOutcome::Inserted {
            text: "![](assets/diagram.png)".to_string(),
            location: ImageLocation::Local(image.clone()),
        }
    );
    assert_eq!(std::fs::read(&image).unwrap(), PNG);
    assert_eq!(*editor.inserted.lock().unwrap(), vec!["![](assets/diagram.png)"]);
    assert_eq!(
        stages(&mut rx),
        vec![
            Stage::Idle,
            Stage::ConfigLoaded,
            Stage::PathSynthesized,
            Stage::Captured,
            Stage::Rendered,
            Stage::Inserted,
        ]
    );
}

#[tokio::test]
async fn empty_selection_uses_timestamp_name() {
    let fixture = Fixture::new("");
    let mut config = config();
    config.default_name = "YYYY-MM-DD".to_string();
    let (pipeline, _rx) = pipeline(FakeCapture::with_image(), Arc::default(), Arc::default());

    let now = Utc.from_utc_datetime(
        &NaiveDate::from_ymd_opt(2023, 11, 2)
            .and_then(|d| d.and_hms_opt(8, 0, 0))
            .unwrap(),
    );
    let outcome = pipeline.run_at(&config, &fixture.document, &now).await.unwrap();

    assert!(matches!(outcome, PasteOutcome::Inserted { ref text, .. } if text == "![](assets/2023-11-02.png)"));
    assert!(fixture.assets().join("2023-11-02.png").is_file());
}

#[tokio::test]
async fn spaces_in_names_are_encoded() {
    let fixture = Fixture::new("my pic");
    let (pipeline, _rx) = pipeline(FakeCapture::with_image(), Arc::default(), Arc::default());

    let outcome = pipeline.run(&config(), &fixture.document).await.unwrap();

    assert!(matches!(outcome, PasteOutcome::Inserted { ref text, .. } if text == "![](assets/my%20pic.png)"));
    assert!(fixture.assets().join("my pic.png").is_file());
}

#[tokio::test]
async fn invalid_selection_aborts_before_side_effects() {
    let fixture = Fixture::new("a:b");
    let capture = FakeCapture::with_image();
    let editor = Arc::new(RecordingEditor::default());
    let (pipeline, _rx) = pipeline(capture.clone(), Arc::default(), editor.clone());

    let err = pipeline.run(&config(), &fixture.document).await.unwrap_err();

    assert!(matches!(err, PasteError::InvalidSelection { .. }));
    assert!(!fixture.assets().exists());
    assert_eq!(capture.calls(), 0);
    assert!(editor.inserted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn padded_folder_is_a_configuration_error() {
    let fixture = Fixture::new("diagram");
    let mut config = config();
    config.path = "assets ".to_string();
    let capture = FakeCapture::with_image();
    let (pipeline, _rx) = pipeline(capture.clone(), Arc::default(), Arc::default());

    let err = pipeline.run(&config, &fixture.document).await.unwrap_err();

    assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
    assert_eq!(capture.calls(), 0);
}

#[tokio::test]
async fn declining_overwrite_keeps_existing_file() {
    let fixture = Fixture::new("diagram");
    std::fs::create_dir_all(fixture.assets()).unwrap();
    let image = fixture.assets().join("diagram.png");
    std::fs::write(&image, b"original").unwrap();

    let capture = FakeCapture::with_image();
    let prompter = ScriptedPrompter::confirming(&[false]);
    let editor = Arc::new(RecordingEditor::default());
    let (pipeline, mut rx) = pipeline(capture.clone(), prompter.clone(), editor.clone());

    let outcome = pipeline.run(&config(), &fixture.document).await.unwrap();

    assert_eq!(outcome, PasteOutcome::Aborted(AbortReason::OverwriteDeclined));
    assert_eq!(std::fs::read(&image).unwrap(), b"original");
    assert_eq!(capture.calls(), 0);
    assert!(editor.inserted.lock().unwrap().is_empty());
    assert!(prompter.asked.lock().unwrap()[0].contains("diagram.png"));
    assert!(!stages(&mut rx).contains(&Stage::Captured));
}

#[tokio::test]
async fn accepting_overwrite_replaces_file() {
    let fixture = Fixture::new("diagram");
    std::fs::create_dir_all(fixture.assets()).unwrap();
    let image = fixture.assets().join("diagram.png");
    std::fs::write(&image, b"original").unwrap();

    let (pipeline, _rx) = pipeline(
        FakeCapture::with_image(),
        ScriptedPrompter::confirming(&[true]),
        Arc::default(),
    );

    pipeline.run(&config(), &fixture.document).await.unwrap();
    assert_eq!(std::fs::read(&image).unwrap(), PNG);
}

#[tokio::test]
async fn empty_clipboard_is_a_capture_error() {
    let fixture = Fixture::new("diagram");
    let editor = Arc::new(RecordingEditor::default());
    let (pipeline, _rx) = pipeline(FakeCapture::empty(), Arc::default(), editor.clone());

    let err = pipeline.run(&config(), &fixture.document).await.unwrap_err();

    assert!(matches!(err, PasteError::Capture(CaptureError::NoImage)));
    assert!(err.is_informational());
    assert!(editor.inserted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn cancelled_name_prompt_aborts_silently() {
    let fixture = Fixture::new("diagram");
    let mut config = config();
    config.show_file_path_confirm_input_box = true;
    let capture = FakeCapture::with_image();
    let (pipeline, _rx) = pipeline(
        capture.clone(),
        ScriptedPrompter::answering(vec![None]),
        Arc::default(),
    );

    let outcome = pipeline.run(&config, &fixture.document).await.unwrap();

    assert_eq!(outcome, PasteOutcome::Aborted(AbortReason::NameCancelled));
    assert_eq!(capture.calls(), 0);
}

#[tokio::test]
async fn confirmed_name_replaces_synthesized_one() {
    let fixture = Fixture::new("diagram");
    let mut config = config();
    config.show_file_path_confirm_input_box = true;
    config.file_path_confirm_input_box_mode = ConfirmMode::OnlyName;
    let prompter = ScriptedPrompter::answering(vec![Some("renamed")]);
    let (pipeline, mut rx) = pipeline(FakeCapture::with_image(), prompter.clone(), Arc::default());

    let outcome = pipeline.run(&config, &fixture.document).await.unwrap();

    assert!(matches!(outcome, PasteOutcome::Inserted { ref text, .. } if text == "![](assets/renamed.png)"));
    assert!(fixture.assets().join("renamed.png").is_file());
    assert!(prompter.asked.lock().unwrap()[0].ends_with("[diagram.png]"));
    assert!(stages(&mut rx).contains(&Stage::Confirmed));
}

#[tokio::test]
async fn cloud_mode_uploads_and_renders_the_url() {
    let fixture = Fixture::new("diagram");
    let mut config = config();
    config.azure_is_upload_storage = true;
    config.azure_storage_connection_string = "AccountName=acct;AccountKey=c2VjcmV0".to_string();
    config.azure_storage_container_name = "Images".to_string();

    let store = Arc::new(FakeStore::default());
    let (pipeline, mut rx) = pipeline(FakeCapture::with_image(), Arc::default(), Arc::default());
    let pipeline = pipeline.with_store(store.clone());

    let outcome = pipeline.run(&config, &fixture.document).await.unwrap();

    let url = "https://acct.blob.core.windows.net/images/assets/diagram.png";
    assert_eq!(
        outcome,
        PasteOutcome::Inserted {
            text: format!("![]({})", url),
            location: ImageLocation::Remote(url.to_string()),
        }
    );
    assert_eq!(store.blobs.lock().unwrap().get("assets/diagram.png").map(Vec::as_slice), Some(PNG));
    assert!(!fixture.assets().exists());
    assert!(stages(&mut rx).contains(&Stage::Uploaded));
}

#[tokio::test]
async fn cloud_mode_declined_replacement_aborts() {
    let fixture = Fixture::new("diagram");
    let mut config = config();
    config.azure_is_upload_storage = true;
    config.azure_storage_connection_string = "AccountName=acct;AccountKey=c2VjcmV0".to_string();
    config.azure_storage_container_name = "images".to_string();

    let store = Arc::new(FakeStore::default());
    store
        .blobs
        .lock()
        .unwrap()
        .insert("assets/diagram.png".to_string(), b"original".to_vec());
    let (pipeline, _rx) = pipeline(
        FakeCapture::with_image(),
        ScriptedPrompter::confirming(&[false]),
        Arc::default(),
    );
    let pipeline = pipeline.with_store(store.clone());

    let outcome = pipeline.run(&config, &fixture.document).await.unwrap();

    assert_eq!(outcome, PasteOutcome::Aborted(AbortReason::UploadDeclined));
    assert_eq!(
        store.blobs.lock().unwrap().get("assets/diagram.png").map(Vec::as_slice),
        Some(&b"original"[..])
    );
}

#[tokio::test]
async fn file_in_place_of_image_dir_is_reported() {
    let fixture = Fixture::new("diagram");
    std::fs::write(fixture.assets(), b"not a directory").unwrap();
    let capture = FakeCapture::with_image();
    let editor = Arc::new(RecordingEditor::default());
    let (pipeline, _rx) = pipeline(capture.clone(), Arc::default(), editor.clone());

    let err = pipeline.run(&config(), &fixture.document).await.unwrap_err();

    match &err {
        PasteError::NotADirectory { path } => assert_eq!(path, &fixture.assets()),
        other => panic!("expected NotADirectory, got {:?}", other),
    }
    assert!(err.to_string().contains("is a file. Please check your 'path' config."));
    assert_eq!(capture.calls(), 0);
    assert!(editor.inserted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_selection_is_reported_before_invalid_config() {
    let fixture = Fixture::new("a:b");
    let mut config = config();
    config.path = " assets".to_string();
    let (pipeline, mut rx) = pipeline(FakeCapture::with_image(), Arc::default(), Arc::default());

    let err = pipeline.run(&config, &fixture.document).await.unwrap_err();

    assert!(matches!(err, PasteError::InvalidSelection { .. }));
    assert_eq!(stages(&mut rx), vec![Stage::Idle]);
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn configured_pipeline_captures_with_the_settings_backend() {
    let fixture = Fixture::new("diagram");
    let scripts = tempdir().unwrap();
    std::fs::write(scripts.path().join("linux.sh"), "echo \"no image\"\n").unwrap();

    let mut config = config();
    config.capture_backend = crate::config::CaptureBackend::Script;
    config.script_dir = Some(scripts.path().to_path_buf());
    let editor = Arc::new(RecordingEditor::default());
    let pipeline = PastePipeline::configured(Arc::new(ScriptedPrompter::default()), editor.clone());

    let err = pipeline.run(&config, &fixture.document).await.unwrap_err();

    assert!(matches!(err, PasteError::Capture(CaptureError::NoImage)));
    assert!(editor.inserted.lock().unwrap().is_empty());
}
