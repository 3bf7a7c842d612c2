//! Upload pipeline: validate → extract → store blob → persist.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::{extract_text_from_bytes, DocumentFormat, EngineError, ExtractedEntities, MatchEngine};
use crate::errors::AppError;
use crate::models::resume::{NewResume, ResumeDetail};
use crate::resumes::repository;
use crate::state::AppState;
use crate::storage::{resume_object_key, BlobStore};

const MAX_FILENAME_CHARS: usize = 255;

/// Control characters and characters with path or shell meaning.
static UNSAFE_FILENAME_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[\x00-\x1f\x7f/\\<>:"|?*]"#)
        .unwrap_or_else(|e| unreachable!("filename pattern: {e}"))
});

static DOT_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.{2,}").unwrap_or_else(|e| unreachable!("dot pattern: {e}")));

/// Keeps the basename only, replaces unsafe characters with `_`, collapses
/// dot runs and caps the length.
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(base, "_");
    let collapsed = DOT_RUNS.replace_all(&cleaned, ".");
    collapsed.chars().take(MAX_FILENAME_CHARS).collect()
}

/// Checks everything that can be checked before any work is done.
/// Returns the sanitized filename and the document format.
pub fn validate_upload(
    filename: Option<&str>,
    content_type: Option<&str>,
    bytes: &[u8],
    max_bytes: usize,
) -> Result<(String, DocumentFormat), AppError> {
    let raw = filename
        .filter(|f| !f.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Filename is missing".to_string()))?;

    let safe = sanitize_filename(raw);
    if safe.trim().is_empty() || safe == "." {
        return Err(AppError::Validation("Invalid filename".to_string()));
    }

    let format = safe
        .rsplit_once('.')
        .and_then(|(_, ext)| DocumentFormat::from_extension(ext).ok())
        .ok_or_else(|| AppError::Validation("Only PDF or DOCX files allowed".to_string()))?;

    let declared_ok = content_type.is_some_and(|ct| {
        let ct = ct.split(';').next().unwrap_or_default().trim();
        ct.eq_ignore_ascii_case(DocumentFormat::Pdf.content_type())
            || ct.eq_ignore_ascii_case(DocumentFormat::Docx.content_type())
    });
    if !declared_ok {
        return Err(AppError::Validation("Invalid file type".to_string()));
    }

    if bytes.len() > max_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "File too large. Maximum size is {}MB",
            max_bytes / (1024 * 1024)
        )));
    }

    if !format.matches_magic(bytes) {
        return Err(AppError::Validation(
            "Invalid file content (magic bytes mismatch)".to_string(),
        ));
    }

    Ok((safe, format))
}

struct Processed {
    text: String,
    entities: ExtractedEntities,
    embeddings: Vec<f32>,
    bytes: Vec<u8>,
}

/// Validates, extracts and embeds, then stores the blob. Nothing reaches the
/// blob store unless extraction succeeded. A blob-store failure is logged and
/// leaves `file_url` empty.
pub async fn prepare_upload(
    engine: &MatchEngine,
    storage: &dyn BlobStore,
    filename: Option<&str>,
    content_type: Option<&str>,
    bytes: Vec<u8>,
    max_bytes: usize,
) -> Result<NewResume, AppError> {
    let (safe_filename, format) = validate_upload(filename, content_type, &bytes, max_bytes)?;

    // CPU-bound: extraction, NER, embeddings
    let engine = engine.clone();
    let processed = tokio::task::spawn_blocking(move || -> Result<Processed, AppError> {
        let text = extract_text_from_bytes(&bytes, format)?;
        let entities = engine.extract_entities(&text)?;
        let embeddings = engine.get_embeddings(&text).map_err(|e| match e {
            EngineError::EmptyInput(_) => AppError::UnprocessableEntity(
                "No extractable text found in the document".to_string(),
            ),
            other => other.into(),
        })?;
        Ok(Processed {
            text,
            entities,
            embeddings,
            bytes,
        })
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in upload: {e}")))??;

    let key = resume_object_key(format);
    let file_url = match storage
        .upload(&key, processed.bytes, format.content_type())
        .await
    {
        Ok(url) => Some(url),
        Err(e) => {
            warn!("Storage upload failed for {}: {e}", safe_filename.escape_debug());
            None
        }
    };

    Ok(NewResume {
        filename: safe_filename,
        text: processed.text,
        skills: processed.entities.skills,
        education: processed.entities.education,
        experience: processed.entities.experience,
        embeddings: processed.embeddings,
        file_url,
    })
}

/// Full upload pipeline, ending with the database insert.
pub async fn process_upload(
    state: &AppState,
    filename: Option<&str>,
    content_type: Option<&str>,
    bytes: Vec<u8>,
) -> Result<ResumeDetail, AppError> {
    let new_resume = prepare_upload(
        &state.engine,
        state.storage.as_ref(),
        filename,
        content_type,
        bytes,
        state.config.max_upload_bytes(),
    )
    .await?;

    let resume = repository::insert(&state.db, Uuid::new_v4(), new_resume).await?;

    info!(
        resume_id = %resume.id,
        skills = resume.skills.len(),
        "Resume processed"
    );
    Ok(resume)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::embeddings::HashEmbedder;
    use crate::engine::text::tests::make_docx;
    use crate::engine::{EngineSettings, RuleBasedRecognizer, SkillVocabulary};
    use crate::storage::StorageError;

    const PDF: &str = "application/pdf";
    const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
    const MB: usize = 1024 * 1024;

    fn status(err: AppError) -> axum::http::StatusCode {
        axum::response::IntoResponse::into_response(err).status()
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename(r"C:\Users\me\cv.pdf"), "cv.pdf");
    }

    #[test]
    fn test_sanitize_replaces_unsafe_chars_and_dot_runs() {
        assert_eq!(sanitize_filename("my<cv>|v2?.pdf"), "my_cv__v2_.pdf");
        assert_eq!(sanitize_filename("cv...final..pdf"), "cv.final.pdf");
        assert_eq!(sanitize_filename("line\nbreak.pdf"), "line_break.pdf");
    }

    #[test]
    fn test_sanitize_caps_length() {
        let long = format!("{}.pdf", "a".repeat(400));
        assert_eq!(sanitize_filename(&long).chars().count(), 255);
    }

    #[test]
    fn test_valid_pdf_and_docx() {
        let (name, format) =
            validate_upload(Some("Resume.PDF"), Some(PDF), b"%PDF-1.7 rest", MB).unwrap();
        assert_eq!(name, "Resume.PDF");
        assert_eq!(format, DocumentFormat::Pdf);

        let docx = make_docx(&["hi"]);
        let (_, format) = validate_upload(Some("cv.docx"), Some(DOCX), &docx, MB).unwrap();
        assert_eq!(format, DocumentFormat::Docx);
    }

    #[test]
    fn test_missing_filename() {
        let err = validate_upload(None, Some(PDF), b"%PDF-", MB).unwrap_err();
        assert_eq!(status(err), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_wrong_extension() {
        let err = validate_upload(Some("cv.txt"), Some(PDF), b"%PDF-", MB).unwrap_err();
        assert!(err.to_string().contains("Only PDF or DOCX"));
    }

    #[test]
    fn test_wrong_content_type() {
        let err = validate_upload(Some("cv.pdf"), Some("text/plain"), b"%PDF-", MB).unwrap_err();
        assert!(err.to_string().contains("Invalid file type"));
        assert!(validate_upload(Some("cv.pdf"), None, b"%PDF-", MB).is_err());
    }

    #[test]
    fn test_oversized_is_413() {
        let bytes = vec![b'%'; 11];
        let err = validate_upload(Some("cv.pdf"), Some(PDF), &bytes, 10).unwrap_err();
        assert_eq!(status(err), axum::http::StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_magic_bytes_mismatch() {
        let err =
            validate_upload(Some("cv.docx"), Some(DOCX), b"%PDF-1.4 not a zip", MB).unwrap_err();
        assert!(err.to_string().contains("magic bytes"));
    }

    /// Keeps the keys it was asked to store.
    #[derive(Default)]
    struct RecordingStore {
        keys: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingStore {
        fn keys(&self) -> Vec<String> {
            self.keys.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BlobStore for RecordingStore {
        async fn upload(
            &self,
            key: &str,
            _bytes: Vec<u8>,
            _content_type: &str,
        ) -> Result<String, StorageError> {
            self.keys.lock().unwrap().push(key.to_string());
            if self.fail {
                return Err(StorageError::Upload {
                    key: key.to_string(),
                    message: "bucket missing".to_string(),
                });
            }
            Ok(format!("memory://{key}"))
        }
    }

    fn engine() -> MatchEngine {
        MatchEngine::new(
            Arc::new(HashEmbedder::new(64)),
            Arc::new(RuleBasedRecognizer::new()),
            Arc::new(SkillVocabulary::builtin()),
            EngineSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_upload_stores_blob_after_extraction() {
        let store = RecordingStore::default();
        let docx = make_docx(&["Jane Doe", "Python developer shipping services with Docker"]);

        let resume = prepare_upload(&engine(), &store, Some("cv.docx"), Some(DOCX), docx, MB)
            .await
            .unwrap();

        let keys = store.keys();
        assert_eq!(keys.len(), 1);
        assert!(keys[0].starts_with("resumes/") && keys[0].ends_with(".docx"));
        assert_eq!(resume.file_url, Some(format!("memory://{}", keys[0])));
        assert!(resume.skills.contains(&"Python".to_string()));
        assert_eq!(resume.embeddings.len(), 64);
    }

    #[tokio::test]
    async fn test_failed_extraction_stores_nothing() {
        let store = RecordingStore::default();
        let err = prepare_upload(
            &engine(),
            &store,
            Some("cv.docx"),
            Some(DOCX),
            b"PK\x03\x04garbage".to_vec(),
            MB,
        )
        .await
        .unwrap_err();

        assert_eq!(status(err), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_document_without_text_stores_nothing() {
        let store = RecordingStore::default();
        let err = prepare_upload(&engine(), &store, Some("cv.docx"), Some(DOCX), make_docx(&[""]), MB)
            .await
            .unwrap_err();

        assert_eq!(status(err), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_keeps_resume_without_url() {
        let store = RecordingStore {
            fail: true,
            ..RecordingStore::default()
        };
        let docx = make_docx(&["Backend engineer with Rust and Kubernetes"]);

        let resume = prepare_upload(&engine(), &store, Some("cv.docx"), Some(DOCX), docx, MB)
            .await
            .unwrap();

        assert_eq!(store.keys().len(), 1);
        assert!(resume.file_url.is_none());
        assert!(!resume.text.is_empty());
    }
}
