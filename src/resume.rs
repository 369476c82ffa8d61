//! Resume text resolution for prompt building.
//!
//! A session's resume reference is either a stored upload path or the text
//! the candidate pasted. Extraction is strictly best-effort: question
//! generation must not fail because a resume could not be read.

use std::path::Path;

use tokio::process::Command;
use tracing::warn;

/// Whether a resume reference points at a stored upload rather than pasted
/// text. Recorded upload paths always start with the configured upload root.
pub fn is_stored_upload(upload_dir: &str, resume_ref: &str) -> bool {
    let root = upload_dir.trim_end_matches('/');
    resume_ref.starts_with(&format!("{root}/"))
}

/// Turn the session's resume reference into prompt text. Pasted text passes
/// through untouched; files are read or extracted, and any failure degrades
/// to an empty resume.
pub async fn resolve_resume_text(upload_dir: &str, resume_ref: Option<&str>) -> String {
    let Some(resume_ref) = resume_ref else {
        return String::new();
    };
    if !is_stored_upload(upload_dir, resume_ref) {
        return resume_ref.to_string();
    }

    let ext = Path::new(resume_ref)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match ext.as_deref() {
        Some("txt") | Some("md") => match tokio::fs::read_to_string(resume_ref).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, path = resume_ref, "failed to read resume file, continuing without resume text");
                String::new()
            }
        },
        Some("pdf") => extract_pdf_text(resume_ref).await,
        other => {
            // Word documents land here too; there is no extractor for them.
            warn!(ext = ?other, path = resume_ref, "unsupported resume format, continuing without resume text");
            String::new()
        }
    }
}

/// Extract text from a PDF with the `pdftotext` binary, writing to stdout.
async fn extract_pdf_text(path: &str) -> String {
    let output = match Command::new("pdftotext").arg(path).arg("-").output().await {
        Ok(output) => output,
        Err(e) => {
            warn!(error = %e, path, "failed to run pdftotext, continuing without resume text");
            return String::new();
        }
    };
    if !output.status.success() {
        warn!(
            status = %output.status,
            stderr = %String::from_utf8_lossy(&output.stderr),
            path,
            "pdftotext failed, continuing without resume text"
        );
        return String::new();
    }
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn stored_upload_detection() {
        assert!(is_stored_upload("uploads", "uploads/resumes/u1/cv.pdf"));
        assert!(is_stored_upload("uploads/", "uploads/resumes/u1/cv.pdf"));
        assert!(!is_stored_upload("uploads", "Ten years of Rust experience"));
        assert!(!is_stored_upload("uploads", "uploading is my passion"));
        assert!(!is_stored_upload("/var/data", "uploads/resumes/u1/cv.pdf"));
    }

    #[tokio::test]
    async fn pasted_text_passes_through() {
        let text = resolve_resume_text("uploads", Some("Ten years of Rust")).await;
        assert_eq!(text, "Ten years of Rust");

        assert_eq!(resolve_resume_text("uploads", None).await, "");
    }

    #[tokio::test]
    async fn reads_plain_text_resume_from_disk() {
        let dir = std::env::temp_dir().join(format!("mockmind-resume-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("cv.txt");
        tokio::fs::write(&path, "Built two storage engines").await.unwrap();

        let root = dir.to_string_lossy().into_owned();
        let stored = path.to_string_lossy().into_owned();
        let text = resolve_resume_text(&root, Some(&stored)).await;
        assert_eq!(text, "Built two storage engines");

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn unreadable_or_unsupported_resumes_degrade_to_empty() {
        assert_eq!(
            resolve_resume_text("uploads", Some("uploads/resumes/u1/gone.txt")).await,
            ""
        );
        assert_eq!(
            resolve_resume_text("uploads", Some("uploads/resumes/u1/cv.docx")).await,
            ""
        );
    }
}
