use std::path::Path;
use uuid::Uuid;

/// Attachments are restricted to PDF. Browsers and proxies are sloppy about
/// content types, so the filename extension counts too.
pub fn is_pdf(file_name: Option<&str>, content_type: Option<&str>) -> bool {
    if content_type == Some("application/pdf") {
        return true;
    }
    file_name
        .map(|n| n.to_lowercase().ends_with(".pdf"))
        .unwrap_or(false)
}

/// Copy an uploaded temp file into the upload directory under a fresh
/// unguessable name. Returns the bare stored filename; clients reach it as
/// `/uploads/<name>`. Copy instead of rename: the temp file may sit on
/// another filesystem.
pub fn store_pdf(src: &Path, upload_dir: &str) -> std::io::Result<String> {
    let name = format!("{}.pdf", Uuid::new_v4());
    std::fs::create_dir_all(upload_dir)?;
    let dest = Path::new(upload_dir).join(&name);
    std::fs::copy(src, &dest)?;
    Ok(name)
}

/// Best-effort removal of a stored attachment whose request row never
/// landed.
pub fn discard(upload_dir: &str, name: &str) {
    let path = Path::new(upload_dir).join(name);
    if let Err(e) = std::fs::remove_file(&path) {
        tracing::warn!(error = %e, file = %name, "Failed to remove orphaned attachment");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_detection_checks_type_then_extension() {
        assert!(is_pdf(Some("invoice.pdf"), None));
        assert!(is_pdf(Some("INVOICE.PDF"), Some("application/octet-stream")));
        assert!(is_pdf(None, Some("application/pdf")));
        assert!(!is_pdf(Some("invoice.docx"), Some("application/msword")));
        assert!(!is_pdf(None, None));
    }

    #[test]
    fn stored_copy_keeps_bytes_and_lands_in_the_dir() {
        let scratch = std::env::temp_dir().join(format!("upload-test-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&scratch).unwrap();

        let src = scratch.join("incoming.pdf");
        std::fs::write(&src, b"%PDF-1.4 test").unwrap();

        let dir = scratch.join("stored");
        let name = store_pdf(&src, dir.to_str().unwrap()).unwrap();

        assert!(name.ends_with(".pdf"));
        assert!(!name.contains('/'));
        let copied = std::fs::read(dir.join(&name)).unwrap();
        assert_eq!(copied, b"%PDF-1.4 test");

        std::fs::remove_dir_all(&scratch).unwrap();
    }

    #[test]
    fn discard_removes_a_stored_file_and_tolerates_missing_ones() {
        let scratch = std::env::temp_dir().join(format!("upload-test-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&scratch).unwrap();

        let src = scratch.join("incoming.pdf");
        std::fs::write(&src, b"%PDF-1.4 test").unwrap();

        let dir = scratch.join("stored");
        let dir_str = dir.to_str().unwrap();
        let name = store_pdf(&src, dir_str).unwrap();
        assert!(dir.join(&name).exists());

        discard(dir_str, &name);
        assert!(!dir.join(&name).exists());

        // a second discard of the same name is a quiet no-op
        discard(dir_str, &name);

        std::fs::remove_dir_all(&scratch).unwrap();
    }
}
