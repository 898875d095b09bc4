use std::path::Path;

use anyhow::{bail, Context};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use mentor_core::Attachment;

/// Largest file accepted as an attachment.
pub const MAX_ATTACHMENT_BYTES: u64 = 20 * 1024 * 1024;

pub fn mime_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "md" => "text/markdown",
        "txt" => "text/plain",
        "json" => "application/json",
        "html" => "text/html",
        "css" => "text/css",
        "js" => "text/javascript",
        _ => "application/octet-stream",
    }
}

pub fn load_attachment(path: &Path) -> anyhow::Result<Attachment> {
    let size = std::fs::metadata(path)
        .with_context(|| format!("Cannot read {}", path.display()))?
        .len();
    if size > MAX_ATTACHMENT_BYTES {
        bail!(
            "{} is {} bytes; attachments are limited to {} bytes",
            path.display(),
            size,
            MAX_ATTACHMENT_BYTES
        );
    }
    let bytes = std::fs::read(path).with_context(|| format!("Cannot read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());

    Ok(Attachment {
        name,
        mime_type: mime_type_for(path).to_string(),
        data: BASE64_STANDARD.encode(&bytes),
        size,
    })
}

/// Writes the decoded payload to `path`.
pub fn save_attachment(attachment: &Attachment, path: &Path) -> anyhow::Result<u64> {
    let bytes = BASE64_STANDARD
        .decode(attachment.data.as_bytes())
        .with_context(|| format!("'{}' is not valid base64", attachment.name))?;
    std::fs::write(path, &bytes).with_context(|| format!("Cannot write {}", path.display()))?;
    Ok(bytes.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_common_types() {
        assert_eq!(mime_type_for(Path::new("cat.PNG")), "image/png");
        assert_eq!(mime_type_for(Path::new("notes.md")), "text/markdown");
        assert_eq!(
            mime_type_for(Path::new("blob")),
            "application/octet-stream"
        );
    }

    #[test]
    fn load_then_save_preserves_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("pixel.png");
        std::fs::write(&source, [0x89, b'P', b'N', b'G', 0, 1, 2]).unwrap();

        let attachment = load_attachment(&source).unwrap();
        assert_eq!(attachment.name, "pixel.png");
        assert_eq!(attachment.mime_type, "image/png");
        assert_eq!(attachment.size, 7);

        let target = dir.path().join("copy.png");
        assert_eq!(save_attachment(&attachment, &target).unwrap(), 7);
        assert_eq!(
            std::fs::read(&target).unwrap(),
            std::fs::read(&source).unwrap()
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let error = load_attachment(&dir.path().join("nope.png")).unwrap_err();
        assert!(error.to_string().contains("Cannot read"));
    }
}
