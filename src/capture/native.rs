use super::{CaptureOutcome, ClipboardCapture};
use arboard::Clipboard;
use async_trait::async_trait;
use std::io::Cursor;
use std::path::Path;

/// Reads the clipboard in-process and encodes the pixels as PNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeCapture;

fn clipboard_png() -> CaptureOutcome {
    let mut clipboard = match Clipboard::new() {
        Ok(clipboard) => clipboard,
        Err(e) => return CaptureOutcome::ToolError(format!("clipboard not available: {}", e)),
    };

    let image = match clipboard.get_image() {
        Ok(image) => image,
        Err(arboard::Error::ContentNotAvailable) => return CaptureOutcome::NoImage,
        Err(e) => return CaptureOutcome::ToolError(format!("failed to read clipboard: {}", e)),
    };

    let (width, height) = (image.width as u32, image.height as u32);
    let Some(rgba) = image::RgbaImage::from_raw(width, height, image.bytes.into_owned()) else {
        return CaptureOutcome::ToolError(format!(
            "clipboard image of {}x{} has an unexpected size",
            width, height
        ));
    };

    let mut png = Cursor::new(Vec::new());
    match rgba.write_to(&mut png, image::ImageFormat::Png) {
        Ok(()) => CaptureOutcome::Encoded(png.into_inner()),
        Err(e) => CaptureOutcome::ToolError(format!("failed to encode PNG: {}", e)),
    }
}

async fn capture_blocking() -> CaptureOutcome {
    tokio::task::spawn_blocking(clipboard_png)
        .await
        .unwrap_or_else(|e| CaptureOutcome::ToolError(format!("clipboard task failed: {}", e)))
}

#[async_trait]
impl ClipboardCapture for NativeCapture {
    async fn save_to_file(&self, target: &Path) -> CaptureOutcome {
        match capture_blocking().await {
            CaptureOutcome::Encoded(bytes) => match tokio::fs::write(target, bytes).await {
                Ok(()) => CaptureOutcome::Saved(target.to_path_buf()),
                Err(e) => CaptureOutcome::ToolError(format!(
                    "failed to write {}: {}",
                    target.display(),
                    e
                )),
            },
            other => other,
        }
    }

    async fn read_png(&self) -> CaptureOutcome {
        capture_blocking().await
    }
}
