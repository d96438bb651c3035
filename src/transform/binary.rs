//! Binary file detection

use std::path::Path;

use super::{Context, Transformer};
use crate::error::Result;

/// Number of leading bytes inspected when the extension is inconclusive
pub const SAMPLE_SIZE: usize = 8 * 1024;

/// Extensions that are always treated as binary (lowercase, without the dot)
const BINARY_EXTENSIONS: &[&str] = &[
    // Images
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "tif", "tiff", "webp", "psd", "heic",
    // Archives
    "zip", "tar", "gz", "tgz", "bz2", "xz", "7z", "rar", "zst", "jar", "war",
    // Executables and libraries
    "exe", "dll", "so", "dylib", "bin", "o", "a", "lib", "wasm",
    // Audio and video
    "mp3", "mp4", "wav", "flac", "ogg", "avi", "mov", "mkv", "webm",
    // Fonts
    "ttf", "otf", "woff", "woff2", "eot",
    // Documents
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt",
    // Bytecode
    "class", "pyc", "pyo",
    // Databases
    "db", "sqlite", "sqlite3",
];

/// Decide whether a file is binary.
///
/// A known binary extension decides immediately. Otherwise at most the first
/// [`SAMPLE_SIZE`] bytes are inspected: any NUL byte means binary, and so does
/// a sample where more than 30% of the bytes are control characters (other
/// than tab, LF and CR) or have the high bit set. Empty content is never binary.
pub fn is_binary(path: &str, content: &[u8]) -> bool {
    if has_binary_extension(path) {
        return true;
    }
    if content.is_empty() {
        return false;
    }

    let sample = &content[..content.len().min(SAMPLE_SIZE)];
    if sample.contains(&0) {
        return true;
    }

    let non_text = sample.iter().filter(|&&b| is_non_text(b)).count();
    non_text * 10 > sample.len() * 3
}

fn has_binary_extension(path: &str) -> bool {
    Path::new(path)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| BINARY_EXTENSIONS.contains(&ext.as_str()))
}

fn is_non_text(byte: u8) -> bool {
    match byte {
        b'\t' | b'\n' | b'\r' => false,
        0x00..=0x1f | 0x7f => true,
        _ => byte >= 0x80,
    }
}

/// Pass-through transformer that logs binary files.
///
/// It never changes content; callers that want to skip rewriting binary files
/// check [`is_binary`] before running a chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryTransformer;

impl BinaryTransformer {
    pub fn new() -> Self {
        Self
    }
}

impl Transformer for BinaryTransformer {
    fn name(&self) -> &str {
        "binary"
    }

    fn transform(&self, content: &[u8], ctx: &Context) -> Result<Vec<u8>> {
        if is_binary(&ctx.file_path, content) {
            log::debug!("binary: {} is binary, passing through", ctx.file_path);
        }
        Ok(content.to_vec())
    }
}
