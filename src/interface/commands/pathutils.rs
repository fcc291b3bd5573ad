//! # Path Utilities
//!
//! Directory listing for the host running the bot.

use anyhow::Context as _;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::application::context::Context;
use crate::application::registry::{CommandHandler, CommandMeta};
use crate::strings::messages;
use crate::util::human_readable_bytes;

const AUDIO: &[&str] = &["mp3", "flac", "wav", "m4a"];
const VIDEO: &[&str] = &["mkv", "mp4", "webm", "avi", "mov", "flv"];
const ARCHIVE: &[&str] = &["zip", "tar", "gz", "rar"];
const IMAGE: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "ico", "webp"];

fn file_icon(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let ext = ext.as_str();

    if AUDIO.contains(&ext) {
        "🎵"
    } else if VIDEO.contains(&ext) {
        "📹"
    } else if ARCHIVE.contains(&ext) {
        "🗜"
    } else if IMAGE.contains(&ext) {
        "🖼"
    } else {
        "📄"
    }
}

fn file_line(path: &Path, size: u64) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    format!("{} `{}` _({})_\n", file_icon(path), name, human_readable_bytes(size))
}

async fn list_dir(path: &Path) -> anyhow::Result<String> {
    let mut entries: Vec<PathBuf> = Vec::new();
    let mut dir = tokio::fs::read_dir(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    while let Some(entry) = dir.next_entry().await? {
        entries.push(entry.path());
    }
    entries.sort();

    let mut folders = String::new();
    let mut files = String::new();
    for entry in entries {
        // Anything that is not a readable regular file is listed as a folder.
        match tokio::fs::metadata(&entry).await {
            Ok(meta) if meta.is_file() => files.push_str(&file_line(&entry, meta.len())),
            _ => {
                let name = entry
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                folders.push_str(&format!("📁 `{name}`\n"));
            }
        }
    }

    if folders.is_empty() && files.is_empty() {
        Ok(messages::EMPTY_PATH.to_string())
    } else {
        Ok(folders + &files)
    }
}

pub struct ListDirCommand;

#[async_trait]
impl CommandHandler for ListDirCommand {
    async fn invoke(&self, ctx: &mut Context) -> anyhow::Result<Option<String>> {
        let input = match ctx.input().trim() {
            "" => ".",
            other => other,
        };
        let path = Path::new(input);

        let Ok(meta) = tokio::fs::metadata(path).await else {
            return Ok(Some(messages::PATH_NOT_FOUND.to_string()));
        };

        let mut out = messages::path_header(input);
        if meta.is_dir() {
            out.push_str(&list_dir(path).await?);
        } else {
            out.push_str(&file_line(path, meta.len()));
        }
        Ok(Some(out))
    }

    fn meta(&self) -> CommandMeta {
        CommandMeta::new()
            .desc("List files and folders in the directory.")
            .usage("[path]", true, false)
            .alias(["ls"])
    }
}
