use anyhow::{Context, Result};
use colored::Colorize;
use sagechat_store::{ChatSessionStore, FileStore, HistorySummary, KeyValueStore};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::cli::{DataDirArgs, ExportArgs};
use crate::config::transcript_path;

/// Open the file-backed session store under `data_dir`
pub fn open_store(data_dir: &Path) -> Result<ChatSessionStore<FileStore>> {
    let storage = FileStore::new(data_dir)?;
    let store = ChatSessionStore::load(storage)
        .with_context(|| format!("failed to load chat histories from {}", data_dir.display()))?;
    Ok(store)
}

/// One entry of the history list, numbered from 1
pub fn format_summary(index: usize, summary: &HistorySummary) -> String {
    let marker = if summary.is_active { "▶" } else { " " };
    let star = if summary.is_starred { "★" } else { "☆" };
    let mut line = format!(
        "{} {} {:>2}. {}  ({}, {} messages)",
        marker, star, index, summary.title, summary.created_at, summary.message_count
    );
    if !summary.preview.is_empty() {
        line.push_str(&format!("\n        {}", summary.preview));
    }
    line
}

pub fn print_summaries<S: KeyValueStore>(store: &ChatSessionStore<S>) {
    let summaries = store.summaries();
    if summaries.is_empty() {
        println!("{}", "No saved chats yet.".bright_black());
        return;
    }
    for (i, summary) in summaries.iter().enumerate() {
        let line = format_summary(i + 1, summary);
        if summary.is_active {
            println!("{}", line.bright_cyan());
        } else {
            println!("{}", line);
        }
    }
}

/// Write the transcript of chat `id` to `out`, or next to `default_dir`
/// under the chat title.
pub fn write_transcript<S: KeyValueStore>(
    store: &ChatSessionStore<S>,
    id: &str,
    out: Option<&Path>,
    default_dir: &Path,
) -> Result<PathBuf> {
    let transcript = store
        .export_chat(id)
        .with_context(|| format!("no chat history with id {}", id))?;

    let path = match out {
        Some(path) => path.to_path_buf(),
        None => transcript_path(default_dir, &transcript.file_name),
    };
    fs::write(&path, transcript.content)
        .with_context(|| format!("failed to write transcript to {}", path.display()))?;

    info!(chat_id = %id, path = %path.display(), "exported transcript");
    Ok(path)
}

/// `sagechat list`
pub fn list_histories(args: &DataDirArgs) -> Result<()> {
    let store = open_store(&args.data_dir)?;
    print_summaries(&store);
    Ok(())
}

/// `sagechat export`
pub fn export_history(args: &ExportArgs) -> Result<()> {
    let store = open_store(&args.data.data_dir)?;
    let cwd = std::env::current_dir()?;
    let path = write_transcript(&store, &args.id, args.out.as_deref(), &cwd)?;
    println!("{} {}", "✓ Exported to".green(), path.display());
    Ok(())
}
