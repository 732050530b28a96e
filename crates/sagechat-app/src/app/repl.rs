use anyhow::{bail, Result};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use sagechat_dispatch::view::{message_time, paragraphs};
use sagechat_dispatch::{Composer, DispatchOutcome, Dispatcher, Quote};
use sagechat_store::{ChatSessionStore, KeyValueStore};
use sagechat_types::{ChatMessage, Role};
use std::path::{Path, PathBuf};

use crate::app::commands::{open_store, print_summaries, write_transcript};
use crate::cli::ChatArgs;
use crate::endpoint::{HttpChatEndpoint, TokioTimer};

/// Slash commands understood by the terminal client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    New,
    List,
    Select(String),
    Rename(String),
    Star(Option<String>),
    Delete(Option<String>),
    Export(Option<PathBuf>),
    Quote(Option<String>),
    Help,
    Quit,
}

impl ReplCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let arg = (!rest.is_empty()).then(|| rest.to_string());

        match name {
            "/new" => Ok(Self::New),
            "/list" => Ok(Self::List),
            "/select" => arg.map(Self::Select).ok_or_else(|| "usage: /select <n|id>".to_string()),
            "/rename" => arg.map(Self::Rename).ok_or_else(|| "usage: /rename <title>".to_string()),
            "/star" => Ok(Self::Star(arg)),
            "/delete" => Ok(Self::Delete(arg)),
            "/export" => Ok(Self::Export(arg.map(PathBuf::from))),
            "/quote" => Ok(Self::Quote(arg)),
            "/help" => Ok(Self::Help),
            "/quit" | "/exit" => Ok(Self::Quit),
            other => Err(format!("unknown command {} (try /help)", other)),
        }
    }
}

/// Resolve a list number (as printed by /list) or a chat id
pub fn resolve_target<S: KeyValueStore>(
    store: &ChatSessionStore<S>,
    target: &str,
) -> Option<String> {
    if let Ok(n) = target.parse::<usize>() {
        let listed = n
            .checked_sub(1)
            .and_then(|i| store.sorted_histories().get(i).copied());
        if let Some(history) = listed {
            return Some(history.id.clone());
        }
    }
    store.get(target).map(|h| h.id.clone())
}

fn target_or_active<S: KeyValueStore>(
    store: &ChatSessionStore<S>,
    target: Option<&str>,
) -> Result<String> {
    let id = match target {
        Some(target) => resolve_target(store, target),
        None => store.current_chat_id().map(str::to_string),
    };
    match id {
        Some(id) => Ok(id),
        None => bail!("no such chat: {}", target.unwrap_or("(none active)")),
    }
}

/// Apply a command other than `/quit` to the session
pub fn execute<S: KeyValueStore>(
    command: ReplCommand,
    store: &mut ChatSessionStore<S>,
    composer: &mut Composer,
    export_dir: &Path,
) -> Result<()> {
    match command {
        ReplCommand::New => {
            store.create_chat()?;
            print_active_chat(store);
        }
        ReplCommand::List => print_summaries(store),
        ReplCommand::Select(target) => {
            let id = target_or_active(store, Some(&target))?;
            store.select_chat(&id)?;
            print_active_chat(store);
        }
        ReplCommand::Rename(title) => {
            let id = target_or_active(store, None)?;
            store.rename_chat(&id, &title)?;
        }
        ReplCommand::Star(target) => {
            let id = target_or_active(store, target.as_deref())?;
            store.toggle_star(&id)?;
        }
        ReplCommand::Delete(target) => {
            let id = target_or_active(store, target.as_deref())?;
            store.delete_chat(&id)?;
            print_active_chat(store);
        }
        ReplCommand::Export(out) => {
            let id = target_or_active(store, None)?;
            let path = write_transcript(store, &id, out.as_deref(), export_dir)?;
            println!("{} {}", "✓ Exported to".green(), path.display());
        }
        ReplCommand::Quote(text) => {
            composer.set_quote(text.and_then(Quote::new));
            if let Some(quote) = composer.quote() {
                println!("{} {}", "❝".bright_yellow(), quote.as_str().bright_black());
            }
        }
        ReplCommand::Help => print_help(),
        ReplCommand::Quit => {}
    }
    Ok(())
}

fn print_help() {
    println!("{}", "Commands:".bright_cyan().bold());
    for (usage, text) in [
        ("/new", "start a new chat"),
        ("/list", "list saved chats"),
        ("/select <n|id>", "switch to another chat"),
        ("/rename <title>", "rename the current chat"),
        ("/star [n|id]", "star or unstar a chat"),
        ("/delete [n|id]", "delete a chat"),
        ("/export [file]", "write the current chat to a text file"),
        ("/quote [text]", "quote text in the next message, or clear the quote"),
        ("/quit", "leave"),
    ] {
        println!("  {:<18} {}", usage.bright_green(), text.bright_black());
    }
}

pub fn print_message(message: &ChatMessage) {
    let label = match message.role {
        Role::User => message.role.transcript_label().bright_green().bold(),
        Role::Assistant => message.role.transcript_label().bright_cyan().bold(),
    };
    println!("{} {}", label, message_time(&message.timestamp).bright_black());
    for paragraph in paragraphs(&message.content) {
        for line in paragraph {
            println!("  {}", line);
        }
        println!();
    }
}

fn print_active_chat<S: KeyValueStore>(store: &ChatSessionStore<S>) {
    if let Some(chat) = store.active_chat() {
        println!("{}", format!("── {} ──", chat.title).bright_cyan().bold());
    }
    for message in store.messages() {
        print_message(message);
    }
}

/// Run the interactive terminal client
pub async fn run_repl_mode(args: &ChatArgs) -> Result<()> {
    let mut store = open_store(&args.data.data_dir)?;
    store.ensure_active_chat()?;

    let endpoint = HttpChatEndpoint::new(&args.endpoint);
    let mut dispatcher = Dispatcher::default();
    let mut composer = Composer::new();
    let export_dir = std::env::current_dir()?;

    println!("{}", "🤖 SageChat".bright_cyan().bold());
    println!("{}", format!("Proxy: {}", endpoint.url()).bright_black());
    println!("{}", format!("Data directory: {}", args.data.data_dir.display()).bright_black());
    println!("{}", "Type /help for commands, /quit to exit\n".bright_black());
    print_active_chat(&store);

    let mut rl = DefaultEditor::new()?;

    loop {
        let prompt = if composer.quote().is_some() { "❝ > " } else { "> " };
        match rl.readline(prompt) {
            Ok(line) => {
                let line = line.trim();
                if !line.is_empty() {
                    let _ = rl.add_history_entry(line);
                }

                if line.starts_with('/') {
                    match ReplCommand::parse(line) {
                        Ok(ReplCommand::Quit) => break,
                        Ok(command) => {
                            let result =
                                execute(command, &mut store, &mut composer, &export_dir);
                            if let Err(e) = result {
                                eprintln!("{} {}", "⚠️".yellow(), e);
                            }
                        }
                        Err(usage) => eprintln!("{} {}", "⚠️".yellow(), usage),
                    }
                    continue;
                }

                composer.set_input(line);
                if !composer.can_submit() {
                    continue;
                }
                println!("{}", "思考中...".bright_black());

                match dispatcher
                    .send(&mut store, &mut composer, &endpoint, &TokioTimer)
                    .await?
                {
                    DispatchOutcome::Replied(message) => print_message(&message),
                    DispatchOutcome::GaveUp(message) => {
                        println!("{}\n", message.content.red());
                    }
                    DispatchOutcome::Rejected(_) => {}
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    println!("{}", "Goodbye!".bright_black());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sagechat_store::MemoryStore;

    fn session() -> (ChatSessionStore<MemoryStore>, Composer) {
        let mut store = ChatSessionStore::new(MemoryStore::new());
        store.create_chat().unwrap();
        (store, Composer::new())
    }

    #[test]
    fn parses_commands_and_arguments() {
        assert_eq!(ReplCommand::parse("/new"), Ok(ReplCommand::New));
        assert_eq!(ReplCommand::parse("/select 2"), Ok(ReplCommand::Select("2".into())));
        assert_eq!(
            ReplCommand::parse("/rename  学习 笔记 "),
            Ok(ReplCommand::Rename("学习 笔记".into()))
        );
        assert_eq!(ReplCommand::parse("/star"), Ok(ReplCommand::Star(None)));
        assert_eq!(ReplCommand::parse("/quote"), Ok(ReplCommand::Quote(None)));
        assert_eq!(ReplCommand::parse("/exit"), Ok(ReplCommand::Quit));
        assert!(ReplCommand::parse("/select").is_err());
        assert!(ReplCommand::parse("/frobnicate").is_err());
    }

    #[test]
    fn select_by_list_number_follows_sort_order() {
        let (mut store, mut composer) = session();
        let first = store.current_chat_id().unwrap().to_string();
        let second = store.create_chat().unwrap();
        store.toggle_star(&first).unwrap();

        assert_eq!(resolve_target(&store, "1"), Some(first.clone()));
        assert_eq!(resolve_target(&store, "2"), Some(second.clone()));
        assert_eq!(resolve_target(&store, "3"), None);
        assert_eq!(resolve_target(&store, &second), Some(second.clone()));

        let dir = tempfile::tempdir().unwrap();
        execute(ReplCommand::Select("1".into()), &mut store, &mut composer, dir.path()).unwrap();
        assert_eq!(store.current_chat_id(), Some(first.as_str()));
    }

    #[test]
    fn rename_and_star_apply_to_active_chat() {
        let (mut store, mut composer) = session();
        let dir = tempfile::tempdir().unwrap();

        execute(ReplCommand::Rename("周末计划".into()), &mut store, &mut composer, dir.path()).unwrap();
        execute(ReplCommand::Star(None), &mut store, &mut composer, dir.path()).unwrap();

        let chat = store.active_chat().unwrap();
        assert_eq!(chat.title, "周末计划");
        assert!(chat.is_starred);
    }

    #[test]
    fn quote_command_sets_and_clears_quote() {
        let (mut store, mut composer) = session();
        let dir = tempfile::tempdir().unwrap();

        let quote = ReplCommand::Quote(Some("类比解释".into()));
        execute(quote, &mut store, &mut composer, dir.path()).unwrap();
        assert_eq!(composer.quote().map(Quote::as_str), Some("类比解释"));

        execute(ReplCommand::Quote(None), &mut store, &mut composer, dir.path()).unwrap();
        assert!(composer.quote().is_none());
    }

    #[test]
    fn delete_unknown_chat_is_an_error() {
        let (mut store, mut composer) = session();
        let dir = tempfile::tempdir().unwrap();

        let delete = ReplCommand::Delete(Some("nope".into()));
        let result = execute(delete, &mut store, &mut composer, dir.path());
        assert!(result.is_err());
        assert_eq!(store.histories().len(), 1);
    }

    #[test]
    fn export_writes_into_export_dir() {
        let (mut store, mut composer) = session();
        let dir = tempfile::tempdir().unwrap();

        execute(ReplCommand::Export(None), &mut store, &mut composer, dir.path()).unwrap();

        assert!(dir.path().join("新对话 1.txt").exists());
    }
}
