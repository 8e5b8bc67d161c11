pub mod commands;

use std::io::{self, Write};

use crate::chat::chat_turn;
use crate::cli::commands::{Commands, ParticipantAction};
use crate::config::AppConfig;
use crate::llm::ProviderFactory;
use crate::session::SessionStore;
use crate::store::{clock, ConversationTurn, LogStore};

pub async fn run_cli(command: Commands, config_path: String) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load(&config_path)?;
    let store = LogStore::open(&config.storage)?;

    match command {
        Commands::Serve => {
            return Err("serve is handled by the server entrypoint".into());
        }
        Commands::Participant { action } => match action {
            ParticipantAction::List => {
                let ids = store.list_participants()?;
                if ids.is_empty() {
                    println!("No participants found.");
                }
                for id in ids {
                    println!("{:<24} | {} files", id, store.list_files(&id)?.len());
                }
            }
            ParticipantAction::Files { id } => {
                for name in store.list_files(&id)? {
                    println!("{}", name);
                }
            }
            ParticipantAction::Logs { id, date, page_type } => {
                let date = date.unwrap_or_else(clock::today);
                let logs = store.read_log(&id, &page_type, &date)?;
                if logs.is_empty() {
                    println!("No {} log for {} on {}.", page_type, id, date);
                }
                print!("{}", render_transcript(&logs));
            }
            ParticipantAction::Export { id, path } => {
                let logs = store.latest_conversation_log(&id)?;
                let export_path = path.unwrap_or_else(|| format!("conversation_{}.txt", id));
                let mut file = std::fs::File::create(&export_path)?;
                writeln!(file, "Participant: {}", id)?;
                writeln!(file, "Exported At: {}", clock::iso_now())?;
                writeln!(file, "---")?;
                write!(file, "{}", render_transcript(&logs))?;
                println!("Conversation exported successfully to: {}", export_path);
            }
        },
        Commands::Chat { participant, page_type } => {
            config.validate()?;
            run_repl(&config, &store, &participant, &page_type).await?;
        }
    }
    Ok(())
}

/// `[ROLE]: content` blocks separated by `---` lines.
pub fn render_transcript(turns: &[ConversationTurn]) -> String {
    let mut out = String::new();
    for turn in turns {
        out.push_str(&format!("[USER]: {}\n---\n", turn.user_message));
        out.push_str(&format!("[ASSISTANT]: {}\n---\n", turn.bot_response));
    }
    out
}

async fn run_repl(
    config: &AppConfig,
    store: &LogStore,
    participant: &str,
    page_type: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let llm = ProviderFactory::create_default(config);
    let sessions = SessionStore::new(config.chat.max_history_messages);

    println!("--- MedTalk Terminal Consultation ---");
    println!("Participant: {} ({})", participant, page_type);
    println!("Type /exit to quit, /clear to reset the conversation.");
    println!("-------------------------------------");

    loop {
        print!("\n환자> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let text = input.trim();

        if text.is_empty() { continue; }
        if text == "/exit" || text == "/quit" { break; }
        if text == "/clear" {
            sessions.clear(Some(participant));
            println!("대화 기록이 초기화되었습니다.");
            continue;
        }

        match chat_turn(config, llm.as_ref(), store, &sessions, text, Some(participant), Some(page_type)).await {
            Ok(reply) => println!("의사> {}", reply),
            Err(e) => eprintln!("Error: {}", e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_uses_role_blocks() {
        let turns = vec![ConversationTurn::new("머리가 아파요", "언제부터?", None, None)];
        assert_eq!(
            render_transcript(&turns),
            "[USER]: 머리가 아파요\n---\n[ASSISTANT]: 언제부터?\n---\n"
        );
    }
}
