use crate::cli::SessionCommand;
use crate::commands::Backend;
use crate::config::Config;
use crate::error::Result;
use crate::session::SendMessageRequest;
use crate::storage::{Role, Session};
use colored::Colorize;

/// Handle `session new` and `session show`
pub async fn handle_session(config: &Config, command: SessionCommand) -> Result<()> {
    let backend = Backend::from_config(config, false)?;

    match command {
        SessionCommand::New { user, title } => {
            let session = backend
                .service
                .create_session(user.as_deref(), title.as_deref())
                .await?;
            println!("{}", session.id);
        }
        SessionCommand::Show { id, json } => {
            let session = backend.service.get_history(&id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&session)?);
            } else {
                print_transcript(&session);
            }
        }
    }

    Ok(())
}

/// Send one message and print the reply
pub async fn run_send(
    config: &Config,
    session_id: String,
    provider: String,
    file_ids: Vec<String>,
    message: String,
) -> Result<()> {
    let backend = Backend::from_config(config, false)?;

    let outcome = backend
        .service
        .send_message(SendMessageRequest {
            session_id,
            message,
            provider,
            file_ids,
        })
        .await?;

    for warning in &outcome.warnings {
        eprintln!(
            "{} file {} was not included: {}",
            "warning:".yellow().bold(),
            warning.file_id,
            warning.cause
        );
    }

    println!("{}", outcome.assistant_text);
    Ok(())
}

fn print_transcript(session: &Session) {
    println!("{} {}", "Session:".bold(), session.id.cyan());
    println!("{} {}", "Title:".bold(), session.title);
    println!("{} {}", "User:".bold(), session.user_id);
    println!(
        "{} {}",
        "Updated:".bold(),
        session.updated_at.format("%Y-%m-%d %H:%M:%S")
    );

    if session.messages.is_empty() {
        println!("\n{}", "No messages yet.".yellow());
        return;
    }

    for message in &session.messages {
        let label = match message.role {
            Role::User => format!("[user via {}]", message.provider).green(),
            Role::Assistant => format!("[{}]", message.provider).blue(),
        };
        println!("\n{} {}", label.bold(), message.timestamp.format("%H:%M:%S"));
        if !message.file_references.is_empty() {
            println!("  files: {}", message.file_references.join(", ").dimmed());
        }
        println!("{}", message.content);
    }
}
