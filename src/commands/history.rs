use crate::commands::{truncate, Backend};
use crate::config::Config;
use crate::error::Result;
use crate::storage::SessionSummary;
use colored::Colorize;
use prettytable::{format, Table};

/// Print stored sessions, most recently updated first
pub async fn handle_history(config: &Config) -> Result<()> {
    let backend = Backend::from_config(config, false)?;
    let sessions = backend.service.list_sessions().await?;

    if sessions.is_empty() {
        println!("{}", "No chat sessions found.".yellow());
        return Ok(());
    }

    println!("\nChat Sessions:");
    render_table(&sessions).printstd();
    println!();
    println!(
        "Use {} to view a transcript.",
        "multichat session show <ID>".cyan()
    );
    println!();
    Ok(())
}

fn render_table(sessions: &[SessionSummary]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "ID".bold(),
        "Title".bold(),
        "User".bold(),
        "Messages".bold(),
        "Last Updated".bold()
    ]);

    for session in sessions {
        let updated = session.updated_at.format("%Y-%m-%d %H:%M").to_string();
        table.add_row(prettytable::row![
            session.id.cyan(),
            truncate(&session.title, 40),
            session.user_id,
            session.message_count,
            updated
        ]);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Session;

    #[test]
    fn test_render_table_has_row_per_session() {
        let sessions = vec![
            Session::new(None, Some("First")).summary(),
            Session::new(Some("u2"), None).summary(),
        ];
        let table = render_table(&sessions);
        // header + one row each
        assert_eq!(table.len(), 3);
    }
}
