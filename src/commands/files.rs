use crate::cli::FileCommand;
use crate::commands::{truncate, Backend};
use crate::config::Config;
use crate::error::{ChatError, Result};
use colored::Colorize;
use prettytable::{format, Table};

/// Handle `files upload`, `files list` and `files delete`
pub async fn handle_files(config: &Config, command: FileCommand) -> Result<()> {
    let backend = Backend::from_config(config, false)?;

    match command {
        FileCommand::Upload { path, name } => {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                ChatError::Validation(format!("Cannot read {}: {}", path.display(), e))
            })?;
            let name = name.unwrap_or_else(|| {
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string())
            });

            let stored = backend.files.put_file(&name, &content).await?;
            tracing::info!(file_id = %stored.id, size = stored.size, "Uploaded file");
            println!("{}", stored.id);
        }
        FileCommand::List => {
            let files = backend.files.list_files().await?;
            if files.is_empty() {
                println!("{}", "No files uploaded.".yellow());
                return Ok(());
            }

            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
            table.add_row(prettytable::row![
                "ID".bold(),
                "Name".bold(),
                "Size".bold(),
                "Uploaded".bold()
            ]);
            for file in files {
                table.add_row(prettytable::row![
                    file.id.cyan(),
                    truncate(&file.name, 40),
                    file.size,
                    file.uploaded_at.format("%Y-%m-%d %H:%M").to_string()
                ]);
            }
            table.printstd();
        }
        FileCommand::Delete { id } => {
            if !backend.files.delete_file(&id).await? {
                return Err(ChatError::FileNotFound(id).into());
            }
            println!("Deleted {}", id);
        }
    }

    Ok(())
}
