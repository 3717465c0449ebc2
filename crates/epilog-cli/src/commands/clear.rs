use crate::commands::authenticated_serializd;
use crate::output::Output;
use color_eyre::Result;
use history_import_config::{Config, CredentialStore, PathManager};
use history_import_remote::TrackingService;
use std::fs;
use std::io::{self, BufRead, Write};

pub async fn run_clear(
    tag: Option<String>,
    all: bool,
    credentials: bool,
    yes: bool,
    output: &Output,
) -> Result<()> {
    let paths = PathManager::new().map_err(|e| color_eyre::eyre::eyre!("{:#}", e))?;
    let mut cleared_anything = false;

    if credentials {
        clear_credentials(&paths, output)?;
        cleared_anything = true;
    }

    if all || tag.is_some() {
        clear_remote_entries(&paths, tag.as_deref(), yes, output).await?;
        cleared_anything = true;
    }

    if !cleared_anything {
        output.warn("No clear option specified. Use --tag, --all, or --credentials");
        output.println("\nExample: epilog clear --tag '#netfliximport'");
    }

    Ok(())
}

fn clear_credentials(paths: &PathManager, output: &Output) -> Result<()> {
    let credentials_file = paths.credentials_file();
    if credentials_file.exists() {
        fs::remove_file(&credentials_file).map_err(|e| {
            color_eyre::eyre::eyre!(
                "Failed to remove credentials file at {}: {}",
                credentials_file.display(),
                e
            )
        })?;
        output.success(format!("Cleared credentials: {}", credentials_file.display()));
    } else {
        output.info("No credentials file found to clear");
    }
    Ok(())
}

async fn clear_remote_entries(
    paths: &PathManager,
    tag: Option<&str>,
    yes: bool,
    output: &Output,
) -> Result<()> {
    match tag {
        Some(tag) => output.info(format!("Deleting diary entries tagged {}", tag)),
        None => output.warn("This will delete ALL diary entries on Serializd"),
    }

    if !yes && !confirm("Are you sure you want to continue?")? {
        output.info("Cancelled");
        return Ok(());
    }

    let config = Config::load(&paths.config_file()).map_err(|e| color_eyre::eyre::eyre!("{:#}", e))?;
    let mut creds = CredentialStore::new(paths.credentials_file());
    creds.load().map_err(|e| color_eyre::eyre::eyre!("{:#}", e))?;
    let client = authenticated_serializd(&config, &mut creds).await?;

    let deleted = client
        .delete_entries_by_tag(tag)
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Failed to delete entries: {}", e))?;
    output.success(format!("Deleted {} diary entries", deleted));
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} (yes/no): ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(answer == "yes" || answer == "y")
}
