pub mod clear;
pub mod import;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use history_import_config::{Config, CredentialStore};
use history_import_remote::SerializdClient;

/// Build an authenticated Serializd client. Prefers the saved session
/// token; falls back to email/password from environment, config, and
/// the credential store. A fresh token is written back to the store.
pub(crate) async fn authenticated_serializd(
    config: &Config,
    creds: &mut CredentialStore,
) -> Result<SerializdClient> {
    let email = std::env::var("SERIALIZD_EMAIL")
        .ok()
        .or_else(|| config.serializd.as_ref().map(|s| s.email.clone()));
    let password = std::env::var("SERIALIZD_PASSWORD")
        .ok()
        .or_else(|| creds.get_serializd_password().cloned());

    let saved_token = creds.get_serializd_token().cloned();
    let mut client = SerializdClient::new();
    client
        .authenticate(saved_token.as_deref(), email.as_deref(), password.as_deref())
        .await
        .map_err(|e| eyre!("Serializd authentication failed: {}", e))?;

    if let Some(token) = client.session_token() {
        if saved_token.as_deref() != Some(token) {
            creds.set_serializd_token(token.to_string());
            creds.save().map_err(|e| eyre!("{:#}", e))?;
        }
    }
    Ok(client)
}

/// TMDB API key: environment wins, then credential store, then config.
pub(crate) fn tmdb_api_key(config: &Config, creds: &CredentialStore) -> Result<String> {
    std::env::var("TMDB_API_KEY")
        .ok()
        .or_else(|| creds.get_tmdb_api_key().cloned())
        .or_else(|| config.tmdb.as_ref().map(|t| t.api_key.clone()))
        .ok_or_else(|| {
            eyre!(
                "TMDB API key required. Set TMDB_API_KEY, or add [tmdb] api_key to the \
                 config file."
            )
        })
}
