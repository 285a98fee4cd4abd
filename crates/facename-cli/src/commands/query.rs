//! The `facename query` command.

use std::path::PathBuf;

use anyhow::Result;

use facename_core::api;

use crate::app::App;

/// Answer one query string and print the response envelope as JSON.
pub async fn execute(config_path: Option<PathBuf>, query: String) -> Result<()> {
    let app = App::load(config_path.as_deref())?;
    let response = api::dispatch(&app.service, &query).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    if !response.success {
        anyhow::bail!("query failed");
    }
    Ok(())
}
