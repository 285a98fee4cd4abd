//! The `facename generate` command.

use std::path::PathBuf;

use anyhow::Result;

use facename_core::model::{Age, Gender};

use super::{conditions, pairs_table};
use crate::app::App;

pub async fn execute(
    config_path: Option<PathBuf>,
    count: usize,
    age: Option<Age>,
    gender: Option<Gender>,
) -> Result<()> {
    let app = App::load(config_path.as_deref())?;
    eprintln!("Generating {count} pair(s)...");
    let pairs = app
        .service
        .generate_multiple(count, conditions(age, gender))
        .await?;
    println!("{}", pairs_table(&pairs));
    Ok(())
}
