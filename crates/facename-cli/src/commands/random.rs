//! The `facename random` command.

use std::path::PathBuf;

use anyhow::Result;

use facename_core::model::{Age, Gender};

use super::{conditions, pairs_table};
use crate::app::App;

pub async fn execute(
    config_path: Option<PathBuf>,
    count: Option<usize>,
    age: Option<Age>,
    gender: Option<Gender>,
) -> Result<()> {
    let app = App::load(config_path.as_deref())?;
    let count = count.unwrap_or(app.config.trainer.person_count);
    let pairs = app
        .service
        .get_random_pairs(count, conditions(age, gender))
        .await?;
    if pairs.is_empty() {
        println!("No pairs found.");
    } else {
        println!("{}", pairs_table(&pairs));
    }
    Ok(())
}
