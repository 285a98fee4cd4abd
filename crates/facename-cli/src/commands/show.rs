//! The `facename show` command.

use std::path::PathBuf;

use anyhow::Result;

use crate::app::App;

pub fn execute(config_path: Option<PathBuf>, id: String) -> Result<()> {
    let app = App::load(config_path.as_deref())?;
    let Some(pair) = app.service.get_pair_by_id(&id)? else {
        anyhow::bail!("no pair with id {id}");
    };

    println!("{}", pair.full_name());
    println!("  id:        {}", pair.id);
    println!("  age:       {}", pair.age);
    println!("  gender:    {}", pair.gender);
    println!("  ethnicity: {}", pair.ethnicity);
    if let Some(seed) = pair.seed {
        println!("  seed:      {seed}");
    }
    println!("  image:     {}", app.config.app_root.join(&pair.image_uri).display());
    println!("  created:   {}", pair.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    Ok(())
}
