//! The `facename init` command.

use std::path::Path;

use anyhow::Result;

use facename_core::names::FAMILY_NAMES_FILE;

const NAME_LISTS: [(&str, &str); 13] = [
    (FAMILY_NAMES_FILE, include_str!("../../../../assets/names/familyNames.txt")),
    ("20-male-Names.txt", include_str!("../../../../assets/names/20-male-Names.txt")),
    ("20-female-Names.txt", include_str!("../../../../assets/names/20-female-Names.txt")),
    ("30-male-Names.txt", include_str!("../../../../assets/names/30-male-Names.txt")),
    ("30-female-Names.txt", include_str!("../../../../assets/names/30-female-Names.txt")),
    ("40-male-Names.txt", include_str!("../../../../assets/names/40-male-Names.txt")),
    ("40-female-Names.txt", include_str!("../../../../assets/names/40-female-Names.txt")),
    ("50-male-Names.txt", include_str!("../../../../assets/names/50-male-Names.txt")),
    ("50-female-Names.txt", include_str!("../../../../assets/names/50-female-Names.txt")),
    ("60-male-Names.txt", include_str!("../../../../assets/names/60-male-Names.txt")),
    ("60-female-Names.txt", include_str!("../../../../assets/names/60-female-Names.txt")),
    ("70-male-Names.txt", include_str!("../../../../assets/names/70-male-Names.txt")),
    ("70-female-Names.txt", include_str!("../../../../assets/names/70-female-Names.txt")),
];

pub fn execute() -> Result<()> {
    if Path::new("facename.toml").exists() {
        println!("facename.toml already exists, skipping.");
    } else {
        std::fs::write("facename.toml", SAMPLE_CONFIG)?;
        println!("Created facename.toml");
    }

    let names_dir = Path::new("assets/names");
    std::fs::create_dir_all(names_dir)?;
    let mut created = 0;
    for (file, content) in NAME_LISTS {
        let path = names_dir.join(file);
        if path.exists() {
            println!("{} already exists, skipping.", path.display());
        } else {
            std::fs::write(&path, content)?;
            created += 1;
        }
    }
    println!("Created {created} name lists in {}", names_dir.display());

    println!("\nNext steps:");
    println!("  1. Set STABILITY_API_KEY, or set backend = \"mock\" in facename.toml");
    println!("  2. Run: facename generate --count 5");
    println!("  3. Run: facename train");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# facename configuration

# Image backend: "stability" or "mock" (offline placeholder images)
backend = "stability"
# Store: "sqlite" or "json"
store = "sqlite"
app_root = "."
ethnicity = "japanese"

[stability]
api_key = "${STABILITY_API_KEY}"
# endpoint = "https://api.stability.ai/v2beta/stable-image/generate/core"
timeout_secs = 60

[image]
width = 512
height = 512
cfg_scale = 7.5

[retry]
max_attempts = 3
base_delay_ms = 1000

[trainer]
person_count = 5
display_time_secs = 10

# Weights used when a request leaves age or gender open.
# [distributions]
# age = [[20, 0.25], [30, 0.25], [40, 0.20], [50, 0.15], [60, 0.10], [70, 0.05]]
# gender = [["male", 0.5], ["female", 0.5]]
"#;
