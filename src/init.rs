use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use xdg::BaseDirectories;

/// Default config.toml content
const DEFAULT_CONFIG: &str = r#"# Directory holding the Packages/ resource tree.
# packages_path = "/path/to/Sublime Text/Packages"

# Build number assertions with a `build>=N` filter are checked against.
build = 4200

# Print the test list and per-test color scheme and syntax.
debug = false

# Print a coverage report after a successful run.
coverage = false
"#;

/// Run the init command
pub fn run_init(force: bool) -> Result<()> {
    let base_dirs =
        BaseDirectories::with_prefix("color-scheme-unit").context("Failed to get config directory")?;

    init_config_home(&base_dirs.get_config_home(), force)?;

    println!();
    println!("Initialization complete!");
    Ok(())
}

fn init_config_home(config_home: &Path, force: bool) -> Result<()> {
    if !config_home.exists() {
        println!(
            "Creating configuration directory: {}",
            config_home.display()
        );
        fs::create_dir_all(config_home).context("Failed to create config directory")?;
    }

    write_file_if_needed(&config_home.join("config.toml"), DEFAULT_CONFIG, force, "config.toml")
}

/// Write a file if it doesn't exist or force is true
fn write_file_if_needed(path: &Path, content: &str, force: bool, name: &str) -> Result<()> {
    if path.exists() && !force {
        println!(
            "Skipping {} (already exists, use --force to overwrite)",
            name
        );
        return Ok(());
    }

    println!("Writing {}...", name);
    fs::write(path, content).with_context(|| format!("Failed to write {}", name))?;
    Ok(())
}
