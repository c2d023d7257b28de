use boxflow_core::Manifest;
use colored::Colorize;

/// Load `box.yml` from the working directory
pub fn load_manifest() -> anyhow::Result<Manifest> {
    let dir = std::env::current_dir()?;
    println!("{}", "Loading run manifest".blue());
    let manifest = Manifest::load_from_dir(&dir)?;
    println!(
        "Project: {} ({} services)",
        manifest.project.cyan(),
        manifest.services.len()
    );
    Ok(manifest)
}

pub fn print_done(message: &str) {
    println!("{} {}", "✓".green(), message);
}
