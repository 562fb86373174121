use crate::error::{PainelError, Result};
use crate::settings::{save_settings, settings_path, Settings};

pub fn run(data_dir: &str, current: &Settings) -> Result<()> {
    let dir = std::path::Path::new(data_dir);
    if !dir.is_dir() {
        return Err(PainelError::Other(format!("Not a directory: {data_dir}")));
    }
    let data_dir = std::fs::canonicalize(dir)?.to_string_lossy().to_string();

    let mut settings = current.clone();
    settings.data_dir = data_dir;
    save_settings(&settings)?;

    println!("Settings written to {}", settings_path().display());
    println!("  Transações: {}", settings.transactions_path().display());
    println!("  Patrimônio: {}", settings.networth_path().display());
    Ok(())
}
