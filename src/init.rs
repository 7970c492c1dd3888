use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::template::Template;

pub fn init_template(filename: &str) -> Result<PathBuf> {
    let path = if filename.ends_with(".toml") {
        PathBuf::from(filename)
    } else {
        PathBuf::from(format!("{}.toml", filename))
    };

    let text = toml::to_string_pretty(&Template::default())?;
    fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Template created: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_loadable_default_template() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("layout");
        let path = init_template(base.to_str().unwrap()).unwrap();
        assert_eq!(path.extension().unwrap(), "toml");
        assert_eq!(Template::load(&path).unwrap(), Template::default());
    }
}
