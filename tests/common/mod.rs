#![allow(dead_code)]

pub mod command;

use chisel::areas::repository::Repository;
use std::path::Path;

/// Repository handle discarding everything commands print
pub fn open_repository(dir: &Path) -> Repository {
    Repository::new(&dir.display().to_string(), Box::new(std::io::sink()))
        .expect("Failed to open repository")
}
