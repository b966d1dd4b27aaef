//! Import subcommand for support-config CLI
//!
//! Reads a configuration export (plain or gzip JSON) and hands it to the
//! config manager, which verifies the checksum and validates the document.

use clap::Args;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Arguments for the import subcommand
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Path to the export file to import
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Parse and verify the file without changing anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Read a file as text, transparently decompressing gzip (detected by magic bytes).
pub fn read_input(path: &Path) -> std::io::Result<String> {
    let mut bytes = Vec::new();
    BufReader::new(File::open(path)?).read_to_end(&mut bytes)?;

    if bytes.starts_with(&[0x1f, 0x8b]) {
        let mut decoder = flate2::read::GzDecoder::new(bytes.as_slice());
        let mut content = String::new();
        decoder.read_to_string(&mut content)?;
        Ok(content)
    } else {
        String::from_utf8(bytes)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
