//! Export subcommand for support-config CLI
//!
//! Writes the configuration export (document, timestamp, version, checksum)
//! as pretty JSON, optionally gzip-compressed.

use clap::Args;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Arguments for the export subcommand
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output file path (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Force gzip compression (auto-detected from .gz extension otherwise)
    #[arg(long)]
    pub gzip: bool,
}

impl ExportArgs {
    /// Whether output should be compressed, from the flag or the file extension
    pub fn should_compress(&self) -> bool {
        self.gzip
            || self
                .output
                .as_ref()
                .and_then(|p| p.extension())
                .is_some_and(|ext| ext == "gz")
    }
}

/// Write `content` to `path`, gzip-compressing when asked.
pub fn write_output(path: &Path, content: &str, compress: bool) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    if compress {
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(content.as_bytes())?;
        encoder.finish()?;
    } else {
        let mut file = file;
        file.write_all(content.as_bytes())?;
    }
    Ok(())
}
