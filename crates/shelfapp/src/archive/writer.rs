use crate::error::{Result, ShelfError};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Container format for produced archives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchiveFormat {
    #[default]
    #[serde(rename = "zip")]
    Zip,
    #[serde(rename = "tar.gz")]
    TarGz,
}

impl ArchiveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::TarGz => "tar.gz",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ArchiveFormat {
    type Err = ShelfError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "zip" => Ok(ArchiveFormat::Zip),
            "tar.gz" | "tgz" => Ok(ArchiveFormat::TarGz),
            other => Err(ShelfError::Config(format!(
                "Unknown archive format: {}",
                other
            ))),
        }
    }
}

/// An archive being written to disk.
pub enum ArchiveSink {
    Zip(ZipWriter<BufWriter<File>>),
    TarGz(tar::Builder<GzEncoder<BufWriter<File>>>),
}

impl ArchiveSink {
    pub fn create(path: &Path, format: ArchiveFormat) -> Result<Self> {
        let file = BufWriter::new(File::create(path).map_err(ShelfError::Io)?);
        Ok(match format {
            ArchiveFormat::Zip => ArchiveSink::Zip(ZipWriter::new(file)),
            ArchiveFormat::TarGz => {
                let enc = GzEncoder::new(file, Compression::default());
                ArchiveSink::TarGz(tar::Builder::new(enc))
            }
        })
    }

    /// Append the contents of `source` under `entry_name`.
    pub fn append_file(&mut self, entry_name: &str, source: &mut File) -> Result<()> {
        match self {
            ArchiveSink::Zip(zip) => {
                let len = source.metadata().map_err(ShelfError::Io)?.len();
                let options = SimpleFileOptions::default()
                    .compression_method(CompressionMethod::Deflated)
                    .large_file(len > u64::from(u32::MAX));
                zip.start_file(entry_name, options)?;
                io::copy(source, zip).map_err(ShelfError::Io)?;
            }
            ArchiveSink::TarGz(tar) => {
                tar.append_file(entry_name, source).map_err(ShelfError::Io)?;
            }
        }
        Ok(())
    }

    /// Write trailers and flush everything to disk.
    pub fn finish(self) -> Result<()> {
        let mut out = match self {
            ArchiveSink::Zip(zip) => zip.finish()?,
            ArchiveSink::TarGz(tar) => {
                let enc = tar.into_inner().map_err(ShelfError::Io)?;
                enc.finish().map_err(ShelfError::Io)?
            }
        };
        out.flush().map_err(ShelfError::Io)?;
        out.get_ref().sync_all().map_err(ShelfError::Io)?;
        Ok(())
    }
}
