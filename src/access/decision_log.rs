use anyhow::{Context, Result, anyhow};
use log::info;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use time::PrimitiveDateTime;
use time::macros::format_description;

use crate::error::PipelineError;
use crate::models::{AccessStatus, DecisionRecord};

pub const LOG_HEADER: &str = "timestamp,plate_number,status";

/// Append-only record of every access decision.
///
/// Every append is written and flushed to disk before it returns. The log
/// is never truncated or rewritten.
#[derive(Debug)]
pub struct AccessDecisionLog {
    path: PathBuf,
    file: File,
}

impl AccessDecisionLog {
    /// Open the log at `path`, creating it with a header row if it does not
    /// exist yet. An existing log is reused as-is.
    pub fn initialize(path: impl Into<PathBuf>) -> Result<Self, PipelineError> {
        let path = path.into();
        let create_err = |source| PipelineError::LogCreate { path: path.clone(), source };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)
            .map_err(create_err)?;

        let len = file.metadata().map_err(create_err)?.len();
        if len == 0 {
            file.write_all(format!("{}\n", LOG_HEADER).as_bytes())
                .and_then(|_| file.sync_data())
                .map_err(create_err)?;
            info!("created decision log {}", path.display());
        } else {
            // Keep rows line-aligned if a previous writer died mid-line
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1))
                .and_then(|_| file.read_exact(&mut last))
                .map_err(create_err)?;
            if last[0] != b'\n' {
                file.write_all(b"\n").map_err(create_err)?;
            }
            info!("appending to existing decision log {}", path.display());
        }

        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record and flush it.
    pub fn append(&mut self, record: &DecisionRecord) -> Result<(), PipelineError> {
        let row = format!(
            "{},{},{}\n",
            record.formatted_timestamp(),
            record.plate,
            record.status
        );
        self.file
            .write_all(row.as_bytes())
            .and_then(|_| self.file.flush())
            .and_then(|_| self.file.sync_data())
            .map_err(|source| PipelineError::LogWrite { path: self.path.clone(), source })
    }
}

/// Read every record from a decision log, in append order.
///
/// Not used by the pipeline itself; provided for tools that consume the log.
pub fn read_log(path: &Path) -> Result<Vec<DecisionRecord>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read decision log {}", path.display()))?;
    contents
        .lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(i, line)| parse_row(line).with_context(|| format!("bad row {} in {}", i + 2, path.display())))
        .collect()
}

fn parse_row(line: &str) -> Result<DecisionRecord> {
    let mut cells = line.trim_end_matches('\r').split(',');
    let (Some(ts), Some(plate), Some(status)) = (cells.next(), cells.next(), cells.next()) else {
        return Err(anyhow!("expected 3 columns"));
    };

    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let timestamp = PrimitiveDateTime::parse(ts.trim(), format)?.assume_utc();
    let status = AccessStatus::parse(status).ok_or_else(|| anyhow!("unknown status {:?}", status))?;

    Ok(DecisionRecord {
        timestamp,
        plate: plate.trim().to_string(),
        status,
    })
}
