//! Append-only JSON lines store.
//!
//! Each line holds one serialized [`SignatureRecord`]. The file is read once
//! on open; registrations append a line and flush before returning, so a
//! record is durable once its id is handed out. Existing lines are never
//! rewritten.

use crate::store::{RegistrationRequest, SignatureRecord, SignatureStore};
use crate::trace::{trace_event, trace_span};
use crate::util::{ConstellationError, ConstellationResult};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// File-backed store.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: Vec<SignatureRecord>,
    writer: Option<BufWriter<File>>,
}

impl JsonFileStore {
    /// Opens (creating if needed) the store file and loads existing records.
    pub fn open<P: AsRef<Path>>(path: P) -> ConstellationResult<Self> {
        let path = path.as_ref().to_path_buf();
        let _span = trace_span!("open_json_store").entered();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)
            .map_err(io_error)?;

        let mut records = Vec::new();
        for (idx, line) in BufReader::new(&file).lines().enumerate() {
            let line = line.map_err(io_error)?;
            if line.trim().is_empty() {
                continue;
            }
            let record: SignatureRecord =
                serde_json::from_str(&line).map_err(|err| ConstellationError::StoreCorrupt {
                    line: idx + 1,
                    reason: err.to_string(),
                })?;
            records.push(record);
        }

        trace_event!("json_store_loaded", records = records.len());
        Ok(Self {
            path,
            records,
            writer: Some(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn next_id(&self) -> u64 {
        self.records.iter().map(|r| r.id).max().unwrap_or(0) + 1
    }
}

impl SignatureStore for JsonFileStore {
    fn register_signature(&mut self, request: RegistrationRequest) -> ConstellationResult<u64> {
        let id = self.next_id();
        let writer = self.writer.as_mut().ok_or(ConstellationError::StoreClosed)?;
        let record = SignatureRecord::from_request(id, request);
        let line = serde_json::to_string(&record).map_err(|err| ConstellationError::StoreIo {
            reason: err.to_string(),
        })?;
        writeln!(writer, "{line}").map_err(io_error)?;
        writer.flush().map_err(io_error)?;
        self.records.push(record);
        trace_event!("signature_registered", id = id);
        Ok(id)
    }

    fn all_signatures(&self) -> ConstellationResult<Vec<SignatureRecord>> {
        if self.writer.is_none() {
            return Err(ConstellationError::StoreClosed);
        }
        Ok(self.records.clone())
    }

    fn close(&mut self) -> ConstellationResult<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(io_error)?;
        }
        Ok(())
    }
}

fn io_error(err: std::io::Error) -> ConstellationError {
    ConstellationError::StoreIo {
        reason: err.to_string(),
    }
}
