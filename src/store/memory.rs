//! In-memory signature table, for tests and single-process use.

use crate::store::{RegistrationRequest, SignatureRecord, SignatureStore};
use crate::trace::trace_event;
use crate::util::{ConstellationError, ConstellationResult};

/// Volatile store; records live as long as the value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<SignatureRecord>,
    closed: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn ensure_open(&self) -> ConstellationResult<()> {
        if self.closed {
            return Err(ConstellationError::StoreClosed);
        }
        Ok(())
    }
}

impl SignatureStore for MemoryStore {
    fn register_signature(&mut self, request: RegistrationRequest) -> ConstellationResult<u64> {
        self.ensure_open()?;
        let id = self.records.len() as u64 + 1;
        self.records.push(SignatureRecord::from_request(id, request));
        trace_event!("signature_registered", id = id);
        Ok(id)
    }

    fn all_signatures(&self) -> ConstellationResult<Vec<SignatureRecord>> {
        self.ensure_open()?;
        Ok(self.records.clone())
    }

    fn close(&mut self) -> ConstellationResult<()> {
        self.closed = true;
        Ok(())
    }
}
