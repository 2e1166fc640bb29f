//! Batch resolution.
//!
//! Batches are ID-addressed. For UX, the CLI accepts either a `bat_` ID or a
//! batch name; names are unique so a name match is never ambiguous.

use anyhow::Result;
use seatplan_engine::{Batch, MemoryStore};
use seatplan_id::BatchId;

use crate::error::CliError;

pub fn resolve_batch(store: &MemoryStore, ident: &str) -> Result<Batch> {
    let ident = ident.trim();
    if ident.is_empty() {
        anyhow::bail!("Batch cannot be empty");
    }

    if let Ok(id) = ident.parse::<BatchId>() {
        return store
            .batch(id)
            .map_err(|_| CliError::BatchNotFound(ident.to_string()).into());
    }

    store
        .list_batches()
        .into_iter()
        .map(|summary| summary.batch)
        .find(|batch| batch.name == ident)
        .ok_or_else(|| CliError::BatchNotFound(ident.to_string()).into())
}
