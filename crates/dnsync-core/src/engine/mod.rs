//! Record reconciliation engine
//!
//! The ZoneEngine is responsible for:
//! - Listing the records of a zone
//! - Appending new records
//! - Converging records toward a desired state (create or update)
//! - Deleting records
//!
//! ## Architecture
//!
//! ```text
//!   caller records
//!         │
//!         ▼
//! ┌──────────────┐   encode / decode   ┌──────────────┐
//! │  ZoneEngine  │◄───────────────────►│ RecordCodec  │
//! └──────────────┘                     └──────────────┘
//!         │
//!         │ invoke(method, params)
//!         ▼
//! ┌──────────────┐
//! │  Transport   │──── retries, backoff, envelope ────► remote service
//! └──────────────┘
//! ```
//!
//! ## Identity resolution
//!
//! Records carrying an identity token are addressed by it directly. Records
//! without one are correlated with the zone's current records by
//! [`ReconciliationKey`] (relative name + type), fetched once per call and
//! only when at least one input record needs it.
//!
//! ## Partial results
//!
//! Append, Set and Delete process records one at a time and stop at the
//! first failure, returning the records completed so far inside a
//! [`BatchError`]. List is all-or-nothing.

use crate::config::EngineConfig;
use crate::context::CallContext;
use crate::error::{BatchError, BatchResult, Error, Result};
use crate::record::{
    ListRecordsResponse, ReconciliationKey, Record, RemoteRecord, is_record_id, normalize_zone,
};
use crate::traits::{ProviderParts, RecordCodec, Transport, call, call_unit};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Remote procedure names
pub mod methods {
    /// Enumerate all records of a domain
    pub const LIST_RECORDS: &str = "list-records";
    /// Create a record, returning it with its new identity
    pub const ADD_RECORD: &str = "add-record";
    /// Replace the content of the record with a given identity
    pub const EDIT_RECORD: &str = "edit-record";
    /// Remove the record with a given identity
    pub const REMOVE_RECORD: &str = "remove-record";
}

#[derive(Serialize)]
struct DomainRequest<'a> {
    domain: &'a str,
}

#[derive(Serialize)]
struct RemoveRecordRequest<'a> {
    domain: &'a str,
    id: &'a str,
}

/// Existing records of a zone indexed by reconciliation key
type Lookup = HashMap<ReconciliationKey, Record>;

/// Identity usable for addressing `record`, if any
///
/// Tokens that still look like a rendered reconciliation key are rejected.
fn resolve_identity(record: &Record) -> Option<&str> {
    record.identity().filter(|id| is_record_id(id))
}

/// Reconciliation engine for one provider
///
/// The engine holds no mutable state: every operation re-fetches whatever
/// remote state it needs, so one engine can serve concurrent callers.
pub struct ZoneEngine {
    /// Remote procedure transport
    transport: Arc<dyn Transport>,

    /// Record conversion for the provider
    codec: Arc<dyn RecordCodec>,

    /// Timeouts
    config: EngineConfig,
}

impl ZoneEngine {
    /// Create a new engine
    ///
    /// # Parameters
    ///
    /// - `transport`: Transport implementation
    /// - `codec`: Record codec for the same provider
    /// - `config`: Engine configuration
    pub fn new(
        transport: Arc<dyn Transport>,
        codec: Arc<dyn RecordCodec>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            transport,
            codec,
            config,
        })
    }

    /// Create an engine from a factory-built provider
    pub fn from_parts(parts: ProviderParts, config: EngineConfig) -> Result<Self> {
        Self::new(parts.transport, parts.codec, config)
    }

    /// Name of the underlying provider
    pub fn provider_name(&self) -> &'static str {
        self.transport.provider_name()
    }

    /// List every record in `zone`
    ///
    /// Fails without partial output if the remote call fails or any single
    /// record cannot be decoded.
    pub async fn list_records(&self, ctx: &CallContext, zone: &str) -> Result<Vec<Record>> {
        let zone = normalize_zone(zone);
        let records = self.fetch_records(ctx, zone).await?;
        debug!("Listed {} record(s) in {}", records.len(), zone);
        Ok(records)
    }

    /// Create each record in `zone`, in input order
    ///
    /// On the first failure the records created so far are returned inside
    /// the [`BatchError`].
    pub async fn append_records(
        &self,
        ctx: &CallContext,
        zone: &str,
        records: &[Record],
    ) -> BatchResult {
        let zone = normalize_zone(zone);
        let mut appended = Vec::with_capacity(records.len());

        for record in records {
            match self.create(ctx, zone, record).await {
                Ok(created) => appended.push(created),
                Err(e) => return Err(BatchError::new(appended, e)),
            }
        }

        info!("Appended {} record(s) to {}", appended.len(), zone);
        Ok(appended)
    }

    /// Create or update each record in `zone`
    ///
    /// Records with an identity token are updated in place. Records without
    /// one are matched by (name, type) against the zone's current records:
    /// a match is updated under the matched identity, a miss is created.
    ///
    /// Each remote call runs under its own `call_timeout`. Without a caller
    /// deadline the whole operation is bounded by `operation_timeout`.
    pub async fn set_records(
        &self,
        ctx: &CallContext,
        zone: &str,
        records: &[Record],
    ) -> BatchResult {
        let zone = normalize_zone(zone);
        let ctx = self.operation_context(ctx);
        let (keyed, unkeyed) = partition_by_identity(records);

        let lookup = if unkeyed.is_empty() {
            Lookup::new()
        } else {
            self.lookup_existing(&ctx, zone)
                .await
                .map_err(BatchError::empty)?
        };

        let mut set = Vec::with_capacity(records.len());

        for (id, record) in keyed {
            let op_ctx = ctx.with_timeout(self.config.call_timeout());
            match self.update(&op_ctx, zone, record, id).await {
                Ok(updated) => set.push(updated),
                Err(e) => return Err(BatchError::new(set, e)),
            }
            if let Some(err) = ctx.err() {
                return Err(BatchError::new(set, err));
            }
        }

        for record in unkeyed {
            let op_ctx = ctx.with_timeout(self.config.call_timeout());
            let key = record.reconciliation_key(zone);

            let result = match lookup.get(&key) {
                Some(existing) => match resolve_identity(existing) {
                    Some(id) => {
                        debug!("Matched {} to existing record {}", key, id);
                        self.update(&op_ctx, zone, record, id).await
                    }
                    None => Err(Error::inconsistent(format!(
                        "missing ID for existing record {}",
                        key
                    ))),
                },
                None => {
                    debug!("No existing record for {}, creating", key);
                    self.create(&op_ctx, zone, record).await
                }
            };

            match result {
                Ok(record) => set.push(record),
                Err(e) => return Err(BatchError::new(set, e)),
            }
            if let Some(err) = ctx.err() {
                return Err(BatchError::new(set, err));
            }
        }

        info!("Set {} record(s) in {}", set.len(), zone);
        Ok(set)
    }

    /// Delete each record from `zone`
    ///
    /// Records without an identity token are resolved by (name, type); a
    /// record with no remote counterpart is skipped, not reported as an
    /// error. The returned records are the caller's inputs that were
    /// removed. Identity-keyed records are processed first; callers must not
    /// rely on the ordering.
    pub async fn delete_records(
        &self,
        ctx: &CallContext,
        zone: &str,
        records: &[Record],
    ) -> BatchResult {
        let zone = normalize_zone(zone);
        let ctx = self.operation_context(ctx);
        let (keyed, unkeyed) = partition_by_identity(records);

        let lookup = if unkeyed.is_empty() {
            Lookup::new()
        } else {
            self.lookup_existing(&ctx, zone)
                .await
                .map_err(BatchError::empty)?
        };

        let mut targets: Vec<(&str, &Record)> = keyed;
        for record in unkeyed {
            let key = record.reconciliation_key(zone);
            match lookup.get(&key).and_then(resolve_identity) {
                Some(id) => targets.push((id, record)),
                None => debug!("No existing record for {}, nothing to delete", key),
            }
        }

        let mut seen = HashSet::new();
        let mut deleted = Vec::with_capacity(targets.len());

        for (id, record) in targets {
            if !seen.insert(id) {
                debug!("Record {} already removed in this batch", id);
                continue;
            }

            let op_ctx = ctx.with_timeout(self.config.call_timeout());
            let request = RemoveRecordRequest { domain: zone, id };
            let removed =
                call_unit(self.transport.as_ref(), &op_ctx, methods::REMOVE_RECORD, &request).await;
            if let Err(e) = removed {
                let e = e.context(format!("failed to delete record {}", id));
                return Err(BatchError::new(deleted, e));
            }

            deleted.push(record.clone());
            if let Some(err) = ctx.err() {
                return Err(BatchError::new(deleted, err));
            }
        }

        info!("Deleted {} record(s) from {}", deleted.len(), zone);
        Ok(deleted)
    }

    /// Caller context, bounded by `operation_timeout` if it has no deadline
    fn operation_context(&self, ctx: &CallContext) -> CallContext {
        if ctx.deadline().is_some() {
            ctx.clone()
        } else {
            ctx.with_timeout(self.config.operation_timeout())
        }
    }

    /// List and decode the records of an already-normalized zone
    async fn fetch_records(&self, ctx: &CallContext, zone: &str) -> Result<Vec<Record>> {
        let listed: ListRecordsResponse = call(
            self.transport.as_ref(),
            ctx,
            methods::LIST_RECORDS,
            &DomainRequest { domain: zone },
        )
        .await
        .map_err(|e| e.context("failed to list records"))?;

        listed
            .records
            .into_iter()
            .map(|remote| {
                self.codec
                    .decode(remote)
                    .map_err(|e| e.context("failed to convert record"))
            })
            .collect()
    }

    /// Current records of the zone indexed by reconciliation key
    ///
    /// When several records share a key the last one listed wins.
    async fn lookup_existing(&self, ctx: &CallContext, zone: &str) -> Result<Lookup> {
        let fetch_ctx = ctx.with_timeout(self.config.lookup_timeout());
        let existing = self
            .fetch_records(&fetch_ctx, zone)
            .await
            .map_err(|e| e.context("failed to get existing records"))?;

        Ok(existing
            .into_iter()
            .map(|record| (record.reconciliation_key(zone), record))
            .collect())
    }

    fn encode(&self, record: &Record, zone: &str) -> Result<RemoteRecord> {
        self.codec
            .encode(record, zone)
            .map_err(|e| e.context("failed to convert record"))
    }

    fn decode_response(&self, remote: RemoteRecord) -> Result<Record> {
        self.codec
            .decode(remote)
            .map_err(|e| e.context("failed to convert response record"))
    }

    async fn create(&self, ctx: &CallContext, zone: &str, record: &Record) -> Result<Record> {
        let remote = self.encode(record, zone)?.without_id();
        let created: RemoteRecord =
            call(self.transport.as_ref(), ctx, methods::ADD_RECORD, &remote)
                .await
                .map_err(|e| e.context("failed to add record"))?;
        self.decode_response(created)
    }

    async fn update(
        &self,
        ctx: &CallContext,
        zone: &str,
        record: &Record,
        id: &str,
    ) -> Result<Record> {
        let remote = self.encode(record, zone)?.with_id(id);
        let updated: RemoteRecord =
            call(self.transport.as_ref(), ctx, methods::EDIT_RECORD, &remote)
                .await
                .map_err(|e| e.context(format!("failed to update record {}", id)))?;
        self.decode_response(updated)
    }
}

/// Split records into (identity, record) pairs and identity-less records
fn partition_by_identity(records: &[Record]) -> (Vec<(&str, &Record)>, Vec<&Record>) {
    let mut keyed = Vec::new();
    let mut unkeyed = Vec::new();
    for record in records {
        match resolve_identity(record) {
            Some(id) => keyed.push((id, record)),
            None => unkeyed.push(record),
        }
    }
    (keyed, unkeyed)
}
