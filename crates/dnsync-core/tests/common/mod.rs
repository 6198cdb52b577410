//! Test doubles and common utilities for reconciliation contract tests
//!
//! This module provides a scripted transport that records every call and a
//! minimal codec covering address, TXT and generic records.

#![allow(dead_code)]

use dnsync_core::context::CallContext;
use dnsync_core::error::{Error, Result};
use dnsync_core::record::{Address, Generic, Record, RemoteRecord, Txt, relative_name};
use dnsync_core::traits::{RecordCodec, Transport};
use dnsync_core::{EngineConfig, ZoneEngine};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// One observed `invoke`
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub params: Value,
    pub deadline: Option<Instant>,
}

type Handler = Box<dyn Fn(&str, &Value, usize) -> Option<Result<Value>> + Send + Sync>;

/// A scripted Transport that tracks calls
///
/// Resolution order for a call: a done context fails with the context
/// error, then the custom handler (if it returns `Some`), then configured
/// per-method responses, then write echoing, then an error.
pub struct MockTransport {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    responses: Mutex<HashMap<String, Value>>,
    handler: Mutex<Option<Handler>>,
    echo_writes: bool,
    next_id: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            responses: Mutex::new(HashMap::new()),
            handler: Mutex::new(None),
            echo_writes: false,
            next_id: AtomicUsize::new(1),
        }
    }

    /// A transport that answers add-record / edit-record / remove-record
    /// by echoing the request, assigning `new-<n>` ids to created records
    pub fn echoing() -> Self {
        Self {
            echo_writes: true,
            ..Self::new()
        }
    }

    /// Respond to `method` with `response`
    pub fn set_response(&self, method: &str, response: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(method.to_string(), response);
    }

    /// Respond to list-records with the given records
    pub fn set_existing(&self, records: Vec<RemoteRecord>) {
        self.set_response("list-records", json!({ "records": records }));
    }

    /// Install a handler consulted before configured responses
    ///
    /// The handler receives the method, params and the 1-based count of
    /// calls to that method so far (including this one).
    pub fn set_handler<F>(&self, handler: F)
    where
        F: Fn(&str, &Value, usize) -> Option<Result<Value>> + Send + Sync + 'static,
    {
        *self.handler.lock().unwrap() = Some(Box::new(handler));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method)
            .collect()
    }

    /// Get the number of times `method` was invoked
    pub fn call_count(&self, method: &str) -> usize {
        self.calls_to(method).len()
    }

    fn echo(&self, method: &str, params: &Value) -> Option<Value> {
        if !self.echo_writes {
            return None;
        }
        match method {
            "add-record" => {
                let mut created = params.clone();
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                created["id"] = json!(format!("new-{}", id));
                Some(created)
            }
            "edit-record" => Some(params.clone()),
            "remove-record" => Some(json!({})),
            _ => None,
        }
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn invoke(&self, ctx: &CallContext, method: &str, params: Value) -> Result<Value> {
        let count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(RecordedCall {
                method: method.to_string(),
                params: params.clone(),
                deadline: ctx.deadline(),
            });
            calls.iter().filter(|c| c.method == method).count()
        };

        if let Some(err) = ctx.err() {
            return Err(err);
        }

        if let Some(handler) = self.handler.lock().unwrap().as_ref()
            && let Some(result) = handler(method, &params, count)
        {
            return result;
        }

        if let Some(response) = self.responses.lock().unwrap().get(method) {
            return Ok(response.clone());
        }

        self.echo(method, &params)
            .ok_or_else(|| Error::Other(format!("no mock response configured for method: {}", method)))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Minimal codec for A/AAAA, TXT and generic records
pub struct MockCodec;

impl RecordCodec for MockCodec {
    fn encode(&self, record: &Record, zone: &str) -> Result<RemoteRecord> {
        let mut remote = RemoteRecord {
            id: record.identity().unwrap_or_default().to_string(),
            domain: zone.to_string(),
            rtype: record.record_type().to_string(),
            name: relative_name(record.name(), zone),
            ttl: record.ttl().as_secs() as u32,
            ..Default::default()
        };
        remote.content = match record {
            Record::Address(r) => r.ip.to_string(),
            Record::Txt(r) => r.text.clone(),
            Record::Generic(r) => r.data.clone(),
            other => {
                return Err(Error::conversion(format!(
                    "unsupported record type: {}",
                    other.record_type()
                )));
            }
        };
        Ok(remote)
    }

    fn decode(&self, record: RemoteRecord) -> Result<Record> {
        let ttl = Duration::from_secs(u64::from(record.ttl));
        let identity = Some(record.id.clone()).filter(|id| !id.is_empty());
        match record.rtype.as_str() {
            "A" | "AAAA" => {
                let ip: IpAddr = record.content.parse().map_err(|_| {
                    Error::conversion(format!(
                        "invalid {} record IP address {:?}",
                        record.rtype, record.content
                    ))
                })?;
                Ok(Record::Address(Address {
                    name: record.name,
                    ttl,
                    ip,
                    identity,
                }))
            }
            "TXT" => Ok(Record::Txt(Txt {
                name: record.name,
                ttl,
                text: record.content,
                identity,
            })),
            _ => Ok(Record::Generic(Generic {
                name: record.name,
                ttl,
                rtype: record.rtype,
                data: record.content,
            })),
        }
    }
}

/// Engine over `transport` with the mock codec and default timeouts
pub fn engine(transport: Arc<MockTransport>) -> ZoneEngine {
    engine_with_config(transport, EngineConfig::default())
}

pub fn engine_with_config(transport: Arc<MockTransport>, config: EngineConfig) -> ZoneEngine {
    ZoneEngine::new(transport, Arc::new(MockCodec), config).expect("engine construction succeeds")
}

pub fn a_record(name: &str, ip: &str, identity: Option<&str>) -> Record {
    Record::Address(Address {
        name: name.to_string(),
        ttl: Duration::from_secs(3600),
        ip: ip.parse().expect("valid test IP"),
        identity: identity.map(str::to_string),
    })
}

pub fn remote_a(id: &str, name: &str, ip: &str) -> RemoteRecord {
    RemoteRecord {
        id: id.to_string(),
        domain: "example.com".to_string(),
        rtype: "A".to_string(),
        name: name.to_string(),
        content: ip.to_string(),
        ttl: 3600,
        ..Default::default()
    }
}
