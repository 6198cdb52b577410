//! Conversion between [`Record`] and the Njalla record shape
//!
//! Njalla stores every record with a zone-relative `name`, a `content`
//! string and a handful of optional numeric fields. HTTPS records are the
//! odd one out: their SvcParams travel in `value` and `content` stays empty.

use dnsync_core::error::{Error, Result};
use dnsync_core::record::{
    Address, BindingScheme, Cname, Generic, Mx, Record, RemoteRecord, ServiceBinding, Srv, Txt,
    relative_name,
};
use dnsync_core::traits::RecordCodec;
use std::net::IpAddr;
use std::time::Duration;

/// Record codec for the Njalla API
#[derive(Debug, Clone, Copy, Default)]
pub struct NjallaCodec;

impl RecordCodec for NjallaCodec {
    fn encode(&self, record: &Record, zone: &str) -> Result<RemoteRecord> {
        let mut remote = RemoteRecord {
            id: record.identity().unwrap_or_default().to_string(),
            domain: zone.to_string(),
            rtype: record.record_type().to_string(),
            name: relative_name(record.name(), zone),
            ttl: ttl_secs(record.ttl())?,
            ..Default::default()
        };

        match record {
            Record::Address(r) => remote.content = r.ip.to_string(),
            Record::Cname(r) => remote.content = r.target.clone(),
            Record::Txt(r) => remote.content = r.text.clone(),
            Record::Mx(r) => {
                remote.content = r.target.clone();
                remote.prio = Some(r.preference);
            }
            Record::Srv(r) => {
                remote.content = r.target.clone();
                remote.prio = Some(r.priority);
                remote.weight = Some(r.weight);
                remote.port = Some(r.port);
            }
            Record::ServiceBinding(r) => {
                remote.target = Some(r.target.clone());
                remote.prio = Some(r.priority);
                let params = Some(r.params.clone()).filter(|p| !p.is_empty());
                match r.scheme {
                    BindingScheme::Https => remote.value = params,
                    BindingScheme::Svcb => remote.content = params.unwrap_or_default(),
                }
            }
            Record::Generic(r) => remote.content = r.data.clone(),
        }

        Ok(remote)
    }

    fn decode(&self, record: RemoteRecord) -> Result<Record> {
        let ttl = Duration::from_secs(u64::from(record.ttl));
        let identity = Some(record.id).filter(|id| !id.is_empty());
        let name = record.name;

        let decoded = match record.rtype.as_str() {
            "A" | "AAAA" => {
                let ip: IpAddr = record.content.parse().map_err(|e| {
                    Error::conversion(format!(
                        "invalid {} record IP address {:?}: {}",
                        record.rtype, record.content, e
                    ))
                })?;
                Record::Address(Address {
                    name,
                    ttl,
                    ip,
                    identity,
                })
            }
            "CNAME" => Record::Cname(Cname {
                name,
                ttl,
                target: record.content,
                identity,
            }),
            "TXT" => Record::Txt(Txt {
                name,
                ttl,
                text: record.content,
                identity,
            }),
            "MX" => Record::Mx(Mx {
                name,
                ttl,
                preference: record.prio.unwrap_or_default(),
                target: record.content,
                identity,
            }),
            "SRV" => Record::Srv(Srv {
                name,
                ttl,
                priority: record.prio.unwrap_or_default(),
                weight: record.weight.unwrap_or_default(),
                port: record.port.unwrap_or_default(),
                target: record.content,
                identity,
            }),
            "HTTPS" => Record::ServiceBinding(ServiceBinding {
                name,
                ttl,
                scheme: BindingScheme::Https,
                priority: record.prio.unwrap_or_default(),
                target: record.target.unwrap_or_default(),
                params: record.value.unwrap_or_default(),
                identity,
            }),
            "SVCB" => Record::ServiceBinding(ServiceBinding {
                name,
                ttl,
                scheme: BindingScheme::Svcb,
                priority: record.prio.unwrap_or_default(),
                target: record.target.unwrap_or_default(),
                params: record.content,
                identity,
            }),
            _ => Record::Generic(Generic {
                name,
                ttl,
                rtype: record.rtype,
                data: record.content,
            }),
        };

        Ok(decoded)
    }
}

/// TTL in whole seconds, truncating any fraction
fn ttl_secs(ttl: Duration) -> Result<u32> {
    u32::try_from(ttl.as_secs())
        .map_err(|_| Error::conversion(format!("TTL out of range: {}s", ttl.as_secs())))
}
