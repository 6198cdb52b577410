// # dnsync - DNS record reconciliation CLI
//
// This binary is a THIN integration layer: it reads configuration from the
// environment, parses one command, builds the engine through the provider
// registry and runs the command. All reconciliation logic lives in
// dnsync-core; all wire details live in the provider crates.
//
// ## Commands
//
// ```text
// dnsync list   <zone>
// dnsync append <zone> <name> <type> <data> [ttl-secs]
// dnsync set    <zone> <name> <type> <data> [ttl-secs] [id]
// dnsync delete <zone> <name> <type> <data> [ttl-secs] [id]
// ```
//
// `<data>` is the address for A/AAAA, the target for CNAME, the text for
// TXT, `"<pref> <target>"` for MX, `"<prio> <weight> <port> <target>"` for
// SRV and `"<prio> <target> [params]"` for HTTPS/SVCB. Any other type is
// passed through as a generic record.
//
// ## Configuration
//
// - `DNSYNC_PROVIDER_TYPE`: Provider type (njalla)
// - `DNSYNC_API_TOKEN`: API token (required)
// - `DNSYNC_ENDPOINT`: API endpoint override
// - `DNSYNC_MAX_RETRIES`: Retries after the first attempt (0-10)
// - `DNSYNC_REQUEST_TIMEOUT_SECS`: Timeout per HTTP attempt
// - `DNSYNC_OPERATION_TIMEOUT_SECS`: Default bound for set/delete
// - `DNSYNC_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export DNSYNC_API_TOKEN=your_token
// dnsync set example.com www A 192.0.2.1 3600
// ```

use anyhow::{Context, Result, bail};
use dnsync_core::config::{DnsyncConfig, ProviderConfig};
use dnsync_core::record::{
    Address, BindingScheme, Cname, Generic, Mx, Record, ServiceBinding, Srv, Txt,
};
use dnsync_core::{CallContext, ProviderRegistry, ZoneEngine};
use std::env;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Default TTL for records given on the command line (1 hour)
const DEFAULT_TTL_SECS: u64 = 3600;

/// Exit codes for different termination scenarios
///
/// - 0: Command completed
/// - 1: Usage or configuration error
/// - 2: Runtime error (remote failure, cancellation)
#[derive(Debug, Clone, Copy)]
enum DnsyncExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<DnsyncExitCode> for ExitCode {
    fn from(code: DnsyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    provider_type: String,
    api_token: String,
    endpoint: Option<String>,
    max_retries: Option<u32>,
    request_timeout_secs: Option<u64>,
    operation_timeout_secs: Option<u64>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            provider_type: lookup("DNSYNC_PROVIDER_TYPE").unwrap_or_else(|| "njalla".to_string()),
            api_token: lookup("DNSYNC_API_TOKEN").unwrap_or_default(),
            endpoint: lookup("DNSYNC_ENDPOINT").filter(|s| !s.is_empty()),
            max_retries: parse_number(&lookup, "DNSYNC_MAX_RETRIES")?,
            request_timeout_secs: parse_number(&lookup, "DNSYNC_REQUEST_TIMEOUT_SECS")?,
            operation_timeout_secs: parse_number(&lookup, "DNSYNC_OPERATION_TIMEOUT_SECS")?,
            log_level: lookup("DNSYNC_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.api_token.is_empty() {
            bail!(
                "DNSYNC_API_TOKEN is required. \
                Set it via: export DNSYNC_API_TOKEN=your_token"
            );
        }

        match self.provider_type.as_str() {
            "njalla" => {}
            _ => bail!(
                "DNSYNC_PROVIDER_TYPE '{}' is not supported. \
                Supported providers: njalla",
                self.provider_type
            ),
        }

        if let Some(ref endpoint) = self.endpoint
            && !endpoint.starts_with("https://")
            && !endpoint.starts_with("http://")
        {
            bail!(
                "DNSYNC_ENDPOINT must use HTTP or HTTPS scheme. Got: {}",
                endpoint
            );
        }

        if let Some(max_retries) = self.max_retries
            && max_retries > 10
        {
            bail!(
                "DNSYNC_MAX_RETRIES must be between 0 and 10. Got: {}",
                max_retries
            );
        }

        if let Some(timeout) = self.request_timeout_secs
            && !(1..=300).contains(&timeout)
        {
            bail!(
                "DNSYNC_REQUEST_TIMEOUT_SECS must be between 1 and 300 seconds. Got: {}",
                timeout
            );
        }

        if let Some(timeout) = self.operation_timeout_secs
            && !(1..=3600).contains(&timeout)
        {
            bail!(
                "DNSYNC_OPERATION_TIMEOUT_SECS must be between 1 and 3600 seconds. Got: {}",
                timeout
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => bail!(
                "DNSYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Build the library configuration
    fn to_dnsync_config(&self) -> DnsyncConfig {
        let mut provider = ProviderConfig::njalla(self.api_token.clone());
        if let ProviderConfig::Njalla {
            endpoint,
            request_timeout_secs,
            ..
        } = &mut provider
        {
            endpoint.clone_from(&self.endpoint);
            if let Some(timeout) = self.request_timeout_secs {
                *request_timeout_secs = timeout;
            }
        }

        let mut config = DnsyncConfig::new(provider);
        if let Some(max_retries) = self.max_retries {
            config.retry.max_retries = max_retries;
        }
        if let Some(timeout) = self.operation_timeout_secs {
            config.engine.operation_timeout_secs = timeout;
        }
        config
    }

    fn log_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

fn parse_number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("{} must be a non-negative integer. Got: {}", key, raw)),
        None => Ok(None),
    }
}

/// A parsed command line
#[derive(Debug, PartialEq)]
enum Command {
    List { zone: String },
    Append { zone: String, record: Record },
    Set { zone: String, record: Record },
    Delete { zone: String, record: Record },
}

impl Command {
    fn parse(args: &[String]) -> Result<Self> {
        let Some((verb, rest)) = args.split_first() else {
            bail!("missing command");
        };

        match verb.as_str() {
            "list" => match rest {
                [zone] => Ok(Command::List { zone: zone.clone() }),
                _ => bail!("list takes exactly one argument: <zone>"),
            },
            "append" | "set" | "delete" => {
                let allow_id = verb != "append";
                let (zone, record) = parse_record_args(rest, allow_id)
                    .with_context(|| format!("invalid arguments for {}", verb))?;
                Ok(match verb.as_str() {
                    "append" => Command::Append { zone, record },
                    "set" => Command::Set { zone, record },
                    _ => Command::Delete { zone, record },
                })
            }
            other => bail!("unknown command: {}", other),
        }
    }
}

fn usage() -> &'static str {
    "usage:\n  \
     dnsync list   <zone>\n  \
     dnsync append <zone> <name> <type> <data> [ttl-secs]\n  \
     dnsync set    <zone> <name> <type> <data> [ttl-secs] [id]\n  \
     dnsync delete <zone> <name> <type> <data> [ttl-secs] [id]"
}

fn parse_record_args(args: &[String], allow_id: bool) -> Result<(String, Record)> {
    let max = if allow_id { 6 } else { 5 };
    if args.len() < 4 || args.len() > max {
        bail!("expected <zone> <name> <type> <data> [ttl-secs]{}", if allow_id { " [id]" } else { "" });
    }

    let ttl = match args.get(4) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("invalid TTL: {}", raw))?,
        None => DEFAULT_TTL_SECS,
    };

    let mut record = parse_record(&args[1], &args[2], &args[3], Duration::from_secs(ttl))?;
    if let Some(id) = args.get(5) {
        record = record.with_identity(id.clone());
    }

    Ok((args[0].clone(), record))
}

/// Build a record from its presentation fields
fn parse_record(name: &str, rtype: &str, data: &str, ttl: Duration) -> Result<Record> {
    let name = name.to_string();
    let rtype = rtype.to_uppercase();
    let fields: Vec<&str> = data.split_whitespace().collect();

    let record = match rtype.as_str() {
        "A" | "AAAA" => {
            let ip = data
                .parse()
                .with_context(|| format!("invalid {} address: {}", rtype, data))?;
            Record::Address(Address {
                name,
                ttl,
                ip,
                identity: None,
            })
        }
        "CNAME" => Record::Cname(Cname {
            name,
            ttl,
            target: data.to_string(),
            identity: None,
        }),
        "TXT" => Record::Txt(Txt {
            name,
            ttl,
            text: data.to_string(),
            identity: None,
        }),
        "MX" => match fields.as_slice() {
            [preference, target] => Record::Mx(Mx {
                name,
                ttl,
                preference: parse_u16(preference, "MX preference")?,
                target: target.to_string(),
                identity: None,
            }),
            _ => bail!("MX data must be \"<pref> <target>\""),
        },
        "SRV" => match fields.as_slice() {
            [priority, weight, port, target] => Record::Srv(Srv {
                name,
                ttl,
                priority: parse_u16(priority, "SRV priority")?,
                weight: parse_u16(weight, "SRV weight")?,
                port: parse_u16(port, "SRV port")?,
                target: target.to_string(),
                identity: None,
            }),
            _ => bail!("SRV data must be \"<prio> <weight> <port> <target>\""),
        },
        "HTTPS" | "SVCB" => match fields.as_slice() {
            [priority, target, params @ ..] => Record::ServiceBinding(ServiceBinding {
                name,
                ttl,
                scheme: if rtype == "HTTPS" {
                    BindingScheme::Https
                } else {
                    BindingScheme::Svcb
                },
                priority: parse_u16(priority, "service binding priority")?,
                target: target.to_string(),
                params: params.join(" "),
                identity: None,
            }),
            _ => bail!("{} data must be \"<prio> <target> [params]\"", rtype),
        },
        _ => Record::Generic(Generic {
            name,
            ttl,
            rtype,
            data: data.to_string(),
        }),
    };

    Ok(record)
}

fn parse_u16(raw: &str, what: &str) -> Result<u16> {
    raw.parse()
        .with_context(|| format!("invalid {}: {}", what, raw))
}

/// One tab-separated output line: name, ttl, type, data, id
fn format_record(record: &Record) -> String {
    let data = match record {
        Record::Address(r) => r.ip.to_string(),
        Record::Cname(r) => r.target.clone(),
        Record::Txt(r) => r.text.clone(),
        Record::Mx(r) => format!("{} {}", r.preference, r.target),
        Record::Srv(r) => format!("{} {} {} {}", r.priority, r.weight, r.port, r.target),
        Record::ServiceBinding(r) if r.params.is_empty() => format!("{} {}", r.priority, r.target),
        Record::ServiceBinding(r) => format!("{} {} {}", r.priority, r.target, r.params),
        Record::Generic(r) => r.data.clone(),
    };

    format!(
        "{}\t{}\t{}\t{}\t{}",
        record.name(),
        record.ttl().as_secs(),
        record.record_type(),
        data,
        record.identity().unwrap_or("-")
    )
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{:#}\n\n{}", e, usage());
            return DnsyncExitCode::ConfigError.into();
        }
    };

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DnsyncExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DnsyncExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DnsyncExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DnsyncExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        let engine = match build_engine(&config) {
            Ok(engine) => engine,
            Err(e) => {
                error!("Startup error: {:#}", e);
                return DnsyncExitCode::ConfigError;
            }
        };

        match run_command(&engine, command).await {
            Ok(()) => DnsyncExitCode::Success,
            Err(e) => {
                error!("{:#}", e);
                DnsyncExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Register providers and build the engine
fn build_engine(config: &Config) -> Result<ZoneEngine> {
    let registry = ProviderRegistry::new();

    #[cfg(feature = "njalla")]
    {
        info!("Registering Njalla provider");
        dnsync_provider_njalla::register(&registry);
    }

    let engine = registry
        .create_engine(&config.to_dnsync_config())
        .context("failed to create engine")?;
    info!("Using provider: {}", engine.provider_name());
    Ok(engine)
}

/// Run one command, cancelling it on Ctrl-C
async fn run_command(engine: &ZoneEngine, command: Command) -> Result<()> {
    let token = CancellationToken::new();
    let ctx = CallContext::from_token(token.clone());

    let watcher = tokio::spawn({
        let token = token.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Received interrupt, cancelling");
                token.cancel();
            }
        }
    });

    let result = execute(engine, &ctx, command).await;
    watcher.abort();
    result
}

async fn execute(engine: &ZoneEngine, ctx: &CallContext, command: Command) -> Result<()> {
    let (zone, records) = match command {
        Command::List { zone } => {
            for record in engine.list_records(ctx, &zone).await? {
                println!("{}", format_record(&record));
            }
            return Ok(());
        }
        Command::Append { zone, record } => {
            let done = engine.append_records(ctx, &zone, &[record]).await;
            (zone, done)
        }
        Command::Set { zone, record } => {
            let done = engine.set_records(ctx, &zone, &[record]).await;
            (zone, done)
        }
        Command::Delete { zone, record } => {
            let done = engine.delete_records(ctx, &zone, &[record]).await;
            (zone, done)
        }
    };

    match records {
        Ok(records) => {
            if records.is_empty() {
                info!("No matching record in {}", zone);
            }
            for record in &records {
                println!("{}", format_record(record));
            }
            Ok(())
        }
        Err(e) => {
            for record in &e.completed {
                println!("{}", format_record(record));
            }
            Err(anyhow::Error::new(e.error)
                .context(format!("{} record(s) completed before failure", e.completed.len())))
        }
    }
}
