use clap::Parser;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use isdn_config::{SharedConfig, toml_config};
use isdn_core::{CallDirection, STACK_VERSION, debug};
use isdn_entities::transport::{LoopbackTransport, open_with_retry};
use isdn_entities::{ActionQueue, CallContext, EventResponse, IsdnApp, IsdnManager, StackInfo, Transport, TransportErr};
use isdn_pdus::enums::event::Event;

/// Load configuration file
fn load_config_from_toml(cfg_path: &str) -> SharedConfig {
    match toml_config::from_file(cfg_path) {
        Ok(c) => c,
        Err(e) => {
            println!("Failed to load configuration from {}: {}", cfg_path, e);
            std::process::exit(1);
        }
    }
}

/// Answers every call and clears whatever the peer clears
struct AnsweringApp;

impl IsdnApp for AnsweringApp {
    fn cb_event(&mut self, actions: &mut ActionQueue, event: Event, call: &mut CallContext) -> EventResponse {
        tracing::info!(port = call.port, "{} {}", event, call);
        let reply = match event {
            Event::Setup => {
                tracing::info!(port = call.port, "incoming call {} -> {}", call.data.oad, call.data.dad);
                actions.send(&call.handle(), Event::Alerting);
                Some(Event::Connect)
            }
            Event::Connect => Some(Event::ConnectAcknowledge),
            Event::Disconnect => Some(Event::Release),
            Event::Release => Some(Event::ReleaseComplete),
            _ => None,
        };
        if let Some(reply) = reply {
            actions.send(&call.handle(), reply);
        }
        EventResponse::Ok
    }

    fn log(&mut self, port: u8, msg: &str) {
        tracing::debug!(port, "app: {}", msg);
    }
}

/// Loopback device with one D-channel per configured port, the first two wired together
fn build_loopback(cfg: &SharedConfig) -> Arc<LoopbackTransport> {
    let infos: Vec<StackInfo> = cfg
        .config()
        .ports
        .iter()
        .map(|p| StackInfo::new(p.port, p.role, p.trunk, p.ptp))
        .collect();
    let lo = open_with_retry(|| {
        if infos.is_empty() {
            return Err(TransportErr::OpenFailed("no ports configured".to_string()));
        }
        Ok(LoopbackTransport::new(infos.clone()))
    });
    if let [a, b, ..] = infos.as_slice() {
        lo.connect(a.port, b.port);
        eprintln!(" -> port {} wired to port {}", a.port, b.port);
    }
    Arc::new(lo)
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "ISDN Q.931 signalling stack",
    long_about = "Runs the ISDN signalling stack over an in-process loopback device using the provided TOML configuration"
)]
struct Args {
    /// Config file (required)
    #[arg(help = "TOML config with general options and per-port settings")]
    config: String,

    /// Place a call to this number from the first configured port once it is up
    #[arg(long)]
    call: Option<String>,

    /// Calling number used with --call
    #[arg(long, default_value = "1000")]
    from: String,
}

fn main() {
    eprintln!("isdn-stack {}", STACK_VERSION);

    let args = Args::parse();
    let cfg = load_config_from_toml(&args.config);
    let _log_guard = debug::setup_logging_default(cfg.config().debug_log.clone());

    let loopback = build_loopback(&cfg);
    let transport: Arc<dyn Transport> = loopback;
    let mgr = match IsdnManager::new(cfg.clone(), transport, Box::new(AnsweringApp)) {
        Ok(m) => m,
        Err(e) => {
            tracing::error!("cannot create stack: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = mgr.start() {
        tracing::error!("cannot start stack: {}", e);
        std::process::exit(1);
    }
    for port in mgr.ports() {
        if let Err(e) = mgr.get_port_up(port) {
            tracing::warn!(port, "activation failed: {}", e);
        }
    }

    // Set up Ctrl+C handler for graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("failed to set Ctrl+C handler");

    let mut pending_call = args.call;
    let first_port = mgr.ports().first().copied();
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(200));
        let Some(port) = first_port else {
            continue;
        };
        if pending_call.is_none() || !mgr.port_up(port) {
            continue;
        }
        if let Some(dad) = pending_call.take() {
            place_call(&mgr, port, &args.from, &dad);
        }
    }

    mgr.destroy();
}

fn place_call(mgr: &IsdnManager, port: u8, oad: &str, dad: &str) {
    let Some(call) = mgr.get_free_bc(port, 0, CallDirection::Outgoing, false) else {
        tracing::warn!(port, "no free context for the demo call");
        return;
    };
    mgr.with_call(&call, |ctx| {
        ctx.data.oad = oad.to_string();
        ctx.data.dad = dad.to_string();
    });
    match mgr.send_event(&call, Event::Setup) {
        Ok(()) => tracing::info!(port, "calling {} from {}", dad, oad),
        Err(e) => {
            tracing::warn!(port, "demo call failed: {}", e);
            mgr.release(&call);
        }
    }
}
