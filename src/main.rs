use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use voiceform::{
    create_router, AppState, AudioBackendFactory, AudioSource, Config, ConnectionStatus, Session,
    SessionState, TemplateStore, TimeContext,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Fill in forms from live speech", long_about = None)]
struct Args {
    /// Configuration file (extension optional)
    #[arg(long, default_value = "config/voiceform")]
    config: String,

    /// Template to fill in; the configured default if omitted
    #[arg(long, short)]
    template: Option<String>,

    /// Replay a WAV file instead of capturing the microphone
    #[arg(long)]
    wav: Option<PathBuf>,

    /// Override the service endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Serve the control API instead of recording right away
    #[arg(long)]
    serve: bool,

    /// Print the available templates and exit
    #[arg(long)]
    list_templates: bool,

    /// Print the available input devices and exit
    #[cfg(feature = "microphone")]
    #[arg(long)]
    list_devices: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let mut cfg = Config::load(&args.config)?;
    if let Some(endpoint) = args.endpoint.clone() {
        cfg.client.endpoint = endpoint;
    }

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    #[cfg(feature = "microphone")]
    if args.list_devices {
        for name in voiceform::audio::MicrophoneBackend::list_devices()? {
            println!("{}", name);
        }
        return Ok(());
    }

    let store = TemplateStore::load_or_default(cfg.templates.path.as_deref())?;

    if args.list_templates {
        for template in store.templates() {
            println!(
                "{} ({} fields){}",
                template.name,
                template.fields.len(),
                template
                    .description
                    .as_deref()
                    .map(|d| format!(": {}", d))
                    .unwrap_or_default()
            );
        }
        return Ok(());
    }

    let wanted = args.template.clone().or_else(|| cfg.templates.default.clone());
    let template = match wanted.as_deref() {
        Some(name) => store
            .find(name)
            .with_context(|| format!("Unknown template '{}'", name))?,
        None => store.templates().first().context("No templates available")?,
    };
    info!("Using template '{}'", template.name);

    let session_config = cfg.session_config(template, &TimeContext::now());

    let source = match args.wav.clone() {
        Some(path) => AudioSource::File(path),
        None => AudioSource::Microphone {
            device: cfg.audio.device.clone(),
        },
    };
    let backend = AudioBackendFactory::create(source, cfg.backend_config())?;

    let session = Arc::new(Session::new(session_config, backend)?);
    info!("Session {} -> {}", session.session_id(), cfg.client.endpoint);

    let printer = tokio::spawn(print_updates(session.subscribe()));

    if args.serve {
        serve(&cfg, Arc::clone(&session)).await?;
    } else {
        record(&session).await?;
    }

    session.shutdown().await;
    printer.abort();

    let state = session.state();
    println!("{}", serde_json::to_string_pretty(&state)?);

    Ok(())
}

async fn serve(cfg: &Config, session: Arc<Session>) -> Result<()> {
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Control API listening on http://{}", addr);

    axum::serve(listener, create_router(AppState::new(session)))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("HTTP server failed")
}

/// Connect, record until ctrl-c or the server ends the session
async fn record(session: &Session) -> Result<()> {
    let mut updates = session.subscribe();
    session.connect();

    let status = updates
        .wait_for(|s| {
            matches!(
                s.connection_status,
                ConnectionStatus::Connected | ConnectionStatus::Error
            )
        })
        .await
        .context("Session closed while connecting")?
        .connection_status;

    if status != ConnectionStatus::Connected {
        let reason = session
            .state()
            .error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string());
        bail!("Connection failed: {}", reason);
    }

    if !session.start_recording() {
        bail!("Could not start recording");
    }
    info!("Recording; press ctrl-c to stop");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
        ended = updates.wait_for(|s| s.connection_status != ConnectionStatus::Connected) => {
            if ended.is_ok() {
                warn!("Session ended by the server");
            }
        }
    }

    Ok(())
}

/// Log transcript and field changes as they arrive
async fn print_updates(mut updates: watch::Receiver<SessionState>) {
    let mut last = updates.borrow().clone();

    while updates.changed().await.is_ok() {
        let current = updates.borrow_and_update().clone();

        if current.transcript_final.text != last.transcript_final.text {
            println!("> {}", current.transcript_final.text);
        } else if current.transcript_interim.text != last.transcript_interim.text
            && !current.transcript_interim.text.is_empty()
        {
            println!("~ {}", current.transcript_interim.text);
        }

        for (identifier, field) in &current.fields {
            if last.fields.get(identifier) != Some(field) {
                let marker = if field.draft { " (draft)" } else { "" };
                println!("  {} = {}{}", identifier, field.value, marker);
            }
        }

        if let Some(error) = current.error.as_ref().filter(|e| last.error.as_ref() != Some(*e)) {
            warn!("{}", error);
        }

        last = current;
    }
}
