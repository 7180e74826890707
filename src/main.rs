use std::{net::SocketAddr, path::Path, sync::Arc};

use clap::{Args as ClapArgs, Parser};
use color_eyre::{Result, eyre::Context};
use stubway::{
    FileDocumentLoader, MockHttpHandler, MockHttpServer, MockService, PayloadMismatch,
    config::{RouteFileValidator, ServerSettings, SettingsValidator, load_settings},
    core::service::DEFAULT_ROUTE_FILE,
    ports::http_server::HttpServer,
    tracing_setup,
    utils::GracefulShutdown,
};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Start the mock server (default)
    Serve(ServeArgs),
    /// Lint a route file and the rule files it references
    Validate {
        /// Route file to validate
        #[clap(short, long, default_value = DEFAULT_ROUTE_FILE)]
        routes: String,
    },
    /// Write a sample route file
    Init {
        /// Output path for the new route file
        #[clap(short, long, default_value = DEFAULT_ROUTE_FILE)]
        routes: String,
    },
}

#[derive(ClapArgs, Debug, Default)]
struct ServeArgs {
    /// Settings file (TOML, YAML, JSON or INI)
    #[clap(short, long)]
    settings: Option<String>,

    /// Route file, overrides the settings file
    #[clap(short, long)]
    routes: Option<String>,

    /// Listen address, overrides the settings file
    #[clap(short, long)]
    listen: Option<String>,

    /// Answer CORS preflights and add CORS headers
    #[clap(long)]
    cors: bool,

    /// Log every request at info level
    #[clap(long)]
    logs: bool,

    /// Reject mismatching POST/PUT bodies with 400 instead of 404
    #[clap(long)]
    strict_payload: bool,

    /// Emit logs as JSON
    #[clap(long)]
    json_logs: bool,
}

impl ServeArgs {
    /// Command line flags win over the settings file and environment.
    fn apply(&self, settings: &mut ServerSettings) {
        if let Some(routes) = &self.routes {
            settings.route_file = routes.clone();
        }
        if let Some(listen) = &self.listen {
            settings.listen_addr = listen.clone();
        }
        settings.cors_enabled |= self.cors;
        settings.logs_enabled |= self.logs;
        if self.strict_payload {
            settings.payload_mismatch = PayloadMismatch::Reject;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    match args.command {
        Some(Commands::Validate { routes }) => validate_routes_command(&routes).await,
        Some(Commands::Init { routes }) => init_routes_command(&routes).await,
        Some(Commands::Serve(serve)) => serve_command(serve).await,
        None => serve_command(ServeArgs::default()).await,
    }
}

async fn serve_command(args: ServeArgs) -> Result<()> {
    let tracing_init = if args.json_logs {
        tracing_setup::init_tracing()
    } else {
        tracing_setup::init_console_tracing()
    };
    tracing_init.context("Failed to initialize tracing")?;

    let mut settings = load_settings(args.settings.as_deref())
        .await
        .context("Failed to load settings")?;
    args.apply(&mut settings);
    SettingsValidator::validate(&settings).context("Invalid settings")?;

    let addr: SocketAddr = settings
        .listen_addr
        .parse()
        .context("Failed to parse listen address")?;

    let service = Arc::new(MockService::from_settings(
        Arc::new(FileDocumentLoader::new()),
        &settings,
    ));
    let handler =
        Arc::new(MockHttpHandler::new(service).with_max_body_bytes(settings.max_body_bytes));

    // Create graceful shutdown manager
    let graceful_shutdown = Arc::new(GracefulShutdown::new());

    // Start signal handler for graceful shutdown
    let signal_handler_shutdown = graceful_shutdown.clone();
    tokio::spawn(async move {
        signal_handler_shutdown.run_signal_handler().await;
    });

    let server = MockHttpServer::bind(addr, handler, graceful_shutdown.clone()).await?;

    tracing::info!(
        "Serving routes from {} (CORS: {}, request logs: {}, payload mismatch: {:?})",
        settings.route_file,
        settings.cors_enabled,
        settings.logs_enabled,
        settings.payload_mismatch
    );
    println!(
        "Stubway listening on http://{} (routes: {})",
        server.local_addr()?,
        settings.route_file
    );

    server.run().await.context("Server error")?;

    tracing::info!("Graceful shutdown completed");
    Ok(())
}

/// Validate a route file and exit
async fn validate_routes_command(routes_path: &str) -> Result<()> {
    println!("🔍 Validating route file: {routes_path}");

    let loader = FileDocumentLoader::new();
    match RouteFileValidator::validate(&loader, routes_path).await {
        Ok(summary) => {
            println!("✅ Route file validation: OK");
            println!();
            println!("📋 Route Summary:");
            println!("   • Routes: {}", summary.routes);
            println!("   • Rule files: {}", summary.rules);
            println!("   • Inline definitions: {}", summary.inline);
            println!();
            println!("🎉 Route file is valid and ready to use!");
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Route file validation failed:");
            eprintln!("{e}");
            println!();
            println!("💡 Common fixes:");
            println!("   • Keys look like \"GET:/api/v2/user/:id\"");
            println!("   • Rule file paths are relative to the working directory");
            println!("   • Every definition needs a 'request' object and a 'response.payload' object");
            std::process::exit(1);
        }
    }
}

/// Initialize a new route file
async fn init_routes_command(routes_path: &str) -> Result<()> {
    let path = Path::new(routes_path);
    if path.exists() {
        eprintln!("❌ Error: Route file '{routes_path}' already exists");
        std::process::exit(1);
    }

    let sample_routes = r#"{
  "GET:/api/v2/user/:id": {
    "data": {
      "request": {},
      "response": {
        "statusCode": 200,
        "headers": { "content-type": "application/json" },
        "payload": { "id": ":id", "name": "cerlin" }
      }
    }
  },
  "POST:/api/v2/login": {
    "data": {
      "request": {
        "headers": { "content-type": "application/json" },
        "payload": { "username": "cerlin", "password": "cerlin" }
      },
      "response": {
        "statusCode": 200,
        "payload": { "success": true, "message": "Successfully logged in" }
      }
    }
  }
}
"#;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    tokio::fs::write(path, sample_routes)
        .await
        .context("Failed to write route file")?;
    println!("✅ Created sample route file at: {routes_path}");
    println!("   Run 'stubway serve --routes {routes_path}' to start the server");
    Ok(())
}
