use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use wilayah::config::{SettingsLoadOutcome, load_settings};
use wilayah::{
    CachedSource, Callbacks, Cascade, Level, RegionClient, RegionQuery, RegionSource, Selection,
    Session, SessionStore, WilayahSettings,
};

/// Region cascade and listing tools for the property dashboard
#[derive(Parser)]
#[command(name = "wilayah")]
#[command(version)]
#[command(about = "Region cascade and listing tools for the property dashboard")]
struct Cli {
    /// Directory holding a project wilayah.toml (default: current directory)
    #[arg(long, global = true)]
    project_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the option list for one level
    Regions {
        /// province, district, city or village
        level: Level,

        /// Parent code (required below province)
        #[arg(long)]
        parent: Option<String>,
    },
    /// Mount a cascade with preselected codes and print every level once settled
    Pick {
        #[arg(long)]
        province: Option<String>,
        #[arg(long)]
        district: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        village: Option<String>,

        /// Give up waiting for fetches after this many seconds
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
    /// Store a session token
    Login {
        #[arg(long)]
        token: String,
        #[arg(long)]
        user_id: String,
    },
    /// Remove the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Print the merged configuration
    Config,
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();
}

fn session_store(settings: &WilayahSettings) -> Option<SessionStore> {
    settings
        .session_path
        .clone()
        .or_else(SessionStore::default_path)
        .map(SessionStore::load)
}

fn region_source(settings: &WilayahSettings) -> Result<CachedSource<RegionClient>, String> {
    let client = RegionClient::from_settings(settings).map_err(|e| e.to_string())?;
    Ok(CachedSource::new(
        client,
        Duration::from_secs(settings.cache_ttl_secs),
    ))
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let project_dir = cli
        .project_dir
        .clone()
        .or_else(|| std::env::current_dir().ok());
    let SettingsLoadOutcome { settings, events } = load_settings(project_dir.as_deref());
    for event in &events {
        event.log();
    }

    match run(cli.command, &settings, &events).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

async fn run(
    command: Commands,
    settings: &WilayahSettings,
    events: &[wilayah::config::SettingsEvent],
) -> Result<(), String> {
    match command {
        Commands::Regions { level, parent } => {
            let query = RegionQuery::for_level(level, parent.as_deref())?;
            let source = region_source(settings)?;
            let regions = source.fetch(&query).await.map_err(|e| e.to_string())?;
            for region in regions {
                println!("{}\t{}", region.code, region.name);
            }
            Ok(())
        }
        Commands::Pick {
            province,
            district,
            city,
            village,
            timeout_secs,
        } => {
            let selection = Selection::from_codes(
                province.as_deref(),
                district.as_deref(),
                city.as_deref(),
                village.as_deref(),
            );
            let source = Arc::new(region_source(settings)?);
            let mut cascade = Cascade::mount(source, selection, Callbacks::new());
            tokio::time::timeout(Duration::from_secs(timeout_secs), cascade.settle())
                .await
                .map_err(|_| format!("fetches did not settle within {}s", timeout_secs))?;

            for view in cascade.views() {
                let state = if view.disabled {
                    "disabled"
                } else if view.failed {
                    "failed"
                } else {
                    "ready"
                };
                let selected = match (&view.selected, &view.selected_name) {
                    (Some(code), Some(name)) => format!("{} ({})", code, name),
                    (Some(code), None) => format!("{} (unresolved)", code),
                    _ => "-".to_string(),
                };
                println!(
                    "{:<9} {:<9} {:>3} options  selected: {}",
                    view.level,
                    state,
                    view.options.len(),
                    selected
                );
            }
            match cascade.selection().deepest() {
                Some(level) => println!("selected down to {}", level),
                None => println!("nothing selected"),
            }
            Ok(())
        }
        Commands::Login { token, user_id } => {
            let store = session_store(settings).ok_or("could not determine session path")?;
            store
                .login(Session::new(token, user_id))
                .map_err(|e| e.to_string())?;
            if let Some(path) = store.path() {
                eprintln!("Session stored at {}", path.display());
            }
            Ok(())
        }
        Commands::Logout => {
            let store = session_store(settings).ok_or("could not determine session path")?;
            store.logout().map_err(|e| e.to_string())
        }
        Commands::Whoami => {
            let store = session_store(settings).ok_or("could not determine session path")?;
            match store.current() {
                Some(session) => println!("{}", session.user_id),
                None => println!("not signed in"),
            }
            Ok(())
        }
        Commands::Config => {
            let rendered = toml::to_string_pretty(settings).map_err(|e| e.to_string())?;
            print!("{}", rendered);
            for event in events {
                eprintln!("# {:?}: {}", event.kind, event.message);
            }
            Ok(())
        }
    }
}
