use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use repcoach_cli::backends::{self, SpeechBackend};
use repcoach_cli::{CliContext, Repl, commands, logging};
use repcoach_core::{CoachConfig, CoachConfigExt};

/// Startup options
#[derive(Parser)]
#[command(version, about = "Interactive workout coach")]
struct Args {
    /// Exercise library to load at startup (defaults to the configured one)
    #[arg(short, long)]
    library: Option<PathBuf>,

    /// Where announcements are spoken
    #[arg(short, long, value_enum, default_value_t = SpeechBackend::Console)]
    speech: SpeechBackend,

    /// Play background tracks as lock-screen controlled tracks
    #[arg(long)]
    lock_screen: bool,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let args = Args::parse();
    let _log_guard = logging::init();

    let mut config = CoachConfig::load();
    let lock_screen = args.lock_screen || config.audio.lock_screen_controls;
    config.audio.lock_screen_controls = lock_screen;
    let library_path = args
        .library
        .or_else(|| (!config.library_path.is_empty()).then(|| PathBuf::from(&config.library_path)));

    let ctx = CliContext::new(config, backends::platform(args.speech, lock_screen));
    if let Some(path) = library_path
        && let Err(err) = commands::load_library(&path, &ctx).await
    {
        eprintln!("{err}");
    }

    let mut repl = Repl::new();
    loop {
        let Some(line) = repl.readline().await? else {
            commands::exit(&ctx).await;
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &ctx).await {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                writeln!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(version, about = "repcoach")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load an exercise library
    Load {
        #[arg(short, long)]
        path: PathBuf,
    },
    /// List exercises and groups
    List,
    /// Start an exercise (-e) or a group workout (-g)
    Start {
        #[arg(short, long, conflicts_with = "group", required_unless_present = "group")]
        exercise: Option<u32>,
        #[arg(short, long)]
        group: Option<u32>,
    },
    Pause,
    Resume,
    Reset,
    Status,
    PauseOptions,
    Config,
    /// Save the library (optionally to a new path) and the config
    Save {
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
    Exit,
}

async fn respond(line: &str, ctx: &CliContext) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "repcoach".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match cli.command {
        Some(Commands::Load { path }) => commands::load_library(&path, ctx).await?,
        Some(Commands::List) => commands::list(ctx).await?,
        Some(Commands::Start { exercise, group }) => match (exercise, group) {
            (Some(id), _) => commands::start_exercise(id, ctx).await?,
            (None, Some(id)) => commands::start_group(id, ctx).await?,
            (None, None) => return Err("error: pass -e <id> or -g <id>".to_string()),
        },
        Some(Commands::Pause) => commands::pause(ctx).await?,
        Some(Commands::Resume) => commands::resume(ctx).await?,
        Some(Commands::Reset) => commands::reset(ctx).await?,
        Some(Commands::Status) => commands::status(ctx).await?,
        Some(Commands::PauseOptions) => commands::pause_options()?,
        Some(Commands::Config) => commands::show_config(ctx).await?,
        Some(Commands::Save { path }) => commands::save(path, ctx).await?,
        Some(Commands::Exit) => {
            commands::exit(ctx).await;
            return Ok(true);
        }
        None => {}
    }
    Ok(false)
}
