use std::io::Write;
use std::path::PathBuf;

use ancestral_cli::{CliContext, commands, logging, readline};
use ancestral_core::ServerConfigExt;
use ancestral_types::ServerConfig;
use clap::{Parser, Subcommand};

/// Startup flags. Each one overrides the stored configuration.
#[derive(Parser)]
#[command(version, about = "Ancestral combat server console")]
struct Args {
    /// Character/enemy catalog TOML
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Narrative graph TOML
    #[arg(long)]
    story: Option<PathBuf>,
    /// Seed for deterministic dice
    #[arg(long)]
    seed: Option<u64>,
    /// Default vote duration in seconds
    #[arg(long)]
    vote_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    logging::init();
    let args = Args::parse();

    let mut config = ServerConfig::load();
    if let Some(path) = args.catalog {
        config.data.catalog_path = Some(path);
    }
    if let Some(path) = args.story {
        config.data.story_path = Some(path);
    }
    if let Some(secs) = args.vote_secs {
        config.default_vote_secs = secs;
    }

    let (ctx, events) = CliContext::new(config, args.seed)?;
    ctx.start_printer(events).await;

    loop {
        let line = readline()?;
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
                write!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    ctx.stop_printer().await;
    Ok(())
}

#[derive(Parser)]
#[command(version, about = "console")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Switch the local client that sends intents
    As { client: String },
    Whoami,
    Create {
        #[arg(short, long)]
        name: Option<String>,
    },
    Join {
        code: String,
        #[arg(short, long)]
        name: Option<String>,
    },
    Pick { character: String },
    Ready {
        #[arg(long)]
        off: bool,
    },
    Story,
    /// Open a vote; without --option the current node's options are used
    VoteStart {
        #[arg(long)]
        node: Option<String>,
        #[arg(short, long = "option")]
        options: Vec<String>,
        #[arg(short, long)]
        secs: Option<u64>,
    },
    Vote { option: String },
    Battle {
        #[arg(short, long)]
        boss: Option<String>,
    },
    Use { ability: String },
    Boss,
    Roll {
        #[arg(long)]
        villain: bool,
    },
    Leave,
    Room,
    Characters,
    Enemies,
    Config,
    SaveConfig,
    Exit,
}

async fn respond(line: &str, ctx: &CliContext) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "ancestral".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match cli.command {
        Some(Commands::As { client }) => commands::act_as(ctx, &client).await,
        Some(Commands::Whoami) => commands::whoami(ctx).await,
        Some(Commands::Create { name }) => commands::create_room(ctx, name).await,
        Some(Commands::Join { code, name }) => commands::join_room(ctx, &code, name).await,
        Some(Commands::Pick { character }) => commands::pick(ctx, &character).await,
        Some(Commands::Ready { off }) => commands::ready(ctx, !off).await,
        Some(Commands::Story) => commands::start_story(ctx).await,
        Some(Commands::VoteStart {
            node,
            options,
            secs,
        }) => commands::start_vote(ctx, node, options, secs).await,
        Some(Commands::Vote { option }) => commands::cast_vote(ctx, &option).await,
        Some(Commands::Battle { boss }) => commands::start_battle(ctx, boss).await,
        Some(Commands::Use { ability }) => commands::use_ability(ctx, &ability).await,
        Some(Commands::Boss) => commands::boss_turn(ctx).await,
        Some(Commands::Roll { villain }) => commands::roll(ctx, villain).await,
        Some(Commands::Leave) => commands::leave(ctx).await,
        Some(Commands::Room) => commands::show_room(ctx).await,
        Some(Commands::Characters) => commands::list_characters(ctx),
        Some(Commands::Enemies) => commands::list_enemies(ctx),
        Some(Commands::Config) => commands::show_config(ctx),
        Some(Commands::SaveConfig) => commands::save_config(ctx),
        Some(Commands::Exit) => {
            commands::exit();
            return Ok(true);
        }
        None => {}
    }
    Ok(false)
}
