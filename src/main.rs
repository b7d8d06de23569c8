#[cfg(not(feature = "std"))]
fn main() {}

#[cfg(feature = "std")]
use std::sync::Arc;

#[cfg(feature = "std")]
use clap::Parser;
#[cfg(feature = "std")]
use rand::rngs::SmallRng;
#[cfg(feature = "std")]
use rand::SeedableRng;
#[cfg(feature = "std")]
use tokio::net::{TcpListener, TcpStream};

#[cfg(feature = "std")]
use seabattle::{
    init_logging, join_session, run_auto, serve, ClientPhase, Field, FieldState, FramedConnection,
    GameClient, JoinOutcome, Pos, Registry, FIELD_SIZE,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[cfg(feature = "std")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
#[cfg(feature = "std")]
enum Commands {
    /// Run the dedicated game server.
    Serve {
        #[arg(long, default_value = "0.0.0.0:4600")]
        bind: String,
    },
    /// Play an automated game against another client.
    Play {
        #[arg(long, default_value = "127.0.0.1:4600")]
        connect: String,
        #[arg(long, help = "Session key to join; omit to create a new session")]
        key: Option<u64>,
        #[arg(long, help = "Fix RNG seed for reproducible games (e.g., --seed 12345)")]
        seed: Option<u64>,
    },
}

#[cfg(feature = "std")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind } => {
            let listener = TcpListener::bind(&bind).await?;
            println!("Listening on {}.", bind);
            serve(listener, Arc::new(Registry::new())).await?;
        }
        Commands::Play { connect, key, seed } => {
            let mut rng = match seed {
                Some(s) => SmallRng::seed_from_u64(s),
                None => {
                    let mut seed_rng = rand::rng();
                    SmallRng::from_rng(&mut seed_rng)
                }
            };
            println!("Connecting to {}...", connect);
            let mut conn = FramedConnection::connect(&connect).await?;
            play(&mut conn, key, &mut rng).await?;
        }
    }
    Ok(())
}

#[cfg(feature = "std")]
async fn play(
    conn: &mut FramedConnection<TcpStream>,
    key: Option<u64>,
    rng: &mut SmallRng,
) -> anyhow::Result<()> {
    let mut field = Field::new(Pos::new(FIELD_SIZE, FIELD_SIZE), FieldState::Preparing);
    if !field.random_fleet(rng) {
        anyhow::bail!("could not deal a random fleet");
    }
    let mut client = GameClient::with_field(field);
    if !client.can_ready() {
        anyhow::bail!("fleet placement is invalid");
    }

    match join_session(conn, key).await? {
        JoinOutcome::Joined { session_key } => {
            client.joined();
            match key {
                None => println!(
                    "Session {} created. Share this key with your opponent and wait.",
                    session_key
                ),
                Some(_) => println!("Joined session {}. Game starting.", session_key),
            }
        }
        JoinOutcome::Refused => {
            println!("Server refused the join (unknown key or session already full).");
            return Ok(());
        }
    }

    run_auto(conn, &mut client, rng).await?;

    match client.phase() {
        ClientPhase::Win => println!("You won! All enemy ships destroyed."),
        ClientPhase::Lose => println!("You lost. All your ships are destroyed."),
        ClientPhase::Disconnected => println!("The other player left the game."),
        _ => {}
    }
    Ok(())
}
