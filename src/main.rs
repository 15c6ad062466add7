use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tile_viewer::{Config, Controller, Inbound, JsonLinesSurface, TileStore, describe_tile, tag_file};

#[derive(Parser)]
#[command(name = "tile-viewer")]
#[command(about = "Browse SVG tiles and edit their keywords", long_about = None)]
struct Cli {
    /// Do not follow symbolic links when scanning folders
    #[arg(long, global = true)]
    no_follow_links: bool,

    /// Image shown when all tiles are closed
    #[arg(long, global = true)]
    placeholder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the metadata of each tile as one JSON line
    Inspect {
        /// Tile files or folders to scan
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Replace the keywords of a tile
    Tag {
        file: PathBuf,
        /// Comma separated keywords
        keywords: String,
    },
    /// Exchange JSON line messages with a UI over stdin/stdout
    Session {
        /// Tiles or folders to open at start
        paths: Vec<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let cli = Cli::parse();
    let config = Config {
        follow_links: !cli.no_follow_links,
        placeholder: cli.placeholder,
        ..Config::default()
    };

    match cli.command {
        Command::Inspect { paths } => {
            let (dirs, files): (Vec<_>, Vec<_>) = paths.into_iter().partition(|p| p.is_dir());
            let mut store = TileStore::new();
            store.load_from_paths(files);
            store.load_from_directories(dirs, &config);

            let mut stdout = io::stdout().lock();
            for tile in store.iter() {
                writeln!(stdout, "{}", describe_tile(tile))?;
            }
        }
        Command::Tag { file, keywords } => {
            tag_file(&file, &keywords)?;
            eprintln!("{}: {}", file.display(), keywords);
        }
        Command::Session { paths } => {
            let (dirs, files): (Vec<_>, Vec<_>) = paths.into_iter().partition(|p| p.is_dir());
            let mut controller = Controller::new(JsonLinesSurface::new(io::stdout()), config);
            if !files.is_empty() {
                controller.handle(Inbound::OpenFiles { paths: files });
            }
            if !dirs.is_empty() {
                controller.handle(Inbound::OpenFolders { paths: dirs });
            }

            for line in io::stdin().lock().lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Inbound>(&line) {
                    Ok(message) => controller.handle(message),
                    Err(e) => log::warn!("Ignoring message {:?}: {}", line, e),
                }
            }
        }
    }

    Ok(())
}
