mod display;
mod mixer;
mod resources;
mod saves;

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::util::SubscriberInitExt;
use vge_bytecode::{decode, ByteCursor, DecodeError};
use vge_core::audio_queue::AudioQueue;
use vge_core::{Engine, EngineConfig};

use crate::display::{write_png, PngPresenter};
use crate::mixer::Mixer;
use crate::resources::DirResources;
use crate::saves::FileStore;

#[derive(Parser)]
#[command(name = "vge")]
#[command(version, about = "VGE vector game engine", long_about = None)]
struct Cli {
    /// Most verbose level to log (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", global = true)]
    log_level: Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a game from an unpacked resource directory
    Run {
        /// Resource directory
        dir: PathBuf,

        /// Number of frames to run
        #[arg(long, default_value_t = 600)]
        frames: u64,

        /// Part to boot instead of the first one
        #[arg(long)]
        part: Option<u16>,

        /// Don't sleep between display updates
        #[arg(long)]
        fast: bool,

        /// Write every Nth presented frame as a PNG (0 = never)
        #[arg(long, default_value_t = 0)]
        dump_every: u64,

        /// Directory for frame dumps and the final frame
        #[arg(short, long, default_value = "frames")]
        out: PathBuf,

        /// Save a snapshot here when the run ends
        #[arg(long)]
        save: Option<PathBuf>,

        /// Resume from a snapshot instead of booting
        #[arg(long)]
        load: Option<PathBuf>,
    },

    /// Disassemble a code segment
    Disasm {
        /// Code segment file
        file: PathBuf,

        /// Offset to start at
        #[arg(long, default_value_t = 0)]
        start: u16,
    },
}

fn setup_logging(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .compact()
        .finish()
        .init();
}

struct RunOptions {
    dir: PathBuf,
    frames: u64,
    part: Option<u16>,
    fast: bool,
    dump_every: u64,
    out: PathBuf,
    save: Option<PathBuf>,
    load: Option<PathBuf>,
}

fn run(options: RunOptions) -> anyhow::Result<()> {
    let mut config = EngineConfig { fast_mode: options.fast, ..Default::default() };
    if let Some(part) = options.part {
        config.boot_part = part;
    }

    let resources = DirResources::open(&options.dir)?;
    let presenter = PngPresenter::new(&options.out, options.dump_every)?;
    let (queue, commands) = AudioQueue::new(256);
    let mut mixer = Mixer::new(commands);

    let mut engine = Engine::init(config, resources, presenter, queue);
    match &options.load {
        Some(path) => engine
            .load_from(&mut FileStore::new(path))
            .with_context(|| format!("loading snapshot {}", path.display()))?,
        None => engine.boot().context("booting")?,
    }

    for frame in 0..options.frames {
        engine.run_frame().with_context(|| format!("frame {frame}"))?;
        mixer.drain();
    }
    info!(
        frames = options.frames,
        presented = engine.presenter.presented(),
        sounds = mixer.sounds_played,
        "run finished"
    );

    match &engine.presenter.last_frame {
        Some((page, palette)) => {
            fs::create_dir_all(&options.out)?;
            write_png(&options.out.join("last.png"), page, palette)?;
        }
        None => warn!("nothing was presented"),
    }

    if let Some(path) = &options.save {
        engine
            .save_to(&mut FileStore::new(path))
            .with_context(|| format!("saving snapshot {}", path.display()))?;
    }
    Ok(())
}

fn disasm(file: PathBuf, start: u16) -> anyhow::Result<()> {
    let code = fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
    let mut cursor = ByteCursor::new(&code, start);

    while !cursor.is_at_end() {
        let at = cursor.pos();
        match decode(&mut cursor) {
            Ok(insn) => println!("{at:04x}: {insn}"),
            Err(DecodeError::EndOfSegment { .. }) => {
                println!("{at:04x}: ; truncated instruction");
                break;
            }
            Err(e) => {
                println!("{at:04x}: db {:#04x} ; {e}", code[at as usize]);
                if at == u16::MAX {
                    break;
                }
                cursor.seek(at + 1);
            }
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.log_level);

    match cli.command {
        Commands::Run { dir, frames, part, fast, dump_every, out, save, load } => {
            run(RunOptions { dir, frames, part, fast, dump_every, out, save, load })
        }
        Commands::Disasm { file, start } => disasm(file, start),
    }
}
