use anyhow::{Context, Result};
use clap::Parser;
use emu_core::logging::LogConfig;
use emu_core::types::Frame;
use emu_nes::NesSystem;
use std::fs::File;
use std::io::BufWriter;
use std::ops::ControlFlow;
use std::path::PathBuf;

/// Run an NROM cartridge without a display.
#[derive(Parser)]
struct Args {
    /// iNES image to load
    rom: PathBuf,

    /// Number of frames to run
    #[arg(long, default_value_t = 60)]
    frames: u32,

    /// Core log spec, e.g. "warn,cpu=debug,ppu=trace"
    #[arg(long)]
    log: Option<String>,

    /// Send core logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Write the last frame (palette indices) to this file as JSON
    #[arg(long)]
    dump: Option<PathBuf>,

    /// No per-frame output
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = LogConfig::global();
    if let Some(spec) = args.log.as_deref() {
        config
            .apply_spec(spec)
            .with_context(|| format!("bad --log spec {:?}", spec))?;
    }
    if let Some(path) = args.log_file.as_ref() {
        config
            .set_log_file(path.clone())
            .with_context(|| format!("opening log file {}", path.display()))?;
    }

    let mut nes = NesSystem::new();
    nes.load_rom_from_path(&args.rom)
        .with_context(|| format!("loading {}", args.rom.display()))?;
    if let Some(header) = nes.cartridge_header() {
        log::info!(
            "{}: {} x 16KB PRG, {} x 8KB CHR, {:?} mirroring",
            args.rom.display(),
            header.prg_banks,
            header.chr_banks,
            header.mirroring
        );
    }

    let mut last: Option<Frame> = None;
    let mut count = 0u32;
    if args.frames > 0 {
        nes.run(|frame| {
            count += 1;
            if !args.quiet {
                println!(
                    "frame {:>4}: {}x{}, backdrop {:02X}",
                    count,
                    frame.width,
                    frame.height,
                    frame.pixel(0, 0).unwrap_or(0)
                );
            }
            if count >= args.frames {
                last = Some(frame.clone());
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .with_context(|| format!("emulation stopped after {} frames", count))?;
    }
    log::info!("ran {} frames, {} CPU cycles", count, nes.cycles());

    if let Some(path) = args.dump.as_ref() {
        let frame = last.context("no frame to dump; --frames was 0")?;
        let out = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer(BufWriter::new(out), &frame)
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!("dumped frame to {}", path.display());
    }

    Ok(())
}
