use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use s8x30x::fastio::Board;
use s8x30x::{Catalog, CpuVariant, Decoded, DisasmConfig, Disassembler, SymbolTable, WideMemory};

mod model;
use model::{load_channels, load_image, load_labels, Image};

#[derive(Parser, Debug)]
#[command(author, version, about = "8X300/8X305 disassembler", long_about = None)]
struct Cli {
    /// CPU variant (affects register checks only)
    #[arg(long, default_value_t = CpuVariant::S8x300, global = true)]
    cpu: CpuVariant,
    /// Import jump labels from JSON (Vec<{ addr, name }>)
    #[arg(long, value_name = "FILE", global = true)]
    labels_in: Option<PathBuf>,
    /// Output format: text or json
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,
    /// Print mnemonics only
    #[arg(long, global = true)]
    no_operands: bool,
    /// Write output to file instead of stdout
    #[arg(long, value_name = "FILE", global = true)]
    out: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the opcode table
    Table,
    /// Disassemble a flat image (raw binary or Intel hex), two bytes per instruction
    Range {
        /// Input image path
        #[arg(value_name = "FILE")]
        input: PathBuf,
        /// Load address (default: hex origin, or 0 for raw)
        #[arg(long)]
        base: Option<String>,
        /// Start address (hex or dec)
        #[arg(long)]
        start: Option<String>,
        /// End address (hex or dec, exclusive)
        #[arg(long)]
        end: Option<String>,
        /// Show instruction bytes
        #[arg(long)]
        show_bytes: bool,
    },
    /// Disassemble a word-wide program spread over several ROMs
    Channels {
        /// Images in order: MSB, LSB, optional fast I/O select
        #[arg(value_name = "FILE", num_args = 2..)]
        inputs: Vec<PathBuf>,
        /// Rename IV operands using this board's fast I/O selects
        #[arg(long)]
        board: Option<Board>,
        /// Show word bytes
        #[arg(long)]
        show_bytes: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize)]
struct LineOut {
    addr: u32,
    bytes: Vec<u8>,
    label: Option<String>,
    text: String,
    decoded: Decoded,
}

fn parse_u32(s: &str) -> Result<u32> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Ok(u32::from_str_radix(hex, 16)?)
    } else {
        Ok(s.parse::<u32>()?)
    }
}

fn check_registers(dis: &Disassembler<'_>, addr: u32, d: &Decoded) {
    for (kind, reg) in dis.register_misuse(d) {
        warn!("{addr:#06x}: {reg} is not valid as {kind:?} on {}", dis.config().cpu);
    }
}

fn range_lines(dis: &Disassembler<'_>, img: &Image, start: u32, end: u32, symbols: &SymbolTable) -> Result<Vec<LineOut>> {
    anyhow::ensure!(end >= start, "end must be >= start");
    anyhow::ensure!(start >= img.base, "start {start:#x} is below image base {:#x}", img.base);
    let width = dis.config().mnemonic_width;
    let mut lines = Vec::new();
    for item in dis.listing(&img.bytes, start - img.base, end - img.base, symbols) {
        let (off, d) = item?;
        let addr = img.base + off;
        check_registers(dis, addr, &d);
        let bytes = img.bytes[off as usize..off as usize + d.length].to_vec();
        lines.push(LineOut { addr, bytes, label: symbols.get(&addr).cloned(), text: d.text(width), decoded: d });
    }
    Ok(lines)
}

fn channel_lines(
    dis: &Disassembler<'_>,
    mem: &WideMemory,
    board: Option<Board>,
    symbols: &SymbolTable,
) -> Result<Vec<LineOut>> {
    let width = dis.config().mnemonic_width;
    let mut lines = Vec::with_capacity(mem.len());
    for (addr, word) in mem.words().enumerate() {
        let addr = addr as u32;
        let (inst, ext) = word.split_at(word.len().min(2));
        let d = dis.decode(inst, symbols)?;
        check_registers(dis, addr, &d);
        let operands = match board {
            Some(b) if !d.data && dis.config().operands => b.rewrite(&d, ext),
            _ => d.operand_text(),
        };
        let text = format!("{:<width$}{operands}", d.mnemonic);
        lines.push(LineOut { addr, bytes: word, label: symbols.get(&addr).cloned(), text, decoded: d });
    }
    Ok(lines)
}

fn render_text(lines: &[LineOut], show_bytes: bool) -> String {
    let mut buf = String::new();
    for l in lines {
        if let Some(lbl) = &l.label {
            let _ = writeln!(buf, "{lbl}:");
        }
        let _ = write!(buf, "{:04x}: ", l.addr);
        if show_bytes {
            for b in &l.bytes {
                let _ = write!(buf, "{b:02x} ");
            }
            buf.push(' ');
        }
        let _ = writeln!(buf, "{}", l.text.trim_end());
    }
    buf
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let catalog = Catalog::s8x30x();
    let config = DisasmConfig { cpu: cli.cpu, operands: !cli.no_operands, ..Default::default() };
    let dis = Disassembler::new(&catalog, config);
    let symbols = match &cli.labels_in {
        Some(path) => load_labels(path)?,
        None => SymbolTable::new(),
    };

    let (lines, show_bytes) = match cli.cmd {
        Command::Table => {
            let mut buf = String::new();
            for line in catalog.table_lines() {
                let _ = writeln!(buf, "{line}");
            }
            return emit(cli.out, buf);
        }
        Command::Range { input, base, start, end, show_bytes } => {
            let base = base.as_deref().map(parse_u32).transpose()?;
            let img = load_image(&input, base)?;
            let start = start.as_deref().map(parse_u32).transpose()?.unwrap_or(img.base);
            let end = end.as_deref().map(parse_u32).transpose()?.unwrap_or(img.end());
            (range_lines(&dis, &img, start, end, &symbols)?, show_bytes)
        }
        Command::Channels { inputs, board, show_bytes } => {
            let mem = load_channels(&inputs)?;
            (channel_lines(&dis, &mem, board, &symbols)?, show_bytes)
        }
    };

    let out = match cli.format {
        OutputFormat::Text => render_text(&lines, show_bytes),
        OutputFormat::Json => serde_json::to_string_pretty(&lines)?,
    };
    emit(cli.out, out)
}

fn emit(path: Option<PathBuf>, text: String) -> Result<()> {
    if let Some(path) = path {
        std::fs::write(path, text)?;
    } else {
        print!("{text}");
        if !text.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}
