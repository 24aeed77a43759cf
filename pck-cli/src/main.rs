mod list;
mod pack;
mod unpack;

use clap::{Args, Parser, Subcommand, ValueEnum};
use pck_core::keys::Keys;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Pack a directory into a PCK archive
    Pack(PackCommand),
    /// Extract a PCK archive
    Unpack(UnpackCommand),
    /// List archive entries
    List(ListCommand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Classic archives (GZIP payloads)
    Classic,
    /// PW revision (DEFLATE payloads)
    Pw,
}

#[derive(Debug, Args)]
struct FormatArgs {
    /// Archive format variant
    #[arg(long, value_enum, default_value_t = Format::Classic)]
    format: Format,
    /// Override the first obfuscation key, e.g. 0xA8937462
    #[arg(long, value_parser = parse_key)]
    key1: Option<u32>,
    /// Override the second obfuscation key
    #[arg(long, value_parser = parse_key)]
    key2: Option<u32>,
}

impl FormatArgs {
    fn keys(&self) -> Keys {
        let defaults = match self.format {
            Format::Classic => Keys::CLASSIC,
            Format::Pw => Keys::PW,
        };
        Keys {
            key1: self.key1.unwrap_or(defaults.key1),
            key2: self.key2.unwrap_or(defaults.key2),
        }
    }
}

#[derive(Debug, Args)]
struct PackCommand {
    /// Input directory
    input: String,
    /// Output archive path, `<input>.pck` by default
    #[arg(short, long)]
    output: Option<String>,
    /// Compression effort, 0-9
    #[arg(long, default_value_t = 6, value_parser = clap::value_parser!(u32).range(0..=9))]
    level: u32,
    /// Overwrite the output file if it exists
    #[arg(long)]
    overwrite: bool,
    #[command(flatten)]
    format: FormatArgs,
}

#[derive(Debug, Args)]
struct UnpackCommand {
    /// Input archive path
    input: String,
    /// Output directory, derived from the input name by default
    #[arg(short, long)]
    output: Option<String>,
    #[command(flatten)]
    format: FormatArgs,
}

#[derive(Debug, Args)]
struct ListCommand {
    /// Input archive path
    input: String,
    /// Emit JSON instead of a table
    #[arg(long)]
    json: bool,
    #[command(flatten)]
    format: FormatArgs,
}

fn parse_key(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| e.to_string())
    } else {
        s.parse::<u32>().map_err(|e| e.to_string())
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Command::Pack(cmd) => pack::pack(cmd),
        Command::Unpack(cmd) => unpack::unpack(cmd),
        Command::List(cmd) => list::list(cmd),
    }
}
