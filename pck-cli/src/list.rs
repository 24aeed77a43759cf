use std::fs::File;
use std::io::BufReader;

use anyhow::Context;
use pck_core::pw::PwPckReader;
use pck_core::read::PckReader;

use crate::{Format, ListCommand};

pub fn list(cmd: &ListCommand) -> anyhow::Result<()> {
    let file = File::open(&cmd.input).context(format!("Input file `{}` not found.", cmd.input))?;
    let reader = BufReader::new(file);
    let keys = cmd.format.keys();

    match cmd.format.format {
        Format::Classic => {
            let pck = PckReader::open_with_keys(reader, keys)?;
            if cmd.json {
                println!("{}", serde_json::to_string_pretty(pck.entries())?);
            } else {
                print_header();
                for entry in pck.entries() {
                    print_row(&entry.path, entry.data_decompressed_size, entry.data_compressed_size);
                }
                println!("{} files", pck.file_count());
            }
        }
        Format::Pw => {
            let pck = PwPckReader::open_with_keys(reader, keys)?;
            if cmd.json {
                println!("{}", serde_json::to_string_pretty(pck.entries())?);
            } else {
                print_header();
                for entry in pck.entries() {
                    print_row(&entry.path, entry.data_decompressed_size, entry.data_compressed_size);
                }
                println!("{} files", pck.file_count());
            }
        }
    }

    Ok(())
}

fn print_header() {
    println!("{:>12} {:>12}  path", "size", "stored");
}

fn print_row(path: &str, decompressed: i32, compressed: i32) {
    println!("{decompressed:>12} {compressed:>12}  {path}");
}
