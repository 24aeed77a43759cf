use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::Context;
use pck_core::pw::PwPckWriter;
use pck_core::write::PckWriter;

use crate::{Format, PackCommand};

pub fn pack(cmd: &PackCommand) -> anyhow::Result<()> {
    let input = Path::new(&cmd.input);
    if !input.is_dir() {
        anyhow::bail!("Input directory does not exist: {}", input.display());
    }

    let output_path = cmd.output.as_ref().map(PathBuf::from).unwrap_or_else(|| {
        let name = input
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or("output".to_string());
        input.with_file_name(format!("{name}.pck"))
    });
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut output_option = OpenOptions::new();
    if cmd.overwrite {
        output_option.create(true).truncate(true);
    } else {
        output_option.create_new(true);
    }
    output_option.write(true);
    let output_file = output_option
        .open(&output_path)
        .context(format!("Failed to create `{}`", output_path.display()))?;

    let keys = cmd.format.keys();
    match cmd.format.format {
        Format::Classic => PckWriter::with_keys(output_file, keys).pack(input, cmd.level)?,
        Format::Pw => PwPckWriter::with_keys(output_file, keys).pack(input, cmd.level)?,
    }

    println!("Output file: {}", output_path.display());
    println!("Done!");

    Ok(())
}
