use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use pck_core::filename;
use pck_core::pw::PwPckReader;
use pck_core::read::PckReader;

use crate::{Format, UnpackCommand};

pub fn unpack(cmd: &UnpackCommand) -> anyhow::Result<()> {
    let input_path = Path::new(&cmd.input);
    let file = File::open(input_path).context(format!("Input file `{}` not found.", cmd.input))?;
    let reader = BufReader::new(file);

    let output_path = output_path(&cmd.output, input_path);
    fs::create_dir_all(&output_path)?;

    let keys = cmd.format.keys();
    match cmd.format.format {
        Format::Classic => {
            let mut pck = PckReader::open_with_keys(reader, keys)?;
            let entries = pck.entries().to_vec();
            let bar = progress_bar(entries.len(), &output_path);
            for entry in &entries {
                let data = pck.read_file(entry)?;
                write_output(&output_path, &entry.path, &data)?;
                bar.inc(1);
            }
            bar.finish();
        }
        Format::Pw => {
            let mut pck = PwPckReader::open_with_keys(reader, keys)?;
            let entries = pck.entries().to_vec();
            let bar = progress_bar(entries.len(), &output_path);
            for entry in &entries {
                let data = pck.read_file(entry)?;
                write_output(&output_path, &entry.path, &data)?;
                bar.inc(1);
            }
            bar.finish();
        }
    }

    println!("Done.");
    Ok(())
}

fn output_path(output: &Option<String>, input: &Path) -> PathBuf {
    if let Some(output) = output {
        // specified output directory
        output.into()
    } else if let Some(parent) = input.parent() {
        // relative to input directory
        let dir_name = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or("output".to_string());
        parent.join(dir_name)
    } else {
        // current directory
        ".".into()
    }
}

fn write_output(root: &Path, archive_path: &str, data: &[u8]) -> anyhow::Result<()> {
    let full_path = root.join(filename::to_host_path(archive_path));
    if let Some(parent) = full_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&full_path, data).context(format!("Failed to write `{}`", full_path.display()))?;
    Ok(())
}

fn progress_bar(total: usize, output_path: &Path) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{pos}/{len} files written {wide_bar}")
            .unwrap(),
    );
    bar.enable_steady_tick(Duration::from_millis(100));
    bar.println(format!("Output directory: `{}`", output_path.display()));
    bar
}
