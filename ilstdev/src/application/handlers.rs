use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use ilst_core::atom::tree::walk;
use ilst_core::error::{IlstError, Result};
use ilst_core::verify::check_sizes;
use ilst_core::{Field, PatchOptions, Reconciliation, Tag, locate_region, read_tags, write_tags};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::presentation::cli::FieldArgs;

/// Install the stderr subscriber. `RUST_LOG` wins over `-v`.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| IlstError::Format(e.to_string()))
}

fn tag_from_args(args: FieldArgs) -> Tag {
    let mut tag = Tag::new();
    let pairs = [
        (Field::Title, args.title),
        (Field::Album, args.album),
        (Field::Artist, args.artist),
        (Field::Year, args.year),
        (Field::Comment, args.comment),
        (Field::Track, args.track),
        (Field::Genre, args.genre),
    ];
    for (field, value) in pairs {
        if let Some(v) = value {
            tag.set(field, v);
        }
    }
    tag
}

pub fn handle_show(file: PathBuf, json: bool) -> Result<()> {
    let tag = read_tags(&file)?;
    if json {
        println!("{}", to_json(&tag)?);
        return Ok(());
    }
    for (field, value) in tag.iter() {
        println!("{field:<8} {value}");
    }
    Ok(())
}

pub fn handle_set(
    file: PathBuf,
    fields: FieldArgs,
    verify: bool,
    buffer_size: usize,
    json: bool,
) -> Result<()> {
    let tag = tag_from_args(fields);
    if tag.is_empty() {
        eprintln!("set: no fields given, nothing to do");
        return Ok(());
    }
    let opts = PatchOptions {
        buffer_size,
        verify,
    };
    debug!(file = %file.display(), ?opts, "patching");
    let report = write_tags(&file, &tag, &opts)?;

    if json {
        println!("{}", to_json(&report)?);
        return Ok(());
    }
    let names = |fs: &[Field]| {
        fs.iter()
            .map(Field::to_string)
            .collect::<Vec<_>>()
            .join(",")
    };
    println!("replaced: {}", names(&report.replaced));
    println!("appended: {}", names(&report.appended));
    println!("delta:    {:+}", report.delta);
    match report.reconciliation {
        Reconciliation::Unneeded => println!("padding:  unchanged"),
        Reconciliation::Padding {
            offset,
            old_len,
            new_len,
        } => println!("padding:  free@{offset} {old_len} -> {new_len}"),
        Reconciliation::Split {
            offset,
            old_len,
            first,
            second,
        } => println!("padding:  free@{offset} {old_len} -> {first} + {second} (split)"),
    }
    Ok(())
}

pub fn handle_check(file: PathBuf) -> Result<()> {
    let mut r = BufReader::new(File::open(&file)?);
    let region = locate_region(&mut r)?;
    if !region.is_usable() {
        return Err(IlstError::UnsupportedRegion);
    }
    let chain = check_sizes(&mut r, region)?;
    for n in &chain {
        println!("{:<4} @{:<10} len={}", n.kind.to_string(), n.offset, n.len);
    }
    eprintln!("check: OK");
    Ok(())
}

pub fn handle_tree(file: PathBuf) -> Result<()> {
    let mut r = BufReader::new(File::open(&file)?);
    for (depth, n) in walk(&mut r)? {
        println!(
            "{:indent$}{} @{} len={}",
            "",
            n.kind,
            n.offset,
            n.len,
            indent = depth * 2
        );
    }
    Ok(())
}
