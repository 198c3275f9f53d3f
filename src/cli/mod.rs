mod def;
include!(concat!(env!("OUT_DIR"), "/rustc_version.rs"));
use clap::Parser;
use std::io::{Read, Write};
use yedit::yaml::{mutation, query};
use yedit::{Document, Error, ValidationRule, Value};

pub mod log;
mod output;

use output::{print_items, print_kv_items, render, render_value, Separator};

/// Whether the document has to be written out after the action.
enum Outcome {
    Unchanged,
    Modified,
}

fn read_document(file: Option<&str>) -> Result<Document, Error> {
    match file {
        Some(path) => Document::load_file(path),
        None => {
            let mut bytes = Vec::new();
            std::io::stdin().read_to_end(&mut bytes)?;
            Document::load_bytes(&bytes)
        }
    }
}

fn write_document(doc: &Document, in_place: Option<&str>) -> Result<(), Error> {
    match in_place {
        Some(path) => {
            ::log::debug!("writing '{}'", path);
            doc.save(path)
        }
        None => {
            let mut stdout = std::io::stdout();
            stdout.write_all(&doc.to_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}

fn load_overlay(path: &str) -> Result<Document, Error> {
    Document::load_file(path).map_err(|e| match e {
        Error::Io(_) => e,
        other => Error::Parse {
            line: 0,
            message: format!("in '{}': {}", path, other),
        },
    })
}

fn execute(action: &def::Actions, doc: &mut Document, as_yaml: bool) -> Result<Outcome, Error> {
    let parse = |text: &str| mutation::parse_value(text, as_yaml);
    let indent = doc.indent();
    match action {
        def::Actions::GetValue { path, default } => {
            match doc.get_node(path.as_deref().unwrap_or("")) {
                Ok(node) => print!("{}", render(node, indent)),
                Err(e) if e.is_path_error() => match default {
                    Some(default) => print!("{}", default),
                    None => return Err(e),
                },
                Err(e) => return Err(e),
            }
        }
        def::Actions::GetType { path } => {
            let node = doc.get_node(path.as_deref().unwrap_or(""))?;
            println!("{}", query::type_name(node));
        }
        def::Actions::GetLength { path } => {
            let path = yedit::Path::parse(path.as_deref().unwrap_or(""))?;
            println!("{}", query::get_length(doc.root(), &path)?);
        }
        def::Actions::Keys { path, nul } => {
            let path = yedit::Path::parse(path.as_deref().unwrap_or(""))?;
            let keys = query::keys(doc.root(), &path)?;
            print_items(keys.into_iter(), Separator::new(*nul));
        }
        def::Actions::Values { path, nul } => {
            let path = yedit::Path::parse(path.as_deref().unwrap_or(""))?;
            let values = query::values(doc.root(), &path)?;
            print_items(
                values.into_iter().map(|n| render(n, indent)),
                Separator::new(*nul),
            );
        }
        def::Actions::KeyValues { path, nul } => {
            let path = yedit::Path::parse(path.as_deref().unwrap_or(""))?;
            let pairs = query::key_values(doc.root(), &path)?;
            print_kv_items(
                pairs.into_iter().map(|(k, n)| (k, render(n, indent))),
                Separator::new(*nul),
            );
        }
        def::Actions::SetValue { key, value } => {
            doc.set(key, parse(value)?)?;
            return Ok(Outcome::Modified);
        }
        def::Actions::Del { key } => {
            doc.delete(key)?;
            return Ok(Outcome::Modified);
        }
        def::Actions::Append { path, value } => {
            doc.append_to_array(path, parse(value)?)?;
            return Ok(Outcome::Modified);
        }
        def::Actions::Insert { path, index, value } => {
            doc.insert_into_array(path, *index, parse(value)?)?;
            return Ok(Outcome::Modified);
        }
        def::Actions::Remove { path, index } => {
            doc.remove_from_array(path, *index)?;
            return Ok(Outcome::Modified);
        }
        def::Actions::Update { path, index, value } => {
            doc.update_array_element(path, *index, parse(value)?)?;
            return Ok(Outcome::Modified);
        }
        def::Actions::GetAll { pattern } => {
            let matches = doc.get_all(pattern)?;
            if !matches.is_empty() {
                print!("{}", render_value(&Value::Map(matches), indent));
            }
        }
        def::Actions::GetKeys { pattern } => {
            print_items(doc.get_keys(pattern)?.into_iter(), Separator::Newline);
        }
        def::Actions::SetAll { pattern, value } => {
            let count = doc.set_all(pattern, parse(value)?)?;
            ::log::info!("set {} value(s)", count);
            return Ok(Outcome::Modified);
        }
        def::Actions::Apply { at, overlays } => {
            for overlay in overlays {
                ::log::debug!("applying '{}'", overlay);
                let donor = load_overlay(overlay)?;
                match at {
                    Some(at) => doc.merge_at(at, Some(&donor))?,
                    None => doc.merge(Some(&donor))?,
                }
            }
            return Ok(Outcome::Modified);
        }
        def::Actions::Validate { schema } => {
            let rule = ValidationRule::from_document(&load_overlay(schema)?)?;
            doc.validate(&rule)?;
            ::log::info!("document is valid");
        }
    }
    std::io::stdout().flush()?;
    Ok(Outcome::Unchanged)
}

pub fn run() -> Result<bool, String> {
    let cli = def::Args::parse();

    // Split log strings upon comma, trim them and flatten all in
    // `logs`, remove empty values
    let logs = cli.log.clone().unwrap_or_default();
    let logs = logs
        .iter()
        .flat_map(|log| log.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<&str>>();

    // Upon failure, display error message and usage string
    log::setup(cli.verbose, logs, cli.log_time)?;

    if cli.color && cli.no_color {
        return Err("Cannot use both --color and --no-color".to_string());
    }
    if cli.color {
        colored::control::set_override(true);
    }
    if cli.no_color {
        colored::control::set_override(false);
    }

    if cli.version {
        println!("version: {}", env!("CARGO_PKG_VERSION"));
        println!(
            "libfyaml used: True\nlibfyaml available: {}",
            yedit::yaml::get_version()?
        );
        println!("Rust: {}", RUSTC_VERSION);
        return Ok(true);
    }

    let action = match &cli.action {
        Some(action) => action,
        None => return Err("Missing action".to_string()),
    };
    if cli.in_place && cli.file.is_none() {
        return Err("--in-place requires --file".to_string());
    }

    let mut doc = read_document(cli.file.as_deref()).map_err(|e| e.to_string())?;
    ::log::trace!("indentation {}", doc.indent());

    match execute(action, &mut doc, cli.yaml) {
        Ok(Outcome::Unchanged) => Ok(true),
        Ok(Outcome::Modified) => {
            let target = if cli.in_place {
                cli.file.as_deref()
            } else {
                None
            };
            write_document(&doc, target).map_err(|e| e.to_string())?;
            Ok(true)
        }
        Err(e) if cli.quiet && e.is_path_error() => Ok(false),
        Err(e) => Err(e.to_string()),
    }
}
