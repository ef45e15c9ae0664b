use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use select_tree::manifest::DEMO_MANIFEST;
use select_tree::{ChainManifest, Control, ControlId, ControlSet, OptionEntry, OptionValue};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize)]
struct LinkSnapshot {
    id: ControlId,
    value: OptionValue,
    options: Vec<OptionEntry>,
}

fn parse_selection(input: &str) -> Result<(ControlId, OptionValue), String> {
    let (id, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected ID=VALUE, got `{input}`"))?;
    if id.is_empty() {
        return Err(format!("missing control id in `{input}`"));
    }
    Ok((ControlId::new(id), OptionValue::new(value)))
}

fn chain_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("initial")
                .long("initial")
                .action(ArgAction::Append)
                .help("Initial value, root first (repeatable)"),
        )
        .arg(
            Arg::new("select")
                .long("select")
                .action(ArgAction::Append)
                .value_parser(parse_selection)
                .help("Select VALUE on control ID after seeding (repeatable, ID=VALUE)"),
        )
        .arg(
            Arg::new("placeholder")
                .long("placeholder")
                .help("Label of the placeholder option"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .default_value("5")
                .value_parser(value_parser!(u64))
                .help("Seconds to wait for populations to settle"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Output as JSON"),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Command::new("select-tree")
        .version(select_tree::VERSION)
        .about("Drive cascading select chains from a manifest")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(chain_args(
            Command::new("demo").about("Run the bundled authors/books/chapters chain"),
        ))
        .subcommand(chain_args(
            Command::new("run").about("Run a chain described by a manifest").arg(
                Arg::new("manifest")
                    .long("manifest")
                    .short('m')
                    .required(true)
                    .value_parser(value_parser!(PathBuf))
                    .help("Manifest file (.toml, .json, .yaml)"),
            ),
        ));

    let matches = cli.get_matches();

    match matches.subcommand() {
        Some(("demo", args)) => {
            let manifest = ChainManifest::from_toml_str(DEMO_MANIFEST)
                .context("bundled demo manifest is invalid")?;
            run_chain(&manifest, args).await
        }
        Some(("run", args)) => {
            let path = args
                .get_one::<PathBuf>("manifest")
                .context("--manifest is required")?;
            let manifest = ChainManifest::from_path(path)
                .with_context(|| format!("failed to load manifest {}", path.display()))?;
            run_chain(&manifest, args).await
        }
        _ => Ok(()),
    }
}

async fn run_chain(manifest: &ChainManifest, args: &ArgMatches) -> Result<()> {
    let mut options = manifest.options().clone();
    if let Some(values) = args.get_many::<String>("initial") {
        options.initial_values = values.map(OptionValue::from).collect();
    }
    if let Some(label) = args.get_one::<String>("placeholder") {
        options.placeholder_label.clone_from(label);
    }
    let timeout = Duration::from_secs(args.get_one::<u64>("timeout").copied().unwrap_or(5));

    let (tree, controls) = manifest.instantiate();
    let handle = tree
        .attach(manifest.root_id(), options)
        .context("failed to attach chain")?;

    let report = tokio::time::timeout(timeout, handle.wait_seeded())
        .await
        .context("seeding did not finish in time")?;
    if let Some(err) = &report.input_error {
        tracing::warn!("{}", err);
    }

    if let Some(selections) = args.get_many::<(ControlId, OptionValue)>("select") {
        for (id, value) in selections {
            let control = controls
                .get(id)
                .with_context(|| format!("unknown control `{id}`"))?;
            control.select(value.clone());
            tokio::time::timeout(timeout, handle.settled())
                .await
                .with_context(|| format!("populations after selecting `{id}` did not settle"))?;
        }
    }

    let ids: Vec<ControlId> = handle.chain().ids().into_iter().cloned().collect();
    handle.detach();

    let snapshot = snapshot(&controls, &ids);
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_snapshot(&snapshot);
    }
    Ok(())
}

fn snapshot(controls: &ControlSet, ids: &[ControlId]) -> Vec<LinkSnapshot> {
    ids.iter()
        .filter_map(|id| controls.get(id))
        .map(|control| LinkSnapshot {
            id: control.id().clone(),
            value: control.value(),
            options: control.options(),
        })
        .collect()
}

fn print_snapshot(links: &[LinkSnapshot]) {
    for link in links {
        let value = if link.value.is_none() {
            "(none)"
        } else {
            link.value.as_str()
        };
        println!("{} = {}", link.id, value);
        for option in &link.options {
            let marker = if option.value == link.value { '*' } else { ' ' };
            println!("  {} {:<28} {}", marker, option.label, option.value);
        }
    }
}
