// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use logging::LogSink;
use netbox_toolbox_app::{
    AppState, InventoryApi, QueryKind, QueryOutcome, QueryRequest, render_text_table, run_query,
};
use netbox_toolbox_client::Client;
use runtime::ApiRuntime;
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let current_dir = env::current_dir().context("resolve working directory")?;
    config::load_dotenv(&current_dir)?;

    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `netbox-toolbox --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let headless = headless_request(&options)?;
    let sink = if options.check_only || headless.is_some() {
        LogSink::Stderr
    } else {
        LogSink::FileOnly
    };
    logging::init_logging(&config.log_config(), sink)?;

    let connection = config.connection()?;
    let client = Client::new(&connection.url, &connection.token, connection.timeout)
        .with_context(|| {
            format!(
                "invalid netbox connection settings; fix {} / {} or [netbox] in {}",
                config::URL_ENV,
                config::TOKEN_ENV,
                options.config_path.display()
            )
        })?;
    tracing::info!(url = client.base_url(), "netbox client ready");

    if options.check_only {
        let status = client.ping().with_context(|| {
            format!(
                "netbox at {} did not answer /api/status/",
                client.base_url()
            )
        })?;
        println!(
            "netbox {} reachable at {}",
            status.netbox_version,
            client.base_url()
        );
        return Ok(());
    }

    if let Some(request) = headless {
        let stdout = io::stdout();
        return run_headless(&client, &request, &mut stdout.lock());
    }

    let endpoint = client.base_url().to_owned();
    let mut state = AppState::default();
    let mut runtime = ApiRuntime::new(client, endpoint);
    netbox_toolbox_tui::run_app(&mut state, &mut runtime)
}

/// Runs one query and prints its table. A lookup that does not resolve is a
/// normal result; only infrastructure failures return an error.
fn run_headless<A: InventoryApi + ?Sized>(
    api: &A,
    request: &QueryRequest,
    out: &mut impl Write,
) -> Result<()> {
    match run_query(api, request) {
        QueryOutcome::Rendered(table) => {
            out.write_all(render_text_table(&table).as_bytes())
                .context("write results")?;
        }
        QueryOutcome::NotFound { message } => {
            writeln!(out, "{message}").context("write results")?;
        }
        QueryOutcome::Failed { message } => bail!("{message}"),
    }
    Ok(())
}

fn headless_request(options: &CliOptions) -> Result<Option<QueryRequest>> {
    let Some(kind) = options.query else {
        if options.device_id.is_some() || options.rack_name.is_some() {
            bail!("--device-id and --rack-name only apply together with --query");
        }
        return Ok(None);
    };

    if options.check_only {
        bail!("--check cannot be combined with --query");
    }

    let (raw, flag) = match kind {
        QueryKind::DeviceInterfaces => (options.device_id.as_deref(), "--device-id"),
        QueryKind::RackDevices => (options.rack_name.as_deref(), "--rack-name"),
        QueryKind::AllDevices | QueryKind::AllInterfaces => (None, ""),
    };
    if options.device_id.is_some() && flag != "--device-id" {
        bail!("--device-id does not apply to --query {:?}", kind.label());
    }
    if options.rack_name.is_some() && flag != "--rack-name" {
        bail!("--rack-name does not apply to --query {:?}", kind.label());
    }
    if kind.parameter().is_some() && raw.is_none() {
        bail!("--query {:?} requires {flag}", kind.label());
    }

    QueryRequest::from_input(kind, raw.unwrap_or_default())
        .map(Some)
        .map_err(|message| anyhow!("{message} (from {flag})"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
    query: Option<QueryKind>,
    device_id: Option<String>,
    rack_name: Option<String>,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
        query: None,
        device_id: None,
        rack_name: None,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--query" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--query requires a number from 1 to 4"))?;
                let kind = QueryKind::parse(value.as_ref()).ok_or_else(|| {
                    anyhow!(
                        "unknown query {:?}; use a number from 1 to 4",
                        value.as_ref()
                    )
                })?;
                options.query = Some(kind);
            }
            "--device-id" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--device-id requires a value"))?;
                options.device_id = Some(value.as_ref().to_owned());
            }
            "--rack-name" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--rack-name requires a value"))?;
                options.rack_name = Some(value.as_ref().to_owned());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("netbox-toolbox");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --check                  Validate config and reach /api/status/");
    println!("  --query <1-4>            Run one query and print the table, no UI");
    for kind in QueryKind::ALL {
        println!("                             {}", kind.label());
    }
    println!("  --device-id <id>         Device ID for --query 3");
    println!("  --rack-name <name>       Rack name for --query 4");
    println!("  --help                   Show this help");
    println!();
    println!("Environment: NETBOX_API_URL, NETBOX_API_TOKEN (required), RUST_LOG");
    println!("A .env file in the working directory fills variables that are not set.");
}
