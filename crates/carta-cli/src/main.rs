// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result};
use carta_app::{WorkspaceAction, WorkspaceState};
use config::Config;
use runtime::AgentRuntime;
use std::env;
use std::path::PathBuf;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
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
            "load config {}; run `carta --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let agent_client = if config.agent_enabled() && !options.demo {
        Some(
            carta_agent::Client::new(
                config.agent_base_url(),
                config.model_config(),
                config.agent_timeout()?,
            )
            .with_context(|| {
                format!(
                    "invalid [agent]/[model] config in {}; fix base_url/model/timeout values",
                    options.config_path.display()
                )
            })?,
        )
    } else {
        None
    };
    if options.check_only {
        return Ok(());
    }

    let mut state = if options.demo {
        carta_testkit::workspace_with_demo_import()
    } else {
        WorkspaceState::default()
    };

    if let Some(goal) = options.goal {
        state.dispatch(WorkspaceAction::SetGoalDescription(goal));
    }

    if options.demo {
        state.dispatch(WorkspaceAction::AutoDashboardLoaded {
            query: carta_testkit::demo_sql_query(),
            rows: carta_testkit::demo_rows(),
            suggestions: carta_testkit::demo_suggestions(),
        });
    } else if let Some(table_name) = &options.table {
        let client = agent_client.as_ref().ok_or_else(|| {
            anyhow::anyhow!(
                "the agent service is disabled in {}; set [agent].enabled = true to fetch suggestions",
                options.config_path.display()
            )
        })?;
        AgentRuntime::new(client).refresh_dashboard(&mut state, table_name);
    }

    print!("{}", runtime::render_suggestions(&state));

    if let Some(index) = options.apply {
        runtime::apply_suggestion(&mut state, index)?;
        println!();
        print!("{}", runtime::render_workspace(&state));
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    table: Option<String>,
    apply: Option<usize>,
    goal: Option<String>,
    demo: bool,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        table: None,
        apply: None,
        goal: None,
        demo: false,
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--table" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--table requires a table name"))?;
                options.table = Some(value.as_ref().to_owned());
            }
            "--apply" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--apply requires a suggestion index"))?;
                let index: usize = value.as_ref().parse().with_context(|| {
                    format!("--apply index {:?} is not a number", value.as_ref())
                })?;
                options.apply = Some(index);
            }
            "--goal" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--goal requires a description"))?;
                options.goal = Some(value.as_ref().to_owned());
            }
            "--demo" => {
                options.demo = true;
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
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("carta");
    println!("  --config <path>          Use a specific config path");
    println!("  --table <name>           Fetch dashboard suggestions for a dataset");
    println!("  --apply <n>              Adopt the n-th fetched suggestion into the workspace");
    println!("  --goal <text>            Set the workspace goal description");
    println!("  --demo                   Run offline against the bundled demo corpus");
    println!("  --check                  Validate config and agent client setup");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --help                   Show this help");
}
