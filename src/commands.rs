//! Command implementations: one function per subcommand, dispatched from
//! [`run`]. Each builds at most one request, issues it, and renders
//! synchronously; there is no retry or background work.

use std::io::Write;

use anyhow::{Context, Result, anyhow, bail};
use chrono::Utc;
use colored::Colorize;
use regex::Regex;
use tracing::debug;

use crate::cli::{Cli, Command, ListArgs};
use crate::client::ApiClient;
use crate::config::Session;
use crate::query;
use crate::render::{self, RenderContext};
use crate::response;
use crate::sort::SortDirection;

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Error { message } => bail!(message),
        Command::Login { endpoint } => login(&endpoint, cli.insecure),
        Command::List(args) => list(&require_session()?, &args, cli.insecure),
        Command::Describe { name, filter } => {
            describe(&require_session()?, &name, filter.as_deref(), cli.insecure)
        }
        Command::Get { name, object } => get(&require_session()?, &name, &object, cli.insecure),
    }
}

/// Load the persisted session; everything except `login`/`error` needs one.
fn require_session() -> Result<Session> {
    match Session::load()? {
        Some(session) if session.logged_in() => Ok(session),
        _ => bail!("Must login first."),
    }
}

/// Split `[universe/]project`, defaulting the universe from the session.
fn split_name<'a>(name: &'a str, session: &'a Session) -> Result<(&'a str, &'a str)> {
    match name.split_once('/') {
        Some((universe, project)) => Ok((universe, project)),
        None => {
            let universe = session
                .default_universe()
                .ok_or_else(|| anyhow!("session has no universe; use <universe>/<project>"))?;
            Ok((universe, name))
        }
    }
}

fn list(session: &Session, args: &ListArgs, insecure: bool) -> Result<()> {
    let (universe, project) = split_name(&args.name, session)?;
    let now = Utc::now().timestamp();
    let built = query::build(&args.to_request(), now)?;

    if args.query {
        println!("{}", serde_json::to_string(&built.query)?);
        if !args.raw {
            return Ok(());
        }
    }

    let client = ApiClient::new(&session.endpoint, session.config.token.as_deref(), insecure)?;
    let result = client.query(universe, project, &built.query)?;

    if args.raw {
        println!("{}", serde_json::to_string(&result)?);
        return Ok(());
    }

    let results = response::unpack(&result)?;
    debug!(groups = results.len(), "unpacked result set");

    let ctx = RenderContext {
        columns: &built.columns,
        window: built.window,
        direction: if args.reverse {
            SortDirection::Reverse
        } else {
            SortDirection::Forward
        },
        now,
    };
    // A zero limit means no limit, matching the flag's falsy history.
    let limit = args.limit.filter(|&limit| limit > 0);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    render::print_results(&mut out, &results, args.sort.as_deref(), limit, &ctx)?;
    out.flush()?;
    Ok(())
}

fn describe(session: &Session, name: &str, filter: Option<&str>, insecure: bool) -> Result<()> {
    let (universe, project) = split_name(name, session)?;
    let pattern = filter
        .map(Regex::new)
        .transpose()
        .context("invalid describe filter regex")?;

    let client = ApiClient::new(&session.endpoint, session.config.token.as_deref(), insecure)?;
    let mut attributes = client.describe(universe, project)?;

    // Built-in attributes first, then custom, each block by name.
    attributes.sort_by(|a, b| a.custom.cmp(&b.custom).then_with(|| a.name.cmp(&b.name)));
    let width = attributes.iter().map(|a| a.name.len()).max().unwrap_or(0);

    for attribute in &attributes {
        if let Some(pattern) = &pattern
            && !pattern.is_match(&attribute.name)
        {
            continue;
        }

        let name = format!("{:>width$}", attribute.name);
        let name = if attribute.custom {
            name.blue()
        } else {
            name.yellow()
        };
        print!("{name}: {}", attribute.description);
        if let Some(format) = &attribute.format {
            print!(" {}", format!("[{format}]").dimmed());
        }
        println!();
    }
    Ok(())
}

fn get(session: &Session, name: &str, object: &str, insecure: bool) -> Result<()> {
    let (universe, project) = split_name(name, session)?;
    let client = ApiClient::new(&session.endpoint, session.config.token.as_deref(), insecure)?;
    let record = client.get_object(universe, project, object)?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn login(endpoint: &str, insecure: bool) -> Result<()> {
    let username: String = dialoguer::Input::new()
        .with_prompt("User")
        .interact_text()
        .context("username prompt")?;
    let password = dialoguer::Password::new()
        .with_prompt("Password")
        .interact()
        .context("password prompt")?;

    let client = ApiClient::new(endpoint, None, insecure)?;
    let credentials = client
        .login(&username, &password)
        .map_err(|err| anyhow!("Unable to authenticate: {err}"))?;

    let session = Session {
        config: credentials,
        endpoint: endpoint.to_string(),
    };
    session
        .save()
        .map_err(|err| anyhow!("Unable to save config: {err}"))?;

    println!("{}", "Logged in.".blue().bold());
    Ok(())
}
