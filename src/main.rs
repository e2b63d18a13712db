use std::{env, error::Error, fs, process::ExitCode};

use docsim::{parse_documents, DocsimConfig, Session};
use serde_json::json;
use tracing_subscriber::EnvFilter;

const USAGE: &str =
    "usage: docsim <documents-file> [--config <yaml>] [--query <id>] [--threshold <f>] [--json-logs]";

struct Args {
    documents: String,
    config: Option<String>,
    query: Option<usize>,
    threshold: Option<f64>,
    json_logs: bool,
}

fn parse_args() -> Result<Args, Box<dyn Error>> {
    let mut args = env::args().skip(1);
    let mut documents = None;
    let mut config = None;
    let mut query = None;
    let mut threshold = None;
    let mut json_logs = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config = Some(args.next().ok_or("--config needs a path")?),
            "--query" => query = Some(args.next().ok_or("--query needs an id")?.parse()?),
            "--threshold" => {
                threshold = Some(args.next().ok_or("--threshold needs a value")?.parse()?)
            }
            "--json-logs" => json_logs = true,
            "-h" | "--help" => return Err(USAGE.into()),
            _ if documents.is_none() => documents = Some(arg.clone()),
            other => return Err(format!("unexpected argument {other:?}\n{USAGE}").into()),
        }
    }

    Ok(Args {
        documents: documents.ok_or(USAGE)?,
        config,
        query,
        threshold,
        json_logs,
    })
}

fn init_tracing(json_logs: bool) {
    let filter = EnvFilter::try_from_env("DOCSIM_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => DocsimConfig::from_file(path)?,
        None => DocsimConfig::default(),
    };
    let mut cfg = config.pipeline_config();
    if let Some(threshold) = args.threshold {
        cfg = cfg.with_threshold(threshold);
    }

    let text = fs::read_to_string(&args.documents)?;
    let documents = parse_documents(&text);
    tracing::info!(
        path = %args.documents,
        documents = documents.len(),
        "loaded documents"
    );

    let mut session = Session::new();
    let report = session.process(documents.as_slice(), &cfg)?;
    if !report.status.is_ok() {
        println!("{}", serde_json::to_string_pretty(&json!({ "process": &report }))?);
        report.into_result()?;
        return Ok(());
    }

    let graph = session.pairwise_graph()?;
    let query = args.query.map(|id| session.run_query(id)).transpose()?;

    let output = json!({
        "documents": documents,
        "process": report,
        "graph": graph,
        "query": query,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };
    init_tracing(args.json_logs);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "docsim failed");
            ExitCode::FAILURE
        }
    }
}
