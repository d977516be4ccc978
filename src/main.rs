use anyhow::{anyhow, Context, Result};
use clap::{App, Arg, ArgMatches};
use folio::build::build_site;
use folio::config::Config;
use folio::paginate::Paginator;
use serde::Serialize;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary<'a> {
    link: &'a str,
    template_path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    paginator: Option<&'a Paginator>,
}

fn main() -> Result<()> {
    let matches = App::new("folio")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(
            Arg::with_name("source")
                .long("source")
                .value_name("DIR")
                .default_value(".")
                .help("Directory to look for folio.yaml in (and its parents)"),
        )
        .arg(
            Arg::with_name("drafts")
                .long("drafts")
                .help("Include documents flagged as drafts"),
        )
        .arg(
            Arg::with_name("future")
                .long("future")
                .help("Include documents dated in the future"),
        )
        .arg(
            Arg::with_name("threads")
                .long("threads")
                .value_name("N")
                .help("Number of threads used to scan the content tree"),
        )
        .arg(
            Arg::with_name("verbose")
                .long("verbose")
                .short("v")
                .help("Log every generated template and paginated page"),
        )
        .get_matches();

    init_logging(matches.is_present("verbose"));
    let config = config(&matches)?;

    let site = build_site(&config, &[])?;
    let summaries: Vec<Summary> = site
        .published
        .documents
        .iter()
        .map(|d| Summary {
            link: &d.link,
            template_path: &d.info.template_path,
            paginator: None,
        })
        .chain(site.published.pages.iter().map(|p| Summary {
            link: &p.link,
            template_path: &p.info.template_path,
            paginator: p.paginator.as_ref(),
        }))
        .collect();
    serde_yaml::to_writer(std::io::stdout(), &summaries)?;
    println!();
    Ok(())
}

fn config(matches: &ArgMatches) -> Result<Config> {
    let source = matches.value_of("source").unwrap_or(".");
    let source = Path::new(source)
        .canonicalize()
        .with_context(|| format!("Resolving source directory `{}`", source))?;
    let mut config = Config::from_directory(&source)?;
    if matches.is_present("drafts") {
        config.draft = true;
    }
    if matches.is_present("future") {
        config.future = true;
    }
    if let Some(threads) = matches.value_of("threads") {
        config.threads = threads
            .parse()
            .map_err(|e| anyhow!("Invalid --threads `{}`: {}", threads, e))?;
    }
    Ok(config)
}

// Logs go to stderr; stdout carries the YAML summary.
fn init_logging(verbose: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
