use docnav::{
    cli::Cli,
    config::Config,
    html::HtmlPage,
    location,
    logging::{self, LogLevel},
    report::{self, TocReport},
    settings::{CfgDefaultKeymaps, Settings},
    ui::viewer::{Viewer, ViewerOptions},
};

use clap::Parser;
use eyre::Result;
use std::{fs, path::PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(LogLevel::from_flags(cli.verbose, cli.debug));

    let config = match &cli.config {
        Some(path) => Config::load_from(path.clone())?,
        None => match Config::new() {
            Ok(config) => config,
            Err(err) => {
                logging::warn(format!("could not load configuration, using defaults: {}", err));
                Config::from_parts(
                    Settings::default(),
                    CfgDefaultKeymaps::default(),
                    PathBuf::from("configuration.json"),
                )
            }
        },
    };

    if cli.is_batch() {
        return run_batch(&cli, &config);
    }

    let options = ViewerOptions {
        root_selector: cli.root.clone(),
        url: cli.url.clone(),
        fallback_back_url: cli.back_url.clone(),
    };
    let mut viewer = Viewer::new(config, options, &cli.file)?;
    viewer.run()
}

/// Annotate the document and print or write the results without a terminal UI.
fn run_batch(cli: &Cli, config: &Config) -> Result<()> {
    let source = fs::read_to_string(&cli.file)?;
    let root = cli.root.as_deref().unwrap_or(&config.settings.root_selector);
    let nav = cli.nav.as_deref().unwrap_or(&config.settings.nav_selector);
    let page_url = cli
        .url
        .clone()
        .or_else(|| location::file_url(&cli.file))
        .unwrap_or_else(|| cli.file.display().to_string());

    let annotated = HtmlPage::parse(&source).annotate(root, nav)?;
    logging::info(format!("{} sections in {}", annotated.toc.links.len(), cli.file.display()));

    if let Some(output) = &cli.output {
        if output.as_os_str() == "-" {
            println!("{}", annotated.html);
        } else {
            fs::write(output, &annotated.html)?;
            logging::info(format!("wrote {}", output.display()));
        }
    }

    if cli.dump {
        print!("{}", report::outline(&annotated.toc));
    } else if cli.json {
        let back_url = cli.back_url.as_deref().or_else(|| {
            Some(config.settings.fallback_back_url.as_str()).filter(|url| !url.is_empty())
        });
        println!("{}", TocReport::new(&annotated.toc, &page_url, back_url).to_json()?);
    }

    Ok(())
}
