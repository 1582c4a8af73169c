use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "docnav",
    version,
    about = "Table of contents, section tracking and deep links for long HTML documents.",
    long_about = None
)]
pub struct Cli {
    /// Selector of the document root whose h2/h3 headings form the TOC
    #[clap(long, value_name = "SELECTOR")]
    pub root: Option<String>,

    /// Selector of the navigation container that receives the links
    #[clap(long, value_name = "SELECTOR")]
    pub nav: Option<String>,

    /// Page URL used for deep links (defaults to the file:// URL of FILE)
    #[clap(long, value_name = "URL")]
    pub url: Option<String>,

    /// Fallback URL for the back action when there is no history
    #[clap(long, value_name = "URL")]
    pub back_url: Option<String>,

    /// Print the table of contents as indented text
    #[clap(short, long)]
    pub dump: bool,

    /// Print the table of contents as JSON
    #[clap(long, conflicts_with = "dump")]
    pub json: bool,

    /// Write the annotated HTML to FILE ("-" for stdout)
    #[clap(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Use a specific configuration file
    #[clap(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[clap(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Enable debug output
    #[clap(long)]
    pub debug: bool,

    /// HTML document to open
    #[clap(name = "FILE")]
    pub file: PathBuf,
}

impl Cli {
    /// Whether the run only prints or writes and never opens the viewer.
    pub fn is_batch(&self) -> bool {
        self.dump || self.json || self.output.is_some()
    }
}
