use crate::prelude::*;
use clap::Parser;
use pdfmark_core::LayoutConfig;

mod batch;
mod convert;
mod error;
mod name;
mod output;
mod prelude;
mod upload;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Convert PDF market reports into Markdown with headings and inline links"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Maximum vertical distance between runs of the same line
    #[clap(long, env = "PDFMARK_LINE_GAP", global = true, default_value_t = LayoutConfig::DEFAULT_LINE_GAP)]
    line_gap: f64,

    /// Horizontal gap above which a space is inserted between runs
    #[clap(long, env = "PDFMARK_WORD_GAP", global = true, default_value_t = LayoutConfig::DEFAULT_WORD_GAP)]
    word_gap: f64,

    /// Padding added around link annotation rectangles
    #[clap(long, env = "PDFMARK_LINK_PADDING", global = true, default_value_t = LayoutConfig::DEFAULT_LINK_PADDING)]
    link_padding: f64,

    /// Whether to display additional information.
    #[clap(long, env = "PDFMARK_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

impl Global {
    pub fn layout(&self) -> LayoutConfig {
        LayoutConfig {
            line_gap: self.line_gap,
            word_gap: self.word_gap,
            link_padding: self.link_padding,
        }
    }
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Convert a single PDF to Markdown
    Convert(crate::convert::App),

    /// Convert many PDFs, skipping duplicates
    Batch(crate::batch::App),

    /// Print the output name derived for a PDF
    Name(crate::name::App),

    /// Upload existing Markdown files
    Upload(crate::upload::App),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Convert(sub_app) => crate::convert::run(sub_app, app.global).await,
        SubCommands::Batch(sub_app) => crate::batch::run(sub_app, app.global).await,
        SubCommands::Name(sub_app) => crate::name::run(sub_app, app.global).await,
        SubCommands::Upload(sub_app) => crate::upload::run(sub_app, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
