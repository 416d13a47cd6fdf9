//! shelf - Shelfwork admin CLI entry point.

use shelfwork::cli::args::Cli;
use shelfwork::cli::{commands, Context};
use shelfwork::ui::output;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    let ctx = Context {
        config: cli.config.clone(),
        store_url: cli.store_url.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
    };

    if let Err(e) = commands::dispatch(cli.command, &ctx).await {
        output::error(e);
        std::process::exit(1);
    }
}
