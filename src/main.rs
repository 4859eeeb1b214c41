use clap::Parser;
use dwalk::cli::{Cli, Commands};
use miette::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    init_logging(global.verbose);

    match cli.command {
        Commands::Init(args) => dwalk::cli::commands::init::run(args),
        Commands::Walk(cmd) => dwalk::cli::commands::walk::run(cmd, &global),
        Commands::Store(cmd) => dwalk::cli::commands::store::run(cmd, &global),
        Commands::Checklist(args) => dwalk::cli::commands::checklist::run(args, &global),
        Commands::Stats(args) => dwalk::cli::commands::stats::run(args, &global),
        Commands::Export(args) => dwalk::cli::commands::export::run(args, &global),
        Commands::Validate(args) => dwalk::cli::commands::validate::run(args, &global),
        Commands::Config(cmd) => dwalk::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => dwalk::cli::commands::completions::run(args),
    }
}

/// Log to stderr; `RUST_LOG` wins, else `debug` with `--verbose`, else `warn`
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
