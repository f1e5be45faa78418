use clap::Parser;
use kbt::cli::commands::{check, compatible, completions, cost, metrics, rules, validate};
use kbt::cli::{Cli, Commands};
use miette::Result;

fn main() -> Result<()> {
    // Reset SIGPIPE so piping into `head` exits quietly instead of panicking
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
    kbt::core::logging::init(global.verbose, global.quiet);

    match cli.command {
        Commands::Check(args) => check::run(args, &global),
        Commands::Metrics(args) => metrics::run(args, &global),
        Commands::Cost(args) => cost::run(args, &global),
        Commands::Rules(args) => rules::run(args, &global),
        Commands::Compatible(args) => compatible::run(args, &global),
        Commands::Validate(args) => validate::run(args, &global),
        Commands::Completions(args) => completions::run(args),
    }
}
