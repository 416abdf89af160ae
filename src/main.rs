use botadmin::cli::commands::{completions, config, import, init, manage, parse, template};
use botadmin::cli::helpers::init_tracing;
use botadmin::cli::{Cli, Commands};
use clap::Parser;
use miette::Result;

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
    init_tracing(global.verbose);

    match cli.command {
        Commands::Init(args) => init::run(args),
        Commands::Config(cmd) => config::run(cmd, &global),
        Commands::Template(args) => template::run(args, &global),
        Commands::Parse(args) => parse::run(args, &global),
        Commands::Import(args) => import::run(args, &global),
        Commands::List(args) => manage::run_list(args, &global),
        Commands::Delete(args) => manage::run_delete(args, &global),
        Commands::Completions(args) => completions::run(args),
    }
}
