use clap::Parser;
use log::LevelFilter;
use miette::Result;
use dst::cli::{Cli, Commands};
use dst::core::Config;

fn main() -> Result<()> {
    // Install miette's fancy error handler for beautiful diagnostics
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
    let (config, config_warnings) = Config::load_with(cli.global.config.as_deref());

    let level = match cli.global.verbose {
        _ if config.debug_mode => LevelFilter::Debug,
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    // RUST_LOG, when set, overrides the level chosen here
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
    for warning in &config_warnings {
        log::warn!("{}", warning);
    }

    let global = &cli.global;
    match cli.command {
        Commands::Calc(cmd) => dst::cli::commands::calc::run(cmd, global, &config),
        Commands::Types(cmd) => dst::cli::commands::types::run(cmd, global, &config),
        Commands::Fields(cmd) => dst::cli::commands::fields::run(cmd, global, &config),
        Commands::Recalc(args) => dst::cli::commands::recalc::run(args, global, &config),
        Commands::Insert(args) => dst::cli::commands::insert::run(args, global, &config),
        Commands::Layer(cmd) => dst::cli::commands::layer::run(cmd, global, &config),
        Commands::Config(cmd) => dst::cli::commands::config::run(cmd, global, &config),
        Commands::Completions(args) => dst::cli::commands::completions::run(args),
    }
}
