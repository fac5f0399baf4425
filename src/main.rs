use churn_eda::cli::{self, Cli, Commands};
use churn_eda::logging::StdLogSink;
use churn_eda::Result;
use clap::Parser;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let sink = StdLogSink;

    match cli.command {
        Commands::Validate {
            input,
            config,
            penguins,
            out,
        } => cli::run_validate(&input, config.as_deref(), penguins, out.as_deref(), &sink)?,
        Commands::Missing { input, threshold } => cli::run_missing(&input, threshold, &sink)?,
        Commands::Engineer { input, config, out } => {
            cli::run_engineer(&input, config.as_deref(), out.as_deref(), &sink)?
        }
        Commands::Eda {
            input,
            columns,
            method,
            threshold,
        } => cli::run_eda(&input, &columns, &method, threshold, &sink)?,
        Commands::Clean {
            input,
            column,
            valid,
            out,
        } => cli::run_clean(&input, &column, &valid, out.as_deref(), &sink)?,
    }

    Ok(())
}
