use clap::{Parser, Subcommand};

mod cmd;
mod display;
mod records;
mod resolve;
mod store;
mod tax;

#[derive(Parser, Debug)]
#[command(
    name = "milltax",
    version,
    about = "Estimate county property taxes from assessor reference data"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a property by account number or address fragment
    Lookup(cmd::lookup::LookupCommand),
    /// Search site addresses for a fragment
    Search(cmd::search::SearchCommand),
    /// Estimate assessed value and property tax
    Estimate(cmd::estimate::EstimateCommand),
    /// Check the reference datasets for quality issues
    Validate(cmd::validate::ValidateCommand),
    /// Print expected dataset formats
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    match &cli.command {
        Command::Lookup(command) => command.exec(),
        Command::Search(command) => command.exec(),
        Command::Estimate(command) => command.exec(),
        Command::Validate(command) => command.exec(),
        Command::Schema(command) => command.exec(),
    }
}
