use clap::Parser;

use signoff::cli::{self, Cli, Commands, output};
use signoff::core::models::status::Status;

fn main() {
    let args = Cli::parse();
    cli::logging::init(args.verbose);
    cli::context::init(args.dir.as_deref());

    let actor = || cli::context::resolve_actor(args.actor.as_deref());

    let result = match &args.command {
        Commands::Init { columns } => cli::commands::init::execute(columns, &actor(), args.verbose),
        Commands::Approve { decision } => {
            cli::commands::decide::execute(Status::Approved, decision, &actor())
        }
        Commands::Reject { decision } => {
            cli::commands::decide::execute(Status::Rejected, decision, &actor())
        }
        Commands::Reset { decision } => {
            cli::commands::decide::execute(Status::Pending, decision, &actor())
        }
        Commands::Add { set } => cli::commands::add::execute(set),
        Commands::Edit { row, set } => cli::commands::edit::execute(*row, set, &actor()),
        Commands::Scan => cli::commands::scan::execute(&actor()),
        Commands::Verify => cli::commands::verify::execute(),
        Commands::Log {
            by,
            since,
            request,
            last,
        } => cli::commands::log::execute(
            by.as_deref(),
            since.as_deref(),
            request.as_deref(),
            *last,
        ),
        Commands::Status => cli::commands::status::execute(),
    };

    if let Err(e) = result {
        output::error(&format!("Error: {e}"));
        std::process::exit(1);
    }
}
