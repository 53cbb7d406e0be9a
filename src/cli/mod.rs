pub mod commands;
pub mod context;
pub mod logging;
pub mod output;

use clap::{Parser, Subcommand};

/// Approve rows. Detect drift. Keep a tamper-evident audit trail.
#[derive(Parser, Debug)]
#[command(name = "signoff", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Who is acting (default: git user.name, then $USER)
    #[arg(long, global = true, env = "SIGNOFF_ACTOR")]
    pub actor: Option<String>,

    /// Project directory holding config, sheet and audit log
    #[arg(long, global = true)]
    pub dir: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Signoff in the current project
    Init {
        /// Extra business columns for the new request sheet
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },

    /// Approve one or more requests
    Approve {
        #[command(flatten)]
        decision: DecisionArgs,
    },

    /// Reject one or more requests
    Reject {
        #[command(flatten)]
        decision: DecisionArgs,
    },

    /// Send requests back to pending
    Reset {
        #[command(flatten)]
        decision: DecisionArgs,
    },

    /// Append a new request row
    Add {
        /// Cell value as HEADER=VALUE. Repeatable.
        #[arg(long = "set", value_name = "HEADER=VALUE", required = true)]
        set: Vec<String>,
    },

    /// Edit cells of a request and trigger reapproval if needed
    Edit {
        /// Row to edit
        #[arg(long)]
        row: u32,
        /// Cell value as HEADER=VALUE. Repeatable.
        #[arg(long = "set", value_name = "HEADER=VALUE", required = true)]
        set: Vec<String>,
    },

    /// Detect approved requests that changed since approval
    Scan,

    /// Verify the audit log hash chain
    Verify,

    /// Show audit history
    Log {
        /// Filter by actor
        #[arg(long)]
        by: Option<String>,
        /// Filter events since this date (ISO 8601)
        #[arg(long)]
        since: Option<String>,
        /// Only events for this request id
        #[arg(long)]
        request: Option<String>,
        /// Show last N events
        #[arg(long)]
        last: Option<usize>,
    },

    /// Show request counts and audit chain health
    Status,
}

/// Rows and notes shared by approve, reject and reset.
#[derive(clap::Args, Debug)]
pub struct DecisionArgs {
    /// Sheet row number (data rows start at 2). Repeatable.
    #[arg(long = "row", required = true)]
    pub rows: Vec<u32>,

    /// Decision notes
    #[arg(long, default_value = "")]
    pub notes: String,
}
