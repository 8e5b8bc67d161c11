use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "medtalk", version, about = "Medical consultation practice server", long_about = None)]
pub struct Cli {
    /// Defaults to `serve`
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file path globally
    #[arg(short, long, global = true, default_value = "config.yaml")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve,

    /// Practice a consultation in the terminal
    Chat {
        /// Participant id the transcript is logged under
        #[arg(short, long)]
        participant: String,

        /// Page type recorded with each turn
        #[arg(long, default_value = "chat")]
        page_type: String,
    },

    /// Inspect stored participant data
    Participant {
        #[command(subcommand)]
        action: ParticipantAction,
    },
}

#[derive(Subcommand)]
pub enum ParticipantAction {
    /// List participant directories
    List,

    /// List the files stored for a participant
    Files {
        id: String,
    },

    /// Print one day's conversation log
    Logs {
        id: String,
        /// Day as YYYYMMDD (defaults to today)
        #[arg(short, long)]
        date: Option<String>,
        #[arg(long, default_value = "chat")]
        page_type: String,
    },

    /// Export the most recent conversation log to a .txt file
    Export {
        id: String,
        /// The path to the output file (optional)
        #[arg(short, long)]
        path: Option<String>,
    },
}
