use clap::{Args, Parser, Subcommand};

use crate::jobs::types::JobStatus;

pub mod commands;

#[derive(Parser)]
#[command(name = "job-escrow")]
#[command(about = "Escrow-backed job workflow between a client and a freelancer")]
#[command(long_about = "job-escrow drives jobs through OPEN -> ACCEPTED -> FUNDED -> SUBMITTED -> RELEASED. \
                       Deposit and release steps are two-phase: 'prepare' prints an unsigned transfer for \
                       a wallet to sign, 'confirm' records the resulting transaction reference.")]
pub struct Cli {
    /// Configuration file (defaults to ./job-escrow.toml when present)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Job snapshot file, overriding the configured storage
    #[arg(long, global = true)]
    pub store: Option<String>,

    /// Escrow destination identity, overriding the configured one
    #[arg(long, global = true)]
    pub escrow_address: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open a new job
    Create {
        #[arg(long)]
        title: String,
        /// Amount in major units (scaled by 10^6 for storage)
        #[arg(long)]
        amount: f64,
        /// Client identity
        #[arg(long)]
        client: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Show one job
    Show { id: String },
    /// List jobs, optionally filtered
    List {
        #[arg(long, help = "Only jobs in this status (OPEN, ACCEPTED, ...)")]
        status: Option<JobStatus>,
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        freelancer: Option<String>,
    },
    /// Take an open job as freelancer
    Accept {
        id: String,
        #[arg(long)]
        freelancer: String,
    },
    /// Deliver work for an accepted or funded job
    Submit {
        id: String,
        #[arg(long)]
        freelancer: String,
        /// Reference to the delivered work
        #[arg(long)]
        work: String,
    },
    /// Raise a dispute as client or freelancer
    Dispute {
        id: String,
        #[arg(long)]
        identity: String,
        #[arg(long)]
        reason: String,
    },
    /// Client deposit into escrow
    #[command(subcommand)]
    Deposit(DepositCommands),
    /// Payout from escrow to the freelancer
    #[command(subcommand)]
    Release(ReleaseCommands),
    /// Apply a JSON action request read from a file or stdin
    Apply {
        #[arg(long, help = "Request file; reads stdin when omitted or '-'")]
        file: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum DepositCommands {
    /// Print the unsigned deposit transfer
    Prepare {
        id: String,
        #[arg(long)]
        client: String,
        /// Amount in major units; defaults to the job amount
        #[arg(long)]
        amount: Option<f64>,
    },
    /// Record an executed deposit
    Confirm(ConfirmArgs),
}

#[derive(Subcommand)]
pub enum ReleaseCommands {
    /// Print the unsigned payout transfer
    Prepare {
        id: String,
        #[arg(long)]
        client: String,
    },
    /// Record an executed payout
    Confirm(ConfirmArgs),
}

#[derive(Args)]
pub struct ConfirmArgs {
    pub id: String,
    #[arg(long)]
    pub client: String,
    /// Transaction reference asserted by the wallet
    #[arg(long = "tx")]
    pub transaction_ref: String,
}
