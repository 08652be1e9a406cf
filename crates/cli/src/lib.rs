pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use cloudquote_core::{DeviceType, VpsForm};

use crate::commands::quote::{BaasArgs, VpsArgs};

#[derive(Debug, Parser)]
#[command(
    name = "cloudquote",
    about = "Cloudquote reseller pricing CLI",
    long_about = "Price VPS and backup-as-a-service offerings against the stored pricing snapshot, \
                  manage snapshot versions, and check runtime readiness.",
    after_help = "Examples:\n  cloudquote seed\n  cloudquote quote vps --user 4 --category V3 --cpu 4 --vms 12\n  cloudquote quote baas --user 3 --device server --count 2\n  cloudquote doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Store the demo pricing snapshot and verify its contents")]
    Seed,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, DB connectivity, and the stored snapshot")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Price an offering for a user")]
    Quote {
        #[command(subcommand)]
        offering: QuoteCommand,
    },
    #[command(about = "Apply a JSON snapshot update and store the result as a new version")]
    Apply {
        #[arg(help = "Path to a JSON file holding one snapshot update")]
        file: PathBuf,
    },
    #[command(about = "List stored snapshot versions, newest first")]
    History {
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
}

#[derive(Debug, Subcommand)]
enum QuoteCommand {
    #[command(about = "Quote a VPS configuration")]
    Vps {
        #[arg(long, help = "Account id of the user requesting the quote")]
        user: String,
        #[arg(long, default_value = "V3")]
        category: String,
        #[arg(long, default_value = "1")]
        cpu: String,
        #[arg(long, default_value = "4", help = "RAM in GB")]
        ram: String,
        #[arg(long, default_value = "50", help = "Storage in GB")]
        storage: String,
        #[arg(long, default_value = "1")]
        vms: String,
        #[arg(long = "baas-gb", default_value = "0", help = "Bundled backup storage in GB")]
        baas_gb: String,
        #[arg(long, help = "Emit the full quote as JSON")]
        json: bool,
    },
    #[command(about = "Quote backup-as-a-service by volume or by device")]
    Baas {
        #[arg(long, help = "Account id of the user requesting the quote")]
        user: String,
        #[arg(long = "gb", conflicts_with = "device", help = "Backup volume in GB")]
        gigabytes: Option<String>,
        #[arg(long, help = "Price per device instead of per GB (server or workstation)")]
        device: Option<DeviceType>,
        #[arg(long, requires = "device", help = "Number of devices")]
        count: Option<String>,
        #[arg(long, help = "Emit the full quote as JSON")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Quote { offering } => match offering {
            QuoteCommand::Vps { user, category, cpu, ram, storage, vms, baas_gb, json } => {
                commands::quote::run_vps(VpsArgs {
                    user,
                    category,
                    form: VpsForm {
                        cpu_count: cpu,
                        ram_gb: ram,
                        storage_gb: storage,
                        vm_count: vms,
                        baas_backup_gb: baas_gb,
                    },
                    json,
                })
            }
            QuoteCommand::Baas { user, gigabytes, device, count, json } => {
                commands::quote::run_baas(BaasArgs { user, gigabytes, device, count, json })
            }
        },
        Command::Apply { file } => commands::apply::run(&file),
        Command::History { limit } => commands::history::run(limit),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
