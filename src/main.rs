use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use bloodlink::config::{LoggingSettings, Settings};
use bloodlink::core::{blood_group_stats, donation_stats, donor_summary, MatchingEngine, MatchingOptions};
use bloodlink::models::lenient::parse_date;
use bloodlink::models::{
    BloodGroup, DataExport, DonorSearchCriteria, HospitalSearchCriteria, HospitalType, RequestSearchCriteria,
    RequestStatus, Urgency,
};
use bloodlink::services::{load_hospitals, HospitalError, JsonFileStore, Registry, RegistryError, StorageError};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// `bloodlink` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "bloodlink",
    about = "Search donors, match blood groups and track requests over a local data directory",
    version
)]
struct Cli {
    /// Configuration file. Defaults to `config/default.toml` and `config/local.toml`.
    #[arg(long, global = true, value_name = "path")]
    config: Option<PathBuf>,
    /// Data directory, overriding `storage.data_dir`.
    #[arg(long, global = true, value_name = "dir")]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search donors by group, district, upazila and eligibility
    Donors {
        #[arg(long)]
        blood_group: Option<BloodGroup>,
        #[arg(long)]
        district: Option<String>,
        #[arg(long)]
        upazila: Option<String>,
        #[arg(long)]
        eligible_only: bool,
    },
    /// Eligible donors of any group that can give to the recipient group;
    /// an unrecognized group finds nobody
    Compatible {
        #[arg(long)]
        blood_group: String,
        #[arg(long, default_value = "")]
        district: String,
    },
    /// Exact-group donors first, broadening to compatible groups if none
    Emergency {
        #[arg(long)]
        blood_group: BloodGroup,
        #[arg(long, default_value = "")]
        district: String,
    },
    /// Search blood requests
    Requests {
        #[arg(long)]
        blood_group: Option<BloodGroup>,
        #[arg(long)]
        status: Option<RequestStatus>,
        #[arg(long)]
        urgency: Option<Urgency>,
        #[arg(long)]
        district: Option<String>,
    },
    /// Newest blood requests first
    Recent {
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Search the hospital directory
    Hospitals {
        #[arg(long)]
        district: Option<String>,
        #[arg(long)]
        blood_bank_only: bool,
        #[arg(long = "type")]
        hospital_type: Option<HospitalType>,
    },
    /// Donation and fulfilment totals
    Stats,
    /// Donor, request and donation counts per blood group
    GroupStats,
    /// Donation count and eligibility for one donor
    Eligibility {
        #[arg(long)]
        donor_id: String,
    },
    /// Record a donation and move the donor's eligibility window
    Donate {
        #[arg(long)]
        donor_id: String,
        /// Donation date; defaults to now
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        hospital: Option<String>,
    },
    /// Write every collection as one JSON document
    Export {
        #[arg(long, value_name = "path")]
        output: Option<PathBuf>,
    },
    /// Replace collections from an exported JSON document
    Import {
        #[arg(value_name = "path")]
        input: PathBuf,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Hospitals(#[from] HospitalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Unknown person: {0}")]
    UnknownPerson(String),
}

fn init_logging(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}

fn load_settings(cli: &Cli) -> Result<Settings, config::ConfigError> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };

    if let Some(dir) = &cli.data_dir {
        settings.storage.data_dir = dir.display().to_string();
    }

    Ok(settings)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

fn run(command: Command, settings: &Settings) -> Result<(), CliError> {
    let store = JsonFileStore::open(&settings.storage.data_dir)?;
    let mut registry = Registry::open(store)?;
    let engine = MatchingEngine::new(MatchingOptions::from(&settings.matching));
    let now = Utc::now();

    match command {
        Command::Donors {
            blood_group,
            district,
            upazila,
            eligible_only,
        } => {
            let criteria = DonorSearchCriteria {
                blood_group: blood_group.into(),
                district,
                upazila,
                eligible_only,
            };
            print_json(&engine.search_donors(registry.persons(), &criteria, now))
        }
        Command::Compatible { blood_group, district } => print_json(&engine.compatible_donors_for_label(
            registry.persons(),
            &blood_group,
            &district,
            now,
        )),
        Command::Emergency { blood_group, district } => {
            let found = engine.find_emergency_donors(registry.persons(), blood_group, &district, now);
            info!("Emergency search: {:?} tier, {} donors", found.tier, found.donors.len());
            print_json(&found)
        }
        Command::Requests {
            blood_group,
            status,
            urgency,
            district,
        } => {
            let criteria = RequestSearchCriteria {
                blood_group: blood_group.into(),
                status: status.into(),
                urgency: urgency.into(),
                district,
            };
            print_json(&engine.search_blood_requests(registry.blood_requests(), &criteria))
        }
        Command::Recent { limit } => print_json(&engine.recent_requests(registry.blood_requests(), limit)),
        Command::Hospitals {
            district,
            blood_bank_only,
            hospital_type,
        } => {
            let hospitals = load_hospitals(&settings.hospitals.path)?;
            let criteria = HospitalSearchCriteria {
                district,
                blood_bank_only,
                hospital_type: hospital_type.into(),
            };
            print_json(&engine.search_hospitals(&hospitals, &criteria))
        }
        Command::Stats => print_json(&donation_stats(
            registry.donations(),
            registry.persons(),
            registry.blood_requests(),
        )),
        Command::GroupStats => print_json(&blood_group_stats(
            registry.donations(),
            registry.persons(),
            registry.blood_requests(),
        )),
        Command::Eligibility { donor_id } => {
            let person = registry
                .person(&donor_id)
                .ok_or_else(|| CliError::UnknownPerson(donor_id.clone()))?;
            print_json(&donor_summary(person, registry.donations(), now))
        }
        Command::Donate {
            donor_id,
            date,
            hospital,
        } => {
            let donation_date = match date {
                Some(raw) => parse_date(&raw).ok_or(CliError::InvalidDate(raw))?,
                None => now,
            };
            let donation = registry.record_donation(&donor_id, donation_date, hospital, now)?;
            print_json(&donation)
        }
        Command::Export { output } => {
            let export = registry.export(now);
            match output {
                Some(path) => {
                    fs::write(&path, serde_json::to_string_pretty(&export)?)?;
                    info!("Exported data to {}", path.display());
                    Ok(())
                }
                None => print_json(&export),
            }
        }
        Command::Import { input } => {
            let raw = fs::read_to_string(&input)?;
            let data: DataExport = serde_json::from_str(&raw)?;
            registry.import(data)?;
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    // Load .env file if present
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            init_logging(&LoggingSettings::default());
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&settings.logging);

    match run(cli.command, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
