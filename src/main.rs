use hairdress_convert::restore::{convert_mssql, convert_pair, RestoreSummary};
use hairdress_convert::store::{convert_to_db, LoadSummary};
use hairdress_convert::{ConvertConfig, DateFallback, RunClock};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hairdress-convert")]
#[command(about = "Convert customer and service history exports for the mobile app")]
#[command(version)]
struct Args {
    /// What to do with unparsable service dates: reject, today or epoch
    #[arg(long, global = true, value_parser = parse_date_fallback)]
    date_fallback: Option<DateFallback>,

    /// Print the summary as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a customer CSV and a service CSV into a fresh SQLite database
    ToDb {
        /// Customer file (id, name, phone, picture)
        customers: PathBuf,

        /// Service file (id, customer_id, date, contents, pay_type, pay, remarks, sales)
        services: PathBuf,

        /// Output database (default: hairdress_history.db)
        output: Option<PathBuf>,
    },
    /// Build a restore CSV from a customer CSV and a service CSV
    Restore {
        /// Customer file (id, name, phone, picture)
        customers: PathBuf,

        /// Service file (id, customer_id, date, contents, pay_type, pay, remarks, sales)
        services: PathBuf,

        /// Output file (default: hairdress_restore.csv)
        output: Option<PathBuf>,
    },
    /// Build a restore CSV from a tagged MSSQL export
    MssqlRestore {
        /// MSSQL export with CUSTOMER and SERVICE_RECORD rows
        input: PathBuf,

        /// Output file (default: hairdress_restore.csv)
        output: Option<PathBuf>,
    },
}

fn parse_date_fallback(s: &str) -> std::result::Result<DateFallback, String> {
    s.parse().map_err(|e: hairdress_convert::ConvertError| e.to_string())
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            println!("{}", e.render());
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_tracing(args.verbose, args.json);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("오류: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logs share stdout with the summary, except under `--json` where stdout
/// carries only the JSON document.
fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if json {
        builder.with_writer(std::io::stderr).init();
    } else {
        builder.init();
    }
}

fn run(args: Args) -> Result<()> {
    let config = ConvertConfig::from_env().context("환경 설정을 읽을 수 없습니다")?;
    let date_fallback = args.date_fallback.unwrap_or(config.date_fallback);
    let clock = RunClock::capture();
    debug!("Run started at {} (date fallback: {})", clock.started_at(), date_fallback);

    match args.command {
        Commands::ToDb {
            customers,
            services,
            output,
        } => {
            ensure_input(&customers)?;
            ensure_input(&services)?;
            let output = output.unwrap_or(config.db_output);

            let summary = convert_to_db(&customers, &services, &output, date_fallback, &clock)
                .context("DB 변환 실패")?;
            if args.json {
                print_json(&summary)?;
            } else {
                print_load_summary(&summary);
            }
        }
        Commands::Restore {
            customers,
            services,
            output,
        } => {
            ensure_input(&customers)?;
            ensure_input(&services)?;
            let output = output.unwrap_or(config.restore_output);

            let summary = convert_pair(&customers, &services, &output, &clock)
                .context("변환 중 오류가 발생했습니다")?;
            if args.json {
                print_json(&summary)?;
            } else {
                print_restore_summary(&summary);
            }
        }
        Commands::MssqlRestore { input, output } => {
            ensure_input(&input)?;
            let output = output.unwrap_or(config.restore_output);

            let summary =
                convert_mssql(&input, &output).context("변환 중 오류가 발생했습니다")?;
            if args.json {
                print_json(&summary)?;
            } else {
                print_restore_summary(&summary);
            }
        }
    }

    Ok(())
}

fn ensure_input(path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!("{} 파일을 찾을 수 없습니다.", path.display());
    }
    Ok(())
}

fn print_json<T: Serialize>(summary: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

fn print_load_summary(summary: &LoadSummary) {
    println!("DB 파일 생성 완료: {}", summary.output.display());
    println!("\n통계:");
    println!("  고객: {}명", summary.customers);
    println!("  서비스 기록: {}건", summary.service_records);

    let skipped_customers = summary.customer_pass.total_skipped();
    let skipped_records = summary.service_pass.total_skipped();
    if skipped_customers > 0 || skipped_records > 0 {
        println!("  스킵된 고객 행: {}개", skipped_customers);
        println!("  스킵된 서비스 기록 행: {}개", skipped_records);
    }
}

fn print_restore_summary(summary: &RestoreSummary) {
    println!("완료: {} 파일이 생성되었습니다.", summary.output.display());
    println!("  고객: {}명", summary.customers);
    println!("  서비스 기록: {}건", summary.service_records);
    if summary.skipped_rows > 0 {
        println!("  스킵된 행: {}개", summary.skipped_rows);
    }
    println!("이 파일을 앱의 '복원' 기능으로 사용하세요.");
}
