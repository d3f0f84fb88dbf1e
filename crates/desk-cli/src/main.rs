use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "desk")]
#[command(about = "Front-desk payment reconciliation CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> site -> local...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Booking balance, ledger and lifecycle
    Booking {
        #[command(subcommand)]
        cmd: BookingCmd,
    },

    /// Record and verify payments
    Payment {
        #[command(subcommand)]
        cmd: PaymentCmd,
    },

    /// Activity log utilities
    Audit {
        #[command(subcommand)]
        cmd: AuditCmd,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    Status,

    /// Apply SQL migrations.
    Migrate,
}

#[derive(Subcommand)]
enum BookingCmd {
    /// Print paid / remaining / payment status
    Balance {
        #[arg(long)]
        booking_id: i64,

        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,
    },

    /// Compare the running balance with the sum of completed payments
    Ledger {
        #[arg(long)]
        booking_id: i64,

        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,
    },

    /// List payment records of a booking
    Payments {
        #[arg(long)]
        booking_id: i64,
    },

    /// Move a booking to a new status (confirmed, checked_in, checked_out, cancelled)
    Transition {
        #[arg(long)]
        booking_id: i64,

        #[arg(long)]
        status: String,

        /// Operator user id recorded in the activity log
        #[arg(long)]
        user_id: i64,

        #[arg(long, default_value = "admin")]
        role: String,

        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,
    },
}

#[derive(Subcommand)]
enum PaymentCmd {
    /// Apply a payment (cash | card | gateway)
    Apply {
        #[arg(long)]
        booking_id: i64,

        /// Decimal amount, e.g. 1500.00
        #[arg(long)]
        amount: String,

        #[arg(long)]
        method: String,

        #[arg(long)]
        notes: Option<String>,

        #[arg(long)]
        user_id: i64,

        #[arg(long, default_value = "admin")]
        role: String,

        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,
    },

    /// Verify a gateway payment callback
    Verify {
        #[arg(long)]
        payment_id: String,

        #[arg(long)]
        order_id: String,

        #[arg(long)]
        signature: String,

        #[arg(long)]
        user_id: i64,

        #[arg(long, default_value = "admin")]
        role: String,

        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,
    },
}

#[derive(Subcommand)]
enum AuditCmd {
    /// Verify the hash chain of a JSONL activity log
    Verify {
        #[arg(long)]
        path: String,
    },

    /// Print the most recent activity rows from the database
    Tail {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Silent if the file does not exist.
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Db { cmd } => {
            let pool = desk_db::connect_from_env().await?;
            match cmd {
                DbCmd::Status => {
                    let s = desk_db::status(&pool).await?;
                    println!("db_ok={} has_bookings_table={}", s.ok, s.has_bookings_table);
                }
                DbCmd::Migrate => {
                    desk_db::migrate(&pool).await?;
                    println!("migrations_applied=true");
                }
            }
        }

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = desk_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Booking { cmd } => match cmd {
            BookingCmd::Balance {
                booking_id,
                config_paths,
            } => {
                let wired = commands::wire_engine(&config_paths).await?;
                let view = wired.engine.balance(booking_id).await?;
                commands::print_balance(&view);
            }

            BookingCmd::Ledger {
                booking_id,
                config_paths,
            } => {
                let wired = commands::wire_engine(&config_paths).await?;
                let report = wired.engine.ledger_report(booking_id).await?;
                commands::print_ledger(booking_id, &report);
                if !report.is_clean() {
                    anyhow::bail!("LEDGER_DRIFT booking_id={booking_id}");
                }
            }

            BookingCmd::Payments { booking_id } => {
                let pool = desk_db::connect_from_env().await?;
                let rows = desk_db::list_payments(&pool, booking_id).await?;
                commands::print_payments(&rows);
            }

            BookingCmd::Transition {
                booking_id,
                status,
                user_id,
                role,
                config_paths,
            } => {
                let wired = commands::wire_engine(&config_paths).await?;
                let actor = commands::operator(user_id, &role)?;
                let tr = wired
                    .engine
                    .transition_booking(&actor, booking_id, &status, wired.balance_policy)
                    .await?;
                println!("booking_id={}", tr.booking_id);
                println!("from={}", tr.from.as_str());
                println!("to={}", tr.to.as_str());
                println!("room_number={}", tr.room_number);
                println!(
                    "room_status={}",
                    tr.room_status.map(|s| s.as_str()).unwrap_or("unchanged")
                );
                println!("remaining_amount={}", tr.remaining_amount);
            }
        },

        Commands::Payment { cmd } => match cmd {
            PaymentCmd::Apply {
                booking_id,
                amount,
                method,
                notes,
                user_id,
                role,
                config_paths,
            } => {
                let amount = desk_payments::parse_amount(&serde_json::Value::String(amount))?;
                let wired = commands::wire_engine(&config_paths).await?;
                let actor = commands::operator(user_id, &role)?;
                let res = wired
                    .engine
                    .apply_payment(&actor, booking_id, amount, &method, notes.as_deref())
                    .await?;
                commands::print_payment(&res);
            }

            PaymentCmd::Verify {
                payment_id,
                order_id,
                signature,
                user_id,
                role,
                config_paths,
            } => {
                let wired = commands::wire_engine(&config_paths).await?;
                let actor = commands::operator(user_id, &role)?;
                let res = wired
                    .engine
                    .verify_gateway_payment(&actor, &payment_id, &order_id, &signature)
                    .await?;
                commands::print_verify(&res);
            }
        },

        Commands::Audit { cmd } => match cmd {
            AuditCmd::Verify { path } => commands::verify_audit_file(&path)?,

            AuditCmd::Tail { limit } => {
                let pool = desk_db::connect_from_env().await?;
                for (id, action, details) in desk_db::recent_activity(&pool, limit).await? {
                    println!("{id} {action} {details}");
                }
            }
        },
    }

    Ok(())
}

/// Logs go to stderr; stdout carries only `key=value` output.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
