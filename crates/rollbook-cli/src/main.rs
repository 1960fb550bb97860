use clap::{Parser, Subcommand};
use dialoguer::{Confirm, Input};
use dotenvy::dotenv;
use rollbook_auth::issue_identity_token;
use rollbook_cli::{admin, seeder};
use rollbook_config::{IdentityConfig, RegistryConfig, StudentCodeConfig};
use rollbook_db::{Registry, connect_registry};
use rollbook_models::{Role, allocate_next, find_gaps};

#[derive(Parser)]
#[command(name = "rollbook-cli")]
#[command(about = "Rollbook CLI - Administrative tools for Rollbook", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an admin record for an identity already set up with the provider
    CreateAdmin {
        /// Identity-provider UID of the admin
        #[arg(short = 'u', long)]
        auth_uid: Option<String>,

        #[arg(short = 'f', long)]
        first_name: Option<String>,

        #[arg(short = 'l', long)]
        last_name: Option<String>,

        #[arg(short = 'e', long)]
        email: Option<String>,
    },
    /// Show the code the next student would receive
    NextCode,
    /// List unused student codes below the highest one
    Gaps,
    /// Renumber all students gaplessly in registration order
    Reassign {
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Seed fake students and teachers
    Seed {
        #[arg(short = 's', long, default_value = "25")]
        students: usize,

        #[arg(short = 't', long, default_value = "5")]
        teachers: usize,
    },
    /// Delete every seeded record
    ClearSeed,
    /// Sign a development identity token with the configured secret
    IssueToken {
        /// Identity-provider UID to put in `sub`
        uid: String,

        #[arg(short = 'e', long)]
        email: Option<String>,

        #[arg(short = 'n', long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    if let Commands::IssueToken { uid, email, name } = &cli.command {
        handle_issue_token(uid, email.as_deref(), name.as_deref());
        return;
    }

    let registry_config = RegistryConfig::from_env();
    let registry = match connect_registry(&registry_config).await {
        Ok(registry) => registry,
        Err(e) => fail("Error opening registry", e),
    };

    match cli.command {
        Commands::CreateAdmin {
            auth_uid,
            first_name,
            last_name,
            email,
        } => handle_create_admin(&registry, auth_uid, first_name, last_name, email).await,
        Commands::NextCode => handle_next_code(&registry).await,
        Commands::Gaps => handle_gaps(&registry).await,
        Commands::Reassign { yes } => handle_reassign(&registry, yes).await,
        Commands::Seed { students, teachers } => handle_seed(&registry, students, teachers).await,
        Commands::ClearSeed => handle_clear_seed(&registry).await,
        Commands::IssueToken { .. } => {}
    }
}

fn fail(context: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("\n❌ {}: {}", context, err);
    std::process::exit(1);
}

fn prompt(value: Option<String>, label: &str) -> String {
    match value {
        Some(value) => value,
        None => Input::new()
            .with_prompt(label)
            .interact_text()
            .unwrap_or_else(|e| fail(&format!("Failed to read {}", label.to_lowercase()), e)),
    }
}

async fn handle_create_admin(
    registry: &Registry,
    auth_uid: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
) {
    let auth_uid = prompt(auth_uid, "Identity UID");
    let first_name = prompt(first_name, "First name");
    let last_name = prompt(last_name, "Last name");
    let email = prompt(email, "Email address");

    match admin::create_admin(registry, &auth_uid, &first_name, &last_name, &email).await {
        Ok(user) => {
            println!("\n✅ Admin created successfully!");
            println!("   ID: {}", user.id);
            println!("   Email: {}", user.email);
            println!("   Name: {}", user.full_name());
        }
        Err(e) => fail("Error creating admin", e),
    }
}

async fn handle_next_code(registry: &Registry) {
    match registry.users.student_codes().await {
        Ok(codes) => println!("{}", allocate_next(&codes)),
        Err(e) => fail("Error reading student codes", e),
    }
}

async fn handle_gaps(registry: &Registry) {
    let codes = match registry.users.student_codes().await {
        Ok(codes) => codes,
        Err(e) => fail("Error reading student codes", e),
    };

    let report = find_gaps(&codes);
    match report.highest_code {
        None => println!("No students with codes."),
        Some(highest) => {
            println!("Students: {}", report.total_students);
            println!("Highest code: {}", highest);
            if report.is_contiguous() {
                println!("✅ No gaps");
            } else {
                let gaps: Vec<String> = report.gaps.iter().map(ToString::to_string).collect();
                println!("Gaps ({}): {}", report.gap_count, gaps.join(", "));
            }
        }
    }
}

async fn handle_reassign(registry: &Registry, yes: bool) {
    if !yes {
        let confirmed = Confirm::new()
            .with_prompt("Renumber every student code? Codes shown to users will change")
            .default(false)
            .interact()
            .unwrap_or_else(|e| fail("Failed to read confirmation", e));
        if !confirmed {
            println!("Aborted.");
            return;
        }
    }

    let report = match admin::reassign_codes(registry).await {
        Ok(report) => report,
        Err(e) => fail("Error reading students", e),
    };

    for entry in &report.updated {
        println!(
            "   {} → {}",
            entry.old_code.as_deref().unwrap_or("(none)"),
            entry.new_code
        );
    }

    if report.complete {
        println!(
            "\n✅ Renumbered {} of {} students",
            report.changed, report.total_students
        );
        return;
    }

    if let Some(failed) = &report.failed {
        eprintln!(
            "\n❌ Writing {} for {} failed: {}",
            failed.new_code, failed.id, failed.error
        );
    }
    eprintln!(
        "   {} written, {} pending. Run again to finish.",
        report.updated.len(),
        report.pending.len()
    );
    std::process::exit(1);
}

async fn handle_seed(registry: &Registry, students: usize, teachers: usize) {
    let retries = StudentCodeConfig::from_env().max_conflict_retries;

    for (role, count) in [(Role::Teacher, teachers), (Role::Student, students)] {
        if let Err(e) = seeder::seed_users(registry, role, count, retries).await {
            fail("Error seeding users", e);
        }
    }
    println!("✅ Seeding complete");
}

async fn handle_clear_seed(registry: &Registry) {
    match seeder::clear_seeded(registry).await {
        Ok(count) => println!("✅ Removed {} seeded users", count),
        Err(e) => fail("Error clearing seeded users", e),
    }
}

fn handle_issue_token(uid: &str, email: Option<&str>, name: Option<&str>) {
    let config = IdentityConfig::from_env();
    match issue_identity_token(uid, email, name, &config) {
        Ok(token) => println!("{}", token),
        Err(e) => fail("Error signing token", e),
    }
}
