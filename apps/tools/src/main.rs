use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use server_api::last_name_pattern;
use services::OwnerService;
use shared::{
    domain::{Owner, OwnerId},
    validation::validate_owner,
};
use storage::{Storage, StorageOptions};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/petclinic.db")]
    database_url: String,
    /// Match last names with case-sensitive LIKE.
    #[arg(long)]
    case_sensitive: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    AddOwner {
        first_name: String,
        last_name: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        telephone: String,
    },
    FindOwners {
        #[arg(default_value = "")]
        last_name: String,
    },
    ShowOwner {
        owner_id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::with_options(
        &cli.database_url,
        StorageOptions {
            case_sensitive_last_name: cli.case_sensitive,
        },
    )
    .await?;

    match cli.command {
        Command::AddOwner {
            first_name,
            last_name,
            address,
            city,
            telephone,
        } => {
            let owner = Owner {
                address,
                city,
                telephone,
                ..Owner::new(None, first_name, last_name)
            };
            let result = validate_owner(&owner);
            if result.has_errors() {
                for error in result.field_errors() {
                    eprintln!("{}: {}", error.field, error.message);
                }
                bail!("owner rejected");
            }
            let saved = storage.save(owner).await?;
            let owner_id = created_owner_id(&saved)?;
            println!("created owner_id={owner_id}");
        }
        Command::FindOwners { last_name } => {
            let owners = storage
                .find_all_by_last_name_like(&last_name_pattern(&last_name))
                .await?;
            for owner in owners {
                print_owner(&owner);
            }
        }
        Command::ShowOwner { owner_id } => match storage.find_by_id(OwnerId(owner_id)).await? {
            Some(owner) => print_owner(&owner),
            None => bail!("owner {owner_id} not found"),
        },
    }

    Ok(())
}

fn created_owner_id(saved: &Owner) -> Result<OwnerId> {
    match saved.id {
        Some(owner_id) => Ok(owner_id),
        None => bail!("saved owner {} {} has no id", saved.first_name, saved.last_name),
    }
}

fn print_owner(owner: &Owner) {
    let id = owner.id.map(|id| id.to_string()).unwrap_or_default();
    println!(
        "{id}\t{} {}\t{}, {}\t{}",
        owner.first_name, owner.last_name, owner.address, owner.city, owner.telephone
    );
}
