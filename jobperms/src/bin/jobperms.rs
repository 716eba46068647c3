use clap::{
    Parser,
    Subcommand,
};
use jobcore::{
    access::AccessLevel,
    perms::{
        AttributeValues,
        PermissionDef,
    },
    role::RoleGrant,
};
use jobdb::{Backend, ConnectorOption};
use jobperms::{
    platform::Builder as PlatformBuilder,
    Platform,
    Registry,
};
use std::{
    collections::BTreeMap,
    path::PathBuf,
    time::Instant,
};

#[derive(Debug, Parser)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[clap(long, value_name = "JOBPERMS_DB_URL", env = "JOBPERMS_DB_URL")]
    jobperms_db_url: String,
    /// JSON file holding the list of permission definitions
    #[clap(long, value_name = "JOBPERMS_DEFS", env = "JOBPERMS_DEFS")]
    jobperms_defs: Option<PathBuf>,
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(arg_required_else_help = true)]
    Perm {
        #[command(subcommand)]
        cmd: PermCmd,
    },
    #[command(arg_required_else_help = true)]
    Role {
        #[command(subcommand)]
        cmd: RoleCmd,
    },
    #[command(arg_required_else_help = true)]
    User {
        user_id: i64,
        #[command(subcommand)]
        cmd: UserCmd,
    },
    /// Checks whether the user acting in the job at the grade holds the
    /// permission
    #[command(arg_required_else_help = true)]
    Can {
        user_id: i64,
        job: String,
        grade: i32,
        category: String,
        name: String,
        #[arg(long)]
        superuser: bool,
    },
    #[command(arg_required_else_help = true)]
    Access {
        #[command(subcommand)]
        cmd: AccessCmd,
    },
}

#[derive(Debug, Subcommand)]
enum PermCmd {
    /// Stores every defined permission
    Sync,
    List,
}

#[derive(Debug, Subcommand)]
enum RoleCmd {
    #[command(arg_required_else_help = true)]
    Create {
        guard_name: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
    },
    #[command(arg_required_else_help = true)]
    Delete {
        role_id: i64,
    },
    #[command(arg_required_else_help = true)]
    List {
        job: String,
    },
    #[command(arg_required_else_help = true)]
    Show {
        role_id: i64,
    },
    /// Grants a permission to the role
    #[command(arg_required_else_help = true)]
    Grant {
        role_id: i64,
        permission_id: i64,
        /// Attribute values as a JSON object keyed by attribute key
        #[arg(long)]
        attributes: Option<String>,
    },
    /// Revokes a permission from the role
    #[command(arg_required_else_help = true)]
    Revoke {
        role_id: i64,
        permission_id: i64,
    },
}

#[derive(Debug, Subcommand)]
enum UserCmd {
    #[command(arg_required_else_help = true)]
    Assign {
        role_id: i64,
    },
    #[command(arg_required_else_help = true)]
    Revoke {
        role_id: i64,
    },
    Roles,
    /// Lists the permissions granted through the assigned roles
    Perms,
    /// Lists the suffixes of the permissions starting with the prefix
    /// held by the user acting in the job at the grade
    #[command(arg_required_else_help = true)]
    Suffix {
        job: String,
        grade: i32,
        prefix: String,
    },
}

#[derive(Debug, Subcommand)]
enum AccessCmd {
    #[command(arg_required_else_help = true)]
    Show {
        resource: String,
    },
    /// Checks the access the user acting in the job at the grade has to
    /// the resource
    #[command(arg_required_else_help = true)]
    Check {
        resource: String,
        user_id: i64,
        job: String,
        grade: i32,
        #[arg(value_enum)]
        level: AccessLevel,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();
    stderrlog::new()
        .module(module_path!())
        .module("jobperms")
        .module("jobrbac")
        .module("jobdb_sqlite")
        .verbosity((args.verbose as usize) + 1)
        .timestamp(stderrlog::Timestamp::Second)
        .init()?;

    let mut registry = Registry::new();
    if let Some(path) = args.jobperms_defs {
        let defs: Vec<PermissionDef> = serde_json::from_slice(&std::fs::read(&path)?)?;
        registry.register(defs)?;
        log::info!("loaded {} permission definition(s) from {path:?}", registry.len());
    }

    let platform = PlatformBuilder::new()
        .boxed_perms_platform(
            Backend::perms(
                ConnectorOption::from(args.jobperms_db_url)
                    .auto_create_db(true)
            )
                .await
                .map_err(anyhow::Error::from_boxed)?
        )
        .registry(registry)
        .build()?;

    match args.command {
        Commands::Perm { cmd } => {
            parse_perm(&platform, cmd).await?;
        },
        Commands::Role { cmd } => {
            parse_role(&platform, cmd).await?;
        },
        Commands::User { user_id, cmd } => {
            parse_user(&platform, user_id, cmd).await?;
        },
        Commands::Can { user_id, job, grade, category, name, superuser } => {
            let instant = Instant::now();
            let identity = platform.resolve_identity(user_id, &job, grade, superuser).await?;
            let permit = if platform.can(&identity, &category, &name).await? {
                "permitted"
            } else {
                "not permitted"
            };
            let elapsed = instant.elapsed();
            println!("{}", serde_json::to_string_pretty(&platform.generate_policy(&identity).await?)?);
            println!("{identity} {permit} {category}.{name}; check took {elapsed:?}");
        },
        Commands::Access { cmd } => {
            parse_access(&platform, cmd).await?;
        },
    }

    Ok(())
}

async fn parse_perm(
    platform: &Platform,
    arg: PermCmd,
) -> anyhow::Result<()> {
    let permissions = match arg {
        PermCmd::Sync => platform.sync_permissions().await?,
        PermCmd::List => platform.list_permissions().await?,
    };
    for perm in permissions.into_iter() {
        println!("{}\t{}", perm.id, perm.guard_name);
    }
    Ok(())
}

async fn parse_role(
    platform: &Platform,
    arg: RoleCmd,
) -> anyhow::Result<()> {
    match arg {
        RoleCmd::Create { guard_name, name, description } => {
            let name = name.as_deref().unwrap_or(&guard_name);
            let role = platform.create_role_with_guard(name, &guard_name, &description).await?;
            println!("role {:?} created with id {}", role.guard_name, role.id);
        }
        RoleCmd::Delete { role_id } => {
            let role = platform.delete_role(role_id).await?;
            println!("role {:?} deleted", role.guard_name);
        }
        RoleCmd::List { job } => {
            for role in platform.list_roles(&job).await?.into_iter() {
                println!("{}\t{}\t{}", role.id, role.guard_name, role.name);
            }
        }
        RoleCmd::Show { role_id } => {
            match platform.get_role(role_id).await? {
                Some(role) => {
                    println!("{}", serde_json::to_string_pretty(&role)?);
                    let permissions = platform.get_role_permissions(role_id).await?;
                    println!("{}", serde_json::to_string_pretty(&permissions)?);
                }
                None => println!("no role with id {role_id}"),
            }
        }
        RoleCmd::Grant { role_id, permission_id, attributes } => {
            let attributes: BTreeMap<String, AttributeValues> = match attributes {
                Some(s) => serde_json::from_str(&s)?,
                None => BTreeMap::new(),
            };
            let grant = RoleGrant {
                permission_id,
                attributes,
            };
            platform.add_permissions_to_role(role_id, &[grant]).await?;
            println!("permission {permission_id} granted to role {role_id}");
        }
        RoleCmd::Revoke { role_id, permission_id } => {
            platform.remove_permissions_from_role(role_id, &[permission_id]).await?;
            println!("permission {permission_id} revoked from role {role_id}");
        }
    }
    Ok(())
}

async fn parse_user(
    platform: &Platform,
    user_id: i64,
    arg: UserCmd,
) -> anyhow::Result<()> {
    match arg {
        UserCmd::Assign { role_id } => {
            if platform.grant_role_to_user(user_id, role_id).await? {
                println!("role {role_id} assigned to user {user_id}");
            } else {
                println!("role {role_id} was already assigned to user {user_id}");
            }
        }
        UserCmd::Revoke { role_id } => {
            if platform.revoke_role_from_user(user_id, role_id).await? {
                println!("role {role_id} revoked from user {user_id}");
            } else {
                println!("user {user_id} has no role {role_id} to be revoked");
            }
        }
        UserCmd::Roles => {
            for role in platform.get_roles_for_user(user_id).await?.into_iter() {
                println!("{}\t{}", role.id, role.guard_name);
            }
        }
        UserCmd::Perms => {
            for perm in platform.get_permissions_for_user(user_id).await?.into_iter() {
                println!("{}\t{}", perm.id, perm.guard_name);
            }
        }
        UserCmd::Suffix { job, grade, prefix } => {
            let identity = platform.resolve_identity(user_id, &job, grade, false).await?;
            let suffixes = platform
                .get_suffix_of_permissions_by_prefix_of_user(&identity, &prefix)
                .await?;
            println!("{}", suffixes.join("\n"));
        }
    }
    Ok(())
}

async fn parse_access(
    platform: &Platform,
    arg: AccessCmd,
) -> anyhow::Result<()> {
    match arg {
        AccessCmd::Show { resource } => {
            for entry in platform.get_job_access(&resource).await?.into_iter() {
                println!("job {}:{}\t{}", entry.job, entry.minimum_grade, entry.access);
            }
            for entry in platform.get_user_access(&resource).await?.into_iter() {
                println!("user {}\t{}", entry.user_id, entry.access);
            }
            for entry in platform.get_resource_access(&resource).await?.into_iter() {
                println!("resource {}\t{}", entry.target_resource, entry.access);
            }
        }
        AccessCmd::Check { resource, user_id, job, grade, level } => {
            let identity = platform.resolve_identity(user_id, &job, grade, false).await?;
            let permit = if platform.check_resource_access(&identity, &resource, level).await? {
                "permitted"
            } else {
                "not permitted"
            };
            println!("{identity} {permit} {level} access to {resource}");
        }
    }
    Ok(())
}
