//! Session profile management commands.

use clap::{Args, Subcommand};
use openasio_config::{
    FACTORY_PROFILE_NAMES, SessionProfile, list_user_profiles, paths, resolve_profile,
    user_profiles_dir,
};
use openasio_core::StreamConfig;

use super::common::StreamArgs;

#[derive(Args)]
pub struct ProfilesArgs {
    #[command(subcommand)]
    command: ProfilesCommand,
}

#[derive(Subcommand)]
enum ProfilesCommand {
    /// List factory and user profiles
    List,

    /// Print a profile as TOML
    Show {
        /// Profile name or path
        name: String,
    },

    /// Save stream flags as a user profile
    Save {
        /// Name for the new profile
        name: String,

        /// Device name to record
        #[arg(short, long)]
        device: Option<String>,

        /// Description of the profile
        #[arg(long)]
        description: Option<String>,

        #[command(flatten)]
        stream: StreamArgs,

        /// Overwrite if the profile already exists
        #[arg(long)]
        force: bool,
    },
}

pub fn run(args: ProfilesArgs) -> anyhow::Result<()> {
    match args.command {
        ProfilesCommand::List => {
            println!("Factory profiles:");
            for name in FACTORY_PROFILE_NAMES {
                println!("  {name}");
            }

            let user = list_user_profiles();
            println!("\nUser profiles ({}):", user_profiles_dir().display());
            if user.is_empty() {
                println!("  (none)");
            }
            for path in &user {
                if let Some(name) = paths::profile_name_from_path(path) {
                    println!("  {name}");
                }
            }
        }

        ProfilesCommand::Show { name } => {
            let profile = resolve_profile(&name)?;
            print!("{}", profile.to_toml()?);
        }

        ProfilesCommand::Save {
            name,
            device,
            description,
            stream,
            force,
        } => {
            let mut profile =
                SessionProfile::new(&name).with_stream(stream.apply(StreamConfig::default()));
            profile.device = device;
            profile.description = description;
            profile.validate()?;

            let dir = paths::ensure_user_profiles_dir()?;
            let path = paths::profile_path_in(&dir, &name);
            if path.exists() && !force {
                anyhow::bail!(
                    "profile '{}' already exists at {} (use --force to overwrite)",
                    name,
                    path.display()
                );
            }
            profile.save(&path)?;
            println!("Saved profile '{}' to {}", name, path.display());
        }
    }
    Ok(())
}
