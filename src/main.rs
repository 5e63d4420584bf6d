use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;

use tesuto_install::core::downloader::HttpTransportFactory;
use tesuto_install::core::instance::{InstallMarker, LoaderType, ModloaderSpec};
use tesuto_install::core::version::{ManifestResolver, MojangResolver};
use tesuto_install::{InstallerConfig, Installer, LauncherResult, RuntimeProvisioner};

#[derive(Parser)]
#[command(name = "tesuto-install", version, about = "Install game versions into instance directories")]
struct Cli {
    /// Installer config (JSON). Missing file means defaults.
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install a version into an instance directory.
    Install {
        version_id: String,

        #[arg(long, value_name = "DIR")]
        instance: PathBuf,

        /// `kind` or `kind:version`, e.g. `fabric:0.16.5`.
        #[arg(long, value_name = "LOADER")]
        loader: Option<String>,

        /// Run the pipeline even if the install marker says it is current.
        #[arg(long)]
        force: bool,
    },
    /// Download and unpack a Temurin JRE.
    Runtime {
        major: u32,

        #[arg(long, value_name = "DIR")]
        dest: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tesuto_install::init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(kind = ?e.kind(), "{}", e);
            eprintln!("{}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> LauncherResult<()> {
    let config = match &cli.config {
        Some(path) => InstallerConfig::load(path)?,
        None => InstallerConfig::from_env(),
    };

    match cli.command {
        Commands::Install {
            version_id,
            instance,
            loader,
            force,
        } => {
            let modloader = parse_loader(loader.as_deref())?;
            let resolver = MojangResolver::new(&config, &HttpTransportFactory)?;
            let descriptor = resolver.resolve(&version_id).await?;
            let installer = Installer::new(&instance, config);

            let report = if force {
                let report = installer.install(&descriptor).await?;
                InstallMarker::new(&descriptor.id, modloader)
                    .save(installer.layout().root())
                    .await?;
                Some(report)
            } else {
                installer.ensure_installed(&descriptor, &modloader).await?
            };

            match report {
                Some(report) => println!("{}", serde_json::to_string_pretty(&report)?),
                None => println!("{} is already installed in {}", version_id, instance.display()),
            }
        }
        Commands::Runtime { major, dest } => {
            match RuntimeProvisioner::new(&config).provision(major, &dest).await? {
                Some(java) => println!("{}", java.display()),
                None => println!("No packaged Java runtime for this platform"),
            }
        }
    }
    Ok(())
}

fn parse_loader(raw: Option<&str>) -> LauncherResult<ModloaderSpec> {
    let Some(raw) = raw else {
        return Ok(ModloaderSpec::vanilla());
    };
    let (kind, version) = match raw.split_once(':') {
        Some((kind, version)) => (kind, Some(version.to_string()).filter(|v| !v.is_empty())),
        None => (raw, None),
    };
    Ok(ModloaderSpec::new(kind.parse::<LoaderType>()?, version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loader_argument_forms() {
        assert_eq!(parse_loader(None).unwrap(), ModloaderSpec::vanilla());
        assert_eq!(
            parse_loader(Some("fabric:0.16.5")).unwrap(),
            ModloaderSpec::new(LoaderType::Fabric, Some("0.16.5".into()))
        );
        assert_eq!(
            parse_loader(Some("forge")).unwrap(),
            ModloaderSpec::new(LoaderType::Forge, None)
        );
        assert!(parse_loader(Some("rift:1.0")).is_err());
    }

    #[test]
    fn cli_parses_install() {
        let cli = Cli::try_parse_from([
            "tesuto-install",
            "install",
            "1.21.1",
            "--instance",
            "/tmp/inst",
            "--loader",
            "quilt",
            "--force",
        ])
        .unwrap();
        match cli.command {
            Commands::Install {
                version_id, force, ..
            } => {
                assert_eq!(version_id, "1.21.1");
                assert!(force);
            }
            Commands::Runtime { .. } => panic!("expected install"),
        }
    }
}
