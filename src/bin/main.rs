use std::error::Error;

use clap::Parser;
use jwt_issuer::Issuer;
use jwt_issuer::commands::generate_key::GenerateKeyCommand;
use jwt_issuer::commands::issue::IssueCommand;
use jwt_issuer::commands::key_info::KeyInfoCommand;
use jwt_issuer::key::local::LocalCreator;
use jwt_issuer::parameters::{Commands, KeyInfoArgs, LogLevel};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "jwt-issuer-cli")]
struct Cli {
    /// Verbosity of the logs written to stderr.
    #[arg(long, global = true, env = "JWT_ISSUER_LOG_LEVEL", default_value = "INFO")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::from(cli.log_level))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Issue { signer } => {
            let issue_args = signer.issue_args();
            let request = issue_args.build_request()?;
            let (jwt_signer, key_id) = signer.build_signer()?;
            debug!(kid = %key_id, "signer ready");

            let command = IssueCommand::new(Issuer::new(jwt_signer, key_id));
            let output = command.issue(request, issue_args.output_format)?;
            println!("{output}");
        }
        Commands::GenerateKey(args) => {
            let creator = LocalCreator::try_from(args.output_dir)?;
            let key_info = GenerateKeyCommand::new(creator).generate(args.name)?;
            println!("{}", serde_json::to_string_pretty(&key_info)?);
        }
        Commands::KeyInfo {
            source: KeyInfoArgs::Vault(vault),
        } => {
            let command = KeyInfoCommand::new(vault.transit_client()?);
            let key_info = command.key_info(vault.transit_key(), &vault.key_id())?;
            println!("{}", serde_json::to_string_pretty(&key_info)?);
        }
    }
    Ok(())
}
