use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use artemis_cr_reducer::{
    cluster::{BrokerResources, CertManagerInventory},
    crd::ActiveMQArtemis,
    reducer::{
        self, new_artemis_cr, new_broker_712, Action, BrokerVersion, FormState, GlobalAction,
        IngressDomain, V712Action,
    },
    settings::Settings,
};
use clap::{Args, Parser, Subcommand};
use kube::{Client, Config, CustomResourceExt, Resource};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct MainArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    GenerateCrds,

    /// Prints a new broker.
    New(NewArgs),

    /// Replays a log of form actions onto a broker and prints the result.
    Apply(ApplyArgs),

    /// Submits a broker to the cluster.
    Create(CreateArgs),

    /// Reports whether cert-manager is installed and which issuers it offers.
    CertManager(CertManagerArgs),
}

#[derive(Args)]
struct NewArgs {
    #[arg(long, short)]
    namespace: Option<String>,

    #[arg(long, default_value = "7.13")]
    broker_version: BrokerVersion,

    #[arg(long)]
    restricted: bool,
}

#[derive(Args)]
struct ApplyArgs {
    /// YAML file holding the broker.
    #[arg(long)]
    cr: PathBuf,

    /// YAML or JSON file holding a list of `{operation, payload}` actions.
    #[arg(long)]
    actions: PathBuf,

    #[arg(long, default_value = "7.13")]
    broker_version: BrokerVersion,
}

#[derive(Args)]
struct CreateArgs {
    #[arg(long)]
    cr: PathBuf,

    #[arg(long, default_value = "7.13")]
    broker_version: BrokerVersion,

    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct CertManagerArgs {
    #[arg(long, short)]
    namespace: Option<String>,
}

fn generate_crds<W: Write>(writer: W) -> anyhow::Result<()> {
    serde_yaml::to_writer(writer, &ActiveMQArtemis::crd()).with_context(|| {
        format!(
            "failed to generate {} definition",
            ActiveMQArtemis::kind(&())
        )
    })
}

fn write_cr<W: Write>(writer: W, cr: &ActiveMQArtemis) -> anyhow::Result<()> {
    serde_yaml::to_writer(writer, cr)
        .with_context(|| format!("failed to serialize {} {}", ActiveMQArtemis::kind(&()), cr.name()))
}

fn read_cr(path: &Path) -> anyhow::Result<ActiveMQArtemis> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

/// Loads an existing broker into the form, the way the YAML editor does.
fn load_state(cr: ActiveMQArtemis, version: BrokerVersion) -> anyhow::Result<FormState> {
    let state = FormState {
        broker_version: version,
        ..Default::default()
    };
    let state = reducer::dispatch(
        &state,
        GlobalAction::SetModel {
            model: Box::new(cr),
            is_set_by_user: false,
        }
        .into(),
    )?;

    Ok(state)
}

fn namespace_or_default(namespace: Option<String>, settings: &Settings) -> String {
    namespace
        .or_else(|| settings.namespace.clone())
        .unwrap_or_else(|| "default".into())
}

fn new_broker(args: NewArgs, settings: &Settings) -> anyhow::Result<()> {
    let namespace = namespace_or_default(args.namespace, settings);
    let mut state = match args.broker_version {
        BrokerVersion::V712 => new_broker_712(&namespace),
        BrokerVersion::V713 => new_artemis_cr(&namespace),
    };

    if let Some(ingress_domain) = settings.ingress_domain.clone() {
        state = reducer::dispatch(
            &state,
            V712Action::SetIngressDomain(IngressDomain::new(ingress_domain, false)).into(),
        )?;
    }

    if args.restricted {
        state = reducer::dispatch(&state, GlobalAction::SetIsRestricted(true).into())?;
    }

    write_cr(io::stdout(), &state.cr)
}

fn apply_actions(args: ApplyArgs) -> anyhow::Result<()> {
    let state = load_state(read_cr(&args.cr)?, args.broker_version)?;

    let content = fs::read_to_string(&args.actions)
        .with_context(|| format!("failed to read {}", args.actions.display()))?;
    let actions: Vec<Action> = serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse actions from {}", args.actions.display()))?;

    let state = actions
        .into_iter()
        .enumerate()
        .try_fold(state, |state, (i, action)| {
            let name = action.name();
            reducer::dispatch(&state, action)
                .with_context(|| format!("action #{i} ({name}) failed"))
        })?;

    if !reducer::are_mandatory_values_set(&state) {
        warn!(name = state.cr.name(), "broker is missing mandatory values");
    }

    write_cr(io::stdout(), &state.cr)
}

async fn create_broker(args: CreateArgs, settings: &Settings) -> anyhow::Result<()> {
    let state = load_state(read_cr(&args.cr)?, args.broker_version)?;
    anyhow::ensure!(
        reducer::are_mandatory_values_set(&state),
        "{} {} is missing mandatory values",
        ActiveMQArtemis::kind(&()),
        state.cr.name()
    );

    let config = Config::infer()
        .await
        .context("failed to infer kube config")?;
    let client = Client::try_from(config).context("failed to build kube client")?;

    let namespace = state.cr.namespace().to_string();
    let created = BrokerResources::new(client, &namespace, settings.field_manager.clone())
        .create(&state.cr, args.dry_run)
        .await?;

    write_cr(io::stdout(), &created)
}

async fn cert_manager(args: CertManagerArgs, settings: &Settings) -> anyhow::Result<()> {
    let namespace = namespace_or_default(args.namespace, settings);

    let config = Config::infer()
        .await
        .context("failed to infer kube config")?;
    let client = Client::try_from(config).context("failed to build kube client")?;
    let inventory = CertManagerInventory::new(client);

    if !inventory.is_installed().await? {
        info!("cert-manager is not installed");
        return Ok(());
    }

    let issuers = inventory.list_issuers(&namespace).await?;
    info!(
        namespaced = issuers.namespaced.len(),
        cluster = issuers.cluster.len(),
        "cert-manager is installed"
    );

    let mut stdout = io::stdout().lock();
    for issuer in issuers.names() {
        writeln!(stdout, "{issuer}")?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let settings = Settings::from_env()?;

    let MainArgs { command } = MainArgs::parse();
    match command {
        Command::GenerateCrds => generate_crds(io::stdout()),
        Command::New(args) => new_broker(args, &settings),
        Command::Apply(args) => apply_actions(args),
        Command::Create(args) => create_broker(args, &settings).await,
        Command::CertManager(args) => cert_manager(args, &settings).await,
    }
}
