use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kcat_hub::aggregate::{DisplayRecord, merge};
use kcat_hub::app::Workbench;
use kcat_hub::auth::LoginRedirect;
use kcat_hub::config::{ConfigLoader, ResolvedConfig};
use kcat_hub::dltkcat::DltKcatHttpClient;
use kcat_hub::domain::{
    ModelARequest, ModelBRequest, PredictionResult, QueryFilter, SourceModel, parse_temperature,
};
use kcat_hub::enzyme_api::EnzymeHttpClient;
use kcat_hub::error::{KcatError, Operation};
use kcat_hub::output::{JsonOutput, OutputMode, TableOutput};
use kcat_hub::pubchem::PubchemHttpClient;
use kcat_hub::session::{SessionStore, User};
use kcat_hub::unikp::UniKpHttpClient;

type CliWorkbench =
    Workbench<EnzymeHttpClient, UniKpHttpClient, DltKcatHttpClient, PubchemHttpClient, CliRedirect>;

#[derive(Parser)]
#[command(name = "kcat-hub")]
#[command(about = "Search measured enzyme kcat values and predict new ones with UniKP and DLTKcat")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Record a token issued by the enzyme database login")]
    Login(LoginArgs),
    #[command(about = "Forget the stored session")]
    Logout,
    #[command(about = "Show the logged-in user")]
    Whoami,
    #[command(about = "Search measured kcat records")]
    Search(SearchArgs),
    #[command(about = "Predict kcat with one or both models")]
    Predict(PredictArgs),
}

#[derive(Args)]
struct LoginArgs {
    #[arg(long)]
    token: String,

    #[arg(long)]
    user_id: u64,

    #[arg(long)]
    username: String,

    #[arg(long)]
    email: String,
}

#[derive(Args)]
struct SearchArgs {
    #[arg(long)]
    ec_number: Option<String>,

    #[arg(long)]
    prot_id: Option<String>,

    #[arg(long)]
    substrate: Option<String>,

    #[arg(long)]
    smiles: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModelChoice {
    A,
    B,
    Both,
}

#[derive(Args)]
struct PredictArgs {
    #[arg(long, value_enum, default_value = "both")]
    model: ModelChoice,

    #[arg(long)]
    smiles: String,

    #[arg(long)]
    sequence: String,

    #[arg(long)]
    temperature: Option<String>,

    #[arg(long)]
    save: bool,
}

struct CliRedirect;

impl LoginRedirect for CliRedirect {
    fn redirect_to_login(&self) {
        eprintln!("session cleared; log in again with `kcat-hub login`");
    }
}

/// A failure whose user-facing message has already been printed.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("{0}")]
struct Reported(KcatError);

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            if report.downcast_ref::<Reported>().is_none() {
                eprintln!("{report:?}");
            }
            ExitCode::from(report_exit_code(&report))
        }
    }
}

fn report_exit_code(report: &miette::Report) -> u8 {
    report
        .downcast_ref::<Reported>()
        .map(|Reported(err)| err)
        .or_else(|| report.downcast_ref::<KcatError>())
        .map_or(1, map_exit_code)
}

fn map_exit_code(error: &KcatError) -> u8 {
    match error {
        KcatError::Validation { .. } => 2,
        KcatError::Upstream { .. } | KcatError::Network(_) | KcatError::MalformedResponse(_) => 3,
        KcatError::AuthExpired | KcatError::AuthForbidden => 4,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let session = match config.session_path.clone() {
        Some(path) => SessionStore::load(path),
        None => SessionStore::in_memory(),
    };

    match cli.command {
        Commands::Login(args) => {
            let user = User {
                id: args.user_id,
                username: args.username,
                email: args.email,
            };
            session.set_session(args.token, user)?;
            println!("logged in");
            Ok(())
        }
        Commands::Logout => {
            session.clear();
            println!("logged out");
            Ok(())
        }
        Commands::Whoami => {
            let user = session.user();
            match output_mode {
                OutputMode::NonInteractive => {
                    JsonOutput::print_user(user.as_ref()).into_diagnostic()
                }
                OutputMode::Interactive => {
                    match user {
                        Some(user) => {
                            println!("{} <{}> (id {})", user.username, user.email, user.id)
                        }
                        None => println!("not logged in"),
                    }
                    Ok(())
                }
            }
        }
        Commands::Search(args) => {
            let workbench = build_workbench(&config, session)?;
            run_async(run_search(args, workbench, output_mode))
        }
        Commands::Predict(args) => {
            let workbench = build_workbench(&config, session)?;
            run_async(run_predict(args, workbench, output_mode))
        }
    }
}

fn build_workbench(
    config: &ResolvedConfig,
    session: SessionStore,
) -> Result<CliWorkbench, KcatError> {
    let timeout = config.request_timeout;
    Ok(Workbench::new(
        session,
        EnzymeHttpClient::new(&config.backend_url, timeout)?,
        UniKpHttpClient::new(&config.model_a_url, timeout)?,
        DltKcatHttpClient::new(&config.model_b_url, timeout)?,
        PubchemHttpClient::new(&config.lookup_url, timeout)?,
        CliRedirect,
        config.auth_redirect_delay,
    ))
}

fn run_async<F>(future: F) -> miette::Result<()>
where
    F: Future<Output = miette::Result<()>>,
{
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .into_diagnostic()?
        .block_on(future)
}

async fn run_search(
    args: SearchArgs,
    workbench: CliWorkbench,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let filter = QueryFilter {
        ec_number: args.ec_number,
        prot_id: args.prot_id,
        substrate_name: args.substrate,
        substrate_smiles: args.smiles,
    };
    let outcome = workbench.search(&filter).await;
    if let Err(err) = outcome {
        return fail(&workbench, Operation::Search, err).await;
    }
    print_records(&workbench.display_records(), output_mode)
}

async fn run_predict(
    args: PredictArgs,
    workbench: CliWorkbench,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let model_a = ModelARequest {
        substrate_smiles: args.smiles.clone(),
        protein_sequence: args.sequence.clone(),
    };
    let model_b = ModelBRequest {
        substrate_smiles: args.smiles,
        protein_sequence: args.sequence,
        temperature_celsius: model_b_temperature(args.model, args.temperature.as_deref())?,
    };

    let (result_a, result_b) = match args.model {
        ModelChoice::A => (Some(workbench.predict_model_a(&model_a).await), None),
        ModelChoice::B => (None, Some(workbench.predict_model_b(&model_b).await)),
        ModelChoice::Both => {
            let (a, b) = workbench.predict_both(&model_a, &model_b).await;
            (Some(a), Some(b))
        }
    };

    let mut first_error = None;
    let mut succeeded = Vec::new();
    for (model, outcome) in [(SourceModel::A, result_a), (SourceModel::B, result_b)] {
        match outcome {
            Some(Ok(_)) => succeeded.push(model),
            Some(Err(err)) => {
                eprintln!("{}: {}", model.label(), err.user_message(Operation::Predict));
                first_error.get_or_insert(err);
            }
            None => {}
        }
    }

    let a: Vec<PredictionResult> = workbench.prediction_state(SourceModel::A).results;
    let b: Vec<PredictionResult> = workbench.prediction_state(SourceModel::B).results;
    print_records(&merge(&[], &a, &b), output_mode)?;

    if args.save {
        for model in succeeded {
            match workbench.save(model).await {
                Ok(id) => println!("{} prediction saved with id {id}", model.label()),
                Err(err) => {
                    eprintln!("{}", err.user_message(Operation::Save));
                    first_error.get_or_insert(err);
                }
            }
        }
    }

    match first_error {
        Some(err) => {
            workbench.wait_for_teardown().await;
            Err(Reported(err).into())
        }
        None => Ok(()),
    }
}

/// Only model B reads the temperature.
fn model_b_temperature(
    model: ModelChoice,
    raw: Option<&str>,
) -> Result<Option<f64>, KcatError> {
    match model {
        ModelChoice::A => Ok(None),
        ModelChoice::B | ModelChoice::Both => raw.map(parse_temperature).transpose(),
    }
}

async fn fail(
    workbench: &CliWorkbench,
    operation: Operation,
    err: KcatError,
) -> miette::Result<()> {
    eprintln!("{}", err.user_message(operation));
    workbench.wait_for_teardown().await;
    Err(Reported(err).into())
}

fn print_records(records: &[DisplayRecord], output_mode: OutputMode) -> miette::Result<()> {
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_records(records).into_diagnostic(),
        OutputMode::Interactive => TableOutput::print_records(records).into_diagnostic(),
    }
}
