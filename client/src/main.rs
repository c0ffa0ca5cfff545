use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand};
use log::error;

use severity_client::{
    FormInputs, FormSource, HttpPredictionService, PredictorController, RenderedPrediction,
    ResultView,
};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

#[derive(Parser, Debug)]
#[command(author, version, about = "Traffic accident severity prediction client", long_about = None)]
struct Cli {
    /// Base URL of the prediction service
    #[arg(long, env = "PREDICTOR_URL", default_value = DEFAULT_BASE_URL)]
    url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one prediction request built from the form fields
    Predict(PredictArgs),
    /// Print the service health document
    Health,
}

/// One flag per form field. Values are kept raw; unparseable numbers are
/// sent as null.
#[derive(Args, Debug)]
struct PredictArgs {
    /// State / UT / city name
    #[arg(long, default_value = "")]
    state_ut_city: String,

    #[arg(long, default_value = "", allow_hyphen_values = true)]
    road_accidents_cases: String,

    #[arg(long, default_value = "", allow_hyphen_values = true)]
    road_accidents_injured: String,

    #[arg(long, default_value = "", allow_hyphen_values = true)]
    road_accidents_died: String,

    #[arg(long, default_value = "", allow_hyphen_values = true)]
    total_traffic_accidents_cases: String,

    #[arg(long, default_value = "", allow_hyphen_values = true)]
    total_traffic_accidents_injured: String,

    #[arg(long, default_value = "", allow_hyphen_values = true)]
    total_traffic_accidents_died: String,

    /// Derive fatality ratios before sending
    #[arg(long, action = ArgAction::SetTrue)]
    compute_ratios: bool,
}

impl FormSource for PredictArgs {
    fn read(&self) -> FormInputs {
        FormInputs {
            state_ut_city: self.state_ut_city.clone(),
            road_accidents_cases: self.road_accidents_cases.clone(),
            road_accidents_injured: self.road_accidents_injured.clone(),
            road_accidents_died: self.road_accidents_died.clone(),
            total_traffic_accidents_cases: self.total_traffic_accidents_cases.clone(),
            total_traffic_accidents_injured: self.total_traffic_accidents_injured.clone(),
            total_traffic_accidents_died: self.total_traffic_accidents_died.clone(),
            compute_ratios: self.compute_ratios,
        }
    }
}

/// Pending and error text on stderr, the prediction on stdout.
struct TerminalView;

impl ResultView for TerminalView {
    fn show_pending(&self, placeholder: &str) {
        eprintln!("{}", placeholder);
    }

    fn show_prediction(&self, rendered: &RenderedPrediction) {
        println!("{}", rendered);
    }

    fn show_error(&self, message: &str) {
        eprintln!("{}", message);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .format_module_path(false)
        .init();

    let cli = Cli::parse();

    let service = match HttpPredictionService::new(&cli.url) {
        Ok(service) => service,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::Predict(args) => {
            let controller = PredictorController::new(args, service, TerminalView);
            match controller.predict().await {
                Ok(_) => ExitCode::SUCCESS,
                Err(_) => ExitCode::FAILURE,
            }
        }
        Command::Health => match service.health().await {
            Ok(doc) => {
                println!("{}", serde_json::to_string_pretty(&doc).unwrap_or_else(|_| doc.to_string()));
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}
