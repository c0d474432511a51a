use tracing::info;
use tracing_subscriber::EnvFilter;

use postagger::error::{Error, Result};
use postagger::pipeline::TrainerTool;
use postagger::sample::FileSampleStream;

use super::args::CliArgs;

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed when embedded; keep that one.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

pub fn run(args: CliArgs) -> Result<()> {
    init_logging(args.log);

    let samples = FileSampleStream::open(&args.data).map_err(|e| {
        Error::io(format!("opening training data '{}'", args.data.display()), e)
    })?;
    info!(data = %args.data.display(), "Reading training data");

    let mut tool = TrainerTool::new(args.trainer_params());
    tool.run(samples)
}
