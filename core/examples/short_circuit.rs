// strand_core/examples/short_circuit.rs

use strand::{action, Pipeline, PipelineControl, PipelineResult, StrandError};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
enum Reply {
  Amount(i64),
  Rejected(String),
}

#[derive(Debug, thiserror::Error)]
enum AppError {
  #[error("Strand: {0}")]
  Strand(#[from] StrandError),
  #[error("Overflow while processing {0}")]
  Overflow(i64),
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
  info!("--- Short-Circuit Example ---");

  let pipeline: Pipeline<&str, Reply, AppError> = Pipeline::new();

  // A guard ends the run early; its payload becomes the result.
  pipeline.put(
    "guard",
    action::from_fn(|reply: Reply| match reply {
      Reply::Amount(n) if n < 0 => {
        warn!("Negative amount {}, rejecting.", n);
        Ok(PipelineControl::ShortCircuit(Reply::Rejected("blocked".to_string())))
      }
      other => Ok(PipelineControl::Continue(other)),
    }),
  );
  pipeline.put(
    "double",
    action::map(|reply: Reply| match reply {
      Reply::Amount(n) => n.checked_mul(2).map(Reply::Amount).ok_or(AppError::Overflow(n)),
      other => Ok(other),
    }),
  );

  for input in [Reply::Amount(2), Reply::Amount(-1)] {
    match pipeline.run_async(input.clone()).await? {
      PipelineResult::Completed(out) => info!("{:?} completed with {:?}", input, out),
      PipelineResult::ShortCircuited(out) => info!("{:?} short-circuited with {:?}", input, out),
    }
  }

  // A step error is not a short-circuit: it aborts the run and is returned as-is.
  match pipeline.execute(Reply::Amount(i64::MAX)) {
    Err(e) => info!("Run failed as expected: {}", e),
    Ok(out) => warn!("Unexpected success: {:?}", out),
  }

  Ok(())
}
