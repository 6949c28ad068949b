// strand_core/examples/basic_pipeline.rs

use strand::{action, Pipeline, StrandError, StrandResult};
use tracing::info;

#[tokio::main]
async fn main() -> StrandResult<()> {
  // Initialize tracing (optional, for demonstration)
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Basic Pipeline Example ---");

  // 1. Create a pipeline keyed by &str, folding i64 values.
  //    The error type defaults to StrandError.
  let pipeline: Pipeline<&str, i64> = Pipeline::new();

  // 2. Bind actions to keys; new keys are appended in order.
  pipeline.put("double", action::map(|x: i64| Ok::<_, StrandError>(x * 2)));
  pipeline.put("incr", action::map(|x: i64| Ok::<_, StrandError>(x + 1)));

  let result = pipeline.execute(3)?;
  info!("{:?} execute(3) = {}", pipeline.keys(), result);
  assert_eq!(result, 7);

  // 3. Splice a step between the two existing ones.
  pipeline.insert_before(&"incr", "halve", action::map(|x: i64| Ok::<_, StrandError>(x / 2)))?;

  // 4. Run the same chain as a sequence of scheduled units of work.
  let result = pipeline.execute_async(4).await?;
  info!("{:?} execute_async(4) = {}", pipeline.keys(), result);
  assert_eq!(result, 5);

  // 5. Rebind a step in place; its position does not change.
  pipeline.put("incr", action::map(|x: i64| Ok::<_, StrandError>(x + 100)));
  info!("After rebinding 'incr': execute(4) = {}", pipeline.execute(4)?);

  // 6. Remove a step.
  pipeline.remove(&"halve");
  info!("{:?} execute(4) = {}", pipeline.keys(), pipeline.execute(4)?);

  Ok(())
}
