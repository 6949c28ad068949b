// strand_core/examples/batch_splice.rs

use std::sync::Arc;
use strand::{action, ActionRef, Pipeline, PipelineBuilder, StrandError};
use tracing::{error, info};

fn log_step(label: &'static str) -> ActionRef<Vec<String>, StrandError> {
  action::map(move |mut trail: Vec<String>| {
    trail.push(label.to_string());
    Ok(trail)
  })
}

#[tokio::main]
async fn main() -> Result<(), StrandError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();
  info!("--- Batch Splice Example ---");

  let request: Pipeline<&str, Vec<String>> = PipelineBuilder::new().name("request").build();
  request.put("decode", log_step("decode"));
  request.put("handle", log_step("handle"));
  request.put("encode", log_step("encode"));

  // A reusable group of steps, copied into the receiver at an anchor.
  let auth: Pipeline<&str, Vec<String>> = PipelineBuilder::new().name("auth").build();
  auth.put("authenticate", log_step("authenticate"));
  auth.put("authorize", log_step("authorize"));

  request.insert_pipeline_after(&"decode", &auth)?;
  info!("Request steps: {:?}", request.keys());

  // The source is untouched and independent of the copy.
  auth.put("audit", log_step("audit"));
  info!("Auth steps: {:?}, request still has {} steps", auth.keys(), request.len());

  // Splicing the same keys again is refused and changes nothing.
  if let Err(e) = request.insert_pipeline_before(&"encode", &auth) {
    error!("Second splice rejected: {}", e);
  }

  // A pipeline is itself an action, so it can be nested as a single step.
  let outer: Pipeline<&str, Vec<String>> = PipelineBuilder::new().name("outer").build();
  outer.put("accept", log_step("accept"));
  outer.put("request", Arc::new(request));
  outer.put("close", log_step("close"));

  let trail = outer.execute_async(Vec::new()).await?;
  info!("Trail: {}", trail.join(" -> "));

  Ok(())
}
