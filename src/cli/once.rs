use crate::core::models::CycleOutcome;
use crate::core::settings::Settings;
use crate::core::validation::validate;
use crate::engine::build_executor;
use anyhow::Result;

pub async fn run(json: bool) -> Result<()> {
    let settings = Settings::load();
    let config = validate(&settings.account)?;
    let executor = build_executor(&settings)?;

    let outcome = executor.run(&config).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    for entry in executor.store().entries().await {
        println!("{entry}");
    }

    match &outcome {
        CycleOutcome::Success { delta, .. } => println!("Cycle succeeded (delta: {delta:+})"),
        CycleOutcome::Failure { stage, message, .. } => {
            println!("Cycle failed at {stage}: {message}")
        }
    }

    Ok(())
}
