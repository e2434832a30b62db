//! Offline CLI commands: trip overview, budget, text analysis, project init.

use std::path::Path;

use voyager_core::config::{ApiKeys, VoyagerConfig, CONFIG_PATH};
use voyager_core::llm::build_completion_service;
use voyager_core::nlp::NlpService;
use voyager_core::travel::{
    estimate_trip_budget, gather_trip_overview, generate_travel_plan, TravelApiClient,
    TravelPlanDocument, TripOverview, TripRequest,
};

pub async fn plan(
    config: &VoyagerConfig,
    destination: String,
    budget: u32,
    interests: Vec<String>,
    duration: Option<u64>,
    itinerary: bool,
) -> anyhow::Result<()> {
    let request = TripRequest {
        destination,
        budget,
        interests,
        duration_days: duration,
    }
    .validate()?;

    let client = TravelApiClient::new(config.apis.clone(), ApiKeys::from_env())?;
    let overview = gather_trip_overview(&client, request).await;
    print_overview(&overview);

    if !itinerary {
        return Ok(());
    }

    let llm = build_completion_service(&config.model, config.apis.http_timeout_secs)?;
    let plan = generate_travel_plan(llm.as_ref(), &overview).await?;
    if plan.fallback {
        println!("\n{}", plan.plan);
    } else {
        println!("\n{}", TravelPlanDocument::new(&overview, &plan).to_markdown());
    }
    Ok(())
}

fn print_overview(overview: &TripOverview) {
    println!("Trip to {}", overview.request.destination);
    println!(
        "  Budget: ${}  Interests: {}",
        overview.request.budget,
        overview.request.interests.join(", ")
    );

    match &overview.weather {
        Some(weather) => println!("\nWeather: {}", weather.summary()),
        None => println!("\nWeather data not available."),
    }

    if overview.attractions.is_empty() {
        println!("\nNo attractions data available.");
    } else {
        println!("\nTop attractions:");
        for attraction in &overview.attractions {
            println!("  - {}", attraction.name);
        }
    }

    if overview.recommendations.is_empty() {
        println!("\nNo travel recommendations found.");
    } else {
        println!("\nTravel blogs:");
        for rec in &overview.recommendations {
            println!("  - {} ({})", rec.title, rec.link);
            println!("    {}", rec.snippet);
        }
    }

    if let Some(budget) = &overview.budget {
        println!(
            "\nEstimated budget ({} days): ${}",
            budget.duration_days, budget.total_estimated_budget
        );
        for share in &overview.budget_shares {
            println!("  {:<16} ${:>6}  {:>5.1}%", share.category, share.amount, share.percent);
        }
    }

    for warning in &overview.warnings {
        println!("\n! {}", warning.message);
    }
}

pub fn budget(destination: &str, duration: u64) -> anyhow::Result<()> {
    let estimate = estimate_trip_budget(destination, duration)?;
    println!("{}", serde_json::to_string_pretty(&estimate)?);
    Ok(())
}

pub fn analyze(config: &VoyagerConfig, text: &str) -> anyhow::Result<()> {
    let nlp = NlpService::new(config.sentiment);
    let report = serde_json::json!({
        "sentiment": nlp.analyze_sentiment(text, None)?,
        "intent": nlp.analyze_conversation_intent(text, true)?,
        "entities": nlp.extract_key_entities(text)?,
        "language": nlp.detect_language(text)?,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub async fn init() -> anyhow::Result<()> {
    let dir = Path::new(".voyager");
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(
        dir.join(".gitignore"),
        "# Never commit secrets or local state\n.env\n*.env\n*.db\n",
    )
    .await?;

    if Path::new(CONFIG_PATH).exists() {
        println!("Config already exists at {}", CONFIG_PATH);
    } else {
        VoyagerConfig::default().save().await?;
        println!("Created {}", CONFIG_PATH);
    }
    println!("Run `voyager serve` to start the server");
    Ok(())
}
