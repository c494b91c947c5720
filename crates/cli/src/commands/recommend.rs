use std::fs;
use std::path::Path;

use pickwise_core::domain::behavior::UserBehaviorProfile;
use pickwise_core::scoring::{self, score_and_rank};
use pickwise_db::repositories::{ProductFilter, ProductRepository, SqlProductRepository};
use serde_json::{json, Value};

use crate::commands::{
    current_thread_runtime, load_config, open_database, CommandResult, Failure,
};

pub fn run(behavior_path: &Path, top_n: usize) -> CommandResult {
    let behavior = match read_behavior(behavior_path) {
        Ok(behavior) => behavior,
        Err(message) => return CommandResult::failure("recommend", "input", message, 7),
    };
    let profile = match UserBehaviorProfile::from_value(&behavior) {
        Ok(profile) => profile,
        Err(error) => return CommandResult::failure("recommend", "input", error.to_string(), 7),
    };

    let config = match load_config("recommend") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match current_thread_runtime("recommend") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let catalog = SqlProductRepository::new(pool.clone())
            .list(&ProductFilter::all())
            .await
            .map_err(|error| ("catalog_read", error.to_string(), 4u8))?;
        pool.close().await;
        Ok::<_, Failure>(catalog)
    });
    let catalog = match result {
        Ok(catalog) if catalog.is_empty() => {
            return CommandResult::failure(
                "recommend",
                "empty_catalog",
                "No product catalog available. Run `pickwise seed` or upload a catalog first",
                8,
            );
        }
        Ok(catalog) => catalog,
        Err(failure) => return CommandResult::from_failure("recommend", failure),
    };

    let ranked = score_and_rank(&catalog, &profile, top_n);
    let explanation = scoring::explain(&ranked);
    let recommendations: Vec<Value> = ranked
        .iter()
        .map(|scored| {
            json!({
                "id": scored.product.id,
                "title": scored.product.title,
                "sku": scored.product.sku,
                "category": scored.product.category,
                "price": scored.product.price,
                "score": scored.score,
                "signals": scored.signals,
            })
        })
        .collect();

    CommandResult::success_with(
        "recommend",
        format!("ranked {} of {} product(s)", ranked.len(), catalog.len()),
        Some(json!({ "recommendations": recommendations, "explanation": explanation })),
    )
}

fn read_behavior(path: &Path) -> Result<Value, String> {
    let raw = fs::read_to_string(path)
        .map_err(|error| format!("failed to read behavior file `{}`: {error}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .map_err(|error| format!("behavior file `{}` is not valid JSON: {error}", path.display()))?;
    if !value.is_object() {
        return Err("Behavior object is required".to_string());
    }
    Ok(value)
}
