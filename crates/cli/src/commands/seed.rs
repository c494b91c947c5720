use pickwise_db::fixtures::{DemoCatalog, SeedResult, VerificationResult};
use pickwise_db::repositories::SqlProductRepository;
use serde_json::json;

use crate::commands::{
    current_thread_runtime, load_config, open_database, CommandResult, Failure,
};

pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match current_thread_runtime("seed") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let repo = SqlProductRepository::new(pool.clone());

        let seeded = DemoCatalog::load(&repo)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
        let verification = DemoCatalog::verify(&repo)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        pool.close().await;
        if verification.all_present {
            Ok::<SeedResult, Failure>(seeded)
        } else {
            Err(("seed_verification", verification_failure_message(&verification), 6u8))
        }
    });

    match result {
        Ok(seeded) => CommandResult::success_with(
            "seed",
            summary(&seeded),
            Some(json!({
                "strategy": seeded.strategy,
                "extracted": seeded.extracted,
                "inserted": seeded.inserted,
                "alreadyPresent": seeded.already_present,
            })),
        ),
        Err(failure) => CommandResult::from_failure("seed", failure),
    }
}

fn summary(seeded: &SeedResult) -> String {
    format!(
        "demo catalog ready: {} product(s) extracted via {}; {} inserted, {} already present",
        seeded.extracted,
        seeded.strategy.as_str(),
        seeded.inserted,
        seeded.already_present
    )
}

fn verification_failure_message(verification: &VerificationResult) -> String {
    let missing = verification
        .checks
        .iter()
        .filter_map(|(title, present)| (!present).then_some(*title))
        .collect::<Vec<_>>();
    if missing.is_empty() {
        "Some demo products failed to load".to_string()
    } else {
        format!("Seed verification failed for: {}", missing.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use pickwise_db::fixtures::VerificationResult;

    use super::verification_failure_message;

    #[test]
    fn verification_error_message_names_missing_products() {
        let verification = VerificationResult {
            all_present: false,
            checks: vec![("Yoga Mat", true), ("Leather Wallet", false), ("Field Guide to Birds", false)],
        };

        assert_eq!(
            verification_failure_message(&verification),
            "Seed verification failed for: Leather Wallet, Field Guide to Birds"
        );
    }

    #[test]
    fn verification_error_message_falls_back_to_generic_when_nothing_is_missing() {
        let verification = VerificationResult { all_present: false, checks: Vec::new() };

        assert_eq!(verification_failure_message(&verification), "Some demo products failed to load");
    }
}
