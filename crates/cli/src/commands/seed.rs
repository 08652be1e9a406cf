use cloudquote_db::DemoSeed;

use crate::commands::{build_runtime, load_config, open_store, CommandResult, StepFailure};

pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let (pool, repo) = open_store(&config).await?;

        let seed_result = DemoSeed::load(&repo)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
        let verification = DemoSeed::verify(&repo)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result: Result<cloudquote_db::SeedResult, StepFailure> =
            if verification.all_present {
                Ok(seed_result)
            } else {
                Err(("seed_verification", verification_message(&verification.checks), 6u8))
            };

        pool.close().await;
        run_result
    });

    match result {
        Ok(seeded) => {
            let action = if seeded.created { "saved as" } else { "already current at" };
            CommandResult::success(
                "seed",
                format!(
                    "demo configuration {action} version {}: {} categories, {} discount tiers, {} accounts",
                    seeded.version, seeded.categories, seeded.discount_tiers, seeded.accounts
                ),
            )
        }
        Err(failure) => CommandResult::from(("seed", failure)),
    }
}

fn verification_message(checks: &[(&'static str, bool)]) -> String {
    let failed_checks =
        checks.iter().filter_map(|(check, passed)| (!passed).then_some(*check)).collect::<Vec<_>>();
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::verification_message;

    #[test]
    fn verification_error_message_targets_failed_checks() {
        let checks = [("snapshot-present", true), ("categories", false), ("consistency", false)];

        assert_eq!(
            verification_message(&checks),
            "Seed verification failed for checks: categories, consistency"
        );
    }

    #[test]
    fn verification_error_message_falls_back_to_generic_when_no_labels() {
        let checks = [("snapshot-present", true), ("accounts", true)];
        assert_eq!(verification_message(&checks), "Some seed data failed to load");
    }
}
