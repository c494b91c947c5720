use std::path::Path;

use pickwise_agent::AgentRuntime;
use pickwise_core::document::extract_text_from_path;
use pickwise_core::domain::product::ProductDraft;
use pickwise_core::errors::BILLING_REMEDIATION;
use pickwise_core::extraction::ExtractionOutcome;
use pickwise_core::normalize::Normalizer;
use serde_json::json;

use crate::commands::{current_thread_runtime, load_config, CommandResult};

pub fn run(file: &Path, json_output: bool) -> CommandResult {
    let config = match load_config("extract") {
        Ok(config) => config,
        Err(result) => return result,
    };

    let text = match extract_text_from_path(file, config.upload.max_bytes) {
        Ok(text) => text,
        Err(error) => return CommandResult::failure("extract", "input", error.to_string(), 7),
    };

    let agent = match AgentRuntime::from_config(&config.llm) {
        Ok(agent) => agent,
        Err(error) => {
            return CommandResult::failure(
                "extract",
                "llm_init",
                format!("failed to initialize language model runtime: {error}"),
                3,
            );
        }
    };
    let runtime = match current_thread_runtime("extract") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let outcome = runtime.block_on(agent.extraction_chain().extract(&text));
    let notice = billing_notice(&outcome);
    let strategy = outcome.strategy;
    let candidates = outcome.candidates.len();
    let dropped = outcome.dropped;
    let drafts = Normalizer::new().normalize(outcome.candidates);

    let message = format!(
        "{} product(s) after deduplication from {candidates} candidate(s) via {}",
        drafts.len(),
        strategy.map_or("no strategy", |kind| kind.as_str())
    );

    if json_output {
        return CommandResult::success_with(
            "extract",
            message,
            Some(json!({
                "file": file.display().to_string(),
                "strategy": strategy,
                "candidates": candidates,
                "dropped": dropped,
                "notice": notice,
                "products": drafts,
            })),
        );
    }

    CommandResult { exit_code: 0, output: render_human(&message, notice.as_deref(), &drafts) }
}

fn billing_notice(outcome: &ExtractionOutcome) -> Option<String> {
    outcome.billing_failure().map(|_| {
        format!("LLM extraction unavailable (billing); used fallback parsing. {BILLING_REMEDIATION}")
    })
}

fn render_human(message: &str, notice: Option<&str>, drafts: &[ProductDraft]) -> String {
    let mut lines = vec![message.to_string()];
    if let Some(notice) = notice {
        lines.push(format!("notice: {notice}"));
    }
    for draft in drafts {
        lines.push(format!(
            "- [{}] {} ({}, ${}) tags: {}",
            draft.sku,
            draft.title,
            draft.category,
            draft.price,
            draft.tags.join(", ")
        ));
    }
    lines.join("\n")
}
