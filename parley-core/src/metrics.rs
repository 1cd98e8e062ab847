use std::sync::OnceLock;

use metrics::{Label, counter, describe_counter};

static METRICS_INIT: OnceLock<bool> = OnceLock::new();

/// Lazily describes all the metrics used in this module once
pub fn lazy_init() {
    METRICS_INIT.get_or_init(|| {
        describe_counter!("parley.usage.prompt_tokens", "token usage for the prompt");
        describe_counter!(
            "parley.usage.completion_tokens",
            "token usage for the completion"
        );
        describe_counter!("parley.usage.total_tokens", "total token usage");
        true
    });
}

/// Emits usage metrics for a language model
pub fn emit_usage(model: &str, prompt_tokens: u64, completion_tokens: u64, total_tokens: u64) {
    let labels = [Label::new("model", model.to_string())];

    lazy_init();
    counter!("parley.usage.prompt_tokens", labels.iter()).increment(prompt_tokens);
    counter!("parley.usage.completion_tokens", labels.iter()).increment(completion_tokens);
    counter!("parley.usage.total_tokens", labels.iter()).increment(total_tokens);
}
