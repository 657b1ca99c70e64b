use std::path::PathBuf;

use clap::{Parser, Subcommand};

use llm_fanout::EvalConfig;

/// Command line arguments for the fan-out runner
#[derive(Parser, Debug)]
#[command(
    name = "llm-fanout",
    about = "Fan a workload out across model endpoints and compare the results"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (TOML, YAML or JSON)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Items per batch
    #[arg(long, global = true)]
    pub batch_size: Option<usize>,

    /// Dispatch at most this many batches; the rest of the workload is dropped
    #[arg(long, global = true)]
    pub max_batches: Option<usize>,

    /// Batches running at once
    #[arg(long, global = true)]
    pub max_parallel: Option<usize>,

    /// Completion token budget per chat call
    #[arg(long, global = true)]
    pub max_tokens: Option<u32>,

    #[arg(long, global = true)]
    pub temperature: Option<f32>,

    /// Model id to call; repeat for several models
    #[arg(long = "model", short = 'm', global = true)]
    pub models: Vec<String>,

    /// Times each batch is replayed
    #[arg(long, global = true)]
    pub trials: Option<usize>,

    /// Base URL of the OpenAI-compatible endpoint
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Write the full JSON report to this file
    #[arg(long, short = 'o', global = true)]
    pub output: Option<PathBuf>,

    /// Print the JSON report instead of the summary table
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send the same chat prompt to every model
    Chat {
        #[arg(long, short = 'p')]
        prompt: String,
        #[arg(long, default_value = "You are a helpful assistant.")]
        system: String,
        /// Number of copies of the prompt; defaults to `workload_size`
        #[arg(long, short = 'n')]
        n: Option<usize>,
        /// JSON schema file the completion must follow
        #[arg(long)]
        guided_json: Option<PathBuf>,
    },
    /// Embed the lines of a text file, one call per batch
    Embed {
        #[arg(long, short = 'f')]
        file: PathBuf,
        /// Embed as indexed passages instead of queries
        #[arg(long)]
        passages: bool,
    },
    /// Rerank JSON-lines records of `{query, passages}`
    Rerank {
        #[arg(long, short = 'f')]
        file: PathBuf,
        /// Reject passages longer than the model context instead of truncating
        #[arg(long)]
        no_truncate: bool,
    },
}

impl CliArgs {
    /// Applies command line overrides on top of the loaded config.
    pub fn apply_overrides(&self, config: &mut EvalConfig) {
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if self.max_batches.is_some() {
            config.max_batches = self.max_batches;
        }
        if let Some(max_parallel) = self.max_parallel {
            config.max_parallel = max_parallel;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.max_tokens = max_tokens;
        }
        if self.temperature.is_some() {
            config.temperature = self.temperature;
        }
        if !self.models.is_empty() {
            config.model_ids = self.models.clone();
        }
        if let Some(trials) = self.trials {
            config.trials = trials;
        }
        if let Some(base_url) = &self.base_url {
            config.endpoint.base_url = base_url.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_overrides_follow_subcommand() {
        let args = CliArgs::try_parse_from([
            "llm-fanout",
            "chat",
            "--prompt",
            "What's the weather like today?",
            "-n",
            "10",
            "--batch-size",
            "3",
            "-m",
            "meta/llama3-8b-instruct",
            "-m",
            "meta/llama3-70b-instruct",
        ])
        .unwrap();

        let Command::Chat { prompt, n, system, .. } = &args.command else {
            panic!("expected chat");
        };
        assert_eq!(prompt, "What's the weather like today?");
        assert_eq!(*n, Some(10));
        assert_eq!(system, "You are a helpful assistant.");

        let mut config = EvalConfig::default();
        args.apply_overrides(&mut config);
        assert_eq!(config.batch_size, 3);
        assert_eq!(config.max_parallel, 5);
        assert_eq!(config.model_ids.len(), 2);
    }

    #[test]
    fn no_overrides_keep_config() {
        let args = CliArgs::try_parse_from(["llm-fanout", "embed", "--file", "data.txt"]).unwrap();
        let mut config = EvalConfig::default();
        args.apply_overrides(&mut config);
        assert_eq!(config, EvalConfig::default());
    }
}
