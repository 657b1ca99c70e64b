use std::sync::Arc;

use clap::Parser;

use llm_fanout::{
    config::load_config,
    model::{InputType, Truncate},
    Dispatcher, EndpointRegistry, EvalConfig, EvalRun, HttpEndpoint, ModelEndpoint,
    RequestShaper, RunReport,
};

use crate::args::{CliArgs, Command};
use crate::logging::init_logging;
use crate::report::{render_summary, ReportDocument};
use crate::workload;

pub async fn run() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let loaded = load_config(args.config.clone())?;
    let mut config = loaded.config;
    args.apply_overrides(&mut config);
    config.validate()?;
    let _logger = init_logging(&config.logging)?;
    if !loaded.exists {
        log::debug!("no config file at {}", loaded.path.display());
    }

    let registry = build_registry(&config)?;
    let (name, report) = match &args.command {
        Command::Chat {
            prompt,
            system,
            n,
            guided_json,
        } => {
            let schema = guided_json
                .as_deref()
                .map(workload::read_schema)
                .transpose()?;
            let items = workload::repeated_prompt(prompt, n.unwrap_or(config.workload_size));
            let shaper = workload::chat_shaper(
                system.clone(),
                config.max_tokens,
                config.temperature,
                schema,
            );
            ("chat", execute(&config, &registry, shaper, &items).await?)
        }
        Command::Embed { file, passages } => {
            let items = workload::read_lines(file)?;
            let input_type = if *passages {
                InputType::Passage
            } else {
                InputType::Query
            };
            let shaper = workload::embedding_shaper(input_type);
            ("embed", execute(&config, &registry, shaper, &items).await?)
        }
        Command::Rerank { file, no_truncate } => {
            let items = workload::read_rerank_items(file)?;
            let truncate = if *no_truncate {
                Truncate::None
            } else {
                Truncate::End
            };
            let shaper = workload::rerank_shaper(truncate);
            ("rerank", execute(&config, &registry, shaper, &items).await?)
        }
    };

    let document = ReportDocument::new(name, &config, &report);
    if let Some(path) = &args.output {
        document.write(path)?;
        log::info!("report written to {}", path.display());
    }
    if args.json {
        println!("{}", document.to_json()?);
    } else {
        print!("{}", render_summary(&report));
    }
    Ok(())
}

/// One HTTP client shared by every configured model id.
fn build_registry(config: &EvalConfig) -> anyhow::Result<EndpointRegistry> {
    let api_key = config.endpoint.api_key();
    if api_key.is_none() {
        log::warn!(
            "{} is not set; calling {} without credentials",
            config.endpoint.api_key_env,
            config.endpoint.base_url
        );
    }
    let endpoint: Arc<dyn ModelEndpoint> = Arc::new(HttpEndpoint::new(
        config.endpoint.base_url.as_str(),
        api_key,
        config.endpoint.timeout_seconds,
    )?);

    let mut builder = EndpointRegistry::builder();
    for id in &config.model_ids {
        builder = builder.try_register(id.as_str(), Arc::clone(&endpoint))?;
    }
    Ok(builder.build())
}

async fn execute<T>(
    config: &EvalConfig,
    registry: &EndpointRegistry,
    shaper: RequestShaper<T>,
    items: &[T],
) -> anyhow::Result<RunReport>
where
    T: Clone + Send + Sync + 'static,
{
    let dispatcher = Dispatcher::new(registry, &config.model_ids, shaper)?
        .retry_policy(config.retry.clone())
        .trials(config.trials);
    let report = EvalRun::from_config(config, dispatcher).execute(items).await?;
    Ok(report)
}
