#[path = "llm-fanout/app.rs"]
mod app;
#[path = "llm-fanout/args.rs"]
mod args;
#[path = "llm-fanout/logging.rs"]
mod logging;
#[path = "llm-fanout/report.rs"]
mod report;
#[path = "llm-fanout/workload.rs"]
mod workload;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::run().await
}
