//! CLI entry point: run one extraction session for a named dataset and
//! hand the result to a tabular sink.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tracing::info;

use findata_crawler_lib::application::{DatasetProfile, ExtractionSession, RunParams};
use findata_crawler_lib::infrastructure::{
    config::ConfigManager,
    logging,
    sink::{CsvSink, JsonLinesSink, RecordSink},
    HttpClient, HttpClientConfig, HttpPageSource, PageSourceConfig,
};

struct CliArgs {
    dataset: String,
    count: Option<usize>,
    out: Option<PathBuf>,
    format: Option<String>,
    url: Option<String>,
}

fn usage() -> String {
    format!(
        "Usage: findata-crawler <dataset> [--count N] [--out PATH] [--format csv|jsonl] [--url URL]\n\
         Datasets: {}",
        DatasetProfile::known_names().join(", ")
    )
}

fn parse_args(mut args: std::env::Args) -> Result<CliArgs> {
    let _ = args.next(); // program name

    let Some(dataset) = args.next() else {
        bail!("{}", usage());
    };

    let mut parsed = CliArgs {
        dataset,
        count: None,
        out: None,
        format: None,
        url: None,
    };

    while let Some(flag) = args.next() {
        let mut value = |name: &str| {
            args.next()
                .with_context(|| format!("{name} requires a value\n{}", usage()))
        };
        match flag.as_str() {
            "--count" => parsed.count = Some(value("--count")?.parse().context("--count")?),
            "--out" => parsed.out = Some(PathBuf::from(value("--out")?)),
            "--format" => parsed.format = Some(value("--format")?),
            "--url" => parsed.url = Some(value("--url")?),
            other => bail!("Unknown flag '{other}'\n{}", usage()),
        }
    }
    Ok(parsed)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args(std::env::args())?;

    let config_manager = ConfigManager::new()?;
    let config = config_manager.load().await?;

    let mut logging_config = config.user.logging.clone();
    if config.user.verbose_logging {
        logging_config.level = "debug".to_string();
    }
    logging::init_logging_with_config(logging_config)?;

    let Some(profile) = DatasetProfile::by_name(&args.dataset) else {
        bail!("Unknown dataset '{}'\n{}", args.dataset, usage());
    };
    info!("데이터 수집 시작: {}", profile.name);

    let http = HttpClient::new(HttpClientConfig {
        timeout_seconds: config.advanced.request_timeout_seconds,
        max_requests_per_second: config.advanced.max_requests_per_second,
        ..Default::default()
    })?;

    let source_config = PageSourceConfig {
        readiness_markers: profile.table_candidates.as_slice().to_vec(),
        readiness_timeout_secs: config.advanced.readiness_timeout_secs,
        poll_interval_ms: config.advanced.poll_interval_ms,
        settle_delay_ms: config.advanced.settle_delay_ms,
        page_param: config.advanced.page_param.clone(),
    };
    let source = HttpPageSource::new(http, source_config);

    let start_url = args.url.unwrap_or_else(|| profile.start_url.clone());
    let target_count = args.count.unwrap_or(config.user.target_count);
    let params = RunParams::new(start_url).with_target_count(target_count);

    let session = ExtractionSession::new(
        Box::new(source),
        profile.table_candidates.clone(),
        profile.schema.clone(),
        params,
    );

    let outcome = match session.run().await {
        Ok(outcome) => outcome,
        Err(e) => {
            println!("❌ {} 크롤링에 실패했습니다: {e}", profile.name);
            std::process::exit(1);
        }
    };

    if outcome.is_empty() {
        println!(
            "⚠️ 수집된 데이터가 없습니다. (사유: {})",
            outcome.termination
        );
        return Ok(());
    }

    let format = args.format.unwrap_or_else(|| {
        match args.out.as_ref().and_then(|p| p.extension()).and_then(|e| e.to_str()) {
            Some("jsonl") | Some("ndjson") => "jsonl".to_string(),
            _ => "csv".to_string(),
        }
    });
    let out_path = args
        .out
        .unwrap_or_else(|| PathBuf::from(format!("{}.{format}", profile.name)));

    let mut sink: Box<dyn RecordSink> = match format.as_str() {
        "csv" => Box::new(CsvSink::new(&out_path)),
        "jsonl" => Box::new(JsonLinesSink::new(&out_path)),
        other => bail!("Unknown format '{other}'\n{}", usage()),
    };
    sink.write(&outcome.records).await?;

    println!("✅ {} 크롤링이 성공적으로 완료되었습니다!", profile.name);
    println!(
        "📁 {} 파일을 확인해주세요. (총 {}개, {}페이지, {}ms)",
        out_path.display(),
        outcome.records.len(),
        outcome.pages_visited,
        outcome.duration_ms
    );
    Ok(())
}
