mod util;

use auditguard::demo;
use auditguard::dto::{AnalysisRequest, AnalysisSummary};
use auditguard::error::ServiceError;
use auditguard::response::make_response_payload;
use auditguard::util::{get_region, resolve_threshold};
use auditguard::{analyze, export_high_risk, ExportScope, RandomScorer};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use lazy_static::lazy_static;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rusoto_core::{Client, Region};
use rusoto_s3::S3Client;
use serde_json::Value;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

lazy_static! {
    // AWS Region
    static ref REGION: Region = get_region().unwrap();
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "auditguard=info".into()),
        )
        .without_time()
        .init();
    run(service_fn(process)).await?;
    Ok(())
}

async fn process(event: LambdaEvent<AnalysisRequest>) -> Result<Value, Error> {
    let (request, _context) = event.into_parts();
    let result = run_analysis(request).await;
    make_response_payload(result)
}

async fn run_analysis(request: AnalysisRequest) -> Result<Value, ServiceError> {
    let threshold = resolve_threshold(request.threshold)?;
    let scorer = match request.seed {
        Some(seed) => RandomScorer::seeded(seed),
        None => RandomScorer::from_entropy(),
    };
    let scope = if request.export_all {
        ExportScope::AllHighRisk
    } else {
        ExportScope::Ranked
    };

    let start = Instant::now();
    let (dataset, source) = match request.data {
        Some(data) => {
            let client = S3Client::new_with_client(Client::shared(), REGION.clone());
            let dataset = util::pull_data_file(&client, &data).await?;
            (dataset, Some((client, data)))
        }
        None => {
            let mut rng = match request.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            (demo::generate(&mut rng)?, None)
        }
    };
    info!(
        rows = dataset.len(),
        provenance = ?dataset.provenance(),
        demo = source.is_none(),
        elapsed_secs = start.elapsed().as_secs_f64(),
        "dataset loaded"
    );

    let (classified, report) = analyze(&dataset, threshold, &scorer)?;
    let csv = export_high_risk(&classified, &report, scope)?;

    let output = match &source {
        Some((client, data)) => Some(util::push_report_file(client, data, csv).await?),
        None => None,
    };
    info!(
        elapsed_secs = start.elapsed().as_secs_f64(),
        uploaded = output.is_some(),
        "report complete"
    );

    let summary = AnalysisSummary::new(
        &report,
        dataset.schema().len(),
        dataset.provenance(),
        util::ranked_entries(&report),
        output,
    );
    serde_json::to_value(summary).map_err(ServiceError::internal_server_error)
}
