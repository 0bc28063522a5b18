use auditguard::dto::{DataFile, RankedEntry};
use auditguard::error::ServiceError;
use auditguard::util::{download_object_from_s3, upload_object_to_s3};
use auditguard::{ingest, AggregateReport, Dataset};
use rusoto_s3::S3Client;

pub async fn pull_data_file(client: &S3Client, data: &DataFile) -> Result<Dataset, ServiceError> {
    let bytes = download_object_from_s3(client, data.bucket.clone(), data.key.clone()).await?;
    ingest(&bytes).map_err(ServiceError::from)
}

pub async fn push_report_file(
    client: &S3Client,
    input: &DataFile,
    report: Vec<u8>,
) -> Result<DataFile, ServiceError> {
    let output = input.report_location();
    upload_object_to_s3(client, report, output.bucket.clone(), output.key.clone()).await?;
    Ok(output)
}

pub fn ranked_entries(report: &AggregateReport) -> Vec<RankedEntry> {
    report
        .ranked
        .iter()
        .map(|record| RankedEntry {
            position: record.position(),
            tender_id: record
                .scored
                .record
                .get("tender_id")
                .map(|field| field.to_string()),
            risk_score: record.risk_score(),
        })
        .collect()
}
