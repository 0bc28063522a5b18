use auditguard::aggregate::{aggregate, aggregate_non_empty, HIGH_RISK_CAP};
use auditguard::classify::classify_dataset;
use auditguard::demo;
use auditguard::export::report_columns;
use auditguard::scoring::score_dataset;
use auditguard::{
    analyze, export, export_high_risk, ingest, ClassifiedRecord, ColumnScorer, Dataset,
    ExportScope, PipelineError, RandomScorer, Record, RiskLevel, StrategyError, Threshold,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

fn threshold(value: i64) -> Threshold {
    Threshold::new(value).unwrap()
}

fn procurement(rows: usize) -> Dataset {
    let mut csv = String::from("tender_id,department,amount,vendor_name\n");
    for i in 0..rows {
        csv.push_str(&format!("T-{},Health,{},\"Vendor, {}\"\n", 1000 + i, 5000 + 7 * i, i));
    }
    ingest(csv.as_bytes()).unwrap()
}

fn high_positions(dataset: &Dataset, t: Threshold, seed: u64) -> HashSet<usize> {
    let (classified, _) = analyze(dataset, t, &RandomScorer::seeded(seed)).unwrap();
    classified
        .high_risk()
        .iter()
        .map(|r| r.position())
        .collect()
}

#[test]
fn high_tier_shrinks_as_threshold_rises() {
    let dataset = procurement(400);
    for seed in 0..5 {
        let mut previous = high_positions(&dataset, threshold(0), seed);
        for t in 1..=100 {
            let current = high_positions(&dataset, threshold(t), seed);
            assert!(current.is_subset(&previous), "threshold {} seed {}", t, seed);
            previous = current;
        }
    }
}

#[test]
fn tiers_partition_the_dataset() {
    let dataset = procurement(257);
    for (seed, t) in [(1, 40), (2, 55), (3, 70), (4, 90)] {
        let (classified, report) =
            analyze(&dataset, threshold(t), &RandomScorer::seeded(seed)).unwrap();
        assert_eq!(report.high.count + report.medium.count + report.low.count, dataset.len());
        let sum = report.high.percentage + report.medium.percentage + report.low.percentage;
        assert!((sum - 100.0).abs() < 1e-9);
        for record in classified.records() {
            let score = i64::from(record.risk_score());
            assert_eq!(record.risk_level == RiskLevel::High, score >= t);
            assert_eq!(record.risk_level == RiskLevel::Medium, (40..t).contains(&score));
            assert_eq!(record.risk_level == RiskLevel::Low, score < 40);
        }
    }
}

#[test]
fn reclassifying_with_the_same_threshold_is_idempotent() {
    let dataset = procurement(150);
    let (classified, _) = analyze(&dataset, threshold(65), &RandomScorer::seeded(8)).unwrap();
    let again = classified.reclassify(threshold(65)).unwrap();
    assert_eq!(again, classified);

    let detour = classified
        .reclassify(threshold(20))
        .unwrap()
        .reclassify(threshold(65))
        .unwrap();
    assert_eq!(detour, classified);
}

#[test]
fn exported_report_round_trips() {
    let dataset = procurement(200);
    let (classified, report) =
        analyze(&dataset, threshold(70), &RandomScorer::seeded(21)).unwrap();
    let bytes = export_high_risk(&classified, &report, ExportScope::AllHighRisk).unwrap();

    let reloaded = ingest(&bytes).unwrap();
    assert_eq!(
        reloaded.schema().columns(),
        ["tender_id", "department", "amount", "risk_score", "risk_level"]
    );
    let (reclassified, rereport) =
        analyze(&reloaded, threshold(70), &ColumnScorer::new("risk_score")).unwrap();
    assert_eq!(rereport.high.count, report.high.count);
    assert_eq!(rereport.total, report.high_risk_total);

    let original: Vec<(u8, RiskLevel)> = classified
        .high_risk()
        .iter()
        .map(|r| (r.risk_score(), r.risk_level))
        .collect();
    let restored: Vec<(u8, RiskLevel)> = reclassified
        .records()
        .iter()
        .map(|r| (r.risk_score(), r.risk_level))
        .collect();
    assert_eq!(restored, original);
    for record in reclassified.records() {
        let level = record.scored.record.get("risk_level").unwrap().to_string();
        assert_eq!(level, record.risk_level.to_string());
    }
}

#[test]
fn demo_example_keeps_high_count_through_export() {
    let dataset = demo::generate(&mut StdRng::seed_from_u64(2026)).unwrap();
    assert_eq!(dataset.len(), 50);
    let (classified, report) =
        analyze(&dataset, threshold(70), &RandomScorer::seeded(77)).unwrap();
    let expected = classified
        .records()
        .iter()
        .filter(|r| r.risk_score() >= 70)
        .count();
    assert_eq!(report.high.count, expected);

    let bytes = export_high_risk(&classified, &report, ExportScope::AllHighRisk).unwrap();
    let (_, rereport) = analyze(
        &ingest(&bytes).unwrap(),
        threshold(70),
        &ColumnScorer::new("risk_score"),
    )
    .unwrap();
    assert_eq!(rereport.high.count, expected);
}

#[test]
fn ranking_keeps_ingestion_order_for_ties() {
    let dataset = procurement(120);
    let mut rng = StdRng::seed_from_u64(4);
    // few distinct values so ties are common
    let scores: Vec<i64> = (0..dataset.len())
        .map(|_| [70, 80, 90][rng.gen_range(0..3usize)])
        .collect();
    let lookup =
        |position: usize, _: &Record| -> Result<i64, StrategyError> { Ok(scores[position]) };
    let scored = score_dataset(&dataset, &lookup).unwrap();
    let report = aggregate(&classify_dataset(&scored, threshold(70)).unwrap());

    assert_eq!(report.ranked.len(), HIGH_RISK_CAP);
    for pair in report.ranked.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(a.risk_score() >= b.risk_score());
        if a.risk_score() == b.risk_score() {
            assert!(a.position() < b.position());
        }
    }
}

#[test]
fn empty_dataset_under_both_policies() {
    let dataset = ingest(b"tender_id,department,amount\n").unwrap();
    let (classified, report) =
        analyze(&dataset, threshold(70), &RandomScorer::seeded(1)).unwrap();
    assert_eq!(report.total, 0);
    assert_eq!(report.high.percentage, 0.0);
    assert_eq!(report.medium.percentage, 0.0);
    assert_eq!(report.low.percentage, 0.0);
    assert_eq!(aggregate_non_empty(&classified), Err(PipelineError::Aggregation));

    let bytes = export_high_risk(&classified, &report, ExportScope::Ranked).unwrap();
    assert_eq!(
        String::from_utf8(bytes).unwrap(),
        "tender_id,department,amount,risk_score,risk_level\n"
    );
}

#[test]
fn extreme_thresholds() {
    let dataset = procurement(101);
    let by_position = |position: usize, _: &Record| -> Result<i64, StrategyError> {
        Ok(position as i64)
    };
    let scored = score_dataset(&dataset, &by_position).unwrap();

    let everything = classify_dataset(&scored, threshold(0)).unwrap();
    assert!(everything.records().iter().all(|r| r.risk_level == RiskLevel::High));

    let only_perfect = classify_dataset(&scored, threshold(100)).unwrap();
    let report = aggregate(&only_perfect);
    assert_eq!(report.high.count, 1);
    assert_eq!(report.ranked[0].risk_score(), 100);
    assert_eq!(report.medium.count, 60);
    assert_eq!(report.low.count, 40);
}

#[test]
fn projection_can_be_chosen_by_caller() {
    let dataset = procurement(30);
    let (classified, _) = analyze(&dataset, threshold(50), &RandomScorer::seeded(6)).unwrap();
    let high: Vec<&ClassifiedRecord> = classified.high_risk();
    let bytes = export(&high, &["vendor_name", "risk_score"]).unwrap();
    let reloaded = ingest(&bytes).unwrap();
    assert_eq!(reloaded.len(), high.len());
    assert_eq!(reloaded.schema().columns(), ["vendor_name", "risk_score"]);
    assert_eq!(report_columns(reloaded.schema()), vec!["risk_score", "risk_level"]);
}
