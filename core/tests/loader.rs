//! CSV loading: column validation, aliases and value coercion.

use peergroup_core::{
    engine::PeerEngine,
    error::PeerError,
    frame::PeerInputs,
    loader::{read_headcount_table, read_metric_table},
    threshold::MORE_THAN_1K,
    anchor::AnchorQuery,
};

const GRAD_CSV: &str = "\
institution_id,year,institution_name,grad_rate_150,source_flag,is_revised,sector
1,2023,Alpha,50.0,DRVGR,false,\"Public, 4-year or above\"
2,2023,Beta,60,DRVGR,0,
3,2023,Gamma,n/a,DRVGR,,
4,2023,Delta,80,DRVGR,true,
";

const HEADCOUNT_CSV: &str = "\
unitid,year,ft_ug_headcount,headcount_source
1,2023,800,FT_UG_12M
2,2023,1500,FT_UG_12M
3,2023,,
4,2023.0,15000,FT_UG_12M
";

#[test]
fn metric_table_reads_named_value_column() {
    let table = read_metric_table(GRAD_CSV.as_bytes(), "grad_rate_150").unwrap();

    assert_eq!(table.len(), 4);
    let alpha = &table.records()[0];
    assert_eq!(alpha.institution_id, 1);
    assert_eq!(alpha.metric_value, Some(50.0));
    assert_eq!(alpha.source_flag.as_deref(), Some("DRVGR"));
    assert_eq!(alpha.is_revised, Some(false));
    assert_eq!(alpha.sector.as_deref(), Some("Public, 4-year or above"));

    assert_eq!(table.records()[1].is_revised, Some(false));
    assert_eq!(table.records()[1].sector, None);
    assert_eq!(table.records()[3].is_revised, Some(true));
}

#[test]
fn non_numeric_values_become_missing() {
    let table = read_metric_table(GRAD_CSV.as_bytes(), "grad_rate_150").unwrap();
    assert_eq!(table.records()[2].metric_value, None, "Expected 'n/a' coerced to missing");
}

#[test]
fn missing_required_column_is_a_schema_error() {
    let err = read_metric_table(GRAD_CSV.as_bytes(), "retention_rate").unwrap_err();
    match err {
        PeerError::Schema { table, column } => {
            assert_eq!(table, "metrics");
            assert_eq!(column, "retention_rate");
        }
        other => panic!("Expected Schema error; got {other:?}"),
    }

    let no_year = "institution_id,institution_name,metric_value\n1,Alpha,50\n";
    let err = read_metric_table(no_year.as_bytes(), "metric_value").unwrap_err();
    assert!(matches!(err, PeerError::Schema { ref column, .. } if column == "year"), "got {err:?}");

    let no_id = "year,ft_ug_headcount\n2023,100\n";
    let err = read_headcount_table(no_id.as_bytes()).unwrap_err();
    assert!(
        matches!(err, PeerError::Schema { ref table, .. } if table == "headcounts"),
        "got {err:?}"
    );
}

#[test]
fn headcount_table_accepts_aliases_and_float_keys() {
    let table = read_headcount_table(HEADCOUNT_CSV.as_bytes()).unwrap();

    assert_eq!(table.len(), 4);
    assert_eq!(table.records()[0].headcount, Some(800.0));
    assert_eq!(table.records()[2].headcount, None);
    assert_eq!(table.records()[2].headcount_source, None);
    assert_eq!(table.records()[3].year, 2023);
}

#[test]
fn headcount_columns_are_optional() {
    let keys_only = "institution_id,year\n1,2023\n2,2023\n";
    let table = read_headcount_table(keys_only.as_bytes()).unwrap();
    assert_eq!(table.len(), 2);
    assert!(table.records().iter().all(|r| r.headcount.is_none()));
}

#[test]
fn negative_headcounts_are_dropped() {
    let csv = "institution_id,year,headcount\n1,2023,-5\n";
    let table = read_headcount_table(csv.as_bytes()).unwrap();
    assert_eq!(table.records()[0].headcount, None);
}

#[test]
fn bad_key_rejects_the_load() {
    let csv = "institution_id,year,institution_name,metric_value\nabc,2023,Alpha,50\n";
    let err = read_metric_table(csv.as_bytes(), "metric_value").unwrap_err();
    assert!(matches!(err, PeerError::DataLoad { .. }), "got {err:?}");
}

#[test]
fn loaded_tables_feed_the_engine() {
    let grad = read_metric_table(GRAD_CSV.as_bytes(), "grad_rate_150").unwrap();
    let heads = read_headcount_table(HEADCOUNT_CSV.as_bytes()).unwrap();
    let engine = PeerEngine::standard();
    let inputs = PeerInputs::new(&grad).with_headcounts(&heads);

    let report = engine
        .summarize_anchor(&inputs, &AnchorQuery::new(4, 2023, MORE_THAN_1K))
        .unwrap();

    // Gamma has no value; Alpha is below 1,000.
    assert_eq!(report.stats.peer_count, 2);
    assert!(report.summary.in_peer_group);
}
