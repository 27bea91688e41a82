mod common;

use anyhow::Result;
use common::{date, fixture_path};
use salesline_core::{
    AnalysisConfig, Aggregation, Measure, PipelineError, Pipeline, Reducer, SectionBody,
};
use salesline_parser::{DateOrder, LoadError};

fn close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() <= 0.005 + 1e-9,
        "expected about {expected}, got {actual}"
    );
}

fn fixture_config() -> AnalysisConfig {
    let mut config = AnalysisConfig::default();
    config.input.path = Some(fixture_path());
    config
}

#[test]
fn loads_and_derives_the_fixture() -> Result<()> {
    let pipeline = Pipeline::new(fixture_config())?;
    let (summary, records) = pipeline.prepare()?;

    assert_eq!(summary.total_rows, 11);
    assert_eq!(summary.loaded_rows, 11);
    assert_eq!(summary.skipped_rows, 0);
    assert_eq!(records.len(), 11);

    let late = records
        .iter()
        .find(|r| r.raw.order_id == "CA-2017-105893")
        .unwrap();
    assert_eq!(late.derived.fulfillment_days, -1);

    let zero_quantity = records
        .iter()
        .find(|r| r.raw.product_id == "OFF-AP-10002892")
        .unwrap();
    assert_eq!(zero_quantity.derived.unit_price, None);
    assert_eq!(zero_quantity.derived.profit_margin, None);
    assert_eq!(zero_quantity.derived.discount, 0.0);
    Ok(())
}

#[test]
fn report_covers_every_section() -> Result<()> {
    let output = Pipeline::new(fixture_config())?.run()?;
    let report = &output.report;

    let ids: Vec<&str> = report.sections.iter().map(|s| s.id).collect();
    assert_eq!(
        ids,
        vec![
            "monthly_trend",
            "category_performance",
            "monthly_sales_by_region",
            "segment_performance",
            "shipping",
            "regional_profitability",
            "top_products",
            "discount_impact",
        ]
    );

    let overview = &report.overview;
    assert_eq!(overview.line_items, 11);
    assert_eq!(overview.orders, 8);
    assert_eq!(overview.customers, 8);
    assert_eq!(overview.first_order, Some(date(2014, 6, 9)));
    assert_eq!(overview.last_order, Some(date(2017, 12, 5)));
    close(overview.total_sales, 3736.43);
    close(overview.total_profit, -114.76);
    close(overview.overall_margin.unwrap(), -3.07);
    Ok(())
}

#[test]
fn report_sections_hold_expected_values() -> Result<()> {
    let output = Pipeline::new(fixture_config())?.run()?;
    let report = &output.report;

    let SectionBody::Table(regions) = &report.section("regional_profitability").unwrap().body
    else {
        panic!("regional_profitability should be a table");
    };
    let sales = Aggregation::new(Measure::Sales, Reducer::Sum);
    close(regions.value(&["South"], sales).unwrap().unwrap(), 1989.40);
    close(regions.value(&["East"], sales).unwrap().unwrap(), 90.57);
    let region_total: f64 = regions.rows.iter().filter_map(|r| r.values[0]).sum();
    close(region_total, 3736.43);

    let SectionBody::Table(top) = &report.section("top_products").unwrap().body else {
        panic!("top_products should be a table");
    };
    assert_eq!(
        top.rows[0].key[0],
        "Hon Deluxe Fabric Upholstered Stacking Chairs, Rounded Back"
    );
    assert_eq!(top.rows[1].key[0], "Mitel 5320 IP Phone VoIP phone");

    let SectionBody::Pivot(pivot) = &report.section("monthly_sales_by_region").unwrap().body
    else {
        panic!("monthly_sales_by_region should be a pivot");
    };
    assert_eq!(pivot.column_keys, vec!["Central", "East", "South", "West"]);
    assert_eq!(pivot.cell("2016-11", "South"), Some(Some(993.9)));
    assert_eq!(pivot.cell("2016-11", "West"), Some(None));
    // Zero sales is data, not a missing cell.
    close(pivot.cell("2014-06", "West").unwrap().unwrap(), 907.15);
    Ok(())
}

#[test]
fn top_products_honours_the_limit() -> Result<()> {
    let mut config = fixture_config();
    config.output.top_n = 3;
    let report = Pipeline::new(config)?.run()?.report;

    let SectionBody::Table(top) = &report.section("top_products").unwrap().body else {
        panic!("top_products should be a table");
    };
    assert_eq!(top.len(), 3);
    Ok(())
}

#[test]
fn day_first_misreading_exceeds_tolerance() {
    let mut config = fixture_config();
    config.input.date_order = DateOrder::DayFirst;

    let err = Pipeline::new(config).unwrap().run().unwrap_err();
    assert!(matches!(err, PipelineError::Load(LoadError::Parse(_))), "{err}");
}

#[test]
fn missing_input_path_is_a_validation_error() {
    let err = Pipeline::new(AnalysisConfig::default())
        .unwrap()
        .run()
        .unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)));
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let mut config = fixture_config();
    config.output.top_n = 0;
    assert!(matches!(
        Pipeline::new(config),
        Err(PipelineError::Validation(_))
    ));
}

#[test]
fn unreadable_file_is_a_load_error() {
    let mut config = AnalysisConfig::default();
    config.input.path = Some("does/not/exist.csv".into());

    let err = Pipeline::new(config).unwrap().run().unwrap_err();
    assert!(matches!(err, PipelineError::Load(LoadError::Io { .. })));
}
