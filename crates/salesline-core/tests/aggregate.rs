mod common;

use common::{approx, base_record, date, line, three_records};
use salesline_core::{
    build_report, derive_all, Aggregation, Aggregator, DeriveOptions, Dimension, Measure,
    PipelineError, Reducer, ReportOptions, SectionBody,
};
use salesline_parser::SalesRecord;

fn agg(measure: Measure, reducer: Reducer) -> Aggregation {
    Aggregation::new(measure, reducer)
}

#[test]
fn three_record_example() {
    let records = three_records();
    let table = Aggregator::default()
        .multi_stat(
            &records,
            &[Dimension::Category],
            &[
                agg(Measure::Sales, Reducer::Sum),
                agg(Measure::ProfitMargin, Reducer::Mean),
                agg(Measure::ProfitMargin, Reducer::Count),
                agg(Measure::Sales, Reducer::Count),
            ],
        )
        .unwrap();

    assert_eq!(table.len(), 2);
    let sales_sum = agg(Measure::Sales, Reducer::Sum);
    let margin_mean = agg(Measure::ProfitMargin, Reducer::Mean);
    let margin_count = agg(Measure::ProfitMargin, Reducer::Count);
    let sales_count = agg(Measure::Sales, Reducer::Count);

    // The zero-sales line adds 0 to the sum but has no margin.
    assert_eq!(table.value(&["Furniture"], sales_sum), Some(Some(100.0)));
    assert_eq!(table.value(&["Furniture"], sales_count), Some(Some(2.0)));
    assert_eq!(table.value(&["Furniture"], margin_count), Some(Some(1.0)));
    assert_eq!(table.value(&["Furniture"], margin_mean), Some(Some(10.0)));

    assert_eq!(table.value(&["Technology"], sales_sum), Some(Some(200.0)));
    assert_eq!(table.value(&["Technology"], margin_mean), Some(Some(20.0)));

    assert_eq!(table.value(&["Office Supplies"], sales_sum), None);
}

#[test]
fn zero_quantity_lines_are_excluded_from_per_unit_means() {
    let records = three_records();
    let table = Aggregator::default()
        .group_reduce(
            &records,
            &[Dimension::Category],
            &[Measure::UnitPrice, Measure::ProfitPerUnit],
            Reducer::Mean,
        )
        .unwrap();

    assert_eq!(
        table.value(&["Furniture"], agg(Measure::UnitPrice, Reducer::Mean)),
        Some(Some(50.0))
    );
    assert_eq!(
        table.value(&["Furniture"], agg(Measure::ProfitPerUnit, Reducer::Mean)),
        Some(Some(5.0))
    );
}

#[test]
fn category_sums_partition_the_total() {
    let raw = vec![
        line("Furniture", 261.96, 0.0, 41.9136, 2),
        line("Furniture", 731.94, 0.0, 219.582, 3),
        line("Office Supplies", 14.62, 0.0, 6.8714, 2),
        line("Technology", 907.152, 0.2, 90.7152, 6),
        SalesRecord {
            sales: None,
            ..line("Technology", 0.0, 0.0, 1.0, 1)
        },
        line("Office Supplies", 22.368, 0.2, 2.5164, 2),
    ];
    let records = derive_all(&raw, &DeriveOptions::default());
    let expected: f64 = records.iter().map(|r| r.derived.sales).sum();

    let table = Aggregator::new(6)
        .group_reduce(&records, &[Dimension::Category], &[Measure::Sales], Reducer::Sum)
        .unwrap();
    let total: f64 = table.rows.iter().filter_map(|row| row.values[0]).sum();

    assert!((total - expected).abs() < 1e-6, "{total} != {expected}");
}

#[test]
fn rows_are_ordered_by_key_tuple() {
    let raw = vec![
        SalesRecord {
            sub_category: "Tables".into(),
            ..line("Furniture", 1.0, 0.0, 0.0, 1)
        },
        line("Technology", 1.0, 0.0, 0.0, 1),
        SalesRecord {
            sub_category: "Bookcases".into(),
            ..line("Furniture", 1.0, 0.0, 0.0, 1)
        },
        line("Office Supplies", 1.0, 0.0, 0.0, 1),
    ];
    let records = derive_all(&raw, &DeriveOptions::default());

    let table = Aggregator::default()
        .group_reduce(
            &records,
            &[Dimension::Category, Dimension::SubCategory],
            &[Measure::Sales],
            Reducer::Count,
        )
        .unwrap();

    let keys: Vec<Vec<String>> = table.rows.iter().map(|row| row.key.clone()).collect();
    assert_eq!(
        keys,
        vec![
            vec!["Furniture".to_string(), "Bookcases".to_string()],
            vec!["Furniture".to_string(), "Tables".to_string()],
            vec!["Office Supplies".to_string(), "Chairs".to_string()],
            vec!["Technology".to_string(), "Chairs".to_string()],
        ]
    );
}

#[test]
fn all_undefined_group_reduces_to_undefined_and_zero_count() {
    let raw = vec![
        line("Furniture", 0.0, 0.0, 5.0, 1),
        line("Technology", 100.0, 0.0, 25.0, 1),
    ];
    let records = derive_all(&raw, &DeriveOptions::default());

    let table = Aggregator::default()
        .multi_stat(
            &records,
            &[Dimension::Category],
            &[
                agg(Measure::ProfitMargin, Reducer::Sum),
                agg(Measure::ProfitMargin, Reducer::Mean),
                agg(Measure::ProfitMargin, Reducer::Count),
            ],
        )
        .unwrap();

    let row = table.row(&["Furniture"]).unwrap();
    assert_eq!(row.values, vec![None, None, Some(0.0)]);

    let row = table.row(&["Technology"]).unwrap();
    assert_eq!(row.values, vec![Some(25.0), Some(25.0), Some(1.0)]);
}

#[test]
fn values_are_rounded_to_precision() {
    let raw = vec![
        line("Furniture", 10.0, 0.0, 3.333333, 1),
        line("Furniture", 10.0, 0.0, 3.333333, 1),
    ];
    let records = derive_all(&raw, &DeriveOptions::default());

    let table = Aggregator::new(1)
        .group_reduce(&records, &[Dimension::Category], &[Measure::Profit], Reducer::Sum)
        .unwrap();
    assert_eq!(table.rows[0].values[0], Some(6.7));
}

#[test]
fn pivot_distinguishes_no_data_from_zero() {
    let raw = vec![
        SalesRecord {
            order_date: date(2017, 3, 2),
            region: "Central".into(),
            ..line("Furniture", 100.0, 0.0, 10.0, 1)
        },
        SalesRecord {
            order_date: date(2017, 3, 20),
            region: "West".into(),
            ..line("Furniture", 50.0, 0.0, 10.0, 1)
        },
        SalesRecord {
            order_date: date(2017, 4, 1),
            ship_date: date(2017, 4, 3),
            region: "West".into(),
            ..line("Furniture", 0.0, 0.0, 0.0, 0)
        },
    ];
    let records = derive_all(&raw, &DeriveOptions::default());

    let pivot = Aggregator::default()
        .pivot(&records, Dimension::YearMonth, Dimension::Region, Measure::Sales)
        .unwrap();

    assert_eq!(pivot.row_keys, vec!["2017-03", "2017-04"]);
    assert_eq!(pivot.column_keys, vec!["Central", "West"]);
    assert_eq!(pivot.cell("2017-03", "Central"), Some(Some(100.0)));
    assert_eq!(pivot.cell("2017-03", "West"), Some(Some(50.0)));
    assert_eq!(pivot.cell("2017-04", "West"), Some(Some(0.0)));
    assert_eq!(pivot.cell("2017-04", "Central"), Some(None));
    assert_eq!(pivot.cell("2018-01", "Central"), None);
}

#[test]
fn pivot_cells_with_only_undefined_values_are_empty() {
    let raw = vec![
        SalesRecord {
            region: "East".into(),
            ..line("Furniture", 0.0, 0.0, 5.0, 1)
        },
        SalesRecord {
            region: "West".into(),
            ..line("Furniture", 100.0, 0.0, 25.0, 1)
        },
    ];
    let records = derive_all(&raw, &DeriveOptions::default());

    let pivot = Aggregator::default()
        .pivot(&records, Dimension::Category, Dimension::Region, Measure::ProfitMargin)
        .unwrap();

    assert_eq!(pivot.column_keys, vec!["East", "West"]);
    assert_eq!(pivot.cell("Furniture", "East"), Some(None));
    assert_eq!(pivot.cell("Furniture", "West"), Some(Some(25.0)));
}

#[test]
fn report_builds_over_three_records() {
    let report = build_report(&three_records(), &ReportOptions::default()).unwrap();
    assert_eq!(report.sections.len(), 8);

    let SectionBody::Table(categories) = &report.section("category_performance").unwrap().body
    else {
        panic!("category_performance should be a table");
    };
    let sales = agg(Measure::Sales, Reducer::Sum);
    assert_eq!(categories.value(&["Furniture", "Chairs"], sales), Some(Some(100.0)));
    assert_eq!(categories.value(&["Technology", "Chairs"], sales), Some(Some(200.0)));

    let SectionBody::Pivot(pivot) = &report.section("monthly_sales_by_region").unwrap().body
    else {
        panic!("monthly_sales_by_region should be a pivot");
    };
    assert_eq!(pivot.cell("2017-03", "Central"), Some(Some(300.0)));
}

#[test]
fn pivot_rejects_identical_axes() {
    let err = Aggregator::default()
        .pivot(&three_records(), Dimension::Region, Dimension::Region, Measure::Sales)
        .unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)));
}

#[test]
fn multi_stat_validates_its_arguments() {
    let records = three_records();
    let aggregator = Aggregator::default();
    let sales = agg(Measure::Sales, Reducer::Sum);

    let no_keys = aggregator.multi_stat(&records, &[], &[sales]);
    assert!(matches!(no_keys, Err(PipelineError::Validation(_))));

    let repeated_keys =
        aggregator.multi_stat(&records, &[Dimension::Region, Dimension::Region], &[sales]);
    assert!(matches!(repeated_keys, Err(PipelineError::Validation(_))));

    let no_values = aggregator.multi_stat(&records, &[Dimension::Region], &[]);
    assert!(matches!(no_values, Err(PipelineError::Validation(_))));

    let repeated_values = aggregator.multi_stat(&records, &[Dimension::Region], &[sales, sales]);
    assert!(matches!(repeated_values, Err(PipelineError::Validation(_))));
}

#[test]
fn empty_input_gives_empty_table() {
    let table = Aggregator::default()
        .group_reduce(&[], &[Dimension::Region], &[Measure::Sales], Reducer::Sum)
        .unwrap();
    assert!(table.is_empty());
}

#[test]
fn sorted_by_puts_undefined_last_and_limits() {
    let raw = vec![
        line("Furniture", 100.0, 0.0, 30.0, 1),
        line("Office Supplies", 0.0, 0.0, 5.0, 1),
        line("Technology", 100.0, 0.0, 60.0, 1),
    ];
    let records = derive_all(&raw, &DeriveOptions::default());
    let margin = agg(Measure::ProfitMargin, Reducer::Mean);

    let table = Aggregator::default()
        .multi_stat(&records, &[Dimension::Category], &[margin])
        .unwrap();

    let descending = table.sorted_by(margin, true, None).unwrap();
    let order: Vec<&str> = descending.rows.iter().map(|r| r.key[0].as_str()).collect();
    assert_eq!(order, vec!["Technology", "Furniture", "Office Supplies"]);

    let ascending = table.sorted_by(margin, false, Some(2)).unwrap();
    let order: Vec<&str> = ascending.rows.iter().map(|r| r.key[0].as_str()).collect();
    assert_eq!(order, vec!["Furniture", "Technology"]);

    let missing = table.sorted_by(agg(Measure::Sales, Reducer::Sum), true, None);
    assert!(matches!(missing, Err(PipelineError::Validation(_))));
}

#[test]
fn month_keys_sort_in_calendar_order() {
    let raw: Vec<SalesRecord> = [11, 2, 9]
        .into_iter()
        .map(|month| SalesRecord {
            order_date: date(2016, month, 1),
            ship_date: date(2016, month, 5),
            ..base_record()
        })
        .collect();
    let records = derive_all(&raw, &DeriveOptions::default());

    let table = Aggregator::default()
        .group_reduce(&records, &[Dimension::Month], &[Measure::Sales], Reducer::Sum)
        .unwrap();
    let months: Vec<&str> = table.rows.iter().map(|r| r.key[0].as_str()).collect();
    assert_eq!(months, vec!["02", "09", "11"]);
    approx(table.rows[0].values[0].unwrap(), 100.0);
}

#[test]
fn field_names_parse_from_text() {
    assert_eq!("Sub-Category".parse::<Dimension>().unwrap(), Dimension::SubCategory);
    assert_eq!("subcategory".parse::<Dimension>().unwrap(), Dimension::SubCategory);
    assert_eq!("year month".parse::<Dimension>().unwrap(), Dimension::YearMonth);
    assert!("postal_code".parse::<Dimension>().is_err());

    assert_eq!("profit-margin".parse::<Measure>().unwrap(), Measure::ProfitMargin);
    assert!("revenue".parse::<Measure>().is_err());

    assert_eq!(
        "profit_margin:avg".parse::<Aggregation>().unwrap(),
        agg(Measure::ProfitMargin, Reducer::Mean)
    );
    assert_eq!(
        "sales".parse::<Aggregation>().unwrap(),
        agg(Measure::Sales, Reducer::Sum)
    );
    assert!("sales:median".parse::<Aggregation>().is_err());
    assert_eq!(agg(Measure::Quantity, Reducer::Count).output_name(), "quantity_count");
}
