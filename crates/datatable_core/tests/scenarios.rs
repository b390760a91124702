use datatable_core::aggregate::{Count, Sum};
use datatable_core::hierarchy::KeyCriterion;
use datatable_core::{
    Aggregations, EngineConfig, FilterCriterion, JoinOptions, JoinType, Table, TableStream, Value,
    row, table,
};

#[test]
fn full_outer_join_on_id() {
    logutil::init_test();
    let a = table!(["id", "name"]; [1, "x"], [2, "y"]);
    let b = table!(["id", "dept"]; [1, "eng"], [3, "ops"]);

    let out = a.join(&b, &JoinOptions::on([("id", "id")], JoinType::Full)).unwrap();

    assert_eq!(
        vec!["dept", "id", "name"],
        out.headers().collect::<Vec<_>>()
    );
    assert_eq!(
        &[
            row! { "id" => 1, "name" => "x", "dept" => "eng" },
            row! { "id" => 2, "name" => "y", "dept" => Value::Null },
            row! { "id" => 3, "name" => Value::Null, "dept" => "ops" },
        ],
        out.rows()
    );
}

#[test]
fn aggregate_sum_and_count_by_dept() {
    logutil::init_test();
    let t = table!(["dept", "amount"]; ["A", 10], ["A", 5], ["B", 7]);
    let aggs = Aggregations::new()
        .with("total", Sum::new("amount"))
        .with("n", Count);

    let out = t.aggregate(&["dept"], &aggs).unwrap();
    assert_eq!(table!(["dept", "total", "n"]; ["A", 15, 2], ["B", 7, 1]), out);
}

#[test]
fn stream_pipeline_matches_table_operations() {
    logutil::init_test();
    let orders = table!(["order", "customer", "amount"];
        [1, "ann", 20],
        [2, "bob", 5],
        [3, "ann", 20],
        [4, "cat", 12],
    );
    let customers = table!(["customer", "region"]; ["ann", "north"], ["bob", "south"]);

    let mut stream = TableStream::from_table(&orders)
        .filter_by(vec![(
            "amount",
            FilterCriterion::predicate(|v| v.as_i64().is_some_and(|a| a >= 10)),
        )])
        .unwrap()
        .join(&customers, &JoinOptions::natural(JoinType::Left))
        .unwrap()
        .exclude(["order"]);

    let streamed = stream.materialize().unwrap();
    let expected = orders
        .filter(|r| r.get_or_null("amount").as_i64().is_some_and(|a| a >= 10))
        .join(&customers, &JoinOptions::natural(JoinType::Left))
        .unwrap()
        .excluded(["order"]);
    assert_eq!(expected, streamed);

    // Materialized sources replay.
    assert_eq!(streamed, stream.materialize().unwrap());
    assert_eq!(2, streamed.distinct().len());
}

#[test]
fn hierarchy_report_and_diff() {
    logutil::init_test();
    let before = table!(["region", "rep", "sales"];
        ["north", "ann", 10],
        ["north", "bob", 4],
        ["south", "cat", 7],
    );
    let after = table!(["region", "rep", "sales"];
        ["north", "ann", 12],
        ["north", "bob", 4],
        ["west", "dan", 3],
    );

    let h = before.index(&["region", "rep"], None).unwrap();
    let north = h.subset(&[KeyCriterion::key("north")]).unwrap();
    assert_eq!(2, north.len());

    let totals = h
        .reindex(&["region"], None)
        .unwrap()
        .aggregate(&Aggregations::new().with("sales", Sum::new("sales")))
        .unwrap()
        .to_table();
    assert_eq!(table!(["region", "sales"]; ["north", 14], ["south", 7]), totals);

    let results = before.diff(&after, &["region", "rep"]).unwrap();
    assert_eq!(3, results.len());
    assert_eq!(vec!["sales".to_string()], results.changed_fields());

    let report = results.format_with_config(&EngineConfig::default()).unwrap();
    let expected = "\
Buckets don't match number of rows:
region, rep | From Rows    To Rows
 south, cat | 1            0
  west, dan | 0            1
Changes in common buckets:
region, rep | sales
 north, ann | 10    12";
    assert_eq!(expected, report);

    let as_hierarchy = datatable_core::hierarchy::diff_tables(&before, &after, &["region", "rep"])
        .unwrap()
        .unwrap();
    assert_eq!(
        vec![Value::from("north"), Value::from("south"), Value::from("west")],
        as_hierarchy.keys().cloned().collect::<Vec<_>>()
    );
}

#[test]
fn empty_inputs_are_not_errors() {
    logutil::init_test();
    let empty = Table::new();
    let t = table!(["a"]; [1]);

    assert_eq!(t, empty.appended(&t).unwrap());
    assert!(empty.aggregate(&["a"], &Aggregations::new()).unwrap().is_empty());
    assert!(empty.diff(&empty, &["a"]).unwrap().is_empty());
    assert!(empty.index(&["a"], None).unwrap().is_empty());
    assert_eq!(None, empty.min_row(&["a"]).unwrap());
}
