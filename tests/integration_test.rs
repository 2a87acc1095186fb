use polars::prelude::*;
use relation_engine::config::RelateConfig;
use relation_engine::dataset::{joined_columns, RelationshipType};
use relation_engine::ingestion::load_dataset;
use relation_engine::profiler::{ColumnProfiler, SemanticType};
use relation_engine::scheduler::{detect_relationships_cooperative, CancellationFlag, TokioYield};
use relation_engine::workspace::Workspace;
use relation_engine::{all_relationships, detect_relationships, join_datasets};
use serde_json::json;
use std::fs;
use std::error::Error;
use std::path::{Path, PathBuf};

/// Fresh scratch directory so file stems stay readable as dataset names
fn scratch_dir() -> PathBuf {
    let name = format!("relation_engine_it_{}", uuid::Uuid::new_v4().simple());
    let dir = std::env::temp_dir().join(name);
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Create test data files in CSV format
fn create_csv_files(data_dir: &Path) -> Result<(PathBuf, PathBuf), Box<dyn Error>> {
    let customers = data_dir.join("customers.csv");
    fs::write(
        &customers,
        "customer_id,name,signup_date\n\
         C1,Asha,2024-01-15\n\
         C2,Bruno,2024-02-20\n\
         C3,Chen,2024-03-02\n",
    )?;

    // C1 has two orders, C3 has none, C4 is unknown to customers
    let orders = data_dir.join("orders.csv");
    fs::write(
        &orders,
        "order_id,customer_id,amount\n\
         1,C1,120.5\n\
         2,C1,80\n\
         3,C2,42\n\
         4,C4,10\n",
    )?;

    Ok((customers, orders))
}

/// Create test data files in Parquet format
fn create_parquet_files(data_dir: &Path) -> Result<(PathBuf, PathBuf), Box<dyn Error>> {
    let loans_df = df! [
        "loan_id" => ["1001", "1002", "1003"],
        "customer_id" => ["C001", "C002", "C003"],
        "principal_amount" => [100000.0, 50000.0, 75000.0]
    ]?;
    let loans_path = data_dir.join("loans.parquet");
    let mut file = fs::File::create(&loans_path)?;
    ParquetWriter::new(&mut file).finish(&mut loans_df.clone())?;

    let emis_df = df! [
        "loan_id" => ["1001", "1001", "1002", "1003"],
        "emi_number" => [1i64, 2, 1, 1],
        "emi_amount" => [5000.0, 5000.0, 3000.0, 2500.0]
    ]?;
    let emis_path = data_dir.join("emis.parquet");
    let mut file = fs::File::create(&emis_path)?;
    ParquetWriter::new(&mut file).finish(&mut emis_df.clone())?;

    Ok((loans_path, emis_path))
}

#[test]
fn test_csv_detect_and_join() {
    let dir = scratch_dir();
    let (customers_path, orders_path) = create_csv_files(&dir).expect("Failed to create CSV files");

    let customers = load_dataset(&customers_path).unwrap();
    let orders = load_dataset(&orders_path).unwrap();
    assert_eq!(customers.name, "customers");
    assert_eq!(orders.row_count(), 4);

    let datasets = detect_relationships(&[customers, orders], &RelateConfig::default());
    let relationships = all_relationships(&datasets);

    // customer_id: 2 of 3 distinct values overlap, identical names boost 0.667 to 0.8
    assert_eq!(relationships.len(), 1);
    let rel = &relationships[0];
    assert_eq!(rel.source_file, datasets[0].id);
    assert_eq!(rel.target_file, datasets[1].id);
    assert_eq!(rel.source_column, "customer_id");
    assert_eq!(rel.target_column, "customer_id");
    assert_eq!(rel.matching_rows, 2);
    assert!((rel.confidence - 0.8).abs() < 1e-9);
    assert!(datasets[1].relationships.is_empty());

    let rows = join_datasets(&datasets, &relationships);
    assert_eq!(rows.len(), 4);

    assert_eq!(rows[0]["name"], json!("Asha"));
    assert_eq!(rows[0]["order_id"], json!(1));
    assert_eq!(rows[0]["orders_customer_id"], json!("C1"));
    assert_eq!(rows[1]["amount"], json!(80));
    assert_eq!(rows[2]["amount"], json!(42));

    // C3 never ordered and survives unchanged
    assert_eq!(rows[3]["customer_id"], json!("C3"));
    assert!(rows[3].get("order_id").is_none());

    let columns = joined_columns(&rows);
    assert_eq!(
        columns,
        vec!["customer_id", "name", "signup_date", "order_id", "orders_customer_id", "amount"]
    );

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_parquet_detect_and_join() {
    let dir = scratch_dir();
    let (loans_path, emis_path) =
        create_parquet_files(&dir).expect("Failed to create Parquet files");

    let loans = load_dataset(&loans_path).unwrap();
    let emis = load_dataset(&emis_path).unwrap();
    assert_eq!(loans.columns, vec!["loan_id", "customer_id", "principal_amount"]);
    assert_eq!(emis.rows[1]["emi_number"], json!(2));

    let datasets = detect_relationships(&[loans, emis], &RelateConfig::default());
    let relationships = all_relationships(&datasets);

    let loan_link = relationships
        .iter()
        .find(|r| r.source_column == "loan_id" && r.target_column == "loan_id")
        .expect("loan_id relationship");
    assert_eq!(loan_link.confidence, 1.0);
    assert_eq!(loan_link.matching_rows, 3);
    // every loan matched, but 1001 repeats on the EMI side
    assert_eq!(loan_link.relationship_type, RelationshipType::OneToMany);

    let rows = join_datasets(&datasets, &relationships);
    // loan 1001 fans out over its two EMIs
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0]["loan_id"], json!("1001"));
    assert_eq!(rows[1]["emi_number"], json!(2));
    assert_eq!(rows[3]["emi_amount"], json!(2500.0));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_profile_loaded_file() {
    let dir = scratch_dir();
    let (customers_path, orders_path) = create_csv_files(&dir).expect("Failed to create CSV files");
    let profiler = ColumnProfiler::default();

    let customers = profiler.profile_dataset(&load_dataset(&customers_path).unwrap());
    assert_eq!(customers.len(), 3);
    assert_eq!(customers[2].name, "signup_date");
    assert_eq!(customers[2].semantic_type, SemanticType::Date);

    let orders = profiler.profile_dataset(&load_dataset(&orders_path).unwrap());
    assert_eq!(orders[2].name, "amount");
    assert_eq!(orders[2].semantic_type, SemanticType::Numeric);
    assert_eq!(orders[1].cardinality, 3);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_workspace_lifecycle() {
    let dir = scratch_dir();
    let (customers_path, orders_path) = create_csv_files(&dir).expect("Failed to create CSV files");

    let mut ws = Workspace::new(RelateConfig::default());
    ws.add_dataset(load_dataset(&customers_path).unwrap());
    let orders_id = ws.add_dataset(load_dataset(&orders_path).unwrap());

    assert_eq!(ws.relationship_summary().total, 1);
    assert_eq!(ws.joined_rows().len(), 4);

    ws.remove_dataset(&orders_id).unwrap();
    assert!(ws.relationships().is_empty());
    assert!(ws.joined_rows().is_empty());

    fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_cooperative_detection_over_files() {
    let dir = scratch_dir();
    let (customers_path, orders_path) = create_csv_files(&dir).expect("Failed to create CSV files");
    let datasets = vec![
        load_dataset(&customers_path).unwrap(),
        load_dataset(&orders_path).unwrap(),
    ];
    let config = RelateConfig::default();
    let cancel = CancellationFlag::new();

    let detected = detect_relationships_cooperative(&datasets, &config, &TokioYield, &cancel)
        .await
        .unwrap();
    let relationships = all_relationships(&detected);
    assert_eq!(relationships.len(), 1);
    assert_eq!(relationships[0].source_column, "customer_id");

    fs::remove_dir_all(&dir).ok();
}
