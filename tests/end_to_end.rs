use std::fs;

use market_match::config::{load_config, validate_config};
use market_match::engine::{Evaluator, Recommender};
use market_match::load::{load_market_data, SurveySource};
use market_match::supply::CacheConfig;

const SURVEY: &str = "\
user_id,name,age,city,preferred_category,expected_price_low,expected_price_high,favorite_keyword
U1,Asha,29,Pune,electronics,900,1100,phone
U2,Ravi,41,Delhi,electronics,40000,60000,laptop
U3,Meera,35,Pune,clothing,500,1500,shirt
U4,Broken,30,Delhi,electronics,5000,100,phone
";

const CATALOG: &str = r#"[
  {"id": "1", "title": "Phone X", "price": 1000.0, "category": "electronics", "rating": 4.5, "rating_count": 100},
  {"id": "2", "title": "Laptop Y", "price": 50000.0, "category": "electronics", "rating": 4.7, "rating_count": 200},
  {"id": "3", "title": "Phone Case", "price": 1150.0, "category": "electronics", "rating": 4.0, "rating_count": 30}
]"#;

#[tokio::test]
async fn files_to_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let survey_path = dir.path().join("survey.csv");
    let catalog_path = dir.path().join("catalog.json");
    let config_path = dir.path().join("config.yaml");

    fs::write(&survey_path, SURVEY).unwrap();
    fs::write(&catalog_path, CATALOG).unwrap();
    fs::write(
        &config_path,
        format!(
            "survey_path: {}\ncatalog:\n  path: {}\nengine:\n  sample_size: 10\n",
            survey_path.display(),
            catalog_path.display()
        ),
    )
    .unwrap();

    let config = load_config(Some(config_path)).unwrap();
    assert!(validate_config(&config).is_ok());

    let data = load_market_data(&config, &CacheConfig::default()).await.unwrap();
    assert_eq!(data.survey_source, SurveySource::File(survey_path));
    // U4 has an inverted budget
    assert_eq!(data.customers.len(), 3);
    assert_eq!(data.rejected.len(), 1);
    assert_eq!(data.products.len(), 3);

    let engine = config.engine();
    let recommender = Recommender::from_config(&engine);

    let asha = data.customer("U1").unwrap();
    let rec = recommender.recommend(asha, &data.products, 5);
    assert!(!rec.fallback);
    let ids: Vec<&str> = rec.candidates.iter().map(|c| c.product.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "3"]);

    let ravi = data.customer("U2").unwrap();
    let rec = recommender.recommend(ravi, &data.products, 5);
    assert_eq!(rec.top().unwrap().product.title, "Laptop Y");

    let report = Evaluator::from_config(&engine).evaluate(&data.customers, &data.products, engine.sample_size());
    assert_eq!(report.customers_total, 3);
    // U3 declared clothing
    assert!((report.category_coverage - 200.0 / 3.0).abs() < 1e-9);
    // U1 and U2 have a product inside budget; U3 (500-1500) has Phone X and the case
    assert_eq!(report.customers_price_matched, 3);
    assert_eq!(report.price_accuracy, 100.0);
    assert_eq!(report.customers_sampled, 3);
    assert_eq!(report.customers_skipped, 0);
    // Shirt matches nothing, U1 and U2 hit on their top pick
    assert!((report.precision_at_1_keyword - 200.0 / 3.0).abs() < 1e-9);
    assert_eq!(report.precision_at_1_price, 100.0);
}
