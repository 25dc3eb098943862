mod common;

use std::sync::Arc;

use common::{game, store_link, test_config, FakeFactory, FakePage};
use serde_json::json;
use vr_review_harvester::models::{SkipLedgerEntry, SkipReason};
use vr_review_harvester::orchestrator::Verifier;
use vr_review_harvester::persistence::json_mirror::read_mirror;
use vr_review_harvester::persistence::{count_review_rows, Table};
use vr_review_harvester::services::SkipLedger;
use vr_review_harvester::{App, ArtifactLayout, HarvestFlow, HarvestOutcome, ItemCtx};

fn skip_log_lines(layout: &ArtifactLayout) -> Vec<String> {
    std::fs::read_to_string(layout.skip_log())
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

fn seed_processed(layout: &ArtifactLayout, slug: &str) {
    std::fs::create_dir_all(layout.root()).unwrap();
    let entry = SkipLedgerEntry::new(slug, store_link(slug), SkipReason::Processed);
    std::fs::write(layout.skip_log(), entry.to_line()).unwrap();
}

fn review_tables(layout: &ArtifactLayout) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(layout.reviews_table_dir())
        .map(|dir| {
            dir.filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[tokio::test]
async fn test_three_item_catalog_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let layout = ArtifactLayout::new(dir.path());
    seed_processed(&layout, "already-done");

    let factory = Arc::new(
        FakeFactory::new()
            .page(store_link("few-reviews"), FakePage::with_reviews(10))
            .page(store_link("many-reviews"), FakePage::with_reviews(40)),
    );
    let counters = factory.counters.clone();

    let app = App::initialize(config).await.unwrap();
    let catalog = vec![game("already-done"), game("few-reviews"), game("many-reviews")];
    let summary = app.harvest(catalog, factory).await.unwrap();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.low_yield, 1);
    assert_eq!(summary.failed, 0);
    assert!(!summary.has_failures());

    // 已处理的游戏不启动会话，其余每个会话都被关闭
    assert_eq!(counters.opened(), 2);
    assert_eq!(counters.closed(), 2);

    let table = Table::read(&layout.catalog_table()).unwrap();
    assert_eq!(table.rows.len(), 1);
    let links: Vec<&str> = table.column("store_link").collect();
    assert_eq!(links, vec![store_link("many-reviews")]);
    assert_eq!(table.column("Developer").collect::<Vec<_>>(), vec!["Beat Games"]);
    assert_eq!(
        table.column("description").collect::<Vec<_>>(),
        vec!["Slash the beats. Feel the rhythm."]
    );

    let mirror = read_mirror(&layout.catalog_mirror()).unwrap();
    assert_eq!(mirror.len(), 1);
    assert_eq!(mirror[0]["Version"], json!("1.40.0"));

    let lines = skip_log_lines(&layout);
    assert_eq!(lines.len(), 2);
    let added = SkipLedgerEntry::parse_line(&lines[1]).unwrap();
    assert_eq!(added.item_name, "few-reviews");
    assert_eq!(added.reason, SkipReason::LowYield);

    assert_eq!(review_tables(&layout), vec!["many-reviews.tsv"]);
    let tsv = layout.reviews_table_dir().join("many-reviews.tsv");
    assert_eq!(count_review_rows(&tsv).unwrap(), 40);
    assert!(layout.reviews_csv_dir().join("many-reviews_40.csv").exists());

    let run_log = std::fs::read_to_string(dir.path().join("harvest_run.log")).unwrap();
    assert!(run_log.contains("成功: 1"));
}

#[tokio::test]
async fn test_second_run_skips_everything_already_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ArtifactLayout::new(dir.path());
    let factory = Arc::new(
        FakeFactory::new()
            .page(store_link("few-reviews"), FakePage::with_reviews(10))
            .page(store_link("many-reviews"), FakePage::with_reviews(40)),
    );
    let counters = factory.counters.clone();
    let catalog = vec![game("few-reviews"), game("many-reviews")];

    let app = App::initialize(test_config(dir.path())).await.unwrap();
    let first = app.harvest(catalog.clone(), factory.clone()).await.unwrap();
    assert_eq!(first.processed, 1);
    assert_eq!(first.low_yield, 1);

    let opened_after_first = counters.opened();
    let lines_after_first = skip_log_lines(&layout).len();

    let second = app.harvest(catalog, factory).await.unwrap();
    assert_eq!(second.skipped, 2);
    assert_eq!(second.processed, 0);
    assert_eq!(counters.opened(), opened_after_first);
    assert_eq!(skip_log_lines(&layout).len(), lines_after_first);
    assert_eq!(layout.catalog().row_count().unwrap(), 1);
}

#[tokio::test]
async fn test_low_yield_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    assert_eq!(config.low_yield_threshold, 25);
    let layout = ArtifactLayout::new(dir.path());

    let factory = Arc::new(
        FakeFactory::new()
            .page(store_link("exactly-25"), FakePage::with_reviews(25))
            .page(store_link("exactly-26"), FakePage::with_reviews(26)),
    );
    let flow = HarvestFlow::new(factory, &layout, &config);

    let at = flow
        .run(&game("exactly-25"), &ItemCtx::new(1, 1, 2, "exactly-25".into()))
        .await;
    assert_eq!(at, HarvestOutcome::LowYield { reviews: 25 });

    let above = flow
        .run(&game("exactly-26"), &ItemCtx::new(1, 2, 2, "exactly-26".into()))
        .await;
    assert_eq!(above, HarvestOutcome::Persisted { reviews: 26 });

    assert_eq!(review_tables(&layout), vec!["exactly-26.tsv"]);
    let tsv = layout.reviews_table_dir().join("exactly-26.tsv");
    assert_eq!(count_review_rows(&tsv).unwrap(), 26);

    let ledger = SkipLedger::new(layout.catalog(), layout.skip_log());
    assert!(ledger.is_processed(&store_link("exactly-25")).unwrap());
    assert!(ledger.is_processed(&store_link("exactly-26")).unwrap());
    assert_eq!(layout.catalog().row_count().unwrap(), 1);
}

#[tokio::test]
async fn test_click_cap_stops_disclosure() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.max_load_more_clicks = 1;
    config.low_yield_threshold = 5;
    let layout = ArtifactLayout::new(dir.path());

    let factory = Arc::new(
        FakeFactory::new().page(store_link("endless"), FakePage::with_reviews(500)),
    );
    let flow = HarvestFlow::new(factory, &layout, &config);

    let outcome = flow
        .run(&game("endless"), &ItemCtx::new(1, 1, 1, "endless".into()))
        .await;
    assert_eq!(outcome, HarvestOutcome::Persisted { reviews: 20 });
}

#[tokio::test]
async fn test_soft_faults_still_persist_reviews() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let layout = ArtifactLayout::new(dir.path());

    // 导航超时、详情读取出错、第 3 次点击出错：都不影响已渲染的评论
    let flaky = FakePage {
        time_out: true,
        click_error_after: Some(2),
        details_error: true,
        ..FakePage::with_reviews(60)
    };
    let factory = Arc::new(FakeFactory::new().page(store_link("flaky"), flaky));
    let counters = factory.counters.clone();
    let flow = HarvestFlow::new(factory, &layout, &config);

    let outcome = flow
        .run(&game("flaky"), &ItemCtx::new(1, 1, 1, "flaky".into()))
        .await;
    assert_eq!(outcome, HarvestOutcome::Persisted { reviews: 30 });
    assert_eq!(counters.closed(), 1);

    let table = Table::read(&layout.catalog_table()).unwrap();
    assert_eq!(table.rows.len(), 1);
    assert!(table.column_index("Developer").is_none());
    assert!(table.column_index("description").is_none());

    let tsv = layout.reviews_table_dir().join("flaky.tsv");
    assert_eq!(count_review_rows(&tsv).unwrap(), 30);
}

#[tokio::test]
async fn test_session_faults_are_retried_next_run() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ArtifactLayout::new(dir.path());
    let broken_nav = FakePage {
        fail_navigation: true,
        ..FakePage::with_reviews(40)
    };
    let factory = Arc::new(FakeFactory::new().page(store_link("unreachable"), broken_nav));
    let counters = factory.counters.clone();

    let app = App::initialize(test_config(dir.path())).await.unwrap();
    let summary = app
        .harvest(vec![game("unreachable"), game("missing-page")], factory)
        .await
        .unwrap();

    assert_eq!(summary.session_failed, 2);
    assert!(!summary.has_failures());
    assert_eq!(counters.opened(), counters.closed());
    assert!(skip_log_lines(&layout).is_empty());
    assert_eq!(layout.catalog().row_count().unwrap(), 0);

    let failing = Arc::new(FakeFactory::new().failing_open());
    let summary = app.harvest(vec![game("unreachable")], failing).await.unwrap();
    assert_eq!(summary.session_failed, 1);
}

#[tokio::test]
async fn test_panic_in_one_item_is_contained() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.worker_count = Some(1);
    let layout = ArtifactLayout::new(dir.path());

    let exploding = FakePage {
        panic_on_reviews: true,
        ..FakePage::with_reviews(40)
    };
    let factory = Arc::new(
        FakeFactory::new()
            .page(store_link("exploding"), exploding)
            .page(store_link("after-explosion"), FakePage::with_reviews(30)),
    );
    let counters = factory.counters.clone();

    let app = App::initialize(config).await.unwrap();
    let summary = app
        .harvest(vec![game("exploding"), game("after-explosion")], factory)
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failed_items, vec!["exploding".to_string()]);
    assert_eq!(summary.processed, 1);
    assert!(summary.has_failures());
    assert_eq!(counters.closed(), 2);
    assert_eq!(review_tables(&layout), vec!["after-explosion.tsv"]);
}

#[tokio::test]
async fn test_verifier_records_each_file_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.verify_base_url = "https://www.meta.com/experiences/".to_string();
    let layout = ArtifactLayout::new(dir.path());

    let factory = Arc::new(FakeFactory::new().page(
        store_link("many-reviews"),
        FakePage {
            summary: Some("1,204 ratings, 40 reviews".to_string()),
            ..FakePage::with_reviews(40)
        },
    ));

    let app = App::initialize(config.clone()).await.unwrap();
    app.harvest(vec![game("many-reviews")], factory.clone())
        .await
        .unwrap();

    let verifier = Verifier::new(factory, &layout, &config);
    let first = verifier.scan_once().await.unwrap();
    assert_eq!(first.verified, 1);

    let second = verifier.scan_once().await.unwrap();
    assert_eq!(second.verified, 0);
    assert_eq!(second.already_verified, 1);

    let log = Table::read(&layout.verification_log()).unwrap();
    assert_eq!(log.rows.len(), 1);
    assert_eq!(log.column("filename").collect::<Vec<_>>(), vec!["many-reviews.tsv"]);
    assert_eq!(log.column("ratings").collect::<Vec<_>>(), vec!["1204"]);
    assert_eq!(log.column("reviews").collect::<Vec<_>>(), vec!["40"]);
    assert_eq!(log.column("file_reviews").collect::<Vec<_>>(), vec!["40"]);
}
