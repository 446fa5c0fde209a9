use async_trait::async_trait;
use mockall::mock;
use tempfile::TempDir;

use cineman_reco::{
    error::{AppError, AppResult},
    models::{HistoricalMovie, MovieRecord, Screening},
    services::{pipeline, CatalogSource, Recommender, TrainingConfig},
    storage::{Artifact, ArtifactStore},
};

mock! {
    pub Source {}

    #[async_trait]
    impl CatalogSource for Source {
        async fn historical(&self) -> AppResult<Vec<HistoricalMovie>>;
        async fn current(&self) -> AppResult<Vec<MovieRecord>>;
        async fn showtimes(&self) -> AppResult<Vec<Screening>>;
        fn name(&self) -> &'static str;
    }
}

fn training() -> TrainingConfig {
    TrainingConfig {
        dimension: 16,
        window: 4,
        min_count: 2,
        epochs: 20,
        buckets: 500,
        seed: Some(7),
        ..TrainingConfig::default()
    }
}

fn historical(title: &str, overview: &str, popularity: f64) -> HistoricalMovie {
    HistoricalMovie::new(MovieRecord::new(title, None, Some(overview)), popularity)
}

fn historical_catalog() -> Vec<HistoricalMovie> {
    vec![
        historical("Alien", "A space crew is hunted by a deadly alien creature aboard the ship.", 40.0),
        historical("Alien", "Old duplicate row with a stale overview.", 3.0),
        historical("Aliens", "Marines return to the planet and fight the alien creature in space.", 35.0),
        historical("Notting Hill", "A bookshop owner falls in love with a famous actress in London.", 20.0),
        historical("Love Actually", "Several couples fall in love in London during the holidays.", 25.0),
        historical("Untold", "Xyzzy plugh.", 1.0),
    ]
}

fn current_catalog() -> Vec<MovieRecord> {
    vec![
        MovieRecord::new(
            "Life",
            Some("Be careful what you search for"),
            Some("A space station crew finds an alien creature that hunts them aboard the ship."),
        )
        .with_genres(["Horror", "Science Fiction"]),
        MovieRecord::new(
            "Last Christmas",
            None,
            Some("A young woman in London falls in love during the holidays."),
        )
        .with_genres(["Romance", "Comedy"]),
        MovieRecord::new("Untitled", Some("No overview"), None),
    ]
}

fn source_with(historical: Vec<HistoricalMovie>, current: Vec<MovieRecord>) -> MockSource {
    let mut source = MockSource::new();
    source.expect_name().return_const("mock");
    source
        .expect_historical()
        .times(1)
        .returning(move || Ok(historical.clone()));
    source
        .expect_current()
        .times(1)
        .returning(move || Ok(current.clone()));
    source
}

#[tokio::test]
async fn test_rebuild_persists_aligned_artifacts() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(dir.path().join("artifacts"));
    let source = source_with(historical_catalog(), current_catalog());

    let report = pipeline::rebuild(&source, &store, &training()).await.unwrap();

    // 5 distinct historical titles with overview + 2 describable current titles,
    // while all 3 current titles are showing
    assert_eq!(report.rows, 7);
    assert_eq!(report.showing, 3);
    assert_eq!(report.zero_vector_documents, 1);
    assert_eq!(report.manifest.rows, 7);
    assert_eq!(report.manifest.dimension, 16);

    for artifact in [
        Artifact::Corpus,
        Artifact::Current,
        Artifact::Model,
        Artifact::Similarity,
        Artifact::Manifest,
    ] {
        assert!(store.path(artifact).exists(), "{} missing", artifact);
    }

    let snapshot = store.load_snapshot().await.unwrap();
    let titles: Vec<&str> = snapshot.merged.titles().collect();
    assert_eq!(
        titles,
        vec!["Alien", "Aliens", "Love Actually", "Notting Hill", "Untold", "Life", "Last Christmas"]
    );
    assert!(snapshot.merged.get(0).unwrap().description.contains("deadly"));
    assert!(snapshot.current.contains("Untitled"));
    assert!(!snapshot.merged.contains("Untitled"));

    let matrix = &snapshot.matrix;
    for i in 0..matrix.len() {
        for j in 0..matrix.len() {
            let value = matrix.get(i, j).unwrap();
            assert!(!value.is_nan());
            assert!((value - matrix.get(j, i).unwrap()).abs() < 1e-12);
        }
    }

    let untold = matrix.position("Untold").unwrap();
    assert!(matrix.row("Untold").unwrap().iter().all(|&v| v == 0.0));
    assert_eq!(matrix.get(untold, untold), Some(0.0));
    assert_eq!(matrix.get(0, 0), Some(1.0));

    let model = store.load_model().await.unwrap();
    assert_eq!(model.vocabulary_size(), report.vocabulary);
    assert!(model.contains("alien"));
    assert!(!model.contains("xyzzy"));
}

#[tokio::test]
async fn test_rebuilt_artifacts_serve_recommendations() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(dir.path());
    let source = source_with(historical_catalog(), current_catalog());

    pipeline::rebuild(&source, &store, &training()).await.unwrap();

    let snapshot = store.load_snapshot().await.unwrap();
    let recommender = Recommender::new(snapshot.merged, snapshot.current, snapshot.matrix).unwrap();

    for favorite in ["Alien", "Aliens", "Notting Hill", "Life", "Last Christmas"] {
        let recommendation = recommender.recommend(favorite).unwrap();
        assert_ne!(recommendation, favorite);
        assert!(["Life", "Last Christmas"].contains(&recommendation.as_str()));
    }

    assert!(matches!(
        recommender.recommend("Jaws"),
        Err(AppError::TitleNotFound(_))
    ));
}

#[tokio::test]
async fn test_empty_corpus_aborts_and_keeps_previous_artifacts() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(dir.path());

    let first = source_with(historical_catalog(), current_catalog());
    let report = pipeline::rebuild(&first, &store, &training()).await.unwrap();
    let manifest_before = store.load_manifest().await.unwrap();

    let empty = source_with(
        vec![HistoricalMovie::new(MovieRecord::new("Blank", None, None), 1.0)],
        vec![MovieRecord::new("Also blank", Some("tagline"), None)],
    );
    let result = pipeline::rebuild(&empty, &store, &training()).await;

    assert!(matches!(result, Err(AppError::InputEmpty)));
    assert_eq!(store.load_manifest().await.unwrap(), manifest_before);
    assert_eq!(store.load_snapshot().await.unwrap().merged.len(), report.rows);
}

#[tokio::test]
async fn test_source_failure_aborts_rebuild() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(dir.path().join("never-written"));

    let mut source = MockSource::new();
    source.expect_name().return_const("mock");
    source.expect_historical().returning(|| {
        Err(AppError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "historical export missing",
        )))
    });
    source.expect_current().never();

    let result = pipeline::rebuild(&source, &store, &training()).await;

    assert!(matches!(result, Err(AppError::Io(_))));
    assert!(!store.dir().exists());
}

#[tokio::test]
async fn test_seeded_rebuilds_are_reproducible() {
    let first_dir = TempDir::new().unwrap();
    let second_dir = TempDir::new().unwrap();
    let first = ArtifactStore::new(first_dir.path());
    let second = ArtifactStore::new(second_dir.path());

    pipeline::rebuild(&source_with(historical_catalog(), current_catalog()), &first, &training())
        .await
        .unwrap();
    pipeline::rebuild(&source_with(historical_catalog(), current_catalog()), &second, &training())
        .await
        .unwrap();

    let a = first.load_snapshot().await.unwrap();
    let b = second.load_snapshot().await.unwrap();
    assert_eq!(a.merged, b.merged);
    assert_eq!(a.matrix, b.matrix);
}
