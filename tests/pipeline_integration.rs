//! End-to-end tests over the public `docsim` API.

use docsim::{
    collision_probability, compute_pairwise_graph, jaccard, parse_documents, shingles,
    PipelineConfig, Session, SessionState,
};

const DOCS: [&str; 3] = ["the cat sat", "the cat ran", "a dog barked"];

fn config(seed: u64) -> PipelineConfig {
    PipelineConfig::new()
        .with_k(3)
        .with_num_hashes(20)
        .with_num_bands(10)
        .with_seed(seed)
}

#[test]
fn cat_documents_share_shingles() {
    let a = shingles(DOCS[0], 3).unwrap();
    let b = shingles(DOCS[1], 3).unwrap();
    let c = shingles(DOCS[2], 3).unwrap();

    for shared in ["the", "he ", "e c", " ca", "cat", "at "] {
        assert!(a.contains(shared), "{shared:?}");
        assert!(b.contains(shared), "{shared:?}");
    }
    assert!(jaccard(&a, &b) > jaccard(&a, &c));
    assert_eq!(jaccard(&a, &c), 0.0);
}

#[test]
fn cat_documents_usually_collide_across_draws() {
    const DRAWS: u64 = 50;
    let mut cat_pairs = 0;
    let mut dog_pairs = 0;

    for seed in 0..DRAWS {
        let mut session = Session::new();
        let report = session.process(&DOCS, &config(seed)).unwrap();
        assert_eq!(report.index_stats.as_ref().unwrap().rows_per_band, 2);

        for edge in &report.candidate_edges {
            if (edge.source, edge.target) == (0, 1) {
                cat_pairs += 1;
            } else {
                dog_pairs += 1;
            }
        }
    }

    // Jaccard 0.5 with 10 bands of 2 rows collides with probability ~0.94.
    assert!(collision_probability(0.5, 10, 2) > 0.9);
    assert!(cat_pairs >= 35, "cat pair collided {cat_pairs}/{DRAWS}");
    assert!(dog_pairs <= 2, "dog document collided {dog_pairs} times");
}

#[test]
fn unseeded_build_answers_queries() {
    let mut session = Session::new();
    let cfg = PipelineConfig::new()
        .with_k(3)
        .with_num_hashes(20)
        .with_num_bands(10);
    let report = session.process(&DOCS, &cfg).unwrap();
    assert!(report.status.is_ok());

    let query = session.run_query(0).unwrap();
    assert!(!query.candidates.contains(&0));
    assert_eq!(query.top_neighbors, vec![1]);
    assert_eq!(query.ranked[0].score, 0.5);
}

#[test]
fn identical_documents_are_always_candidates() {
    let docs = [
        "lorem ipsum dolor",
        "something else entirely",
        "lorem ipsum dolor",
    ];
    for seed in 0..10 {
        let mut session = Session::new();
        session.process(&docs, &config(seed)).unwrap();
        let query = session.run_query(0).unwrap();
        assert!(query.candidates.contains(&2));
        assert_eq!(query.evaluation.true_positives, vec![2]);
    }
}

#[test]
fn text_input_to_graph() {
    let text = "the cat sat\n\nthe cat ran\n   \na dog barked\n";
    let documents = parse_documents(text);
    assert_eq!(documents, DOCS);

    let edges = compute_pairwise_graph(documents.as_slice(), 3, 0.3).unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!((edges[0].source, edges[0].target), (0, 1));
    assert_eq!(edges[0].weight, 0.5);
}

#[test]
fn documents_shorter_than_k_are_single_shingles() {
    let docs = ["ab", "ab", "abc"];
    let mut session = Session::new();
    session.process(&docs, &config(3).with_k(5)).unwrap();

    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.shingle_sets()[0].iter().collect::<Vec<_>>(), vec!["ab"]);
    let query = session.run_query(0).unwrap();
    assert!(query.candidates.contains(&1));
    assert!(!query.ranked.iter().any(|hit| hit.doc_id == 2));
}

#[test]
fn rebuild_with_new_documents_replaces_state() {
    let mut session = Session::new();
    session.process(&DOCS, &config(1)).unwrap();
    assert_eq!(session.state(), SessionState::Built);

    session.process(&["only one"], &config(1)).unwrap();
    assert_eq!(session.snapshot().unwrap().len(), 1);
    assert!(session.run_query(2).is_err());
    assert!(session.run_query(0).unwrap().candidates.is_empty());
}

#[test]
fn text_query_finds_near_duplicate() {
    let mut session = Session::new();
    session
        .process(&DOCS, &config(8).with_num_hashes(40).with_num_bands(20))
        .unwrap();

    let report = session.query_text("the cat sat down").unwrap();
    assert!(report.known_shingles < report.total_shingles);
    assert_eq!(report.ranked[0].doc_id, 0);
    assert_eq!(report.ranked[1].doc_id, 1);
}
