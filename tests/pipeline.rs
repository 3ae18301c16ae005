use simnet::{
    run, write_outputs, Delimiter, Label, LabelField, OutputPaths, PipelineConfig, SimilarityMatrix,
};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Two blocks of four plus one outsider, tab separated, with an undefined entry.
const MATRIX: &str = "\
1\t0.9\t0.8\t0.85\t0.1\t0.1\t0.1\t0.1\t0\n\
0.9\t1\t0.9\t0.8\t0.1\t0.1\t0.1\t0.1\t0\n\
0.8\t0.9\t1\t0.9\t0.1\t0.1\t0.1\t0.1\t0\n\
0.85\t0.8\t0.9\t1\t0.1\t0.1\t0.1\t0.1\tNA\n\
0.1\t0.1\t0.1\t0.1\t1\t0.7\t0.75\t0.8\t0\n\
0.1\t0.1\t0.1\t0.1\t0.7\t1\t0.8\t0.7\t0\n\
0.1\t0.1\t0.1\t0.1\t0.75\t0.8\t1\t0.9\t0\n\
0.1\t0.1\t0.1\t0.1\t0.8\t0.7\t0.9\t1\t0\n\
0\t0\t0\tNA\t0\t0\t0\t0\t1\n";

fn load() -> SimilarityMatrix {
    let names: Vec<String> = "ant bee cat dog elk fox gnu hen owl"
        .split(' ')
        .map(String::from)
        .collect();
    SimilarityMatrix::from_reader(MATRIX.as_bytes(), Delimiter::Byte(b'\t'))
        .unwrap()
        .with_names(names)
        .unwrap()
}

fn config() -> PipelineConfig {
    PipelineConfig {
        k: 3,
        n_init: 10,
        cut_height: 1.0,
        layout_iterations: 100,
        ..PipelineConfig::default()
    }
}

#[test]
fn blocks_and_outsider() {
    init_logs();
    let m = load();
    assert!(m.get(3, 8).is_nan());

    let out = run(&m, &config()).unwrap();
    assert_eq!(out.graph.node_count(), 9);
    // 6 + 6 block edges at tau = 0.6
    assert_eq!(out.graph.edge_count(), 12);

    let nodes: Vec<_> = out.annotated.nodes().collect();
    let owl = nodes.iter().find(|n| n.name == "owl").unwrap();
    assert_eq!(owl.community, Label::Unassigned);

    let co = out.annotated.group_sizes(LabelField::Community);
    assert_eq!(co.get(&Label::Cluster(1)), Some(&4));
    assert_eq!(co.get(&Label::Cluster(2)), Some(&4));
    assert_eq!(co.get(&Label::Unassigned), Some(&1));

    for field in [LabelField::Kmeans, LabelField::Hierarchical] {
        let groups = out.annotated.group_sizes(field);
        assert!(!groups.contains_key(&Label::Unassigned));
        assert_eq!(groups.values().sum::<usize>(), 9);
    }
}

#[test]
fn tutorial_defaults_on_small_input() {
    // K = 4 and h = 7 from the defaults; everything fits under one cut
    let out = run(&load(), &PipelineConfig::default()).unwrap();
    assert_eq!(out.annotated.group_sizes(LabelField::Hierarchical).len(), 1);
    assert_eq!(out.annotated.group_sizes(LabelField::Kmeans).len(), 4);
}

#[test]
fn writes_every_view() {
    init_logs();
    let out = run(&load(), &config()).unwrap();
    let dir = std::env::temp_dir().join(format!("simnet-it-{}", std::process::id()));
    let paths = OutputPaths::in_dir(&dir);
    write_outputs(&out, &config(), &paths).unwrap();

    for path in [&paths.kmeans_svg, &paths.hclust_svg, &paths.interactive_html, &paths.nodes_csv] {
        let meta = std::fs::metadata(path).unwrap();
        assert!(meta.len() > 0, "{} is empty", path.display());
    }
    assert!(!paths.elbow_csv.exists());

    let html = std::fs::read_to_string(&paths.interactive_html).unwrap();
    assert!(html.contains("\"name\":\"owl\""));
    let table = std::fs::read_to_string(&paths.nodes_csv).unwrap();
    assert!(table.contains("owl,"));
    assert!(table.contains(",unassigned,"));

    let _ = std::fs::remove_dir_all(&dir);
}
