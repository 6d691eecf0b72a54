// tests/vocab_config.rs
use intel_triage::types::{ResultType, SearchResult};
use intel_triage::vocab::Vocabulary;
use intel_triage::Classifier;
use std::fs;

#[test]
fn toml_file_substitutes_vocabulary() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("vocabulary.toml");
    fs::write(
        &p,
        r#"
[classify]
company_domain_suffixes = [".io"]
company_keywords = ["Startup"]

[scoring]
relevance_keywords = ["quantum", "fusion"]
keyword_weight = 0.5

[scoring.type_bonus]
company_website = 0.4
"#,
    )
    .unwrap();

    let v = Vocabulary::load_from(&p).unwrap();
    assert_eq!(v.classify.company_keywords, vec!["startup".to_string()]);
    // unspecified bonus keeps its seed value
    assert!((v.scoring.type_bonus.research_report - 0.2).abs() < 1e-6);

    let c = Classifier::new(v);
    let r = SearchResult::new("Quantum startup", "https://q.io", "fusion too", 10);
    let t = c.classify(&r);
    assert_eq!(t, ResultType::CompanyWebsite);
    // 0 (position 10) + 0.5 * 2/2 + 0.4
    assert!((c.score(&r, t) - 0.9).abs() < 1e-6);
}

#[test]
fn json_file_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("vocabulary.json");
    fs::write(&p, r#"{"quality": {"authority_domains": ["ft.com"]}}"#).unwrap();
    let v = Vocabulary::load_from(&p).unwrap();
    assert_eq!(v.quality.authority_domains, vec!["ft.com".to_string()]);
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Vocabulary::load_from(&dir.path().join("nope.toml")).is_err());
}

#[test]
fn example_config_matches_builtin_seed() {
    let v: Vocabulary = toml::from_str(include_str!("../config/vocabulary.example.toml")).unwrap();
    assert_eq!(v, Vocabulary::default());
}

#[test]
fn toml_error_location_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("vocabulary.toml");
    fs::write(&p, "[scoring]\nposition_weight = 0.3\nkeyword_weight = \"high\"\n").unwrap();
    let err = Vocabulary::load_from(&p).unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("tried TOML"), "{msg}");
    assert!(msg.contains("line 3"), "{msg}");
}
