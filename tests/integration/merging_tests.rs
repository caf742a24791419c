//! Integration tests for the complete merging pass
//!
//! These tests run the merger end to end against the program fixtures.

use classmerge::config::{GraphConfig, MergeConfig};
use classmerge::lens::RepresentativeStrategy;
use classmerge::merger::HorizontalClassMerger;
use classmerge::program::{AccessFlags, ClassType, DexType, MethodRef, Program, ProgramClass, ProgramMethod, Proto, Use};
use classmerge::report::JsonReporter;
use std::path::PathBuf;

/// Get the path to the test fixtures directory
fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load(name: &str) -> Program {
    Program::from_file(&fixtures_path().join(name)).expect("Failed to load fixture")
}

fn class(name: &str) -> ClassType {
    ClassType::new(name)
}

#[test]
fn test_super_call_pins_both_classes() {
    let program = load("super_call.yaml");
    let outcome = HorizontalClassMerger::default().run(&program).unwrap();

    assert!(outcome.is_pinned(&class("com.example.A")));
    assert!(outcome.is_pinned(&class("com.example.B")));
    assert_eq!(outcome.pinned.len(), 1);
    assert!(!outcome.is_merged(&class("com.example.A")));
    assert!(!outcome.is_merged(&class("com.example.B")));
    assert_eq!(outcome.representative_of(&class("com.example.B")), class("com.example.B"));
}

#[test]
fn test_only_compatible_siblings_merge() {
    let program = load("siblings.yaml");
    let outcome = HorizontalClassMerger::default().run(&program).unwrap();

    assert_eq!(outcome.groups.len(), 1);
    assert_eq!(outcome.groups[0].representative, class("app.P1"));
    assert_eq!(outcome.groups[0].retired, vec![class("app.P2")]);
    assert!(!outcome.is_merged(&class("app.P3")));
    assert!(outcome.pinned.is_empty());

    // P2's members land on P1; clashing signatures get a fresh name
    let lens = &outcome.lens;
    assert_eq!(
        lens.method(&"app.P2#describe():java.lang.String".parse().unwrap()),
        "app.P1#describe$1():java.lang.String".parse::<MethodRef>().unwrap()
    );
    assert_eq!(
        lens.method(&"app.P2#<init>():void".parse().unwrap()),
        "app.P1#<init>$1():void".parse::<MethodRef>().unwrap()
    );
    assert_eq!(
        lens.field(&"app.P2#count:int".parse().unwrap()).holder,
        class("app.P1")
    );
}

#[test]
fn test_nested_classes_never_merge() {
    let program = load("nested.yaml");
    let outcome = HorizontalClassMerger::default().run(&program).unwrap();

    assert_eq!(outcome.pinned.len(), 1);
    assert_eq!(
        outcome.pinned[0].classes,
        vec![class("app.Outer"), class("app.Outer$1"), class("app.Outer$Inner")]
    );
    assert!(outcome.groups.is_empty());
}

#[test]
fn test_connected_classes_are_never_grouped() {
    // H1..H3 form a chain of package-private accesses; F1 and F2 are free
    let hidden = |name: &str, target: Option<&str>| {
        let mut method = ProgramMethod::new("m", Proto::void(), AccessFlags::public());
        if let Some(target) = target {
            method = method.with_code(vec![Use::NewInstance(DexType::class(target))]);
        }
        ProgramClass::new(class(name), AccessFlags::package_private())
            .with_super(class("p.Base"))
            .with_method(method)
    };
    let free = |name: &str| ProgramClass::new(class(name), AccessFlags::public()).with_super(class("p.Base"));

    let program = Program::new(vec![
        hidden("p.H1", Some("p.H2")),
        free("p.F1"),
        hidden("p.H2", Some("p.H3")),
        hidden("p.H3", None),
        free("p.F2"),
    ])
    .unwrap();
    let outcome = HorizontalClassMerger::default().run(&program).unwrap();

    for group in &outcome.groups {
        for retired in &group.retired {
            assert!(!outcome.is_pinned(retired));
        }
        assert!(!outcome.is_pinned(&group.representative));
    }
    assert_eq!(outcome.pinned[0].classes, vec![class("p.H1"), class("p.H2"), class("p.H3")]);
    assert_eq!(outcome.groups.len(), 1);
    assert_eq!(outcome.groups[0].representative, class("p.F1"));
    assert_eq!(outcome.groups[0].retired, vec![class("p.F2")]);
}

#[test]
fn test_config_from_file_drives_the_pass() {
    let config = MergeConfig::from_file(&fixtures_path().join("merge_config.yaml")).unwrap();
    assert_eq!(config.lens.representative, RepresentativeStrategy::MostMembers);

    let program = load("siblings.yaml");
    let outcome = HorizontalClassMerger::new(config).run(&program).unwrap();

    // P2 declares more members than P1
    assert_eq!(outcome.groups[0].representative, class("app.P2"));
    assert_eq!(outcome.groups[0].retired, vec![class("app.P1")]);
}

#[test]
fn test_excluded_packages_are_left_alone() {
    let config = MergeConfig {
        graph: GraphConfig {
            parallel: true,
            exclude_packages: vec!["app.**".to_string()],
        },
        ..MergeConfig::default()
    };

    let program = load("siblings.yaml");
    let outcome = HorizontalClassMerger::new(config).run(&program).unwrap();
    assert!(outcome.groups.is_empty());
    assert_eq!(outcome.stats.nodes, 0);
}

#[test]
fn test_json_report_for_fixture() {
    let program = load("siblings.yaml");
    let outcome = HorizontalClassMerger::default().run(&program).unwrap();

    let json = JsonReporter::new(None).render(&outcome).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["groups"][0]["representative"], "app.P1");
    assert_eq!(value["groups"][0]["members_renamed"], 2);
    assert_eq!(value["summary"]["program_classes"], 3);
    assert_eq!(value["summary"]["registry"]["unresolved"], 0);
}
