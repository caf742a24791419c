//! Integration tests for the policy chain

use classmerge::config::MergeConfig;
use classmerge::oracle::AppInfo;
use classmerge::policy::{
    apply_policy_chain, KeyResult, MergeGroup, MergeKey, MergePolicy, PolicyChain, PolicyContext, PolicyKind,
    PolicyPhase,
};
use classmerge::program::{AccessFlags, ClassType, Program, ProgramClass};
use std::path::PathBuf;

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn names(groups: &[MergeGroup]) -> Vec<Vec<String>> {
    groups
        .iter()
        .map(|g| g.classes().iter().map(|c| c.to_string()).collect())
        .collect()
}

fn group(classes: &[&str]) -> MergeGroup {
    MergeGroup::new(classes.iter().map(|c| ClassType::new(*c)).collect())
}

#[test]
fn test_same_parent_class_splits_siblings() {
    let program = Program::from_file(&fixtures_path().join("siblings.yaml")).unwrap();
    let app_info = AppInfo::new(&program);
    let ctx = PolicyContext::new(&program, &app_info);

    let chain = PolicyChain::from_kinds(&[vec![PolicyKind::SameParentClass]], vec![]);
    let result = apply_policy_chain(vec![group(&["app.P1", "app.P2", "app.P3"])], &chain, &ctx);

    assert_eq!(
        names(&result.groups),
        vec![vec!["app.P1".to_string(), "app.P2".to_string()], vec!["app.P3".to_string()]]
    );
    assert_eq!(result.mergeable_groups().count(), 1);
}

#[test]
fn test_default_chain_keeps_singletons() {
    let program = Program::from_file(&fixtures_path().join("siblings.yaml")).unwrap();
    let app_info = AppInfo::new(&program);
    let ctx = PolicyContext::new(&program, &app_info);

    let result = apply_policy_chain(
        vec![group(&["app.P1", "app.P2", "app.P3"])],
        &PolicyChain::default(),
        &ctx,
    );
    assert_eq!(result.groups.len(), 2);
    assert_eq!(result.groups[1].classes(), &[ClassType::new("app.P3")]);
    assert!(result.ineligible.is_empty());
}

#[test]
fn test_chain_from_config() {
    let config: MergeConfig = serde_yaml::from_str(
        r#"
policies:
  phases:
    - [no-keep-rules]
  keep: ["p.Keep*"]
"#,
    )
    .unwrap();

    let program = Program::new(vec![
        ProgramClass::new(ClassType::new("p.A"), AccessFlags::public()),
        ProgramClass::new(ClassType::new("p.KeepA"), AccessFlags::public()),
        ProgramClass::new(ClassType::new("q.B"), AccessFlags::public()),
    ])
    .unwrap();
    let app_info = AppInfo::new(&program);
    let ctx = PolicyContext::new(&program, &app_info);

    let result = apply_policy_chain(vec![group(&["p.A", "p.KeepA", "q.B"])], &config.policies.chain(), &ctx);
    // Package is not part of this chain, so p.A and q.B share a group
    assert_eq!(names(&result.groups), vec![vec!["p.A".to_string(), "q.B".to_string()]]);
    assert_eq!(result.ineligible.len(), 1);
    assert_eq!(result.ineligible[0].policy, "no-keep-rules");
}

/// Keys classes by the length of their simple name
struct NameLengthPolicy;

impl MergePolicy for NameLengthPolicy {
    fn name(&self) -> &'static str {
        "name-length"
    }

    fn merge_key(&self, class: &ProgramClass, _ctx: &PolicyContext<'_>) -> KeyResult {
        KeyResult::Key(MergeKey::Text(class.class_type.simple_name().len().to_string()))
    }
}

#[test]
fn test_custom_policy_phase() {
    let program = Program::new(vec![
        ProgramClass::new(ClassType::new("p.Ab"), AccessFlags::public()),
        ProgramClass::new(ClassType::new("p.Abc"), AccessFlags::public()),
        ProgramClass::new(ClassType::new("p.Cd"), AccessFlags::public()),
        ProgramClass::new(ClassType::new("p.I"), AccessFlags::public().with_interface()),
    ])
    .unwrap();
    let app_info = AppInfo::new(&program);
    let ctx = PolicyContext::new(&program, &app_info);

    let chain = PolicyChain::new(vec![
        PolicyPhase::new(vec![PolicyKind::NoInterfaces.build(&[])]),
        PolicyPhase::new(vec![Box::new(NameLengthPolicy) as Box<dyn MergePolicy>]),
    ]);
    let result = apply_policy_chain(vec![group(&["p.Ab", "p.Abc", "p.Cd", "p.I"])], &chain, &ctx);

    assert_eq!(
        names(&result.groups),
        vec![vec!["p.Ab".to_string(), "p.Cd".to_string()], vec!["p.Abc".to_string()]]
    );
    assert_eq!(result.ineligible[0].class, ClassType::new("p.I"));
}

#[test]
fn test_phase_order_does_not_change_partition() {
    let program = Program::new(vec![
        ProgramClass::new(ClassType::new("a.X"), AccessFlags::public()).with_super(ClassType::new("a.K")),
        ProgramClass::new(ClassType::new("b.Y"), AccessFlags::public()).with_super(ClassType::new("a.K")),
        ProgramClass::new(ClassType::new("a.Z"), AccessFlags::public()).with_super(ClassType::new("a.K")),
        ProgramClass::new(ClassType::new("a.W"), AccessFlags::public().with_abstract())
            .with_super(ClassType::new("a.K")),
    ])
    .unwrap();
    let app_info = AppInfo::new(&program);
    let ctx = PolicyContext::new(&program, &app_info);
    let input = || vec![group(&["a.X", "b.Y", "a.Z", "a.W"])];

    let split = PolicyChain::from_kinds(
        &[
            vec![PolicyKind::SamePackage],
            vec![PolicyKind::SameAccessKind],
            vec![PolicyKind::SameParentClass],
        ],
        vec![],
    );
    let merged = PolicyChain::from_kinds(
        &[vec![
            PolicyKind::SameParentClass,
            PolicyKind::SameAccessKind,
            PolicyKind::SamePackage,
        ]],
        vec![],
    );

    let expected = vec![
        vec!["a.X".to_string(), "a.Z".to_string()],
        vec!["a.W".to_string()],
        vec!["b.Y".to_string()],
    ];
    assert_eq!(names(&apply_policy_chain(input(), &split, &ctx).groups), expected);

    let mut single_phase = names(&apply_policy_chain(input(), &merged, &ctx).groups);
    single_phase.sort();
    let mut sorted_expected = expected;
    sorted_expected.sort();
    assert_eq!(single_phase, sorted_expected);
}
