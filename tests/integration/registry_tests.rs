//! Integration tests for the use registry and constraint graph construction

use classmerge::config::GraphConfig;
use classmerge::graph::{ConstraintGraph, GraphError};
use classmerge::oracle::AppInfo;
use classmerge::program::{
    AccessFlags, ClassType, DexType, ElementId, FieldRef, MethodRef, Program, ProgramClass, ProgramField,
    ProgramMethod, Proto, Use,
};
use classmerge::registry::{build_constraint_graph, AccessContext, GraphBuilder, ParallelGraphBuilder, UseRegistry};
use std::path::PathBuf;

/// Get the path to the test fixtures directory
fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load(name: &str) -> Program {
    Program::from_file(&fixtures_path().join(name)).expect("Failed to load fixture")
}

fn sequential() -> GraphConfig {
    GraphConfig {
        parallel: false,
        ..GraphConfig::default()
    }
}

fn class(name: &str) -> ElementId {
    ElementId::Class(ClassType::new(name))
}

fn method(reference: &str) -> ElementId {
    ElementId::Method(reference.parse::<MethodRef>().unwrap())
}

fn partition(graph: &ConstraintGraph) -> Vec<Vec<ElementId>> {
    graph
        .connected_components()
        .into_iter()
        .map(|c| c.elements().to_vec())
        .collect()
}

#[test]
fn test_package_private_super_call_links_classes() {
    let program = load("super_call.yaml");
    let app_info = AppInfo::new(&program);
    let (graph, stats) = build_constraint_graph(&program, &app_info, &sequential()).unwrap();

    assert!(graph.contains_edge(
        &method("com.example.B#bar():void"),
        &method("com.example.A#foo():void")
    ));
    assert!(graph.same_component(&class("com.example.A"), &class("com.example.B")));
    assert!(!graph.same_component(&class("com.example.A"), &class("com.example.C")));
    assert!(!graph.same_component(&class("com.example.B"), &class("com.example.Main")));
    assert_eq!(stats.unresolved, 0);
}

#[test]
fn test_public_access_never_links() {
    let program = Program::new(vec![
        ProgramClass::new(ClassType::new("a.Api"), AccessFlags::public())
            .with_field(ProgramField {
                name: "VALUE".to_string(),
                field_type: DexType::class("a.Api"),
                access: AccessFlags::public().with_static(),
            })
            .with_method(ProgramMethod::new("call", Proto::void(), AccessFlags::public())),
        ProgramClass::new(ClassType::new("b.Client"), AccessFlags::public()).with_method(
            ProgramMethod::new("use", Proto::void(), AccessFlags::public()).with_code(vec![
                Use::StaticFieldRead("a.Api#VALUE:a.Api".parse().unwrap()),
                Use::InvokeVirtual("a.Api#call():void".parse().unwrap()),
                Use::CheckCast(DexType::class("a.Api")),
                Use::NewInstance(DexType::class("a.Api")),
            ]),
        ),
    ])
    .unwrap();
    let app_info = AppInfo::new(&program);
    let (graph, stats) = build_constraint_graph(&program, &app_info, &sequential()).unwrap();

    assert!(!graph.same_component(&class("a.Api"), &class("b.Client")));
    assert_eq!(stats.uses, 4);
}

#[test]
fn test_protected_access_depends_on_subtyping() {
    let base = ProgramClass::new(ClassType::new("a.Base"), AccessFlags::public())
        .with_method(ProgramMethod::new("hook", Proto::void(), AccessFlags::protected()));
    let program = Program::new(vec![
        base,
        // Subclass in another package: valid protected access, no edge
        ProgramClass::new(ClassType::new("b.Sub"), AccessFlags::public())
            .with_super(ClassType::new("a.Base"))
            .with_method(
                ProgramMethod::new("go", Proto::void(), AccessFlags::public())
                    .with_code(vec![Use::InvokeSuper("a.Base#hook():void".parse().unwrap())]),
            ),
        // Same package, not a subtype: still valid
        ProgramClass::new(ClassType::new("a.Neighbor"), AccessFlags::public()).with_method(
            ProgramMethod::new("go", Proto::void(), AccessFlags::public())
                .with_code(vec![Use::InvokeVirtual("a.Base#hook():void".parse().unwrap())]),
        ),
        // Another package, not a subtype: fragile
        ProgramClass::new(ClassType::new("c.Stranger"), AccessFlags::public()).with_method(
            ProgramMethod::new("go", Proto::void(), AccessFlags::public())
                .with_code(vec![Use::InvokeVirtual("a.Base#hook():void".parse().unwrap())]),
        ),
    ])
    .unwrap();
    let app_info = AppInfo::new(&program);
    let (graph, _) = build_constraint_graph(&program, &app_info, &sequential()).unwrap();

    assert!(!graph.same_component(&class("a.Base"), &class("b.Sub")));
    assert!(!graph.same_component(&class("a.Base"), &class("a.Neighbor")));
    assert!(graph.contains_edge(&method("c.Stranger#go():void"), &method("a.Base#hook():void")));
}

#[test]
fn test_private_member_and_unresolved_reference() {
    let program = Program::new(vec![
        ProgramClass::new(ClassType::new("a.Holder"), AccessFlags::public()).with_field(ProgramField {
            name: "secret".to_string(),
            field_type: "int".parse().unwrap(),
            access: AccessFlags::private(),
        }),
        ProgramClass::new(ClassType::new("a.Reader"), AccessFlags::public()).with_method(
            ProgramMethod::new("read", Proto::void(), AccessFlags::public()).with_code(vec![
                Use::InstanceFieldRead("a.Holder#secret:int".parse().unwrap()),
                Use::InstanceFieldRead("a.Holder#missing:int".parse().unwrap()),
            ]),
        ),
    ])
    .unwrap();
    let app_info = AppInfo::new(&program);
    let (graph, stats) = build_constraint_graph(&program, &app_info, &sequential()).unwrap();

    assert!(!graph.same_component(&class("a.Holder"), &class("a.Reader")));
    assert_eq!(stats.unresolved, 1);
}

#[test]
fn test_nesting_attributes_always_link() {
    let program = load("nested.yaml");
    let app_info = AppInfo::new(&program);
    let (graph, _) = build_constraint_graph(&program, &app_info, &sequential()).unwrap();

    assert!(graph.contains_edge(&class("app.Outer"), &class("app.Outer$Inner")));
    assert!(graph.contains_edge(&class("app.Outer$1"), &class("app.Outer")));
    assert!(!graph.same_component(&class("app.Outer"), &class("app.Other")));
}

#[test]
fn test_parallel_and_sequential_partitions_match() {
    for fixture in ["super_call.yaml", "siblings.yaml", "nested.yaml"] {
        let program = load(fixture);
        let app_info = AppInfo::new(&program);

        let (parallel, _) = ParallelGraphBuilder::new(&app_info)
            .build_from_program(&program, &GraphConfig::default())
            .unwrap();

        let mut builder = GraphBuilder::new(&app_info, &program, &sequential());
        for class in program.program_classes() {
            builder.process_class(class).unwrap();
        }
        let (one_by_one, _) = builder.build();

        assert_eq!(partition(&parallel), partition(&one_by_one), "partition differs for {}", fixture);

        // A second run yields the same partition again
        let (again, _) = build_constraint_graph(&program, &app_info, &GraphConfig::default()).unwrap();
        assert_eq!(partition(&again), partition(&one_by_one));
    }
}

#[test]
fn test_library_classes_are_not_tracked() {
    let program = load("siblings.yaml");
    let app_info = AppInfo::new(&program);
    let (graph, _) = build_constraint_graph(&program, &app_info, &sequential()).unwrap();

    assert!(!graph.contains(&class("lib.K1")));
    assert!(graph.contains(&class("app.P1")));
    assert!(graph.contains(&ElementId::Field("app.P2#count:int".parse::<FieldRef>().unwrap())));
}

#[test]
fn test_registry_rejects_foreign_nodes() {
    let program = Program::new(vec![ProgramClass::new(ClassType::new("a.A"), AccessFlags::package_private())])
        .unwrap();
    let app_info = AppInfo::new(&program);
    let first = ConstraintGraph::new(vec![class("a.A")]);
    let second = ConstraintGraph::new(vec![class("a.A")]);

    let a = first.node(&class("a.A")).unwrap();
    let b = second.node(&class("a.A")).unwrap();
    assert!(matches!(a.add_neighbor(b), Err(GraphError::ForeignNode { .. })));

    // The registry only ever touches nodes of its own graph
    let mut registry = UseRegistry::new(&app_info, &first, AccessContext::new(class("a.A")));
    registry.register(&Use::NewInstance(DexType::class("a.A"))).unwrap();
    assert_eq!(first.edge_count(), 0);
}
