//! Integration tests for rewrite lens production and composition

use classmerge::lens::{produce_lens, FirstInGroup, LensBuilder, LensError, RewriteLens};
use classmerge::merger::HorizontalClassMerger;
use classmerge::policy::MergeGroup;
use classmerge::program::{
    AccessFlags, ClassType, DexType, ElementId, FieldRef, MethodRef, Program, ProgramClass, ProgramField,
    ProgramMethod, Proto,
};

fn class(name: &str) -> ClassType {
    ClassType::new(name)
}

fn class_lens(mappings: &[(&str, &str)]) -> RewriteLens {
    let mut builder = LensBuilder::new();
    for (from, to) in mappings {
        builder.map_class(class(from), class(to)).unwrap();
    }
    builder.build()
}

#[test]
fn test_composition_collapses_old_mid_new() {
    let first = class_lens(&[("p.Old", "p.Mid")]);
    let second = class_lens(&[("p.Mid", "p.New")]);
    let composed = first.compose(&second);

    assert_eq!(composed.class_type(&class("p.Old")), class("p.New"));
    assert_eq!(composed.class_mappings().get(&class("p.Old")), Some(&class("p.New")));
    assert_eq!(
        composed.dex_type(&"p.Old[]".parse().unwrap()),
        "p.New[]".parse::<DexType>().unwrap()
    );
    assert_eq!(
        composed.element(&ElementId::Method("p.User#take(p.Old):p.Old".parse().unwrap())),
        ElementId::Method("p.User#take(p.New):p.New".parse().unwrap())
    );
}

#[test]
fn test_two_merge_passes_compose() {
    let method = |name: &str| ProgramMethod::new(name, Proto::void(), AccessFlags::public());
    let program = Program::new(vec![
        ProgramClass::new(class("p.A"), AccessFlags::public()).with_method(method("run")),
        ProgramClass::new(class("p.B"), AccessFlags::public()).with_method(method("run")),
        ProgramClass::new(class("p.C"), AccessFlags::public()).with_method(method("run")),
    ])
    .unwrap();

    // First pass merges B into A
    let groups = vec![MergeGroup::new(vec![class("p.A"), class("p.B")])];
    let (first, _) = produce_lens(&groups, &program, &FirstInGroup).unwrap();

    // Second pass merges A, which now also holds run$1, into C
    let after_first = Program::new(vec![
        ProgramClass::new(class("p.A"), AccessFlags::public())
            .with_method(method("run"))
            .with_method(method("run$1")),
        ProgramClass::new(class("p.C"), AccessFlags::public()).with_method(method("run")),
    ])
    .unwrap();
    let groups = vec![MergeGroup::new(vec![class("p.C"), class("p.A")])];
    let (second, _) = produce_lens(&groups, &after_first, &FirstInGroup).unwrap();

    let composed = first.compose(&second);
    assert_eq!(composed.class_type(&class("p.B")), class("p.C"));
    assert_eq!(
        composed.method(&"p.B#run():void".parse().unwrap()),
        "p.C#run$1$1():void".parse::<MethodRef>().unwrap()
    );
    assert_eq!(
        composed.method(&"p.A#run():void".parse().unwrap()),
        "p.C#run$1():void".parse::<MethodRef>().unwrap()
    );
    assert_eq!(composed.class_mappings().len(), 2);
}

#[test]
fn test_fields_mentioning_retired_classes_are_rewritten() {
    let program = Program::new(vec![
        ProgramClass::new(class("p.A"), AccessFlags::public()),
        ProgramClass::new(class("p.B"), AccessFlags::public()),
        ProgramClass::new(class("p.Holder"), AccessFlags::public()).with_field(ProgramField {
            name: "items".to_string(),
            field_type: "p.B[]".parse().unwrap(),
            access: AccessFlags::private(),
        }),
    ])
    .unwrap();

    let groups = vec![MergeGroup::new(vec![class("p.A"), class("p.B")])];
    let (lens, merges) = produce_lens(&groups, &program, &FirstInGroup).unwrap();

    assert_eq!(merges[0].retired, vec![class("p.B")]);
    assert_eq!(
        lens.field(&"p.Holder#items:p.B[]".parse().unwrap()),
        "p.Holder#items:p.A[]".parse::<FieldRef>().unwrap()
    );
    assert!(lens.field_mappings().is_empty());
}

#[test]
fn test_conflicting_builder_entries() {
    let mut builder = RewriteLens::builder();
    builder
        .map_method("p.A#f():void".parse().unwrap(), "p.B#f():void".parse().unwrap())
        .unwrap();

    let result = builder.map_method("p.A#f():void".parse().unwrap(), "p.C#f():void".parse().unwrap());
    assert!(matches!(result, Err(LensError::Conflict { kind: "method", .. })));
}

#[test]
fn test_merger_lens_matches_groups() {
    let program = Program::new(vec![
        ProgramClass::new(class("p.X"), AccessFlags::public()),
        ProgramClass::new(class("p.Y"), AccessFlags::public()),
        ProgramClass::new(class("p.Z"), AccessFlags::public()),
    ])
    .unwrap();
    let outcome = HorizontalClassMerger::default().run(&program).unwrap();

    let mappings = outcome.lens.class_mappings();
    assert_eq!(mappings.len(), 2);
    assert_eq!(mappings.get(&class("p.Y")), Some(&class("p.X")));
    assert_eq!(mappings.get(&class("p.Z")), Some(&class("p.X")));
    assert!(!mappings.contains_key(&class("p.X")));
}

#[test]
fn test_overloads_on_untouched_class_stay_distinct() {
    let overload = |ty: &str| {
        ProgramMethod::new("accept", Proto::new(vec![DexType::class(ty)], DexType::Void), AccessFlags::public())
    };
    let program = Program::new(vec![
        ProgramClass::new(class("p.A"), AccessFlags::public()),
        ProgramClass::new(class("p.B"), AccessFlags::public()),
        ProgramClass::new(class("q.Visitor"), AccessFlags::public())
            .with_method(overload("p.A"))
            .with_method(overload("p.B"))
            .with_method(ProgramMethod::new(
                "accept$1",
                Proto::new(vec![DexType::class("p.A")], DexType::Void),
                AccessFlags::public(),
            )),
    ])
    .unwrap();

    // The visitor lives in another package and stays out of the group
    let outcome = HorizontalClassMerger::default().run(&program).unwrap();
    assert_eq!(outcome.groups.len(), 1);
    assert_eq!(outcome.groups[0].retired, vec![class("p.B")]);

    let targets: Vec<MethodRef> = [
        "q.Visitor#accept(p.A):void",
        "q.Visitor#accept(p.B):void",
        "q.Visitor#accept$1(p.A):void",
    ]
    .iter()
    .map(|m| outcome.lens.method(&m.parse().unwrap()))
    .collect();

    for (i, target) in targets.iter().enumerate() {
        assert_eq!(target.holder, class("q.Visitor"));
        for other in &targets[i + 1..] {
            assert_ne!(target, other, "two methods share one post-merge reference");
        }
    }
}
