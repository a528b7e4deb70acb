use super::*;
use crate::annotation::NodeRole;
use crate::api::VerifierOptions;
use crate::errors::ErrorKind;
use crate::parser;
use crate::registry::RegistryBuilder;
use crate::space::{Node, NodeSpace};
use crate::stdlib;
use crate::types::manager::TypeManager;
use crate::values::Value;
use bumpalo::Bump;
use pretty_assertions::assert_eq;

// Parses `source` against the prelude and hands the verification result to `f`.
fn with_verified<R>(
    source: &str,
    params: &[&str],
    options: &VerifierOptions,
    f: impl FnOnce(&NodeSpace<'_>, &TypeManager<'_>, Node, Result<Verified, TypeError>) -> R,
) -> R {
    let arena = Bump::new();
    let types = TypeManager::new(&arena);
    let mut builder = RegistryBuilder::new(types);
    stdlib::install(&mut builder).unwrap();
    let registry = builder.build();
    let mut space = NodeSpace::new(&arena);
    let parsed = parser::parse(&mut space, source).expect("parse failed");
    let result = verify(&space, parsed.root, types, &registry, params, options);
    f(&space, types, parsed.root, result)
}

fn root_sig(source: &str) -> String {
    root_sig_with(source, &[])
}

fn root_sig_with(source: &str, params: &[&str]) -> String {
    with_verified(source, params, &VerifierOptions::default(), |_, types, _, result| {
        let verified = result.unwrap_or_else(|e| panic!("{source}: {e}"));
        verified.root_signature().display(types).to_string()
    })
}

fn error_kind(source: &str) -> ErrorKind {
    with_verified(source, &[], &VerifierOptions::default(), |_, _, _, result| {
        result.expect_err("expected a type error").kind
    })
}

fn find_def(space: &NodeSpace<'_>, scope: Node, name: &str) -> Option<Node> {
    space.elements(scope).iter().copied().find(|&node| {
        let elements = space.elements(node);
        elements.len() >= 2
            && space.text(elements[0]) == Some("def")
            && (space.text(elements[1]) == Some(name)
                || space
                    .elements(elements[1])
                    .first()
                    .is_some_and(|&head| space.text(head) == Some(name)))
    })
}

fn function_sig(source: &str, name: &str) -> String {
    with_verified(source, &[], &VerifierOptions::default(), |space, types, root, result| {
        let verified = result.unwrap_or_else(|e| panic!("{source}: {e}"));
        let def = find_def(space, root, name).expect("no such def");
        assert_eq!(verified.state(def), InferState::Done);
        verified
            .signature(def)
            .expect("def has no signature")
            .display(types)
            .to_string()
    })
}

// ============================================================================
// Basic effects
// ============================================================================

#[test]
fn test_native_call() {
    assert_eq!(root_sig("(+ 1 2)"), "() -> (num)");
    assert_eq!(root_sig("(> 1 2)"), "() -> (bool)");
    assert_eq!(root_sig("1 2 +"), "() -> (num)");
}

#[test]
fn test_user_function() {
    let source = "(def (addOne x) (+ x 1)) (addOne 4)";
    assert_eq!(function_sig(source, "addOne"), "(num) -> (num)");
    assert_eq!(root_sig(source), "() -> (num)");
}

#[test]
fn test_bare_function_reference() {
    assert_eq!(root_sig("(def (addOne x) (+ x 1)) 4 addOne"), "() -> (num)");
}

#[test]
fn test_let_binds_deepest_first() {
    assert_eq!(root_sig(r#"1 "a" let n s in s n"#), "() -> (string num)");
}

#[test]
fn test_drop_and_shufflers() {
    assert_eq!(root_sig("1 2 drop"), "() -> (num)");
    assert_eq!(root_sig(r#"1 "a" swap"#), "() -> (string num)");
    assert_eq!(root_sig("1 dup +"), "() -> (num)");
}

#[test]
fn test_string_literals() {
    assert_eq!(root_sig(r#"(concat "a" "b") length"#), "() -> (num)");
    assert_eq!(root_sig(r#""if""#), "() -> (string)");
}

#[test]
fn test_blk_scope() {
    assert_eq!(
        root_sig("(blk 1 2 let a b in (def (sq x) (* x x)) (sq b))"),
        "() -> (num)"
    );
    // A block may consume values pushed before it.
    assert_eq!(root_sig("1 (blk 2 +)"), "() -> (num)");
}

#[test]
fn test_polymorphic_function() {
    let source = r#"(def (id x) x) (id 1) (id "s")"#;
    assert_eq!(function_sig(source, "id"), "('0) -> ('0)");
    assert_eq!(root_sig(source), "() -> (num string)");
}

// ============================================================================
// Stack growth
// ============================================================================

#[test]
fn test_root_inputs_inferred() {
    assert_eq!(root_sig("1 +"), "(num) -> (num)");
    assert_eq!(root_sig("drop"), "('0) -> ()");
}

#[test]
fn test_root_inputs_disabled() {
    let options = VerifierOptions {
        infer_root_inputs: false,
    };
    let kind = with_verified("1 +", &[], &options, |_, _, _, result| {
        result.expect_err("growth should be rejected").kind
    });
    assert_eq!(kind, ErrorKind::ArityOrTypeMismatch);

    // Declared params are still bound.
    let sig = with_verified("(+ a 1)", &["a"], &options, |_, types, _, result| {
        result.unwrap().root_signature().display(types).to_string()
    });
    assert_eq!(sig, "(num) -> (num)");
}

#[test]
fn test_function_inputs_from_body() {
    // `twice` takes its argument straight off the stack.
    let source = "(def twice dup +) 3 twice";
    assert_eq!(function_sig(source, "twice"), "(num) -> (num)");
    assert_eq!(root_sig(source), "() -> (num)");
}

// ============================================================================
// Conditionals
// ============================================================================

#[test]
fn test_if_constant_arms() {
    assert_eq!(root_sig("(if true 1 2)"), "() -> (num)");
    assert_eq!(root_sig("(if false 1 2)"), "() -> (num)");
}

#[test]
fn test_if_abs_value() {
    assert_eq!(
        root_sig_with("(if (> a 0) a (- 0 a))", &["a"]),
        "(num) -> (num)"
    );
}

#[test]
fn test_if_without_else_is_identity() {
    assert_eq!(root_sig("5 (if true neg)"), "() -> (num)");
}

#[test]
fn test_arm_signatures_recorded() {
    with_verified(
        "(if true 1 2)",
        &[],
        &VerifierOptions::default(),
        |space, types, root, result| {
            let verified = result.unwrap();
            let if_node = space.elements(root)[0];
            let arms = space.elements(if_node);
            for &arm in &arms[2..] {
                let sig = verified.arm_signature(arm).expect("arm signature");
                assert_eq!(sig.display(types).to_string(), "() -> (num)");
            }
            assert_eq!(verified.annotations().role(if_node), Some(&NodeRole::If));
        },
    );
}

#[test]
fn test_branch_mismatch() {
    assert_eq!(
        error_kind(r#"(if true 1 "a")"#),
        ErrorKind::BranchSignatureMismatch
    );
    assert_eq!(error_kind("(if true 1)"), ErrorKind::BranchSignatureMismatch);
}

#[test]
fn test_branch_mismatch_labels_each_arm() {
    let source = r#"(if true 1 "a")"#;
    with_verified(source, &[], &VerifierOptions::default(), |space, _, root, result| {
        let err = result.expect_err("expected a type error");
        let if_node = space.elements(root)[0];
        let arms = space.elements(if_node);
        let nodes: Vec<Node> = err.related.iter().map(|(node, _)| *node).collect();
        assert_eq!(nodes, vec![arms[2], arms[3]]);
        assert_eq!(err.related[0].1, "then arm: () -> (num)");
        assert_eq!(err.related[1].1, "else arm: () -> (string)");
    });

    // A missing else arm has nothing to point at.
    with_verified("(if true 1)", &[], &VerifierOptions::default(), |_, _, _, result| {
        let err = result.expect_err("expected a type error");
        assert_eq!(err.related.len(), 1);
        assert!(err.related[0].1.starts_with("then arm"));
    });
}

#[test]
fn test_call_arity_points_at_definition() {
    let source = "(def (f x) x) (f 1 2)";
    with_verified(source, &[], &VerifierOptions::default(), |space, _, root, result| {
        let err = result.expect_err("expected a type error");
        assert_eq!(err.kind, ErrorKind::ArityOrTypeMismatch);
        let def = find_def(space, root, "f").expect("no such def");
        assert_eq!(err.related.len(), 1);
        assert_eq!(err.related[0].0, def);
        assert!(err.related[0].1.starts_with("`f` is defined here as"));
    });

    // Natives have no definition in the source.
    with_verified("(+ 1 2 3)", &[], &VerifierOptions::default(), |_, _, _, result| {
        assert!(result.expect_err("expected a type error").related.is_empty());
    });
}

#[test]
fn test_condition_must_be_bool() {
    assert_eq!(error_kind("(if 1 2 3)"), ErrorKind::ArityOrTypeMismatch);
    assert_eq!(error_kind("(if (+ 1 2) 2 3)"), ErrorKind::ArityOrTypeMismatch);
}

// ============================================================================
// Recursion
// ============================================================================

#[test]
fn test_tail_recursive_countdown() {
    let source = "(def (count n) (if (> n 0) (count (- n 1)) n)) (count 100000)";
    assert_eq!(function_sig(source, "count"), "(num) -> (num)");
    assert_eq!(root_sig(source), "() -> (num)");
}

#[test]
fn test_recursion_in_else_arm() {
    let source = "(def (count n) (if (<= n 0) n (count (- n 1)))) (count 3)";
    assert_eq!(function_sig(source, "count"), "(num) -> (num)");
}

#[test]
fn test_recursion_without_base_case() {
    assert_eq!(
        error_kind("(def (f x) (g x)) (def (g x) (f x)) (f 1)"),
        ErrorKind::RecursionWithoutBaseCase
    );
    assert_eq!(
        error_kind("(def (f x) (f x)) (f 1)"),
        ErrorKind::RecursionWithoutBaseCase
    );
}

#[test]
fn test_recursion_without_base_case_points_at_definition() {
    let source = "(def (f x) (f x)) (f 1)";
    with_verified(source, &[], &VerifierOptions::default(), |space, _, root, result| {
        let err = result.expect_err("expected a type error");
        assert_eq!(err.kind, ErrorKind::RecursionWithoutBaseCase);
        let def = find_def(space, root, "f").expect("no such def");
        assert_eq!(err.related, vec![(def, "`f` is defined here".to_string())]);
    });
}

#[test]
fn test_recheck_ignores_later_shadowing() {
    crate::test_utils::init_test_logging();
    // The second `k` is bound after `f` was first inferred and must not
    // leak into the recheck of `f`'s conditional.
    let source = r#"5 let k in
        (def (f n) (if (> n 0) (f (- n k)) n))
        (f 10)
        "s" let k in"#;
    assert_eq!(root_sig(source), "() -> (num)");
}

// ============================================================================
// Sweep of unreferenced definitions
// ============================================================================

#[test]
fn test_unreferenced_definition_checked() {
    assert_eq!(
        error_kind(r#"(def (bad x) (+ x "s")) 1"#),
        ErrorKind::ArityOrTypeMismatch
    );
    assert_eq!(function_sig("(def (unused x) (+ x 1)) 2", "unused"), "(num) -> (num)");
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_undefined_names() {
    assert_eq!(error_kind("(foo 1)"), ErrorKind::NameUndefined);
    assert_eq!(error_kind("bar"), ErrorKind::NameUndefined);
}

#[test]
fn test_invalid_syntax() {
    for source in [
        "()",
        "(if true)",
        "(if true 1 2 3)",
        "1 let x",
        "(drop 1)",
        "(+ (def f 1) 2)",
        "1 let x in (x)",
        r#"("f" 1)"#,
        "in",
        "1 let if in",
    ] {
        assert_eq!(error_kind(source), ErrorKind::SyntaxInvalid, "{source}");
    }
}

#[test]
fn test_call_arity() {
    assert_eq!(error_kind("(+ 1)"), ErrorKind::ArityOrTypeMismatch);
    assert_eq!(error_kind("(+ 1 2 3)"), ErrorKind::ArityOrTypeMismatch);
    // Arguments may not reach outside the call form.
    assert_eq!(error_kind("1 (+ 2 +)"), ErrorKind::ArityOrTypeMismatch);
}

#[test]
fn test_type_mismatch() {
    assert_eq!(error_kind(r#"(+ 1 "a")"#), ErrorKind::ArityOrTypeMismatch);
    assert_eq!(error_kind("(not 1)"), ErrorKind::ArityOrTypeMismatch);
}

#[test]
fn test_error_points_at_node() {
    with_verified("(foo 1)", &[], &VerifierOptions::default(), |space, _, root, result| {
        let err = result.unwrap_err();
        let call = space.elements(root)[0];
        assert_eq!(err.node, space.elements(call)[0]);
    });
}

// ============================================================================
// Annotations and determinism
// ============================================================================

#[test]
fn test_annotations() {
    with_verified(
        "(+ 1 2) false",
        &[],
        &VerifierOptions::default(),
        |space, _, root, result| {
            let verified = result.unwrap();
            let annotations = verified.annotations();
            let call = space.elements(root)[0];
            assert!(matches!(annotations.role(call), Some(NodeRole::CallNative(_))));
            assert_eq!(
                annotations.role(space.elements(call)[1]),
                Some(&NodeRole::Literal(Value::Num(1.0)))
            );
            assert_eq!(
                annotations.role(space.elements(root)[1]),
                Some(&NodeRole::Literal(Value::Bool(false)))
            );
        },
    );
}

#[test]
fn test_let_annotations_and_slots() {
    with_verified(
        "1 2 let a b in b",
        &[],
        &VerifierOptions::default(),
        |space, _, root, result| {
            let verified = result.unwrap();
            let annotations = verified.annotations();
            let elements = space.elements(root);
            assert_eq!(annotations.role(elements[2]), Some(&NodeRole::Bind { count: 2 }));
            assert_eq!(annotations.role(elements[3]), Some(&NodeRole::BindName));
            assert_eq!(annotations.role(elements[5]), Some(&NodeRole::BindEnd));
            assert_eq!(
                annotations.role(elements[6]),
                Some(&NodeRole::Variable { scope: root, slot: 1 })
            );
            assert_eq!(annotations.vars(root), 2);
        },
    );
}

#[test]
fn test_lexical_parents() {
    with_verified(
        "(def (f x) (blk x)) (f 1)",
        &[],
        &VerifierOptions::default(),
        |space, _, root, result| {
            let verified = result.unwrap();
            let def = space.elements(root)[0];
            let blk = space.elements(def)[2];
            assert_eq!(verified.parent(def), Some(root));
            assert_eq!(verified.parent(blk), Some(def));
            assert!(verified.encloses(root, blk));
            assert!(!verified.encloses(blk, def));
        },
    );
}

#[test]
fn test_deterministic() {
    let arena = Bump::new();
    let types = TypeManager::new(&arena);
    let mut builder = RegistryBuilder::new(types);
    stdlib::install(&mut builder).unwrap();
    let registry = builder.build();
    let mut space = NodeSpace::new(&arena);
    let source = "(def (count n) (if (> n 0) (count (- n 1)) n)) (def (id x) x) (id (count 5))";
    let parsed = parser::parse(&mut space, source).unwrap();
    let options = VerifierOptions::default();

    let first = verify(&space, parsed.root, types, &registry, &[], &options).unwrap();
    let second = verify(&space, parsed.root, types, &registry, &[], &options).unwrap();
    assert_eq!(first, second);
}
