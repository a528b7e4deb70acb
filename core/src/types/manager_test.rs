use super::TypeDesc;
use super::manager::TypeManager;
use bumpalo::Bump;

#[test]
fn test_interning() {
    let bump = Bump::new();
    let manager = TypeManager::new(&bump);

    let num = manager.num();
    let bool_ty = manager.bool();

    assert_eq!(num, manager.num());
    assert_eq!(bool_ty, manager.bool());
    assert_ne!(num, bool_ty);
}

#[test]
fn test_primitive_atoms_are_fixed() {
    let bump = Bump::new();
    let manager = TypeManager::new(&bump);

    assert_eq!(manager.lookup(manager.bool()), TypeDesc::Atom(0));
    assert_eq!(manager.lookup(manager.num()), TypeDesc::Atom(1));
    assert_eq!(manager.lookup(manager.string()), TypeDesc::Atom(2));
    assert_eq!(manager.atom_count(), 3);
    assert_eq!(manager.atom_name(1), Some("num"));
}

#[test]
fn test_new_atom() {
    let bump = Bump::new();
    let manager = TypeManager::new(&bump);

    let tracked = manager.new_atom("tracked");
    assert_eq!(manager.lookup(tracked), TypeDesc::Atom(3));
    assert_eq!(manager.display(tracked), "tracked");
    assert_eq!(manager.atom(3), tracked);
}

#[test]
fn test_interning_composites() {
    let bump = Bump::new();
    let manager = TypeManager::new(&bump);

    let arr = manager.array(manager.num());
    assert_eq!(arr, manager.array(manager.num()));
    assert_ne!(arr, manager.array(manager.bool()));

    let tup = manager.tuple(&[manager.num(), manager.string()]);
    assert_eq!(tup, manager.tuple(&[manager.num(), manager.string()]));
    assert_ne!(tup, manager.tuple(&[manager.string(), manager.num()]));

    let f = manager.function(&[manager.num()], &[manager.bool()]);
    assert_eq!(f, manager.function(&[manager.num()], &[manager.bool()]));
    assert_ne!(f, manager.function(&[manager.num()], &[]));
}

#[test]
fn test_matches() {
    let bump = Bump::new();
    let m = TypeManager::new(&bump);

    assert!(m.matches(m.num(), m.num()));
    assert!(!m.matches(m.num(), m.bool()));
    // Var on either side accepts anything.
    assert!(m.matches(m.num(), m.var(7)));
    assert!(m.matches(m.var(0), m.string()));
    assert!(m.matches(m.array(m.num()), m.array(m.var(2))));
    assert!(!m.matches(m.array(m.num()), m.num()));
    assert!(!m.matches(
        m.tuple(&[m.num()]),
        m.tuple(&[m.num(), m.num()])
    ));
}

#[test]
fn test_unify_symmetry() {
    let bump = Bump::new();
    let m = TypeManager::new(&bump);

    let samples = [
        m.num(),
        m.bool(),
        m.string(),
        m.var(0),
        m.array(m.num()),
        m.array(m.var(1)),
        m.tuple(&[m.num(), m.var(0)]),
        m.tuple(&[m.var(3), m.bool()]),
        m.function(&[m.num()], &[m.bool()]),
        m.function(&[m.var(0)], &[m.var(1)]),
    ];
    for &a in &samples {
        for &b in &samples {
            assert_eq!(
                m.unify(a, b),
                m.unify(b, a),
                "unify({}, {}) is not symmetric",
                m.display(a),
                m.display(b)
            );
        }
        assert_eq!(m.unify(a, a), Some(a));
    }
}

#[test]
fn test_unify_results() {
    let bump = Bump::new();
    let m = TypeManager::new(&bump);

    assert_eq!(m.unify(m.num(), m.bool()), None);
    assert_eq!(m.unify(m.var(0), m.num()), Some(m.num()));
    assert_eq!(
        m.unify(m.array(m.var(0)), m.array(m.string())),
        Some(m.array(m.string()))
    );
    assert_eq!(
        m.unify(m.tuple(&[m.num(), m.var(1)]), m.tuple(&[m.var(0), m.bool()])),
        Some(m.tuple(&[m.num(), m.bool()]))
    );
    assert_eq!(
        m.unify(m.tuple(&[m.num()]), m.tuple(&[m.num(), m.num()])),
        None
    );
    assert_eq!(
        m.unify(
            m.function(&[m.num()], &[]),
            m.function(&[m.num(), m.num()], &[])
        ),
        None
    );
}

#[test]
fn test_display() {
    let bump = Bump::new();
    let m = TypeManager::new(&bump);

    assert_eq!(m.display(m.num()), "num");
    assert_eq!(m.display(m.var(2)), "'2");
    assert_eq!(m.display(m.array(m.bool())), "[bool]");
    assert_eq!(m.display(m.tuple(&[m.num(), m.string()])), "{num string}");
    assert_eq!(
        m.display(m.function(&[m.num(), m.num()], &[m.bool()])),
        "(num num) -> (bool)"
    );
}
