use core::any::Any;
use core::fmt;

use bumpalo::Bump;

use super::{CustomValue, Value, format_stack};
use crate::types::manager::TypeManager;

#[derive(Debug, Clone, PartialEq)]
struct Point(i32, i32);

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{},{}>", self.0, self.1)
    }
}

impl CustomValue for Point {
    fn clone_boxed(&self) -> Box<dyn CustomValue> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equals(&self, other: &dyn CustomValue) -> bool {
        other.as_any().downcast_ref::<Point>() == Some(self)
    }
}

#[test]
fn test_display_primitives() {
    assert_eq!(Value::Bool(true).to_string(), "true");
    assert_eq!(Value::Num(3.0).to_string(), "3");
    assert_eq!(Value::Num(-2.5).to_string(), "-2.5");
    assert_eq!(Value::Num(f64::INFINITY).to_string(), "inf");
    assert_eq!(Value::str("a\"b\n").to_string(), r#""a\"b\n""#);
}

#[test]
fn test_format_stack() {
    let stack = vec![Value::Num(3.0), Value::str("hi"), Value::Bool(true)];
    assert_eq!(format_stack(&stack), r#"[3 "hi" true]"#);
    assert_eq!(format_stack(&[]), "[]");
}

#[test]
fn test_value_types() {
    let arena = Bump::new();
    let types = TypeManager::new(&arena);
    let point_ty = types.new_atom("point");

    assert_eq!(Value::Bool(false).ty(types), types.bool());
    assert_eq!(Value::Num(1.0).ty(types), types.num());
    assert_eq!(Value::str("").ty(types), types.string());
    assert_eq!(Value::custom(point_ty, Point(1, 2)).ty(types), point_ty);
}

#[test]
fn test_custom_clone_and_downcast() {
    let arena = Bump::new();
    let types = TypeManager::new(&arena);
    let point_ty = types.new_atom("point");

    let original = Value::custom(point_ty, Point(1, 2));
    let copy = original.clone();
    assert_eq!(original, copy);
    assert_eq!(copy.downcast_ref::<Point>(), Some(&Point(1, 2)));
    assert_eq!(copy.to_string(), "<1,2>");
    assert_eq!(Value::Num(1.0).downcast_ref::<Point>(), None);
}

#[test]
fn test_accessors() {
    assert_eq!(Value::Bool(true).as_bool(), Some(true));
    assert_eq!(Value::Num(1.0).as_bool(), None);
    assert_eq!(Value::Num(4.0).as_num(), Some(4.0));
    assert_eq!(Value::str("x").as_str(), Some("x"));
    assert_ne!(Value::Num(1.0), Value::str("1"));
}
