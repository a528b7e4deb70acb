mod value;

pub use value::{CustomValue, Value, format_stack};
pub(crate) use value::escape_string;

#[cfg(test)]
mod value_test;
