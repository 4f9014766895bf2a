mod field;
mod field_type;
mod tuple;

pub use field::Field;
pub use field_type::FieldType;
pub use tuple::{Tuple, TupleBuilder};
