//! SQL functions not shipped with Diesel's prelude.

use diesel::sql_types::{Array, Text};

diesel::define_sql_function! {
    /// PostgreSQL `array_append` over text arrays, used for the append-style
    /// updates on booking and listing reference lists.
    fn array_append(array: Array<Text>, element: Text) -> Array<Text>;
}
