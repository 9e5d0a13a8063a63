///
/// Scalar Registry
///
/// Single source of truth for the primitive column types. The runtime
/// expands it into `ColumnScalar` impls; the code generator expands it
/// into its binder lookup table, so both sides agree on every entry.
///
/// Entry shape: (rust type, binder kind, sql type, accepted type names, default).
///

#[doc(hidden)]
#[macro_export]
macro_rules! scalar_registry_entries {
    ($macro:ident) => {
        $macro! {
            (bool, Bool, Boolean, ["bool"], false),
            (i8, I8, TinyInt, ["i8"], 0),
            (i16, I16, SmallInt, ["i16"], 0),
            (i32, I32, Integer, ["i32"], 0),
            (i64, I64, BigInt, ["i64"], 0),
            (f32, F32, Float, ["f32"], 0.0),
            (f64, F64, Double, ["f64"], 0.0),
            (String, Text, Text, ["String", "str"], String::new()),
            (Vec<u8>, Blob, Blob, ["Vec<u8>", "[u8]"], Vec::new()),
        }
    };
}
