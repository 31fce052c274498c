/// Builds a [`Value`](crate::Value) from JSON-like literal syntax.
///
/// Objects become `Dict`, brackets become `List`, and every other expression
/// goes through `Value::from`, so `1` is an `Int`, `1.0` a `Real` and
/// `"s"` a `Str`.
///
/// ```rust
/// use bitplist::{plist, Value};
///
/// let state = plist!({
///     "step": 3,
///     "dt": -0.125,
///     "grid": [[0.0, 1.0], []],
///     "meta": {"solver": "rk4", "adaptive": false}
/// });
/// assert_eq!(state.get("dt"), Some(&Value::Real(-0.125)));
/// ```
#[macro_export]
macro_rules! plist {
    (@list [$($done:expr,)*]) => {
        vec![$($done,)*]
    };
    (@list [$($done:expr,)*] [$($inner:tt)*] $(, $($rest:tt)*)?) => {
        $crate::plist!(@list [$($done,)* $crate::plist!([$($inner)*]),] $($($rest)*)?)
    };
    (@list [$($done:expr,)*] {$($inner:tt)*} $(, $($rest:tt)*)?) => {
        $crate::plist!(@list [$($done,)* $crate::plist!({$($inner)*}),] $($($rest)*)?)
    };
    (@list [$($done:expr,)*] $next:expr $(, $($rest:tt)*)?) => {
        $crate::plist!(@list [$($done,)* $crate::Value::from($next),] $($($rest)*)?)
    };

    (@dict $map:ident) => {};
    (@dict $map:ident $key:literal : [$($inner:tt)*] $(, $($rest:tt)*)?) => {
        $map.insert(($key).to_string(), $crate::plist!([$($inner)*]));
        $crate::plist!(@dict $map $($($rest)*)?);
    };
    (@dict $map:ident $key:literal : {$($inner:tt)*} $(, $($rest:tt)*)?) => {
        $map.insert(($key).to_string(), $crate::plist!({$($inner)*}));
        $crate::plist!(@dict $map $($($rest)*)?);
    };
    (@dict $map:ident $key:literal : $value:expr $(, $($rest:tt)*)?) => {
        $map.insert(($key).to_string(), $crate::Value::from($value));
        $crate::plist!(@dict $map $($($rest)*)?);
    };

    ([]) => {
        $crate::Value::List(vec![])
    };

    ([ $($elem:tt)+ ]) => {
        $crate::Value::List($crate::plist!(@list [] $($elem)+))
    };

    ({}) => {
        $crate::Value::Dict($crate::PlistMap::new())
    };

    ({ $($entry:tt)+ }) => {{
        let mut object = $crate::PlistMap::new();
        $crate::plist!(@dict object $($entry)+);
        $crate::Value::Dict(object)
    }};

    ($other:expr) => {
        $crate::Value::from($other)
    };
}
