//! Common macros used by the `webpcodec` crates.

#[macro_export]
/// Create a [`Report`](crate::error::Report) containing `$err`, followed by any number of `$attachment`s.
macro_rules! report_attach {
    ($err:expr $(, $($attachment:expr),+)? $(,)?) => {
        $crate::error::Report::from($err)
            $($(.attach_printable($attachment))+)?
    };
}

#[macro_export]
/// Return early with an [`Err`] wrapping `$err` in a [`Report`](crate::error::Report), followed by any number of
/// `$attachment`s.
///
/// The error is converted with `?`, so the enclosing function may return any error type implementing
/// `From<Report<_>>`.
macro_rules! bail_attach {
    ($err:expr $(, $($attachment:expr),+)? $(,)?) => {
        return Err($crate::report_attach!($err $(, $($attachment),+)?))?
    };
}

#[macro_export]
/// Return early with `$err` (see [`bail_attach`]) unless `$cond` holds.
///
/// The failed condition is attached to the report ahead of any `$attachment`s.
macro_rules! ensure_attach {
    ($cond:expr, $err:expr $(, $($attachment:expr),+)? $(,)?) => {{
        let cond: bool = $cond;
        if !cond {
            $crate::bail_attach!($err, concat!("condition failed: ", stringify!($cond)) $(, $($attachment),+)?);
        }
    }};
}

#[macro_export]
/// Bind `$pat` to `$expr`, or return early with `$err` (see [`bail_attach`]) if it does not match.
macro_rules! ensure_matches_attach {
    ($expr:expr, $pat:pat, $err:expr $(, $($attachment:expr),+)? $(,)?) => {
        let $pat = $expr else {
            $crate::bail_attach!($err, concat!("condition failed: let ", stringify!($pat), " = ", stringify!($expr))
                                 $(, $($attachment),+)?);
        };
    };
}
