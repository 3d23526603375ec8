//! Property-based tests for the expression layer
//!
//! Coverage targets:
//! - Tokenizer (expr/token.rs): never panics, calls always balance
//! - Interpolation (expr/interpolate.rs): marker-free text is untouched
//! - Casting (expr/types.rs): numeric round trips are canonical

use proptest::prelude::*;
use serde_json::{json, Value};

// =============================================================================
// TOKENIZER
// =============================================================================

mod tokenizer {
    use super::*;
    use jsonbatch::expr::token::tokenize;
    use jsonbatch::expr::Token;

    prop_compose! {
        /// A call with literal and path arguments, nested up to two levels
        fn arb_call()(
            name in "[a-z][a-z0-9_]{0,8}",
            inner in "[a-z][a-z0-9_]{0,8}",
            literal in "[0-9]{1,5}",
            field in "[a-z]{1,8}",
        ) -> String {
            format!("{name}($.{field}, {inner}({literal}, $.a[0].{field}), {literal})")
        }
    }

    proptest! {
        #[test]
        fn never_panics(body in ".*") {
            let _ = tokenize(&body);
        }

        #[test]
        fn calls_are_balanced(body in arb_call()) {
            let tokens = tokenize(&body).unwrap();
            let opens = tokens.iter().filter(|t| matches!(t, Token::Func(_))).count();
            let closes = tokens.iter().filter(|t| matches!(t, Token::EndFunc)).count();
            prop_assert_eq!(opens, 2);
            prop_assert_eq!(opens, closes);
            prop_assert_eq!(tokens.last(), Some(&Token::EndFunc));
        }

        #[test]
        fn paths_are_single_tokens(field in "[a-z]{1,8}", index in 0usize..100) {
            let body = format!("$.{field}[{index}]");
            prop_assert_eq!(tokenize(&body).unwrap(), vec![Token::Path(body.clone())]);
        }
    }
}

// =============================================================================
// INTERPOLATION
// =============================================================================

mod interpolation {
    use super::*;
    use jsonbatch::expr::interpolate::interpolate;

    proptest! {
        #[test]
        fn text_without_markers_is_unchanged(text in "[^@]*") {
            let out = interpolate(&text, |_| Ok(Value::Null)).unwrap();
            prop_assert_eq!(out.as_ref(), text.as_str());
        }

        #[test]
        fn single_marker_is_substituted(
            prefix in "[a-z /]{0,10}",
            suffix in "[a-z /]{0,10}",
            n in any::<i64>(),
        ) {
            let text = format!("{prefix}@{{x}}@{suffix}");
            let out = interpolate(&text, |_| Ok(json!(n))).unwrap();
            prop_assert_eq!(out.into_owned(), format!("{prefix}{n}{suffix}"));
        }
    }
}

// =============================================================================
// CASTING
// =============================================================================

mod casting {
    use super::*;
    use jsonbatch::ValueType;

    proptest! {
        #[test]
        fn integer_strings_cast_to_integers(n in any::<i64>()) {
            prop_assert_eq!(ValueType::Integer.cast_scalar(&json!(n.to_string())).unwrap(), json!(n));
        }

        #[test]
        fn wide_integer_strings_keep_every_digit(text in "-?[1-9][0-9]{0,40}") {
            let int = ValueType::Integer.cast_scalar(&json!(text)).unwrap();
            prop_assert!(int.is_number());
            prop_assert_eq!(int.to_string(), text.clone());
            prop_assert_eq!(ValueType::String.cast_scalar(&int).unwrap(), json!(text));
        }

        #[test]
        fn number_then_string_is_canonical(text in "-?[1-9][0-9]{0,40}\\.[0-9]{0,40}[1-9]") {
            let number = ValueType::Number.cast_scalar(&json!(text)).unwrap();
            prop_assert!(number.is_number());
            let back = ValueType::String.cast_scalar(&number).unwrap();
            prop_assert_eq!(back, json!(text));
        }

        #[test]
        fn trailing_zeros_are_dropped(
            int in "[1-9][0-9]{0,30}",
            frac in "[0-9]{0,30}[1-9]",
            zeros in 1usize..10,
        ) {
            let text = format!("{int}.{frac}{}", "0".repeat(zeros));
            let number = ValueType::Number.cast_scalar(&json!(text)).unwrap();
            let back = ValueType::String.cast_scalar(&number).unwrap();
            prop_assert_eq!(back, json!(format!("{int}.{frac}")));
        }

        #[test]
        fn alphabetic_strings_never_cast_to_integer(text in "[a-df-zA-DF-Z]{1,12}") {
            let err = ValueType::Integer.cast_scalar(&json!(text)).unwrap_err();
            prop_assert_eq!(err.code(), "JB-030");
        }

        #[test]
        fn array_coercion_wraps_scalars(n in any::<i32>()) {
            prop_assert_eq!(ValueType::IntegerArray.coerce(json!(n)).unwrap(), json!([n]));
        }
    }
}
