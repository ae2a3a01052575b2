//! Encoder Tests
//!
//! Tests verify byte-exact wire output for each supported value type.

use bytes::{Bytes, BytesMut};
use respio::protocol::{encode, encode_into, parse_commands, Command, Value, WireValue};

// =============================================================================
// Scalar Encoding Tests
// =============================================================================

#[test]
fn test_encode_booleans() {
    assert_eq!(&encode(&true, false)[..], b"+true\r\n");
    assert_eq!(&encode(&false, false)[..], b"+false\r\n");
}

#[test]
fn test_encode_integers() {
    assert_eq!(&encode(&10i32, false)[..], b":10\r\n");
    assert_eq!(&encode(&-19i64, false)[..], b":-19\r\n");
    assert_eq!(&encode(&i64::MIN, false)[..], b":-9223372036854775808\r\n");
    assert_eq!(&encode(&255u8, false)[..], b":255\r\n");
    assert_eq!(&encode(&-1isize, true)[..], b":-1\r\n");
    assert_eq!(&encode(&3usize, false)[..], b":3\r\n");
    assert_eq!(&encode(&u64::MAX, false)[..], b":18446744073709551615\r\n");
}

#[test]
fn test_encode_text_as_simple_string() {
    assert_eq!(&encode("OK", true)[..], b"+OK\r\n");
    assert_eq!(&encode(&"hello".to_string(), true)[..], b"+hello\r\n");
}

#[test]
fn test_encode_text_as_bulk_string() {
    assert_eq!(&encode("hello", false)[..], b"$5\r\nhello\r\n");
    assert_eq!(&encode("", false)[..], b"$0\r\n\r\n");
}

#[test]
fn test_bulk_length_counts_bytes_not_chars() {
    assert_eq!(&encode("héllo", false)[..], "$6\r\nhéllo\r\n".as_bytes());
}

#[test]
fn test_encode_binary_payload() {
    let payload = Bytes::from_static(b"\xff\x00\r\n");
    assert_eq!(&encode(&payload, false)[..], b"$4\r\n\xff\x00\r\n\r\n");
    // Not representable as a simple string, so the flag is overridden
    assert_eq!(&encode(&payload, true)[..], b"$4\r\n\xff\x00\r\n\r\n");
}

#[test]
fn test_multiline_text_falls_back_to_bulk() {
    assert_eq!(&encode("two\nlines", true)[..], b"$9\r\ntwo\nlines\r\n");
    assert_eq!(&encode(&["ok", "a\rb"][..], true)[..], b"*2\r\n+ok\r\n$3\r\na\rb\r\n");
}

#[test]
fn test_explicit_line_forms_stay_single_line() {
    assert_eq!(
        &encode(&WireValue::error("ERR invalid integer '1\n2'"), false)[..],
        b"-ERR invalid integer '1 2'\r\n"
    );
}

#[test]
fn test_encode_option() {
    assert_eq!(&encode(&Some("x"), false)[..], b"$1\r\nx\r\n");
    assert_eq!(&encode(&None::<String>, false)[..], b"$-1\r\n");
}

// =============================================================================
// Array Encoding Tests
// =============================================================================

#[test]
fn test_encode_string_array() {
    assert_eq!(
        &encode(&vec!["hello", "world"], false)[..],
        b"*2\r\n$5\r\nhello\r\n$5\r\nworld\r\n"
    );
}

#[test]
fn test_encode_array_uses_flag_for_elements() {
    assert_eq!(&encode(&["foo", "bar"][..], true)[..], b"*2\r\n+foo\r\n+bar\r\n");
}

#[test]
fn test_encode_nested_arrays() {
    let nested = vec![vec!["foo", "bar"], vec!["hello", "world"]];
    assert_eq!(
        &encode(&nested, true)[..],
        b"*2\r\n*2\r\n+foo\r\n+bar\r\n*2\r\n+hello\r\n+world\r\n"
    );
}

#[test]
fn test_encode_empty_array() {
    assert_eq!(&encode(&Vec::<i64>::new(), false)[..], b"*0\r\n");
}

#[test]
fn test_encode_heterogeneous_values() {
    let value = Value::Array(vec![Value::Integer(1), Value::from("two"), Value::Null]);
    assert_eq!(&encode(&value, false)[..], b"*3\r\n:1\r\n$3\r\ntwo\r\n$-1\r\n");
}

// =============================================================================
// Wire Value Encoding Tests
// =============================================================================

#[test]
fn test_encode_wire_values_exactly() {
    let cases: [(WireValue, &[u8]); 7] = [
        (WireValue::ok(), b"+OK\r\n"),
        (WireValue::error("ERR unknown command 'FOOBAR'"), b"-ERR unknown command 'FOOBAR'\r\n"),
        (WireValue::Integer(1000), b":1000\r\n"),
        (WireValue::bulk("world"), b"$5\r\nworld\r\n"),
        (WireValue::null_bulk(), b"$-1\r\n"),
        (WireValue::array(vec![]), b"*0\r\n"),
        (WireValue::null_array(), b"*-1\r\n"),
    ];

    for (value, want) in cases {
        // The flag never changes an explicit wire value
        assert_eq!(&encode(&value, true)[..], want);
        assert_eq!(&encode(&value, false)[..], want);
    }
}

#[test]
fn test_encode_into_accumulates_batch() {
    let mut out = BytesMut::new();
    encode_into(&WireValue::ok(), false, &mut out);
    encode_into(&WireValue::Integer(2), false, &mut out);
    assert_eq!(&out[..], b"+OK\r\n:2\r\n");
}

#[test]
fn test_binary_argument_round_trips_exactly() {
    let input = b"*2\r\n$3\r\nSET\r\n$2\r\n\xff\xfe\r\n";
    let commands = parse_commands(input).unwrap();
    let arg = &commands[0].args[0];

    assert_eq!(&encode(arg, false)[..], b"$2\r\n\xff\xfe\r\n");
    assert_eq!(&encode(&WireValue::bulk(arg.clone()), false)[..], b"$2\r\n\xff\xfe\r\n");

    let mut words = vec![Bytes::from(commands[0].name.clone())];
    words.extend(commands[0].args.iter().cloned());
    assert_eq!(&encode(&words, false)[..], &input[..]);
}

#[test]
fn test_encoded_command_parses_back() {
    let words = vec!["SET", "key", "value"];
    let commands = parse_commands(&encode(&words, false)).unwrap();
    assert_eq!(
        commands,
        vec![Command::new("SET", ["key", "value"])]
    );
}
