use ultrasonics_core::{decode, decode_optional, encode, CodecError, Value};

fn nested_plan() -> Value {
    Value::map([
        ("title", Value::from("Weekly sync ✨")),
        ("enabled", Value::from(false)),
        ("retries", Value::from(-3_i64)),
        ("ratio", Value::from(0.25)),
        (
            "steps",
            Value::list([
                Value::map([
                    ("name", Value::from("spotify")),
                    ("version", Value::from("1.0")),
                    ("tags", Value::list([Value::from("a"), Value::from("b")])),
                ]),
                Value::list([]),
                Value::Map(Default::default()),
            ]),
        ),
    ])
}

#[test]
fn representative_values_round_trip() {
    let values = [
        Value::from(""),
        Value::from("it's \"quoted\"\nand multi-line"),
        Value::from(i64::MIN),
        Value::from(i64::MAX),
        Value::from(1.0e-12),
        Value::from(true),
        Value::list([]),
        Value::map(Vec::<(String, Value)>::new()),
        nested_plan(),
    ];

    for value in values {
        let text = encode(&value).unwrap();
        assert_eq!(decode(&text).unwrap(), value, "round trip of {text}");
    }
}

#[test]
fn integers_and_floats_stay_distinct() {
    let int_text = encode(&Value::from(2_i64)).unwrap();
    let float_text = encode(&Value::from(2.0)).unwrap();

    assert_eq!(decode(&int_text).unwrap(), Value::Integer(2));
    assert_eq!(decode(&float_text).unwrap(), Value::Float(2.0));
}

#[test]
fn map_encoding_is_key_ordered() {
    let forward = Value::map([("a", Value::from(1_i64)), ("b", Value::from(2_i64))]);
    let backward = Value::map([("b", Value::from(2_i64)), ("a", Value::from(1_i64))]);

    assert_eq!(encode(&forward).unwrap(), encode(&backward).unwrap());
}

#[test]
fn truncated_text_is_malformed() {
    let text = encode(&nested_plan()).unwrap();
    let half = text.chars().count() / 2;
    let truncated: String = text.chars().take(half).collect();

    assert!(matches!(decode(&truncated), Err(CodecError::Malformed(_))));
}

#[test]
fn no_value_differs_from_empty_containers() {
    let empty_map = encode(&Value::map(Vec::<(String, Value)>::new())).unwrap();

    assert_eq!(decode_optional(Some("")).unwrap(), None);
    assert_eq!(
        decode_optional(Some(empty_map.as_str())).unwrap(),
        Some(Value::Map(Default::default()))
    );
}

// xorshift64*; deterministic so failures reproduce.
struct Bits(u64);

impl Bits {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 >> 12;
        self.0 ^= self.0 << 25;
        self.0 ^= self.0 >> 27;
        self.0.wrapping_mul(0x2545_f491_4f6c_dd1d)
    }
}

fn assert_float_round_trips(value: f64) {
    let text = encode(&Value::from(value)).unwrap();
    match decode(&text).unwrap() {
        Value::Float(decoded) => assert_eq!(
            decoded.to_bits(),
            value.to_bits(),
            "float {value:e} came back as {decoded:e} from {text}"
        ),
        other => panic!("float {value:e} decoded as {other:?}"),
    }
}

#[test]
fn ordinary_floats_round_trip_bit_for_bit() {
    let mut bits = Bits(0x9e37_79b9_7f4a_7c15);
    for _ in 0..5_000 {
        let unit = (bits.next() >> 11) as f64 / (1_u64 << 53) as f64;
        assert_float_round_trips(unit * 1000.0);
    }
    assert_float_round_trips(971.9863718547629);
}

#[test]
fn extreme_exponent_floats_round_trip_bit_for_bit() {
    let mut bits = Bits(0xd1b5_4a32_d192_ed03);
    let mut checked = 0;
    while checked < 5_000 {
        let value = f64::from_bits(bits.next());
        if value.is_finite() {
            assert_float_round_trips(value);
            checked += 1;
        }
    }
    for value in [
        f64::MIN_POSITIVE,
        f64::MAX,
        f64::MIN,
        f64::EPSILON,
        5e-324,
        1.0715660391465826e-75,
    ] {
        assert_float_round_trips(value);
    }
}

#[test]
fn floats_inside_nested_values_round_trip() {
    let value = Value::map([
        ("gain", Value::from(0.1 + 0.2)),
        ("weights", Value::list([Value::from(1.0 / 3.0), Value::from(-2.5e-300)])),
    ]);
    let text = encode(&value).unwrap();
    assert_eq!(decode(&text).unwrap(), value);
}
