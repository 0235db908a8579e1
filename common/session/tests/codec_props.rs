use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use common_session::{decode, encode, Audience, Claims, RoleClaim};
use proptest::prelude::*;
use serde_json::{Map, Value};

fn role_claim() -> impl Strategy<Value = Option<RoleClaim>> {
    prop_oneof![
        Just(None),
        "[a-zA-Z]{1,10}".prop_map(|role| Some(RoleClaim::Single(role))),
        prop::collection::vec("[a-zA-Z]{1,10}", 0..4).prop_map(|roles| Some(RoleClaim::Many(roles))),
    ]
}

fn audience() -> impl Strategy<Value = Audience> {
    prop_oneof![
        "[a-z-]{0,12}".prop_map(Audience::Single),
        prop::collection::vec("[a-z-]{1,12}", 0..3).prop_map(Audience::Many),
    ]
}

fn extra_fields() -> impl Strategy<Value = BTreeMap<String, Value>> {
    prop::collection::btree_map(
        "x_[a-z]{1,6}",
        prop_oneof![
            any::<i64>().prop_map(Value::from),
            any::<bool>().prop_map(Value::from),
            "\\PC{0,12}".prop_map(Value::from),
        ],
        0..3,
    )
}

fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        (-1.0e12f64..1.0e12).prop_map(Value::from),
        "\\PC{0,12}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|fields| Value::Object(fields.into_iter().collect())),
        ]
    })
}

// Claim names are drawn often so every field sees values of every JSON type.
fn payload_object() -> impl Strategy<Value = Map<String, Value>> {
    let key = prop_oneof![
        prop::sample::select(vec![
            "email",
            "sub",
            "role",
            "http://schemas.microsoft.com/ws/2008/06/identity/claims/role",
            "ShopId",
            "shopId",
            "exp",
            "iss",
            "aud",
        ])
        .prop_map(str::to_string),
        "[a-zA-Z_]{1,8}",
    ];
    prop::collection::btree_map(key, json_value(), 0..10)
        .prop_map(|fields| fields.into_iter().collect())
}

prop_compose! {
    fn claims()(
        email in "[a-z0-9.]{1,12}@nova\\.vn",
        subject_id in "[0-9]{1,8}",
        role in role_claim(),
        shop_id in prop::option::of("[0-9a-z]{1,6}"),
        expires_at in any::<i64>(),
        issuer in "\\PC{0,16}",
        audience in audience(),
        extra in extra_fields()
    ) -> Claims {
        Claims { email, subject_id, role, shop_id, expires_at, issuer, audience, extra }
    }
}

proptest! {
    #[test]
    fn decode_inverts_encode(claims in claims()) {
        let token = encode(&claims).expect("encode");
        prop_assert_eq!(decode(&token), Some(claims));
    }

    // Any JSON object payload yields claims; only the shape of the token and
    // the payload's JSON-ness can fail a decode.
    #[test]
    fn any_object_payload_decodes(payload in payload_object()) {
        let json = serde_json::to_string(&Value::Object(payload)).expect("json");
        let token = format!("aGVhZA.{}.c2ln", STANDARD_NO_PAD.encode(&json));
        prop_assert!(decode(&token).is_some(), "{}", json);
    }

    // Anything other than exactly two separators is rejected before decoding.
    #[test]
    fn wrong_separator_count_is_rejected(
        parts in prop::collection::vec("[A-Za-z0-9+/]{1,16}", 1..6)
            .prop_filter("exactly three segments is the valid shape", |parts| parts.len() != 3)
    ) {
        let token = parts.join(".");
        prop_assert!(decode(&token).is_none());
    }
}
