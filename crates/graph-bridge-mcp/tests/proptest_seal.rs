//! Property-based tests for the sealed-blob layer.
//!
//! Everything that crosses the browser (authorize state, approval cookies)
//! rides on `seal`/`unseal`, so these properties are what keeps the callback
//! leg tamper-proof.

use proptest::prelude::*;

use graph_bridge_mcp::models::ClientKind;
use graph_bridge_mcp::server::oauth::seal::{seal, unseal};
use graph_bridge_mcp::server::oauth::types::GrantProps;

const SECRET: &str = "proptest-signing-secret";

/// Characters a sealed blob may contain. Base64url plus the separator.
const BLOB_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_.";

fn arb_client_kind() -> impl Strategy<Value = ClientKind> {
    prop_oneof![
        Just(ClientKind::Claude),
        Just(ClientKind::Inspector),
        Just(ClientKind::Unknown),
    ]
}

/// Generate arbitrary GrantProps the way real grants carry them.
fn arb_props() -> impl Strategy<Value = GrantProps> {
    (
        proptest::option::of("[A-Za-z0-9._~-]{1,60}"),  // upstream_code
        proptest::option::of("[A-Za-z0-9._~-]{1,120}"), // upstream_access_token
        proptest::option::of("[A-Za-z0-9._~-]{1,120}"), // upstream_refresh_token
        proptest::option::of("[A-Za-z ./]{1,80}"),      // upstream_scope
        arb_client_kind(),
    )
        .prop_map(|(code, access, refresh, scope, kind)| GrantProps {
            upstream_code: code,
            upstream_redirect_uri: None,
            upstream_access_token: access,
            upstream_token_type: None,
            upstream_scope: scope,
            upstream_refresh_token: refresh,
            client_kind: kind,
        })
}

proptest! {
    /// Any props value survives a seal/unseal round trip intact.
    #[test]
    fn seal_roundtrip(props in arb_props()) {
        let sealed = seal(SECRET, &props).expect("seal");
        let opened: GrantProps = unseal(SECRET, &sealed).expect("unseal");

        prop_assert_eq!(opened, props);
    }

    /// Sealed blobs are cookie- and query-safe: base64url plus one dot.
    #[test]
    fn sealed_blob_is_url_safe(props in arb_props()) {
        let sealed = seal(SECRET, &props).expect("seal");

        prop_assert!(sealed.bytes().all(|b| BLOB_ALPHABET.contains(&b)));
        prop_assert_eq!(sealed.bytes().filter(|&b| b == b'.').count(), 1);
    }

    /// A different signing secret never opens the blob.
    #[test]
    fn wrong_secret_never_opens(props in arb_props(), other in "[a-z0-9]{8,40}") {
        prop_assume!(other != SECRET);

        let sealed = seal(SECRET, &props).expect("seal");
        prop_assert!(unseal::<GrantProps>(&other, &sealed).is_none());
    }

    /// Replacing any single character breaks the blob.
    #[test]
    fn any_substitution_is_rejected(
        props in arb_props(),
        position in 0usize..4096,
        replacement in 0usize..4096,
    ) {
        let sealed = seal(SECRET, &props).expect("seal");

        let index = position % sealed.len();
        let new_char = BLOB_ALPHABET[replacement % BLOB_ALPHABET.len()] as char;
        prop_assume!(sealed.as_bytes()[index] as char != new_char);

        let mut forged: Vec<char> = sealed.chars().collect();
        forged[index] = new_char;
        let forged: String = forged.into_iter().collect();

        prop_assert!(unseal::<GrantProps>(SECRET, &forged).is_none());
    }

    /// Truncating the blob anywhere breaks it.
    #[test]
    fn any_truncation_is_rejected(props in arb_props(), cut in 0usize..4096) {
        let sealed = seal(SECRET, &props).expect("seal");

        let keep = cut % sealed.len();
        prop_assert!(unseal::<GrantProps>(SECRET, &sealed[..keep]).is_none());
    }

    /// A payload sealed under one value never opens as another: swapping the
    /// tag from a second blob is rejected.
    #[test]
    fn tag_swap_is_rejected(a in arb_props(), b in arb_props()) {
        prop_assume!(a != b);

        let sealed_a = seal(SECRET, &a).expect("seal");
        let sealed_b = seal(SECRET, &b).expect("seal");

        let (payload_a, _) = sealed_a.split_once('.').expect("separator");
        let (_, tag_b) = sealed_b.split_once('.').expect("separator");

        let spliced = format!("{payload_a}.{tag_b}");
        prop_assert!(unseal::<GrantProps>(SECRET, &spliced).is_none());
    }
}

#[test]
fn doubled_blob_is_rejected() {
    let sealed = seal(SECRET, &GrantProps::default()).unwrap();
    let doubled = format!("{sealed}{sealed}");

    assert!(unseal::<GrantProps>(SECRET, &doubled).is_none());
}

#[test]
fn blob_sealed_by_one_type_does_not_open_as_another() {
    #[derive(serde::Serialize)]
    struct Other {
        client_id: String,
    }

    let sealed = seal(SECRET, &Other { client_id: "c1".to_string() }).unwrap();

    // GrantProps decodes leniently: foreign payloads parse to defaults,
    // never to invented tokens
    let opened: GrantProps = unseal(SECRET, &sealed).unwrap();
    assert_eq!(opened, GrantProps::default());
}
