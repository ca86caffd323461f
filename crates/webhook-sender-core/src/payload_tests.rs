//! Tests for payload construction and canonical serialization.

use super::*;

const TEST_HASH: &str = "01HZX3Q5K8V2M7N4P6R9T0W1YA";

fn sample_payload() -> WebhookPayload {
    WebhookPayload::from_template(&PayloadTemplate::default(), TEST_HASH, 0)
}

// ============================================================================
// Canonical form
// ============================================================================

mod canonical_tests {
    use super::*;

    /// Keys must appear in declaration order, not alphabetical order.
    #[test]
    fn test_field_order_follows_declaration() {
        let canonical = sample_payload().to_canonical().unwrap();

        let expected = concat!(
            r#"{"scope":"store/order/created","store_id":"1025646","#,
            r#""data":{"type":"order","id":250},"#,
            r#""hash":"01HZX3Q5K8V2M7N4P6R9T0W1YA","created_at":1561479335,"#,
            r#""producer":"stores/{store_hash}"}"#
        );
        assert_eq!(canonical.to_string(), expected);
    }

    /// The canonical form carries no insignificant whitespace.
    #[test]
    fn test_canonical_form_is_compact() {
        let canonical = sample_payload().to_canonical().unwrap();
        assert!(!canonical.as_bytes().contains(&b' '));
        assert!(!canonical.as_bytes().contains(&b'\n'));
    }

    /// Serializing the same payload twice yields the same bytes.
    #[test]
    fn test_canonical_form_is_stable() {
        let payload = sample_payload();
        let first = payload.to_canonical().unwrap();
        let second = payload.to_canonical().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_body_shares_canonical_bytes() {
        let canonical = sample_payload().to_canonical().unwrap();
        let body = canonical.to_body();
        assert_eq!(&body[..], canonical.as_bytes());
        assert_eq!(body.len(), canonical.len());
        assert!(!canonical.is_empty());
    }

    /// HTML-significant characters and line separators are not escaped.
    #[test]
    fn test_html_characters_are_written_raw() {
        let template = PayloadTemplate {
            scope: "store/<order>&created".to_string(),
            producer: "stores/\u{2028}\u{2029}".to_string(),
            ..PayloadTemplate::default()
        };
        let canonical = WebhookPayload::from_template(&template, TEST_HASH, 0)
            .to_canonical()
            .unwrap();
        let text = canonical.to_string();

        assert!(text.contains(r#""scope":"store/<order>&created""#), "body: {}", text);
        assert!(text.contains("stores/\u{2028}\u{2029}"), "body: {}", text);
        assert!(!text.contains("\\u003c"));
        assert!(!text.contains("\\u0026"));
        assert!(!text.contains("\\u2028"));
    }

    /// The canonical bytes parse back to the same payload.
    #[test]
    fn test_canonical_form_parses_back() {
        let payload = sample_payload();
        let canonical = payload.to_canonical().unwrap();
        let parsed: WebhookPayload = serde_json::from_slice(canonical.as_bytes()).unwrap();
        assert_eq!(parsed, payload);
    }
}

// ============================================================================
// Template
// ============================================================================

mod template_tests {
    use super::*;

    #[test]
    fn test_default_template_matches_sample_event() {
        let template = PayloadTemplate::default();
        assert_eq!(template.scope, "store/order/created");
        assert_eq!(template.store_id, "1025646");
        assert_eq!(template.data_type, "order");
        assert_eq!(template.data_id, 250);
        assert_eq!(template.producer, "stores/{store_hash}");
        assert_eq!(template.created_at, Some(DEFAULT_CREATED_AT));
    }

    /// A fixed template timestamp overrides the clock value.
    #[test]
    fn test_fixed_created_at_wins() {
        let payload = WebhookPayload::from_template(&PayloadTemplate::default(), "h", 42);
        assert_eq!(payload.created_at, DEFAULT_CREATED_AT);
    }

    /// Without a fixed timestamp the supplied clock value is used.
    #[test]
    fn test_clock_created_at_used_when_unset() {
        let template = PayloadTemplate {
            created_at: None,
            ..PayloadTemplate::default()
        };
        let payload = WebhookPayload::from_template(&template, "h", 1_700_000_000);
        assert_eq!(payload.created_at, 1_700_000_000);
    }

    #[test]
    fn test_hash_is_taken_from_caller() {
        let payload = WebhookPayload::from_template(&PayloadTemplate::default(), "abc123", 0);
        assert_eq!(payload.hash, "abc123");
    }

    /// Partial template configuration keeps defaults for absent keys.
    #[test]
    fn test_partial_template_deserialization() {
        let template: PayloadTemplate =
            serde_json::from_str(r#"{"scope":"store/product/updated","data_id":7}"#).unwrap();
        assert_eq!(template.scope, "store/product/updated");
        assert_eq!(template.data_id, 7);
        assert_eq!(template.store_id, "1025646");
        assert_eq!(template.data_type, "order");
    }
}
