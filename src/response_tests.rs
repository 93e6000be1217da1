//! Unit and property tests for the response normalizers.
//!
//! Everything here is network-free: the remote-fetch half of the
//! chat-completions path is covered by the wiremock suites in `tests/`.

use proptest::prelude::*;

use crate::response::{
    ExtractedImages, GenerateContentBody, NormalizedResult, extract_image_markup,
    normalize_gemini,
};

fn gemini_body(json: &str) -> GenerateContentBody {
    serde_json::from_str(json).unwrap()
}

// --- extraction -------------------------------------------------------------

#[test]
fn test_extract_plain_text_is_untouched_but_trimmed() {
    let extracted = extract_image_markup("  just some prose  ");
    assert_eq!(
        extracted,
        ExtractedImages {
            text: "just some prose".to_string(),
            data_uris: vec![],
            remote_urls: vec![],
        }
    );
}

#[test]
fn test_extract_data_uri_batch_precedes_remote_batch() {
    // Remote appears first in the document; the data URI still leads its
    // own batch, and batches never interleave.
    let content = "See ![x](https://h/a.png) and ![y](data:image/png;base64,AAAA)";
    let extracted = extract_image_markup(content);

    assert_eq!(extracted.data_uris, vec!["data:image/png;base64,AAAA"]);
    assert_eq!(extracted.remote_urls, vec!["https://h/a.png"]);
    assert_eq!(extracted.text, "See  and");
}

#[test]
fn test_extract_each_batch_keeps_document_order() {
    let content = concat!(
        "a ![r1](http://h/1.png) b ![d1](data:image/webp;base64,Qg==) ",
        "c ![r2](https://h/2.jpg) d ![d2](data:image/png;base64,Qw==) e",
    );
    let extracted = extract_image_markup(content);

    assert_eq!(
        extracted.data_uris,
        vec![
            "data:image/webp;base64,Qg==",
            "data:image/png;base64,Qw==",
        ]
    );
    assert_eq!(
        extracted.remote_urls,
        vec!["http://h/1.png", "https://h/2.jpg"]
    );
    assert_eq!(extracted.text, "a  b  c  d  e");
}

#[test]
fn test_extract_ignores_non_image_links() {
    let extracted = extract_image_markup("see [docs](https://h/doc) and ![img](ftp://h/x)");
    assert!(extracted.data_uris.is_empty());
    assert!(extracted.remote_urls.is_empty());
    assert_eq!(
        extracted.text,
        "see [docs](https://h/doc) and ![img](ftp://h/x)"
    );
}

// --- gemini path ------------------------------------------------------------

#[test]
fn test_gemini_parts_accumulate_in_array_order() {
    let body = gemini_body(
        r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "a"},
                        {"inline_data": {"mime_type": "image/png", "data": "QUFB"}},
                        {"text": "b"}
                    ]
                }
            }]
        }"#,
    );

    let result = normalize_gemini(body);
    assert_eq!(result.text, "ab");
    assert_eq!(result.images.len(), 1);
    assert_eq!(result.images[0].base64, "data:image/png;base64,QUFB");
    assert_eq!(result.images[0].mime_type, "image/png");
}

#[test]
fn test_gemini_part_with_text_and_blob_emits_both() {
    let body = gemini_body(
        r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "x", "inline_data": {"mime_type": "image/png", "data": "QQ=="}}
                    ]
                }
            }]
        }"#,
    );

    let result = normalize_gemini(body);
    assert_eq!(result.text, "x");
    assert_eq!(result.images.len(), 1);
}

#[test]
fn test_gemini_existing_data_uri_is_kept_verbatim() {
    let body = gemini_body(
        r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"inline_data": {"mime_type": "image/png", "data": "data:image/png;base64,QQ=="}}
                    ]
                }
            }]
        }"#,
    );

    let result = normalize_gemini(body);
    assert_eq!(result.images[0].base64, "data:image/png;base64,QQ==");
}

#[test]
fn test_gemini_missing_mime_defaults_to_jpeg() {
    let body = gemini_body(
        r#"{"candidates": [{"content": {"parts": [{"inline_data": {"data": "QQ=="}}]}}]}"#,
    );

    let result = normalize_gemini(body);
    assert_eq!(result.images[0].mime_type, "image/jpeg");
    assert_eq!(result.images[0].base64, "data:image/jpeg;base64,QQ==");
}

#[test]
fn test_gemini_accepts_camel_case_blob_spelling() {
    let body = gemini_body(
        r#"{
            "candidates": [{
                "content": {
                    "parts": [{"inlineData": {"mimeType": "image/webp", "data": "QQ=="}}]
                }
            }]
        }"#,
    );

    let result = normalize_gemini(body);
    assert_eq!(result.images[0].mime_type, "image/webp");
}

#[test]
fn test_gemini_empty_shapes_normalize_to_empty_result() {
    for json in [
        r#"{}"#,
        r#"{"candidates": []}"#,
        r#"{"candidates": [{}]}"#,
        r#"{"candidates": [{"content": {"parts": []}}]}"#,
    ] {
        assert_eq!(normalize_gemini(gemini_body(json)), NormalizedResult::default());
    }
}

// --- result serialization ---------------------------------------------------

#[test]
fn test_result_serializes_with_wire_field_names() {
    let result = NormalizedResult {
        text: "hi".to_string(),
        images: vec![crate::response::ImageAsset {
            base64: "data:image/png;base64,QQ==".to_string(),
            mime_type: "image/png".to_string(),
        }],
    };

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["images"][0]["mimeType"], "image/png");
    assert_eq!(json["images"][0]["base64"], "data:image/png;base64,QQ==");
}

// --- extraction ordering property -------------------------------------------

#[derive(Debug, Clone)]
enum Segment {
    Prose(String),
    DataImage { mime: &'static str, payload: String },
    RemoteImage { url: String },
}

fn arb_segment() -> impl Strategy<Value = Segment> {
    prop_oneof![
        "[A-Za-z0-9 ,.]{0,20}".prop_map(Segment::Prose),
        (
            prop_oneof![Just("png"), Just("jpeg"), Just("webp")],
            "[A-Za-z0-9+/]{1,12}",
        )
            .prop_map(|(mime, payload)| Segment::DataImage { mime, payload }),
        "[a-z0-9]{1,10}".prop_map(|path| Segment::RemoteImage {
            url: format!("https://img.example.com/{path}.png"),
        }),
    ]
}

fn render(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Prose(text) => text.clone(),
            Segment::DataImage { mime, payload } => {
                format!("![gen](data:image/{mime};base64,{payload})")
            }
            Segment::RemoteImage { url } => format!("![gen]({url})"),
        })
        .collect()
}

proptest! {
    /// For any interleaving, extraction yields the data-URI batch in
    /// document order, the remote batch in document order, and the text
    /// with every matched span removed and trimmed.
    #[test]
    fn prop_extraction_batches_and_text(segments in proptest::collection::vec(arb_segment(), 0..12)) {
        let content = render(&segments);
        let extracted = extract_image_markup(&content);

        let expected_data: Vec<String> = segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::DataImage { mime, payload } => {
                    Some(format!("data:image/{mime};base64,{payload}"))
                }
                _ => None,
            })
            .collect();
        let expected_remote: Vec<String> = segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::RemoteImage { url } => Some(url.clone()),
                _ => None,
            })
            .collect();
        let expected_text: String = segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Prose(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();

        prop_assert_eq!(extracted.data_uris, expected_data);
        prop_assert_eq!(extracted.remote_urls, expected_remote);
        prop_assert_eq!(extracted.text, expected_text.trim());
    }
}
