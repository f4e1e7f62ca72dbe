// Edge normalization tests through the public API

use hikari::edge::{EdgeEvent, EdgeRequest, HandlerTable, QueryNormalizer};
use hikari::image_optimizer::{Operation, OperationMap, OutputFormat};
use rstest::rstest;

fn normalize(request: EdgeRequest) -> EdgeRequest {
    let mut request = request;
    QueryNormalizer::new(HandlerTable::standard()).normalize(&mut request);
    request
}

/// Turn a canonical suffix back into query parameters
fn suffix_to_request(uri: &str, suffix: &str) -> EdgeRequest {
    suffix
        .split(',')
        .filter_map(|token| token.split_once('='))
        .fold(EdgeRequest::new(uri), |request, (name, value)| {
            request.with_query(name, value)
        })
}

#[test]
fn test_bernie_event_end_to_end() {
    let json = r#"{
        "request": {
            "method": "GET",
            "uri": "/Bernie.png",
            "querystring": {"format": {"value": "jpg"}},
            "headers": {}
        }
    }"#;

    let mut event = EdgeEvent::from_json(json).unwrap();
    QueryNormalizer::default().normalize(&mut event.request);

    assert_eq!(event.request.uri, "/Bernie.png/format=jpeg");
    assert!(event.request.querystring.is_empty());
}

#[rstest]
#[case(&[("width", "100"), ("height", "200"), ("format", "png")])]
#[case(&[("format", "png"), ("width", "100"), ("height", "200")])]
#[case(&[("height", "200"), ("format", "png"), ("width", "100")])]
fn test_insertion_order_does_not_matter(#[case] params: &[(&str, &str)]) {
    let request = params
        .iter()
        .fold(EdgeRequest::new("/a.jpeg"), |r, (k, v)| r.with_query(*k, *v));

    let normalized = normalize(request);
    assert_eq!(normalized.uri, "/a.jpeg/format=png,height=200,width=100");
}

#[rstest]
#[case(&[("format", "jpg")])]
#[case(&[("width", "5000"), ("quality", "abc")])]
#[case(&[("Width", "-3"), ("HEIGHT", "77x"), ("Format", "auto"), ("quality", "100")])]
#[case(&[("format", "")])]
fn test_idempotence(#[case] params: &[(&str, &str)]) {
    let request = params
        .iter()
        .fold(EdgeRequest::new("/img.png"), |r, (k, v)| r.with_query(*k, *v))
        .with_header("accept", "image/png");

    let first = normalize(request);
    let suffix = first
        .uri
        .strip_prefix("/img.png/")
        .expect("request was rewritten")
        .to_string();

    let second = normalize(suffix_to_request("/img.png", &suffix).with_header("accept", "image/png"));
    assert_eq!(second.uri, first.uri);
}

#[test]
fn test_emitted_values_are_in_range() {
    let inputs = ["", "-1", "0", "abc", "99999999", "512", "+12", " 30", "1e3"];

    for input in inputs {
        let request = EdgeRequest::new("/x.png")
            .with_query("width", input)
            .with_query("height", input)
            .with_query("quality", input)
            .with_query("format", input);

        let normalized = normalize(request);
        let suffix = normalized.uri.strip_prefix("/x.png/").unwrap();
        let operations = OperationMap::decode(suffix);

        for (operation, value) in operations.iter() {
            match operation {
                Operation::Width | Operation::Height => {
                    let n: u32 = value.parse().unwrap();
                    assert!((16..=1024).contains(&n), "{} -> {}", input, value);
                }
                Operation::Quality => {
                    let n: u32 = value.parse().unwrap();
                    assert!((1..=100).contains(&n), "{} -> {}", input, value);
                }
                Operation::Format => {
                    assert!(OutputFormat::from_canonical(value).is_some(), "{}", value);
                }
            }
        }
    }
}

#[test]
fn test_only_unrecognized_params_leave_request_unchanged() {
    let request = EdgeRequest::new("/a.png")
        .with_query("size", "large")
        .with_query("Expires", "1700000000")
        .with_query("Signature", "abc")
        .with_query("Key-Pair-Id", "K1");
    let expected = request.clone();

    assert_eq!(normalize(request), expected);
}

#[test]
fn test_normalizer_is_shareable_across_threads() {
    let normalizer = std::sync::Arc::new(QueryNormalizer::default());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let normalizer = normalizer.clone();
            std::thread::spawn(move || {
                let mut request = EdgeRequest::new("/a.png").with_query("width", (100 + i).to_string());
                normalizer.normalize(&mut request);
                request.uri
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), format!("/a.png/width={}", 100 + i));
    }
}
