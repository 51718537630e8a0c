//! End-to-end pipeline through the public API: flags to descriptor, then a
//! simulated response stream to terminal bytes.
//!
//! # Design
//! The transport is replaced by a fixed list of events, the way the binary
//! would deliver them, and the caller loop mirrors the one in the binary:
//! write the diagnostic bytes, then the output, then obey `Next`.

use coap_cli_core::{
    format_code, CoapClient, CoapMethod, Config, Next, OptionGroup, Payload, ResponseEvent,
    StreamState,
};

struct Terminal {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    /// Interleaving of writes as (stream, bytes), to check ordering.
    writes: Vec<(&'static str, Vec<u8>)>,
}

/// Feed `events` through the client's transformer and collect what a
/// terminal would show. Returns the exit status if one was requested.
fn play(client: &CoapClient, events: Vec<ResponseEvent>) -> (Terminal, Option<u8>) {
    let mut transformer = client.transformer();
    let mut term = Terminal {
        stdout: Vec::new(),
        stderr: Vec::new(),
        writes: Vec::new(),
    };

    for event in events {
        let step = transformer.on_event(&event);
        if let Some(bytes) = step.diagnostic {
            term.stderr.extend(&bytes);
            term.writes.push(("stderr", bytes));
        }
        if let Some(bytes) = step.output {
            term.stdout.extend(&bytes);
            term.writes.push(("stdout", bytes));
        }
        match step.next {
            Next::Continue => {}
            Next::Finished => return (term, None),
            Next::Exit(code) => return (term, Some(code)),
        }
    }
    (term, None)
}

#[test]
fn get_with_options_and_single_response() {
    let config = Config {
        coap_options: vec![
            "2048,HelloWorld".to_string(),
            "2049,0x0102".to_string(),
            "2048,0x61".to_string(),
        ],
        ..Config::default()
    };
    let client = CoapClient::new(config);

    let req = client
        .build_request(CoapMethod::default(), Some("coap://localhost/hello"), Payload::None)
        .unwrap();
    assert_eq!(req.method, CoapMethod::Get);
    assert_eq!(req.uri_path_segments(), vec![b"hello".to_vec()]);
    assert_eq!(
        req.options,
        vec![
            OptionGroup {
                number: 2048,
                values: vec![b"HelloWorld".to_vec(), b"a".to_vec()],
            },
            OptionGroup {
                number: 2049,
                values: vec![vec![0x01, 0x02]],
            },
        ]
    );

    let (term, exit) = play(
        &client,
        vec![ResponseEvent::new(format_code(0x45), "hello world", true)],
    );
    assert_eq!(exit, None);
    assert_eq!(term.stdout, b"hello world\n");
    assert_eq!(term.stderr, b"\x1b[1m(2.05)\x1b[0m\t");
    assert_eq!(term.writes[0].0, "stderr", "marker precedes payload");
    assert_eq!(term.writes[1].0, "stdout");
}

#[test]
fn post_with_inline_payload_and_empty_reply() {
    let config = Config {
        payload: Some("on".to_string()),
        ..Config::default()
    };
    let client = CoapClient::new(config.clone());
    let payload = Payload::resolve(CoapMethod::Post, config.payload.as_deref(), true);
    let req = client
        .build_request(CoapMethod::Post, Some("coap://127.0.0.1/switch"), payload)
        .unwrap();
    assert_eq!(req.payload, Payload::Inline(b"on".to_vec()));

    let (term, exit) = play(
        &client,
        vec![
            ResponseEvent::new("2.04", "", true),
            ResponseEvent::new("2.05", "unreachable", true),
        ],
    );
    assert_eq!(exit, Some(0));
    assert!(term.stdout.is_empty());
    assert_eq!(term.stderr, b"\x1b[1m(2.04)\x1b[0m\n");
}

#[test]
fn observe_stream_keeps_arrival_order() {
    let client = CoapClient::new(Config {
        observe: true,
        ..Config::default()
    });
    let req = client
        .build_request(CoapMethod::Get, Some("coap://localhost/obs"), Payload::None)
        .unwrap();
    assert!(req.observe);

    let mut transformer = client.transformer();
    let mut stdout = Vec::new();
    let mut markers = 0;
    for payload in ["hello", "matteo"] {
        let step = transformer.on_event(&ResponseEvent::new("2.05", payload, false));
        assert_eq!(step.next, Next::Continue);
        markers += usize::from(step.diagnostic.is_some());
        stdout.extend(step.output.unwrap());
    }
    assert_eq!(transformer.state(), StreamState::Streaming);
    assert_eq!(markers, 2);
    assert_eq!(stdout, b"hello\nmatteo\n");
}

#[test]
fn piped_body_only_for_put_and_post() {
    for method in [CoapMethod::Get, CoapMethod::Delete] {
        assert_eq!(Payload::resolve(method, None, false), Payload::None);
    }
    for method in [CoapMethod::Put, CoapMethod::Post] {
        assert_eq!(Payload::resolve(method, None, false), Payload::Piped);
        assert_eq!(Payload::resolve(method, None, true), Payload::None);
    }
}
