use coap_lite::{CoapOption, MessageClass, MessageType, Packet, RequestType, ResponseType};
use mock_server::{large_body, respond};
use tokio::net::UdpSocket;

fn request(method: RequestType, path: &str) -> Packet {
    let mut packet = Packet::new();
    packet.header.set_type(MessageType::Confirmable);
    packet.header.message_id = 0x1000;
    packet.header.code = MessageClass::Request(method);
    packet.set_token(vec![0xca, 0xfe]);
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        packet.add_option(CoapOption::UriPath, segment.as_bytes().to_vec());
    }
    packet
}

fn only(mut replies: Vec<Packet>) -> Packet {
    assert_eq!(replies.len(), 1, "expected a single reply");
    replies.remove(0)
}

fn block2_of(packet: &Packet) -> u32 {
    packet
        .get_option(CoapOption::Block2)
        .and_then(|values| values.front())
        .map(|v| v.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b)))
        .expect("Block2 option")
}

// --- simple resources ---

#[test]
fn hello_is_piggybacked() {
    let resp = only(respond(&request(RequestType::Get, "/hello")));
    assert_eq!(resp.header.get_type(), MessageType::Acknowledgement);
    assert_eq!(resp.header.message_id, 0x1000);
    assert_eq!(resp.header.code, MessageClass::Response(ResponseType::Content));
    assert_eq!(resp.get_token(), &[0xca, 0xfe][..]);
    assert_eq!(resp.payload, b"hello world");
}

#[test]
fn non_confirmable_gets_non_reply() {
    let mut req = request(RequestType::Get, "/matteo");
    req.header.set_type(MessageType::NonConfirmable);
    let resp = only(respond(&req));
    assert_eq!(resp.header.get_type(), MessageType::NonConfirmable);
    assert_eq!(resp.payload, b"hello matteo");
}

#[test]
fn unknown_path_is_empty_not_found() {
    let resp = only(respond(&request(RequestType::Get, "/nope")));
    assert_eq!(resp.header.code, MessageClass::Response(ResponseType::NotFound));
    assert!(resp.payload.is_empty());
}

// --- echo ---

#[test]
fn echo_put_post_delete() {
    let mut req = request(RequestType::Put, "/echo");
    req.payload = b"on".to_vec();
    let resp = only(respond(&req));
    assert_eq!(resp.header.code, MessageClass::Response(ResponseType::Changed));
    assert_eq!(resp.payload, b"on");

    let mut req = request(RequestType::Post, "/echo");
    req.payload = b"new".to_vec();
    let resp = only(respond(&req));
    assert_eq!(resp.header.code, MessageClass::Response(ResponseType::Created));
    assert_eq!(resp.payload, b"new");

    let resp = only(respond(&request(RequestType::Delete, "/echo")));
    assert_eq!(resp.header.code, MessageClass::Response(ResponseType::Deleted));
    assert!(resp.payload.is_empty());
}

// --- query and options ---

#[test]
fn query_is_echoed() {
    let mut req = request(RequestType::Get, "/query");
    req.add_option(CoapOption::UriQuery, b"a=1".to_vec());
    req.add_option(CoapOption::UriQuery, b"b=2".to_vec());
    let resp = only(respond(&req));
    assert_eq!(resp.payload, b"a=1&b=2");
}

#[test]
fn options_are_listed_in_value_order() {
    let mut req = request(RequestType::Get, "/options");
    req.add_option(CoapOption::UriQuery, b"2048".to_vec());
    req.add_option(CoapOption::Unknown(2048), b"a".to_vec());
    req.add_option(CoapOption::Unknown(2048), vec![0x01]);
    let resp = only(respond(&req));
    assert_eq!(resp.payload, b"2048=61;2048=01");
}

// --- blockwise ---

#[test]
fn large_is_served_in_default_blocks() {
    let resp = only(respond(&request(RequestType::Get, "/large")));
    assert_eq!(resp.payload, &large_body()[..64]);
    // num 0, more, szx 2
    assert_eq!(block2_of(&resp), 0b1010);
}

#[test]
fn large_honors_requested_block() {
    let mut req = request(RequestType::Get, "/large");
    // num 6, szx 1 (32 bytes): bytes 192..200, last block
    req.add_option(CoapOption::Block2, vec![(6 << 4) | 1]);
    let resp = only(respond(&req));
    assert_eq!(resp.payload, &large_body()[192..]);
    assert_eq!(block2_of(&resp), (6 << 4) | 1);
}

#[test]
fn large_out_of_range_block() {
    let mut req = request(RequestType::Get, "/large");
    req.add_option(CoapOption::Block2, vec![(9 << 4) | 2]);
    let resp = only(respond(&req));
    assert_eq!(resp.header.code, MessageClass::Response(ResponseType::BadOption));
}

// --- separate and observe ---

#[test]
fn separate_sends_empty_ack_then_confirmable() {
    let replies = respond(&request(RequestType::Get, "/separate"));
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0].header.code, MessageClass::Empty);
    assert_eq!(replies[0].header.get_type(), MessageType::Acknowledgement);
    assert_eq!(replies[0].header.message_id, 0x1000);
    assert_eq!(replies[1].header.get_type(), MessageType::Confirmable);
    assert_eq!(replies[1].header.message_id, 0x1001);
    assert_eq!(replies[1].payload, b"separate");
}

#[test]
fn observe_sends_two_notifications_then_ends() {
    let mut req = request(RequestType::Get, "/observe");
    req.add_option(CoapOption::Observe, Vec::new());
    let replies = respond(&req);
    let payloads: Vec<&[u8]> = replies.iter().map(|p| p.payload.as_slice()).collect();
    assert_eq!(payloads, vec![&b"hello"[..], &b"matteo"[..], &b"bye"[..]]);
    assert!(replies[0].get_option(CoapOption::Observe).is_some());
    assert!(replies[1].get_option(CoapOption::Observe).is_some());
    assert!(replies[2].get_option(CoapOption::Observe).is_none());
    assert!(replies.iter().all(|p| p.get_token() == &[0xca, 0xfe][..]));
}

#[test]
fn observe_without_registration_is_plain_get() {
    let resp = only(respond(&request(RequestType::Get, "/observe")));
    assert_eq!(resp.payload, b"bye");
    assert!(resp.get_option(CoapOption::Observe).is_none());
}

// --- over the wire ---

#[tokio::test]
async fn serves_over_udp() {
    let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(mock_server::run(server));

    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    client.connect(addr).await.unwrap();
    let bytes = request(RequestType::Get, "/hello").to_bytes().unwrap();
    client.send(&bytes).await.unwrap();

    let mut buf = [0u8; 1500];
    let len = client.recv(&mut buf).await.unwrap();
    let resp = Packet::from_bytes(&buf[..len]).unwrap();
    assert_eq!(resp.payload, b"hello world");
}
