//! CoAP test server for the client's integration tests.
//!
//! `respond` maps one decoded request to the messages the server sends back,
//! without any socket, so handlers can be tested directly. `run` wires it to
//! a UDP socket.

use std::collections::LinkedList;

use coap_lite::{CoapOption, MessageClass, MessageType, Packet, RequestType, ResponseType};
use log::{debug, info, warn};
use tokio::net::UdpSocket;

/// Body served by `/large`.
pub const LARGE_BODY_LEN: usize = 200;

/// Block size exponent used when the client does not ask for one (64 bytes).
pub const DEFAULT_SZX: u8 = 2;

pub fn large_body() -> Vec<u8> {
    (0..LARGE_BODY_LEN).map(|i| b'a' + (i % 26) as u8).collect()
}

pub async fn run(socket: UdpSocket) -> Result<(), std::io::Error> {
    let mut buf = [0u8; 1500];
    loop {
        let (len, peer) = socket.recv_from(&mut buf).await?;
        let request = match Packet::from_bytes(&buf[..len]) {
            Ok(packet) => packet,
            Err(e) => {
                warn!("dropping malformed datagram from {peer}: {e:?}");
                continue;
            }
        };
        debug!(
            "{peer} -> {:?} mid={} path={}",
            request.header.code,
            request.header.message_id,
            path_of(&request)
        );

        for reply in respond(&request) {
            match reply.to_bytes() {
                Ok(bytes) => {
                    socket.send_to(&bytes, peer).await?;
                }
                Err(e) => warn!("failed to encode reply: {e:?}"),
            }
        }
    }
}

/// Route a request to its resource. Empty messages (ACK/RST) get no reply.
pub fn respond(request: &Packet) -> Vec<Packet> {
    let method = match request.header.code {
        MessageClass::Request(method) => method,
        _ => return Vec::new(),
    };
    let path = path_of(request);
    info!("{method:?} /{path}");

    match (path.as_str(), method) {
        ("hello", RequestType::Get) => vec![reply(request, ResponseType::Content, b"hello world")],
        ("matteo", RequestType::Get) => {
            vec![reply(request, ResponseType::Content, b"hello matteo")]
        }
        ("echo", RequestType::Get) => vec![reply(request, ResponseType::Content, b"")],
        ("echo", RequestType::Put) => vec![reply(request, ResponseType::Changed, &request.payload)],
        ("echo", RequestType::Post) => {
            vec![reply(request, ResponseType::Created, &request.payload)]
        }
        ("echo", RequestType::Delete) => vec![reply(request, ResponseType::Deleted, b"")],
        ("query", RequestType::Get) => {
            let query = option_values(request, CoapOption::UriQuery)
                .iter()
                .map(|v| String::from_utf8_lossy(v).into_owned())
                .collect::<Vec<_>>()
                .join("&");
            vec![reply(request, ResponseType::Content, query.as_bytes())]
        }
        ("options", RequestType::Get) => {
            let listing = describe_options(request);
            vec![reply(request, ResponseType::Content, listing.as_bytes())]
        }
        ("large", RequestType::Get) => vec![large(request)],
        ("separate", RequestType::Get) => separate(request),
        ("observe", RequestType::Get) => observe(request),
        _ => vec![reply(request, ResponseType::NotFound, b"")],
    }
}

fn path_of(request: &Packet) -> String {
    option_values(request, CoapOption::UriPath)
        .iter()
        .map(|v| String::from_utf8_lossy(v).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn option_values(request: &Packet, option: CoapOption) -> Vec<Vec<u8>> {
    request
        .get_option(option)
        .map(|values| values.iter().cloned().collect())
        .unwrap_or_default()
}

/// Piggybacked ACK for CON requests, NON otherwise.
fn reply(request: &Packet, code: ResponseType, payload: &[u8]) -> Packet {
    let mut packet = Packet::new();
    if request.header.get_type() == MessageType::Confirmable {
        packet.header.set_type(MessageType::Acknowledgement);
    } else {
        packet.header.set_type(MessageType::NonConfirmable);
    }
    packet.header.message_id = request.header.message_id;
    packet.header.code = MessageClass::Response(code);
    packet.set_token(request.get_token().to_vec());
    packet.payload = payload.to_vec();
    packet
}

/// A later message of the same exchange, sent with its own message id.
fn follow_up(
    request: &Packet,
    offset: u16,
    kind: MessageType,
    code: ResponseType,
    payload: &[u8],
) -> Packet {
    let mut packet = reply(request, code, payload);
    packet.header.set_type(kind);
    packet.header.message_id = request.header.message_id.wrapping_add(offset);
    packet
}

/// `number=hex` for every value of each option number named in the query.
fn describe_options(request: &Packet) -> String {
    let mut parts = Vec::new();
    for name in option_values(request, CoapOption::UriQuery) {
        let number = std::str::from_utf8(&name)
            .ok()
            .and_then(|n| n.parse::<u16>().ok());
        let Some(number) = number else {
            continue;
        };
        for value in option_values(request, CoapOption::from(number)) {
            parts.push(format!("{number}={}", hex::encode(value)));
        }
    }
    parts.join(";")
}

fn large(request: &Packet) -> Packet {
    let body = large_body();
    let (num, szx) = match option_values(request, CoapOption::Block2).first() {
        Some(value) => {
            let raw = decode_uint(value);
            (raw >> 4, (raw & 0x7) as u8)
        }
        None => (0, DEFAULT_SZX),
    };
    if szx == 7 {
        return reply(request, ResponseType::BadOption, b"");
    }

    let size = 16usize << szx;
    let start = num as usize * size;
    if start >= body.len() {
        return reply(request, ResponseType::BadOption, b"");
    }
    let end = (start + size).min(body.len());
    let more = end < body.len();

    let mut packet = reply(request, ResponseType::Content, &body[start..end]);
    let block = (num << 4) | (u32::from(more) << 3) | u32::from(szx);
    packet.add_option(CoapOption::Block2, encode_uint(block));
    packet
}

/// Empty ACK now, then the response as its own confirmable message.
fn separate(request: &Packet) -> Vec<Packet> {
    let mut ack = Packet::new();
    ack.header.set_type(MessageType::Acknowledgement);
    ack.header.message_id = request.header.message_id;
    ack.header.code = MessageClass::Empty;

    let response = follow_up(
        request,
        1,
        MessageType::Confirmable,
        ResponseType::Content,
        b"separate",
    );
    vec![ack, response]
}

/// Two notifications, then a final response without Observe that ends the
/// subscription. Requests without Observe get only the final response.
fn observe(request: &Packet) -> Vec<Packet> {
    let registered = request
        .get_option(CoapOption::Observe)
        .and_then(LinkedList::front)
        .map(|v| decode_uint(v) == 0)
        .unwrap_or(false);
    if !registered {
        return vec![reply(request, ResponseType::Content, b"bye")];
    }

    let mut first = reply(request, ResponseType::Content, b"hello");
    first.add_option(CoapOption::Observe, encode_uint(2));
    let mut second = follow_up(
        request,
        1,
        MessageType::NonConfirmable,
        ResponseType::Content,
        b"matteo",
    );
    second.add_option(CoapOption::Observe, encode_uint(3));
    let last = follow_up(request, 2, MessageType::NonConfirmable, ResponseType::Content, b"bye");
    vec![first, second, last]
}

fn decode_uint(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0, |acc, &b| (acc << 8) | u32::from(b))
}

fn encode_uint(value: u32) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count();
    bytes[skip..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uint_encoding_is_minimal() {
        assert_eq!(encode_uint(0), Vec::<u8>::new());
        assert_eq!(encode_uint(0x0a), vec![0x0a]);
        assert_eq!(encode_uint(0x0123), vec![0x01, 0x23]);
        assert_eq!(decode_uint(&[0x01, 0x23]), 0x0123);
        assert_eq!(decode_uint(&[]), 0);
    }

    #[test]
    fn large_body_is_lowercase_alphabet() {
        let body = large_body();
        assert_eq!(body.len(), LARGE_BODY_LEN);
        assert_eq!(&body[..3], b"abc");
        assert_eq!(body[26], b'a');
    }

    #[test]
    fn empty_messages_get_no_reply() {
        let mut ack = Packet::new();
        ack.header.set_type(MessageType::Acknowledgement);
        ack.header.code = MessageClass::Empty;
        assert!(respond(&ack).is_empty());
    }
}
