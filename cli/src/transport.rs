//! CoAP over UDP for a single request.
//!
//! # Design
//! `Exchange::send` encodes a `RequestDescriptor` with `coap-lite`, sends it
//! once and returns the exchange. `next_event` then yields one
//! `ResponseEvent` per response or notification until the exchange is over.
//! `into_events` wraps that in a `Stream` for the output driver.
//!
//! Messages are sent once, without retransmission. The exchange lifetime
//! bounds the wait for the first response; an established observation waits
//! forever.
//!
//! Blockwise responses to plain requests are reassembled here by asking for
//! the following blocks, so the caller sees one event with the whole body.

use std::collections::LinkedList;
use std::net::SocketAddr;
use std::time::Duration;

use coap_cli_core::{format_code, CoapMethod, Payload, RequestDescriptor, ResponseEvent};
use coap_lite::{CoapOption, MessageClass, MessageType, Packet, RequestType};
use futures::stream::{self, Stream};
use log::{debug, trace};
use tokio::io::AsyncReadExt;
use tokio::net::{lookup_host, UdpSocket};

use crate::error::TransportError;

/// Largest datagram we accept.
const MAX_DATAGRAM: usize = 65_535;

/// Length of the random request token.
const TOKEN_LEN: usize = 4;

/// A decoded Block2 option value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockValue {
    pub num: u32,
    pub more: bool,
    pub szx: u8,
}

impl BlockValue {
    pub fn decode(bytes: &[u8]) -> Self {
        let raw = decode_uint(bytes);
        Self {
            num: raw >> 4,
            more: raw & 0x8 != 0,
            szx: (raw & 0x7) as u8,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        encode_uint((self.num << 4) | (u32::from(self.more) << 3) | u32::from(self.szx))
    }

    pub fn size(&self) -> usize {
        16usize << self.szx
    }
}

/// One request in flight and the responses that belong to it.
pub struct Exchange {
    socket: UdpSocket,
    /// The last request sent; follow-up block requests are derived from it.
    request: Packet,
    observe: bool,
    lifetime: Duration,
    established: bool,
    done: bool,
    last_confirmable: Option<u16>,
    body: Vec<u8>,
}

impl Exchange {
    /// Resolve the host, open a socket and send the request.
    pub async fn send(
        descriptor: RequestDescriptor,
        lifetime: Duration,
    ) -> Result<Self, TransportError> {
        let addr = resolve(&descriptor.hostname, descriptor.effective_port()).await?;
        let socket = match addr {
            SocketAddr::V4(_) => UdpSocket::bind("0.0.0.0:0").await?,
            SocketAddr::V6(_) => UdpSocket::bind("[::]:0").await?,
        };
        socket.connect(addr).await?;

        let observe = descriptor.observe;
        let body = match &descriptor.payload {
            Payload::None => Vec::new(),
            Payload::Inline(bytes) => bytes.clone(),
            Payload::Piped => read_stdin().await?,
        };

        let mut request = build_packet(&descriptor, body);
        request.header.message_id = rand::random();
        request.set_token(rand::random::<[u8; TOKEN_LEN]>().to_vec());

        let exchange = Self {
            socket,
            request,
            observe,
            lifetime,
            established: false,
            done: false,
            last_confirmable: None,
            body: Vec::new(),
        };
        debug!(
            "{} {addr} mid={} token={:02x?}",
            descriptor.method,
            exchange.request.header.message_id,
            exchange.request.get_token()
        );
        exchange.transmit().await?;
        Ok(exchange)
    }

    /// Wait for the next response or notification.
    ///
    /// Returns `Ok(None)` once the exchange is complete.
    pub async fn next_event(&mut self) -> Result<Option<ResponseEvent>, TransportError> {
        if self.done {
            return Ok(None);
        }

        loop {
            let packet = self.receive().await?;
            let header = &packet.header;

            if header.get_type() == MessageType::Reset
                && header.message_id == self.request.header.message_id
            {
                return Err(TransportError::Reset);
            }
            if header.code == MessageClass::Empty {
                if header.get_type() == MessageType::Acknowledgement {
                    debug!(
                        "empty ACK for mid={}, waiting for separate response",
                        header.message_id
                    );
                }
                continue;
            }
            if packet.get_token() != self.request.get_token() {
                trace!("ignoring message with foreign token {:02x?}", packet.get_token());
                continue;
            }
            if !matches!(header.code, MessageClass::Response(_)) {
                continue;
            }

            if header.get_type() == MessageType::Confirmable {
                self.acknowledge(header.message_id).await?;
                if self.last_confirmable == Some(header.message_id) {
                    trace!("duplicate mid={}, dropped", header.message_id);
                    continue;
                }
                self.last_confirmable = Some(header.message_id);
            }

            let code = format_code(u8::from(header.code));
            let mut payload = packet.payload.clone();

            if !self.observe {
                if let Some(block) = block2_of(&packet) {
                    let offset = block.num as usize * block.size();
                    if offset != self.body.len() {
                        trace!("unexpected block {} at offset {offset}, dropped", block.num);
                        continue;
                    }
                    self.body.extend_from_slice(&payload);
                    if block.more {
                        self.request_block(BlockValue {
                            num: block.num + 1,
                            more: false,
                            szx: block.szx,
                        })
                        .await?;
                        continue;
                    }
                    payload = std::mem::take(&mut self.body);
                }
            }

            let is_final = !self.observe || packet.get_option(CoapOption::Observe).is_none();
            self.established = true;
            self.done = is_final;
            debug!("response {code} with {} bytes, final={is_final}", payload.len());
            return Ok(Some(ResponseEvent {
                status_code: code,
                payload,
                is_final,
            }));
        }
    }

    /// The exchange as a lazy stream of events.
    pub fn into_events(self) -> impl Stream<Item = Result<ResponseEvent, TransportError>> {
        stream::unfold(Some(self), |state| async move {
            let mut exchange = state?;
            match exchange.next_event().await {
                Ok(Some(event)) => Some((Ok(event), Some(exchange))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    async fn transmit(&self) -> Result<(), TransportError> {
        let bytes = self
            .request
            .to_bytes()
            .map_err(|e| TransportError::Encode(format!("{e:?}")))?;
        self.socket.send(&bytes).await?;
        Ok(())
    }

    async fn receive(&self) -> Result<Packet, TransportError> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            let len = if self.established {
                self.socket.recv(&mut buf).await?
            } else {
                tokio::time::timeout(self.lifetime, self.socket.recv(&mut buf))
                    .await
                    .map_err(|_| TransportError::Timeout(self.lifetime))??
            };
            match Packet::from_bytes(&buf[..len]) {
                Ok(packet) => return Ok(packet),
                Err(e) => debug!("dropping malformed datagram: {e:?}"),
            }
        }
    }

    async fn acknowledge(&self, message_id: u16) -> Result<(), TransportError> {
        let mut ack = Packet::new();
        ack.header.set_type(MessageType::Acknowledgement);
        ack.header.code = MessageClass::Empty;
        ack.header.message_id = message_id;
        let bytes = ack.to_bytes().map_err(|e| TransportError::Encode(format!("{e:?}")))?;
        self.socket.send(&bytes).await?;
        Ok(())
    }

    async fn request_block(&mut self, block: BlockValue) -> Result<(), TransportError> {
        let mut values = LinkedList::new();
        values.push_back(block.encode());
        self.request.set_option(CoapOption::Block2, values);
        self.request.header.message_id = self.request.header.message_id.wrapping_add(1);
        debug!("requesting block {} (mid={})", block.num, self.request.header.message_id);
        self.transmit().await
    }
}

/// Encode a descriptor as a CoAP request. Message id and token are left unset.
pub fn build_packet(descriptor: &RequestDescriptor, body: Vec<u8>) -> Packet {
    let mut packet = Packet::new();
    packet.header.set_type(if descriptor.confirmable {
        MessageType::Confirmable
    } else {
        MessageType::NonConfirmable
    });
    packet.header.code = MessageClass::Request(request_type(descriptor.method));

    for segment in descriptor.uri_path_segments() {
        packet.add_option(CoapOption::UriPath, segment);
    }
    for param in descriptor.uri_query_params() {
        packet.add_option(CoapOption::UriQuery, param);
    }
    if descriptor.observe {
        packet.add_option(CoapOption::Observe, encode_uint(0));
    }
    if let Some(accept) = descriptor.accept {
        packet.add_option(CoapOption::Accept, encode_uint(accept.into()));
    }
    if let Some(format) = descriptor.content_format {
        packet.add_option(CoapOption::ContentFormat, encode_uint(format.into()));
    }
    if let Some(block2) = descriptor.block2_option_value() {
        packet.add_option(CoapOption::Block2, block2);
    }
    for group in &descriptor.options {
        for value in &group.values {
            packet.add_option(CoapOption::from(group.number), value.clone());
        }
    }

    packet.payload = body;
    packet
}

fn request_type(method: CoapMethod) -> RequestType {
    match method {
        CoapMethod::Get => RequestType::Get,
        CoapMethod::Post => RequestType::Post,
        CoapMethod::Put => RequestType::Put,
        CoapMethod::Delete => RequestType::Delete,
    }
}

fn block2_of(packet: &Packet) -> Option<BlockValue> {
    packet
        .get_option(CoapOption::Block2)
        .and_then(LinkedList::front)
        .map(|value| BlockValue::decode(value))
}

async fn resolve(host: &str, port: u16) -> Result<SocketAddr, TransportError> {
    let mut addrs = lookup_host((host, port))
        .await
        .map_err(|source| TransportError::Resolve {
            host: host.to_string(),
            source,
        })?;
    addrs.next().ok_or_else(|| TransportError::NoAddress(host.to_string()))
}

async fn read_stdin() -> Result<Vec<u8>, TransportError> {
    let mut body = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut body)
        .await
        .map_err(TransportError::Payload)?;
    Ok(body)
}

fn decode_uint(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0, |acc, &b| (acc << 8) | u32::from(b))
}

/// Minimal big-endian encoding; zero is the empty value.
fn encode_uint(value: u32) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count();
    bytes[skip..].to_vec()
}
