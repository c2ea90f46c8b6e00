//! RPC envelope layer: multiplexes requests and responses by session id.
//!
//! Every packet is a packed concatenation of a package envelope record and an
//! optional body. An envelope with a `type` field is a request for that
//! protocol tag; an envelope without one is a response resolved against the
//! outstanding-session table.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::codec;
use crate::error::RpcError;
use crate::pack;
use crate::schema::Schema;
use crate::value::Value;

/// Conventional name of the envelope type in a schema.
pub const DEFAULT_PACKAGE: &str = "package";

/// What a live session is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    /// A response body of the given type index.
    Type(usize),
    /// A bodyless acknowledgment.
    Confirm,
}

type SessionTable = Arc<Mutex<HashMap<i64, Pending>>>;

/// One end of an RPC conversation.
///
/// The catalogue is immutable and shared; the session table is the only
/// mutable state and is serialised behind a mutex, so `send` and `dispatch`
/// take `&self`.
pub struct Host {
    schema: Arc<Schema>,
    package: usize,
    sessions: SessionTable,
}

impl Host {
    /// Create a host whose envelope is the schema type named `package_name`.
    pub fn new(schema: Arc<Schema>, package_name: &str) -> Result<Self, RpcError> {
        let package = schema
            .type_index(package_name)
            .ok_or_else(|| RpcError::MissingPackageType(package_name.to_string()))?;
        Ok(Host {
            schema,
            package,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Create a host using the conventional "package" envelope type.
    pub fn with_default_package(schema: Arc<Schema>) -> Result<Self, RpcError> {
        Host::new(schema, DEFAULT_PACKAGE)
    }

    /// Create a sender targeting a peer that speaks `remote`. The sender
    /// shares this host's session table: responses to its requests resolve
    /// at this host's `dispatch`.
    pub fn attach(&self, remote: Arc<Schema>) -> Sender {
        Sender {
            local: self.schema.clone(),
            remote,
            package: self.package,
            sessions: self.sessions.clone(),
        }
    }

    /// Send a request to a peer speaking the same schema as this host.
    pub fn send(
        &self,
        proto_name: &str,
        args: Option<&Value>,
        session: i64,
    ) -> Result<Vec<u8>, RpcError> {
        send_request(
            &self.schema,
            &self.schema,
            self.package,
            &self.sessions,
            proto_name,
            args,
            session,
        )
    }

    /// Classify and decode an incoming packet.
    pub fn dispatch(&self, packet: &[u8]) -> Result<Dispatch, RpcError> {
        let bytes = pack::unpack(packet)?;
        let package_ty = &self.schema.types[self.package];
        let (envelope, consumed) = codec::decode_prefix(&self.schema, package_ty, &bytes)?;
        let payload = &bytes[consumed..];

        let proto_tag = envelope.get("type").and_then(Value::as_integer);
        let session = envelope.get("session").and_then(Value::as_integer);

        match proto_tag {
            Some(tag) => self.dispatch_request(tag, session, payload),
            None => self.dispatch_response(session, payload),
        }
    }

    fn dispatch_request(
        &self,
        tag: i64,
        session: Option<i64>,
        payload: &[u8],
    ) -> Result<Dispatch, RpcError> {
        let proto = u16::try_from(tag)
            .ok()
            .and_then(|t| self.schema.protocol_by_tag(t))
            .ok_or(RpcError::UnknownProtocolTag(tag))?;

        let message = match proto.request {
            Some(idx) if !payload.is_empty() => Some(codec::decode(
                &self.schema,
                &self.schema.types[idx],
                payload,
            )?),
            Some(_) => Some(Value::empty_struct()),
            None => None,
        };

        let responder = session.map(|session| Responder {
            schema: self.schema.clone(),
            package: self.package,
            response: proto.response,
            session,
        });

        Ok(Dispatch::Request {
            name: proto.name.clone(),
            message,
            session,
            responder,
        })
    }

    fn dispatch_response(
        &self,
        session: Option<i64>,
        payload: &[u8],
    ) -> Result<Dispatch, RpcError> {
        let session =
            session.ok_or_else(|| RpcError::BadEnvelope("response without session".into()))?;
        let pending = self
            .sessions
            .lock()
            .remove(&session)
            .ok_or(RpcError::UnknownSession(session))?;

        let message = match pending {
            Pending::Confirm => None,
            Pending::Type(idx) if !payload.is_empty() => Some(codec::decode(
                &self.schema,
                &self.schema.types[idx],
                payload,
            )?),
            Pending::Type(_) => None,
        };

        Ok(Dispatch::Response { session, message })
    }
}

/// A request sender bound to a (possibly remote) schema, created by
/// [`Host::attach`].
pub struct Sender {
    local: Arc<Schema>,
    remote: Arc<Schema>,
    package: usize,
    sessions: SessionTable,
}

impl Sender {
    /// Build a packed request packet for `proto_name`. A non-zero `session`
    /// registers the protocol's response expectation in the originating
    /// host's session table.
    pub fn send(
        &self,
        proto_name: &str,
        args: Option<&Value>,
        session: i64,
    ) -> Result<Vec<u8>, RpcError> {
        send_request(
            &self.local,
            &self.remote,
            self.package,
            &self.sessions,
            proto_name,
            args,
            session,
        )
    }
}

fn send_request(
    local: &Schema,
    remote: &Schema,
    package: usize,
    sessions: &SessionTable,
    proto_name: &str,
    args: Option<&Value>,
    session: i64,
) -> Result<Vec<u8>, RpcError> {
    let proto = remote
        .protocol_by_name(proto_name)
        .ok_or_else(|| RpcError::UnknownProtocol(proto_name.to_string()))?;

    let mut envelope = vec![("type", Value::Integer(i64::from(proto.tag)))];
    if session != 0 {
        envelope.push(("session", Value::Integer(session)));
    }
    let package_ty = &local.types[package];
    let mut bytes = codec::encode(local, package_ty, &Value::record(envelope))?;

    if let (Some(args), Some(idx)) = (args, proto.request) {
        bytes.extend(codec::encode(remote, &remote.types[idx], args)?);
    }

    if session != 0 {
        if let Some(idx) = proto.response {
            sessions.lock().insert(session, Pending::Type(idx));
        } else if proto.confirm {
            sessions.lock().insert(session, Pending::Confirm);
        }
        // a protocol with neither response nor confirm leaves no entry
    }

    Ok(pack::pack(&bytes))
}

/// Result of [`Host::dispatch`].
#[derive(Debug)]
pub enum Dispatch {
    /// An incoming request.
    Request {
        /// Protocol name.
        name: String,
        /// Decoded request body; `None` when the protocol has no request type.
        message: Option<Value>,
        /// Session id the peer attached, if any.
        session: Option<i64>,
        /// Builds the reply packet; present iff the request carried a session.
        responder: Option<Responder>,
    },
    /// A response matching an outstanding session. The session entry has
    /// been removed.
    Response {
        session: i64,
        /// Decoded response body; `None` for confirm-only protocols or empty
        /// payloads.
        message: Option<Value>,
    },
}

/// Encodes the reply to a dispatched request.
#[derive(Debug)]
pub struct Responder {
    schema: Arc<Schema>,
    package: usize,
    response: Option<usize>,
    session: i64,
}

impl Responder {
    pub fn session(&self) -> i64 {
        self.session
    }

    /// Build a packed response packet: an envelope carrying only the session,
    /// plus the encoded body when the protocol declares a response type.
    pub fn respond(&self, args: Option<&Value>) -> Result<Vec<u8>, RpcError> {
        let package_ty = &self.schema.types[self.package];
        let envelope = Value::record([("session", Value::Integer(self.session))]);
        let mut bytes = codec::encode(&self.schema, package_ty, &envelope)?;

        if let (Some(args), Some(idx)) = (args, self.response) {
            bytes.extend(codec::encode(&self.schema, &self.schema.types[idx], args)?);
        }

        Ok(pack::pack(&bytes))
    }
}
