//! The session phase machine.

use std::collections::HashMap;
use std::fmt;
use std::net::TcpStream;
use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use super::cursor::{Fetch, ResultCursor, ResultSummary, ServerInfo};
use super::error::{SessionError, SessionResult};
use super::params::{SessionParams, SslMode};
use super::record::{QueryResult, Record};
use super::transport::{BoltConnection, Transport};
use crate::bolt::message::{
    DiscardMessage, FailureMessage, HelloMessage, LogonMessage, PullMessage, RecordMessage, RunMessage,
    SuccessMessage,
};
use crate::bolt::{BoltRequest, BoltResponse, BoltVersion};
use crate::value::{to_packstream_map, Value};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No transport
    Disconnected,
    /// Handshake and authentication in progress
    Connecting,
    /// Idle, a query may be run
    Ready,
    /// A result is open; `pull` or `discard` it
    Streaming,
    /// Needs `reset` or `disconnect`
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Disconnected => "disconnected",
            Phase::Connecting => "connecting",
            Phase::Ready => "ready",
            Phase::Streaming => "streaming",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A single blocking conversation with a Bolt server.
///
/// One query is open at a time. Calls made in the wrong phase fail with
/// [`SessionError::BadCall`] before anything is written to the wire.
///
/// ```no_run
/// use mgbolt::session::{Fetch, Session, SessionParams};
///
/// let mut session = Session::connect(SessionParams::default())?;
/// session.run("MATCH (n) RETURN n", None)?;
/// while let Fetch::Row(row) = session.pull()? {
///     println!("{}", row.values()[0]);
/// }
/// session.disconnect()?;
/// # Ok::<(), mgbolt::session::SessionError>(())
/// ```
pub struct Session<T: Transport = TcpStream> {
    conn: Option<BoltConnection<T>>,
    params: SessionParams,
    phase: Phase,
    version: BoltVersion,
    server: Option<ServerInfo>,
    cursor: Option<ResultCursor>,
    // A PULL whose terminal reply has not arrived yet.
    pulling: bool,
}

impl Session<TcpStream> {
    /// Open a TCP connection to `params.address()` and authenticate.
    pub fn connect(params: SessionParams) -> SessionResult<Self> {
        if params.ssl_mode == SslMode::Require {
            return Err(SessionError::transport(
                "TLS is not available on the built-in TCP transport; supply a secured stream to connect_with",
            ));
        }
        let address = params.address();
        debug!(%address, "connecting");
        let stream = TcpStream::connect(&address)?;
        stream.set_nodelay(true)?;
        Self::connect_with(stream, params)
    }
}

impl<T: Transport> Session<T> {
    /// Handshake and authenticate over an already open stream.
    ///
    /// The stream is shut down if this fails.
    pub fn connect_with(transport: T, params: SessionParams) -> SessionResult<Self> {
        let conn = BoltConnection::handshake(transport, params.max_message_size, params.max_depth)?;
        let version = conn.version();

        let mut session = Self {
            conn: Some(conn),
            params,
            phase: Phase::Connecting,
            version,
            server: None,
            cursor: None,
            pulling: false,
        };

        match session.authenticate() {
            Ok(()) => {
                session.set_phase(Phase::Ready);
                if let Some(server) = &session.server {
                    info!(%version, agent = %server.agent, "session ready");
                }
                Ok(session)
            }
            Err(e) => {
                session.abort();
                Err(e)
            }
        }
    }

    fn authenticate(&mut self) -> SessionResult<()> {
        let token = self.params.auth.to_token();
        let scheme = self.params.auth.scheme();
        let mut hello = HelloMessage::new(&self.params.user_agent);
        if !self.version.supports_logon() {
            hello = hello.with_auth(token.clone());
        }

        let success = self.expect_auth_success(BoltRequest::Hello(hello))?;
        self.server = Some(ServerInfo::from_hello(self.version, &success));

        if self.version.supports_logon() {
            self.expect_auth_success(BoltRequest::Logon(LogonMessage::new(token)))?;
        }
        debug!(scheme, "authenticated");
        Ok(())
    }

    fn expect_auth_success(&mut self, request: BoltRequest) -> SessionResult<SuccessMessage> {
        let name = request.name();
        self.send(request)?;
        match self.recv()? {
            BoltResponse::Success(success) => Ok(success),
            BoltResponse::Failure(failure) => {
                warn!(code = %failure.code, "{} rejected", name);
                Err(SessionError::auth_failed(failure.code, failure.message))
            }
            other => Err(SessionError::protocol(format!(
                "unexpected {} in reply to {}",
                other.name(),
                name
            ))),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Negotiated protocol version.
    pub fn version(&self) -> BoltVersion {
        self.version
    }

    /// Server details from HELLO.
    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.server.as_ref()
    }

    /// The open or last finished result.
    pub fn cursor(&self) -> Option<&ResultCursor> {
        self.cursor.as_ref()
    }

    /// Connection parameters.
    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    /// Submit a query. Returns its column names.
    ///
    /// A server FAILURE comes back as [`SessionError::QueryFailed`] after the
    /// session has sent RESET (ACK_FAILURE on Bolt 1). If that recovery is
    /// refused or the code is fatal, the error is the same but the session
    /// is left in [`Phase::Failed`]; check [`Session::phase`] and call
    /// [`Session::reset`] before the next query.
    pub fn run(&mut self, query: &str, params: Option<HashMap<String, Value>>) -> SessionResult<&[String]> {
        self.run_with_extra(query, params, HashMap::new())
    }

    /// Submit a query with extra RUN metadata such as `db`.
    ///
    /// Bolt 1 has no place for the extra map and drops it.
    pub fn run_with_extra(
        &mut self,
        query: &str,
        params: Option<HashMap<String, Value>>,
        extra: HashMap<String, Value>,
    ) -> SessionResult<&[String]> {
        self.ensure("run", &[Phase::Ready])?;

        let encode = |map: &HashMap<String, Value>| {
            to_packstream_map(map, self.version)
                .map_err(|e| SessionError::bad_call(format!("parameter cannot be sent over Bolt {}: {}", self.version, e)))
        };
        let parameters = match &params {
            Some(params) => encode(params)?,
            None => HashMap::new(),
        };
        let run = RunMessage::new(query)
            .with_parameters(parameters)
            .with_extra(encode(&extra)?);

        self.cursor = None;
        self.send(BoltRequest::Run(run))?;
        match self.recv()? {
            BoltResponse::Success(success) => {
                let cursor = ResultCursor::new(success);
                debug!(columns = cursor.columns().len(), "query accepted");
                self.pulling = false;
                self.set_phase(Phase::Streaming);
                Ok(self.cursor.insert(cursor).columns())
            }
            BoltResponse::Failure(failure) => Err(self.on_failure(failure)),
            BoltResponse::Ignored => Err(self.on_ignored("RUN")),
            BoltResponse::Record(_) => Err(self.fatal(SessionError::protocol("RECORD in reply to RUN"))),
        }
    }

    /// Fetch the next row of the open result.
    ///
    /// [`Fetch::Done`] ends the stream and returns the session to
    /// [`Phase::Ready`]; pulling again before another `run` is a bad call.
    /// Server failures are handled as for [`Session::run`].
    pub fn pull(&mut self) -> SessionResult<Fetch<'_>> {
        self.ensure("pull", &[Phase::Streaming])?;

        if !self.pulling {
            self.send_pull()?;
        }
        let record = loop {
            match self.recv()? {
                BoltResponse::Record(record) => break record,
                BoltResponse::Success(success) => {
                    self.pulling = false;
                    if success.has_more() {
                        trace!("fetching next batch");
                        self.send_pull()?;
                        continue;
                    }
                    self.complete(&success)?;
                    return self.summary().map(Fetch::Done);
                }
                BoltResponse::Failure(failure) => return Err(self.on_failure(failure)),
                BoltResponse::Ignored => return Err(self.on_ignored("PULL")),
            }
        };

        let values = self.decode_row(record)?;
        self.cursor
            .as_mut()
            .map(|cursor| Fetch::Row(cursor.set_row(values)))
            .ok_or_else(|| SessionError::protocol("record without an open result"))
    }

    /// Drop the rest of the open result and return its summary.
    /// Server failures are handled as for [`Session::run`].
    pub fn discard(&mut self) -> SessionResult<&ResultSummary> {
        self.ensure("discard", &[Phase::Streaming])?;
        if let Some(cursor) = self.cursor.as_mut() {
            cursor.clear_row();
        }

        // Records already requested still arrive; skip them.
        while self.pulling {
            match self.recv()? {
                BoltResponse::Record(_) => continue,
                BoltResponse::Success(success) => {
                    self.pulling = false;
                    if !success.has_more() {
                        self.complete(&success)?;
                        return self.summary();
                    }
                }
                BoltResponse::Failure(failure) => return Err(self.on_failure(failure)),
                BoltResponse::Ignored => return Err(self.on_ignored("PULL")),
            }
        }

        self.send(BoltRequest::Discard(DiscardMessage::all()))?;
        loop {
            match self.recv()? {
                BoltResponse::Record(_) => continue,
                BoltResponse::Success(success) => {
                    self.complete(&success)?;
                    return self.summary();
                }
                BoltResponse::Failure(failure) => return Err(self.on_failure(failure)),
                BoltResponse::Ignored => return Err(self.on_ignored("DISCARD")),
            }
        }
    }

    /// Run a query and read it to the end.
    pub fn execute(&mut self, query: &str, params: Option<HashMap<String, Value>>) -> SessionResult<QueryResult> {
        let columns = self.run(query, params)?.to_vec();
        let keys: Arc<[String]> = Arc::from(columns.as_slice());
        let mut records = Vec::new();
        loop {
            match self.pull()? {
                Fetch::Row(row) => records.push(Record::new(Arc::clone(&keys), row.values().to_vec())),
                Fetch::Done(summary) => {
                    return Ok(QueryResult {
                        columns,
                        records,
                        summary: summary.clone(),
                    })
                }
            }
        }
    }

    /// Abandon any open result and clear a failure with RESET.
    pub fn reset(&mut self) -> SessionResult<()> {
        self.ensure("reset", &[Phase::Ready, Phase::Streaming, Phase::Failed])?;
        let outstanding = usize::from(self.pulling) + 1;
        self.cursor = None;
        self.pulling = false;
        self.send(BoltRequest::Reset)?;
        self.await_recovery(outstanding)
    }

    /// Say GOODBYE where supported and release the transport.
    ///
    /// Allowed in every phase and safe to repeat.
    pub fn disconnect(&mut self) -> SessionResult<()> {
        if let Some(mut conn) = self.conn.take() {
            if !conn.is_closed() && self.version.supports_goodbye() {
                if let Err(e) = conn.send(BoltRequest::Goodbye) {
                    debug!(error = %e, "GOODBYE not delivered");
                }
            }
            conn.close();
            info!("session closed");
        }
        self.cursor = None;
        self.pulling = false;
        self.set_phase(Phase::Disconnected);
        Ok(())
    }

    fn ensure(&self, operation: &str, allowed: &[Phase]) -> SessionResult<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(SessionError::bad_call(format!(
                "{} is not allowed while the session is {}",
                operation, self.phase
            )))
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            trace!(from = %self.phase, to = %phase, "phase change");
            self.phase = phase;
        }
    }

    fn send(&mut self, request: BoltRequest) -> SessionResult<()> {
        let result = match self.conn.as_mut() {
            Some(conn) => conn.send(request),
            None => return Err(SessionError::transport("session is not connected")),
        };
        result.map_err(|e| self.fatal(e.into()))
    }

    fn recv(&mut self) -> SessionResult<BoltResponse> {
        let result = match self.conn.as_mut() {
            Some(conn) => conn.recv(),
            None => return Err(SessionError::transport("session is not connected")),
        };
        result.map_err(|e| self.fatal(e.into()))
    }

    fn send_pull(&mut self) -> SessionResult<()> {
        self.send(BoltRequest::Pull(PullMessage::with_n(self.params.fetch_size)))?;
        self.pulling = true;
        Ok(())
    }

    fn decode_row(&mut self, record: RecordMessage) -> SessionResult<Vec<Value>> {
        let expected = self.cursor.as_ref().map_or(0, |c| c.columns().len());
        if record.len() != expected {
            return Err(self.fatal(SessionError::protocol(format!(
                "record has {} values but the result has {} columns",
                record.len(),
                expected
            ))));
        }
        record
            .fields
            .into_iter()
            .map(Value::from_packstream)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| self.fatal(SessionError::protocol(e.to_string())))
    }

    fn complete(&mut self, done: &SuccessMessage) -> SessionResult<()> {
        let summary = match self.cursor.as_ref() {
            Some(cursor) => cursor.summarize(done),
            None => return Err(self.fatal(SessionError::protocol("summary without an open result"))),
        };
        match summary {
            Ok(summary) => {
                if let Some(cursor) = self.cursor.as_mut() {
                    cursor.finish(summary);
                }
                self.set_phase(Phase::Ready);
                Ok(())
            }
            Err(e) => Err(self.fatal(SessionError::protocol(e.to_string()))),
        }
    }

    fn summary(&self) -> SessionResult<&ResultSummary> {
        self.cursor
            .as_ref()
            .and_then(ResultCursor::summary)
            .ok_or_else(|| SessionError::protocol("result finished without a summary"))
    }

    fn on_failure(&mut self, failure: FailureMessage) -> SessionError {
        self.cursor = None;
        self.pulling = false;
        let error = SessionError::query_failed(failure.code.clone(), failure.message.clone());

        if failure.is_fatal() {
            warn!(code = %failure.code, "fatal server failure, reset required");
            self.set_phase(Phase::Failed);
            return error;
        }

        debug!(code = %failure.code, "query failed, recovering");
        let ack = if self.version.is_legacy() {
            BoltRequest::AckFailure
        } else {
            BoltRequest::Reset
        };
        if let Err(e) = self.send(ack).and_then(|()| self.await_recovery(1)) {
            warn!(error = %e, "recovery after failure did not complete");
        }
        error
    }

    fn on_ignored(&mut self, request: &str) -> SessionError {
        self.cursor = None;
        self.pulling = false;
        self.set_phase(Phase::Failed);
        warn!(request, "request ignored by server");
        SessionError::protocol(format!("{} was ignored by the server", request))
    }

    // Reads replies until the last of `outstanding` terminal replies,
    // which answers the RESET or ACK_FAILURE just sent.
    fn await_recovery(&mut self, mut outstanding: usize) -> SessionResult<()> {
        loop {
            let response = self.recv()?;
            if matches!(response, BoltResponse::Record(_)) {
                continue;
            }
            outstanding -= 1;
            if outstanding > 0 {
                continue;
            }
            return match response {
                BoltResponse::Success(_) => {
                    debug!("session recovered");
                    self.set_phase(Phase::Ready);
                    Ok(())
                }
                BoltResponse::Failure(failure) => {
                    self.set_phase(Phase::Failed);
                    Err(SessionError::protocol(format!("reset rejected: {}", failure)))
                }
                _ => {
                    self.set_phase(Phase::Failed);
                    Err(SessionError::protocol("reset was ignored by the server"))
                }
            };
        }
    }

    fn fatal(&mut self, error: SessionError) -> SessionError {
        warn!(error = %error, "session failed");
        if let Some(conn) = self.conn.as_mut() {
            conn.close();
        }
        self.cursor = None;
        self.pulling = false;
        self.set_phase(Phase::Failed);
        error
    }

    fn abort(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            conn.close();
        }
        self.set_phase(Phase::Disconnected);
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        let _ = self.disconnect();
    }
}

impl<T: Transport> fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("address", &self.params.address())
            .field("version", &self.version)
            .field("phase", &self.phase)
            .field("server", &self.server)
            .finish()
    }
}
