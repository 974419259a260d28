use async_trait::async_trait;
use core::fmt::{Display, Formatter};
use log::*;
use std::collections::HashMap;
use std::error;
use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Duration};

use crate::pdu::data::bind_data::BindData;
use crate::pdu::data::sm_data::SmData;
use crate::pdu::{
    BindReceiverRespPdu, BindTransceiverRespPdu, BindTransmitterRespPdu,
    DeliverSmPdu, EnquireLinkPdu, EnquireLinkRespPdu, GenericNackPdu, Pdu,
    PduBody, PduParseError, PduStatus, SubmitSmRespPdu, UnbindRespPdu,
};
use crate::smpp_connection::{ReadError, SmppConnection};
use crate::smsc::{SmscLogic, SubmitSmError};

/// https://smpp.org/SMPP_v3_4_Issue1_2.pdf section 2.2
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionState {
    Open,
    BoundTx,
    BoundRx,
    BoundTrx,
    Unbound,
    Closed,
}

/// The capability invoked when a submit_sm is accepted.  Returns the
/// message id to echo in the submit_sm_resp.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn on_message(
        &self,
        session_id: &str,
        sm: &SmData,
    ) -> Result<String, SubmitSmError>;
}

#[derive(Debug)]
pub enum SessionError {
    Frame(String),
    Io(io::Error),
}

impl From<io::Error> for SessionError {
    fn from(e: io::Error) -> Self {
        SessionError::Io(e)
    }
}

impl Display for SessionError {
    fn fmt(
        &self,
        formatter: &mut Formatter,
    ) -> std::result::Result<(), std::fmt::Error> {
        match self {
            SessionError::Frame(message) => formatter.write_str(message),
            SessionError::Io(e) => e.fmt(formatter),
        }
    }
}

impl error::Error for SessionError {}

enum Flow {
    Continue,
    Close,
}

enum ResponseError {
    Timeout,
    Cancelled,
}

/// One bound (or binding) ESME session.  Owns the connection; tracks the
/// bind state, the outbound sequence counter and the responses we are
/// waiting for.  The read loop runs on exactly one task; deliver_message
/// may be called concurrently from the server's dispatcher.
pub struct SmppSession {
    connection: Arc<SmppConnection>,
    system_id: String,
    enquire_link_timeout: Duration,
    response_timeout: Duration,
    logic: Arc<dyn SmscLogic>,
    handler: Arc<dyn MessageHandler>,
    state: Mutex<SessionState>,
    client_system_id: Mutex<String>,
    sequence: AtomicU32,
    pending_responses: Mutex<HashMap<u32, oneshot::Sender<Pdu>>>,
    keepalive: Mutex<Option<JoinHandle<()>>>,
}

impl SmppSession {
    pub fn new(
        connection: SmppConnection,
        system_id: &str,
        enquire_link_timeout: Duration,
        response_timeout: Duration,
        logic: Arc<dyn SmscLogic>,
        handler: Arc<dyn MessageHandler>,
    ) -> Arc<Self> {
        Arc::new(Self {
            connection: Arc::new(connection),
            system_id: String::from(system_id),
            enquire_link_timeout,
            response_timeout,
            logic,
            handler,
            state: Mutex::new(SessionState::Open),
            client_system_id: Mutex::new(String::new()),
            sequence: AtomicU32::new(0),
            pending_responses: Mutex::new(HashMap::new()),
            keepalive: Mutex::new(None),
        })
    }

    pub fn id(&self) -> &str {
        &self.connection.id
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap()
    }

    fn set_state(&self, state: SessionState) {
        *self.state.lock().unwrap() = state;
    }

    pub fn client_system_id(&self) -> String {
        self.client_system_id.lock().unwrap().clone()
    }

    pub fn is_bound(&self) -> bool {
        matches!(
            self.state(),
            SessionState::BoundTx
                | SessionState::BoundRx
                | SessionState::BoundTrx
        )
    }

    /// Eligible to receive deliver_sm from us
    pub fn can_receive(&self) -> bool {
        matches!(
            self.state(),
            SessionState::BoundRx | SessionState::BoundTrx
        )
    }

    /// Allowed to send submit_sm to us
    pub fn can_transmit(&self) -> bool {
        matches!(
            self.state(),
            SessionState::BoundTx | SessionState::BoundTrx
        )
    }

    fn next_sequence(&self) -> u32 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Run the session to completion: spawn the keepalive task, then read
    /// and handle PDUs until the session ends.  Returns true if we closed
    /// the connection, false if the peer did.
    pub async fn run(self: &Arc<Self>) -> Result<bool, SessionError> {
        info!("Session {} - started", self.id());
        let keepalive = tokio::spawn(keepalive_loop(Arc::clone(self)));
        *self.keepalive.lock().unwrap() = Some(keepalive);

        let result = self.read_loop().await;
        self.teardown().await;
        result
    }

    async fn read_loop(&self) -> Result<bool, SessionError> {
        loop {
            match self.connection.read_pdu().await {
                Ok(Some(pdu)) => match self.handle_pdu(pdu).await? {
                    Flow::Continue => {}
                    Flow::Close => return Ok(true),
                },
                Ok(None) => {
                    // Clean end of stream, ours or theirs
                    return Ok(self.connection.is_closed());
                }
                Err(ReadError::MalformedPdu(e)) => {
                    // One whole frame was consumed, so the stream is
                    // still synchronised: nack it and carry on
                    warn!("Session {} - bad PDU: {}", self.id(), e);
                    self.send_generic_nack(&e).await?;
                }
                Err(e) => {
                    return Err(SessionError::Frame(e.to_string()));
                }
            }
        }
    }

    async fn send_generic_nack(
        &self,
        error: &PduParseError,
    ) -> Result<(), SessionError> {
        let sequence_number = error.sequence_number.unwrap_or(0);
        let nack = Pdu::new(
            error.status(),
            sequence_number,
            GenericNackPdu::new_error().into(),
        )
        .unwrap();
        self.send_pdu(&nack).await?;
        Ok(())
    }

    async fn handle_pdu(&self, pdu: Pdu) -> Result<Flow, SessionError> {
        debug!(
            "Session {} - received {} (sequence_number={})",
            self.id(),
            pdu.command_name(),
            pdu.sequence_number.value
        );

        // A PDU whose sequence matches a request we issued completes that
        // request and is not dispatched any further
        let pending =
            self.take_pending_response(pdu.sequence_number.value);
        if let Some(tx) = pending {
            let _ = tx.send(pdu);
            return Ok(Flow::Continue);
        }

        let sequence_number = pdu.sequence_number.value;
        match pdu.body() {
            PduBody::BindReceiver(body) => {
                self.handle_bind(
                    sequence_number,
                    body.bind_data(),
                    SessionState::BoundRx,
                )
                .await
            }
            PduBody::BindTransmitter(body) => {
                self.handle_bind(
                    sequence_number,
                    body.bind_data(),
                    SessionState::BoundTx,
                )
                .await
            }
            PduBody::BindTransceiver(body) => {
                self.handle_bind(
                    sequence_number,
                    body.bind_data(),
                    SessionState::BoundTrx,
                )
                .await
            }
            PduBody::Unbind(_body) => {
                self.set_state(SessionState::Unbound);
                self.send_response(
                    PduStatus::ESME_ROK,
                    sequence_number,
                    UnbindRespPdu::new().into(),
                )
                .await?;
                info!("Session {} - unbound", self.id());
                Ok(Flow::Close)
            }
            PduBody::EnquireLink(_body) => {
                // Valid in any state, bound or not
                self.send_response(
                    PduStatus::ESME_ROK,
                    sequence_number,
                    EnquireLinkRespPdu::new().into(),
                )
                .await?;
                Ok(Flow::Continue)
            }
            PduBody::SubmitSm(body) => {
                self.handle_submit_sm(sequence_number, body.sm_data())
                    .await
            }
            PduBody::GenericNack(_body) => {
                warn!(
                    "Session {} - peer sent generic_nack \
                    (sequence_number={})",
                    self.id(),
                    sequence_number
                );
                Ok(Flow::Continue)
            }
            PduBody::BindReceiverResp(_)
            | PduBody::BindTransmitterResp(_)
            | PduBody::BindTransceiverResp(_)
            | PduBody::UnbindResp(_)
            | PduBody::EnquireLinkResp(_)
            | PduBody::SubmitSmResp(_)
            | PduBody::DeliverSmResp(_) => {
                // A response we were not waiting for
                debug!(
                    "Session {} - unexpected {} ignored",
                    self.id(),
                    pdu.command_name()
                );
                Ok(Flow::Continue)
            }
            PduBody::DeliverSm(_body) => {
                // Only the SMSC originates deliver_sm
                warn!(
                    "Session {} - peer sent deliver_sm",
                    self.id()
                );
                self.send_response(
                    PduStatus::ESME_RINVCMDID,
                    sequence_number,
                    GenericNackPdu::new_error().into(),
                )
                .await?;
                Ok(Flow::Continue)
            }
        }
    }

    async fn handle_bind(
        &self,
        sequence_number: u32,
        bind_data: &BindData,
        bound_state: SessionState,
    ) -> Result<Flow, SessionError> {
        let resp_body = |system_id: &str| -> PduBody {
            match bound_state {
                SessionState::BoundRx => {
                    BindReceiverRespPdu::new(system_id).into()
                }
                SessionState::BoundTx => {
                    BindTransmitterRespPdu::new(system_id).into()
                }
                _ => BindTransceiverRespPdu::new(system_id).into(),
            }
        };

        if self.state() != SessionState::Open {
            self.send_response(
                PduStatus::ESME_RALYBND,
                sequence_number,
                resp_body(&self.system_id),
            )
            .await?;
            return Ok(Flow::Continue);
        }

        let client_system_id = bind_data.system_id();
        let status = match self.logic.bind(bind_data).await {
            Ok(()) => {
                self.set_state(bound_state);
                *self.client_system_id.lock().unwrap() =
                    String::from(client_system_id);
                info!(
                    "Session {} - bound as {:?} ({})",
                    self.id(),
                    bound_state,
                    client_system_id
                );
                PduStatus::ESME_ROK
            }
            Err(e) => {
                info!(
                    "Session {} - bind refused ({})",
                    self.id(),
                    client_system_id
                );
                e.into()
            }
        };

        self.send_response(
            status,
            sequence_number,
            resp_body(&self.system_id),
        )
        .await?;
        Ok(Flow::Continue)
    }

    async fn handle_submit_sm(
        &self,
        sequence_number: u32,
        sm: &SmData,
    ) -> Result<Flow, SessionError> {
        if !self.can_transmit() {
            self.send_response(
                PduStatus::ESME_RINVBNDSTS,
                sequence_number,
                SubmitSmRespPdu::new_error().into(),
            )
            .await?;
            return Ok(Flow::Continue);
        }

        match self.handler.on_message(self.id(), sm).await {
            Ok(message_id) => {
                self.send_response(
                    PduStatus::ESME_ROK,
                    sequence_number,
                    SubmitSmRespPdu::new(&message_id).into(),
                )
                .await
            }
            Err(e) => {
                error!("Session {} - submit handler failed", self.id());
                self.send_response(
                    e.into(),
                    sequence_number,
                    SubmitSmRespPdu::new_error().into(),
                )
                .await
            }
        }
        .map(|_| Flow::Continue)
    }

    /// Send a deliver_sm carrying `message` and wait for the matching
    /// deliver_sm_resp.  Returns true only if the peer acknowledged with
    /// ESME_ROK within the response timeout.
    pub async fn deliver_message(
        &self,
        source: &str,
        destination: &str,
        message: &[u8],
        data_coding: u8,
        source_ton: u8,
        source_npi: u8,
        dest_ton: u8,
        dest_npi: u8,
        esm_class: u8,
    ) -> bool {
        if !self.can_receive() {
            warn!(
                "Session {} - cannot deliver: not bound for receiving",
                self.id()
            );
            return false;
        }

        let body = match DeliverSmPdu::new(
            "",
            source_ton,
            source_npi,
            source,
            dest_ton,
            dest_npi,
            destination,
            esm_class,
            0x00,
            0x00,
            "",
            "",
            0x00,
            0x00,
            data_coding,
            0x00,
            message,
        ) {
            Ok(body) => body,
            Err(e) => {
                warn!(
                    "Session {} - could not build deliver_sm: {}",
                    self.id(),
                    e
                );
                return false;
            }
        };

        let sequence_number = self.next_sequence();
        let pdu = Pdu::new(
            PduStatus::ESME_ROK as u32,
            sequence_number,
            body.into(),
        )
        .unwrap();

        match self.send_and_wait(pdu).await {
            Ok(response) => {
                matches!(response.body(), PduBody::DeliverSmResp(_))
                    && response.command_status()
                        == PduStatus::ESME_ROK as u32
            }
            Err(ResponseError::Timeout) => {
                warn!("Session {} - deliver timeout", self.id());
                false
            }
            Err(ResponseError::Cancelled) => false,
        }
    }

    async fn send_response(
        &self,
        status: PduStatus,
        sequence_number: u32,
        body: PduBody,
    ) -> Result<(), SessionError> {
        let pdu = Pdu::new(status as u32, sequence_number, body).unwrap();
        self.send_pdu(&pdu).await
    }

    async fn send_pdu(&self, pdu: &Pdu) -> Result<(), SessionError> {
        debug!(
            "Session {} - sending {} (sequence_number={})",
            self.id(),
            pdu.command_name(),
            pdu.sequence_number.value
        );
        self.connection.write_pdu(pdu).await.map_err(|e| e.into())
    }

    /// Send a request and wait for the response with the same sequence
    /// number, up to the response timeout.
    async fn send_and_wait(&self, pdu: Pdu) -> Result<Pdu, ResponseError> {
        let sequence_number = pdu.sequence_number.value;
        let (tx, rx) = oneshot::channel();
        self.pending_responses
            .lock()
            .unwrap()
            .insert(sequence_number, tx);

        if self.send_pdu(&pdu).await.is_err() {
            self.take_pending_response(sequence_number);
            return Err(ResponseError::Cancelled);
        }

        match timeout(self.response_timeout, rx).await {
            Ok(Ok(response)) => Ok(response),
            // Sender dropped: the session is being torn down
            Ok(Err(_)) => Err(ResponseError::Cancelled),
            Err(_) => {
                self.take_pending_response(sequence_number);
                Err(ResponseError::Timeout)
            }
        }
    }

    fn take_pending_response(
        &self,
        sequence_number: u32,
    ) -> Option<oneshot::Sender<Pdu>> {
        self.pending_responses
            .lock()
            .unwrap()
            .remove(&sequence_number)
    }

    /// Close the session from outside its read loop (server shutdown).
    pub async fn close(&self) {
        self.set_state(SessionState::Closed);
        self.connection.close().await;
    }

    async fn teardown(&self) {
        self.set_state(SessionState::Closed);
        if let Some(keepalive) = self.keepalive.lock().unwrap().take() {
            keepalive.abort();
        }
        // Dropping the senders completes every in-flight request with
        // a cancellation
        self.pending_responses.lock().unwrap().clear();
        self.connection.close().await;
        info!("Session {} - closed", self.id());
    }
}

/// Periodically confirm an idle bound session is still alive.  If the peer
/// fails to answer an enquire_link within the response timeout, the
/// connection is closed, which ends the session's read loop.
async fn keepalive_loop(session: Arc<SmppSession>) {
    loop {
        sleep(session.enquire_link_timeout).await;
        match session.state() {
            SessionState::Closed | SessionState::Unbound => break,
            _ => {}
        }
        if !session.is_bound() {
            continue;
        }
        if session.connection.idle_time() < session.enquire_link_timeout {
            continue;
        }

        debug!("Session {} - sending enquire_link", session.id());
        let pdu = Pdu::new(
            PduStatus::ESME_ROK as u32,
            session.next_sequence(),
            EnquireLinkPdu::new().into(),
        )
        .unwrap();
        match session.send_and_wait(pdu).await {
            Ok(_) => session.connection.touch(),
            Err(_) => {
                warn!(
                    "Session {} - keepalive timed out, closing",
                    session.id()
                );
                session.connection.close().await;
                break;
            }
        }
    }
}
