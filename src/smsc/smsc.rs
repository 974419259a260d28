use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use log::*;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Semaphore, TryAcquireError};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Duration};

use crate::async_result::AsyncResult;
use crate::bus::{EventBus, EventType, SmsEvent, SmsQueue};
use crate::message::{
    decode_short_message, encode_short_message, new_message_id, SmsMessage,
};
use crate::pdu::data::sm_data::SmData;
use crate::pdu::DeliverEsmClass;
use crate::session::{MessageHandler, SessionError, SmppSession};
use crate::smpp_connection::SmppConnection;
use crate::smsc::delivery_report::{
    format_delivery_receipt, PendingDeliveryReport,
};
use crate::smsc::{SmscConfig, SmscLogic, SubmitSmError};

const QUEUE_POLL_TICK: Duration = Duration::from_secs(1);

// deliver_sm defaults when the upstream record carries bare addresses
const TON_INTERNATIONAL: u8 = 0x01;
const NPI_ISDN: u8 = 0x01;

// registered_delivery bit 0: MC delivery receipt requested
const RECEIPT_REQUESTED: u8 = 0x01;

/// Blocking entry point: create a runtime and serve until stopped.
pub fn run<L: SmscLogic + 'static>(
    config: SmscConfig,
    smsc_logic: L,
) -> AsyncResult<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let smsc = Smsc::start(config, smsc_logic).await?;
        smsc.serve_forever().await
    })
}

struct SessionEntry {
    id: String,
    session: Arc<SmppSession>,
}

/// Shared state for the accept loop, the dispatcher and the event
/// consumer.  Also acts as the sessions' submit handler.
struct SmscCore {
    config: SmscConfig,
    logic: Arc<dyn SmscLogic>,
    queue: SmsQueue,
    event_bus: EventBus,
    sessions: Mutex<Vec<SessionEntry>>,
    session_tasks: Mutex<Vec<JoinHandle<()>>>,
    pending_delivery_reports: Mutex<HashMap<String, PendingDeliveryReport>>,
    retry_counts: Mutex<HashMap<String, u32>>,
    stopping: AtomicBool,
}

/// The SMPP server adapter: accepts ESME connections, feeds accepted
/// messages onto the incoming queue, drains the outgoing queue to bound
/// receivers and answers delivery-outcome events with delivery receipts.
pub struct Smsc {
    core: Arc<SmscCore>,
    local_addr: SocketAddr,
    accept_task: Mutex<Option<JoinHandle<()>>>,
    worker_tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Smsc {
    /// Bind the listen socket and spawn the accept loop, the outbound
    /// dispatcher and the event consumer.
    pub async fn start<L: SmscLogic + 'static>(
        config: SmscConfig,
        smsc_logic: L,
    ) -> AsyncResult<Arc<Smsc>> {
        Self::start_with_event_bus(config, smsc_logic, EventBus::new()).await
    }

    /// Like start, but share an externally supplied event bus, so other
    /// adapters and observers can see this server's events.
    pub async fn start_with_event_bus<L: SmscLogic + 'static>(
        config: SmscConfig,
        smsc_logic: L,
        event_bus: EventBus,
    ) -> AsyncResult<Arc<Smsc>> {
        info!("Starting SMSC");
        let listener = TcpListener::bind(&config.bind_address()).await?;
        let local_addr = listener.local_addr()?;
        info!("Bound on {}", local_addr);

        let core = Arc::new(SmscCore {
            config,
            logic: Arc::new(smsc_logic),
            queue: SmsQueue::new(),
            event_bus,
            sessions: Mutex::new(Vec::new()),
            session_tasks: Mutex::new(Vec::new()),
            pending_delivery_reports: Mutex::new(HashMap::new()),
            retry_counts: Mutex::new(HashMap::new()),
            stopping: AtomicBool::new(false),
        });

        let accept = tokio::spawn(listen_loop(listener, Arc::clone(&core)));
        let dispatcher = tokio::spawn(dispatch_loop(Arc::clone(&core)));
        // Subscribe before spawning so no early event can be missed
        let events_rx = core.event_bus.subscribe();
        let events = tokio::spawn(event_loop(Arc::clone(&core), events_rx));

        Ok(Arc::new(Smsc {
            core,
            local_addr,
            accept_task: Mutex::new(Some(accept)),
            worker_tasks: Mutex::new(vec![dispatcher, events]),
        }))
    }

    /// The address the listen socket actually bound to.  Differs from the
    /// configured address when port 0 was requested.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Queue a message for delivery to a bound receiver.
    pub fn send_sms(&self, sms: SmsMessage) -> AsyncResult<()> {
        self.core.queue.send(sms)
    }

    /// Take the next message submitted by an ESME.
    pub async fn receive_sms(&self) -> Option<SmsMessage> {
        self.core.queue.receive().await
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.core.event_bus
    }

    pub fn session_count(&self) -> usize {
        self.core.sessions.lock().unwrap().len()
    }

    /// Run until stop() is called from another task.
    pub async fn serve_forever(&self) -> AsyncResult<()> {
        while !self.core.stopping.load(Ordering::SeqCst) {
            sleep(Duration::from_millis(100)).await;
        }
        Ok(())
    }

    /// Stop accepting, close every session, and wait for all worker
    /// tasks to finish.
    pub async fn stop(&self) {
        info!("Stopping SMSC");
        self.core.stopping.store(true, Ordering::SeqCst);

        if let Some(accept) = self.accept_task.lock().unwrap().take() {
            accept.abort();
        }

        let entries: Vec<SessionEntry> =
            self.core.sessions.lock().unwrap().drain(..).collect();
        for entry in &entries {
            entry.session.close().await;
        }

        let session_tasks: Vec<JoinHandle<()>> =
            self.core.session_tasks.lock().unwrap().drain(..).collect();
        join_all(session_tasks).await;

        // The dispatcher and event consumer notice the stop flag at
        // their next poll tick
        let worker_tasks: Vec<JoinHandle<()>> =
            self.worker_tasks.lock().unwrap().drain(..).collect();
        join_all(worker_tasks).await;
        info!("SMSC stopped");
    }
}

impl SmscCore {
    fn register_session(&self, session: Arc<SmppSession>) {
        let id = String::from(session.id());
        self.sessions
            .lock()
            .unwrap()
            .push(SessionEntry { id, session });
    }

    fn remove_session(&self, id: &str) {
        self.sessions.lock().unwrap().retain(|entry| entry.id != id);
    }

    fn find_session(&self, id: &str) -> Option<Arc<SmppSession>> {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| Arc::clone(&entry.session))
    }

    /// Sessions eligible for deliver_sm, in the order they connected
    fn receiver_sessions(&self) -> Vec<Arc<SmppSession>> {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.session.can_receive())
            .map(|entry| Arc::clone(&entry.session))
            .collect()
    }

    fn track_session_task(&self, handle: JoinHandle<()>) {
        let mut tasks = self.session_tasks.lock().unwrap();
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }

    fn emit_event(&self, event: SmsEvent) {
        self.event_bus.emit(event);
    }

    /// Attempt delivery of one outgoing message: first eligible session
    /// wins.  On repeated failure the message is re-queued up to the
    /// retry limit, then failed.
    async fn dispatch_message(&self, mut sms: SmsMessage) {
        let (message, data_coding) = encode_short_message(&sms.message);

        let mut delivered = false;
        for session in self.receiver_sessions() {
            if session
                .deliver_message(
                    &sms.sender,
                    &sms.recipient,
                    &message,
                    data_coding.into(),
                    TON_INTERNATIONAL,
                    NPI_ISDN,
                    TON_INTERNATIONAL,
                    NPI_ISDN,
                    DeliverEsmClass::Default.into(),
                )
                .await
            {
                delivered = true;
                break;
            }
        }

        if delivered {
            sms.delivered_time = Some(Utc::now());
            self.retry_counts.lock().unwrap().remove(&sms.message_id);
            info!(
                "Delivered message {} to {}",
                sms.message_id, sms.recipient
            );
            self.emit_event(
                SmsEvent::new(EventType::MessageDelivered, &sms.message_id)
                    .with_data("destination", &sms.recipient),
            );
            return;
        }

        let attempts = {
            let mut counts = self.retry_counts.lock().unwrap();
            let count = counts.entry(sms.message_id.clone()).or_insert(0);
            *count += 1;
            *count
        };

        if attempts < self.config.max_delivery_retries {
            warn!(
                "No session delivered message {} (attempt {}); requeueing",
                sms.message_id, attempts
            );
            let message_id = sms.message_id.clone();
            if let Err(e) = self.queue.send(sms) {
                error!("Could not requeue message {}: {}", message_id, e);
            }
            sleep(Duration::from_secs(self.config.retry_backoff)).await;
        } else {
            warn!(
                "Giving up on message {} after {} attempts",
                sms.message_id, attempts
            );
            self.retry_counts.lock().unwrap().remove(&sms.message_id);
            self.emit_event(
                SmsEvent::new(EventType::MessageFailed, &sms.message_id)
                    .with_data(
                        "reason",
                        "No available session to deliver message",
                    ),
            );
        }
    }

    /// Turn a terminal delivery event into a deliver_sm carrying the
    /// receipt text, sent on the session that submitted the message.
    /// Receipts are best-effort: any failure is logged and dropped.
    async fn send_delivery_receipt(&self, event: &SmsEvent) {
        let report = {
            let mut reports = self.pending_delivery_reports.lock().unwrap();
            let now = Utc::now();
            reports.retain(|message_id, report| {
                if report.is_expired(now) {
                    debug!(
                        "Expiring pending delivery report for message {}",
                        message_id
                    );
                    false
                } else {
                    true
                }
            });
            reports.remove(&event.message_id)
        };

        let report = match report {
            Some(report) => report,
            None => return,
        };

        let delivered =
            event.event_type == EventType::MessageDelivered;
        let text = format_delivery_receipt(
            &event.message_id,
            report.submit_time,
            Utc::now(),
            delivered,
            &report.message_text,
        );

        let session = match self.find_session(&report.session_id) {
            Some(session) => session,
            None => {
                warn!(
                    "Dropping delivery receipt for message {}: \
                    session {} is gone",
                    event.message_id, report.session_id
                );
                return;
            }
        };

        // The receipt travels back to the submitter, so source and
        // destination (and their TON/NPI) swap
        let ok = session
            .deliver_message(
                &report.destination,
                &report.source,
                text.as_bytes(),
                crate::pdu::DataCoding::Default.into(),
                report.dest_ton,
                report.dest_npi,
                report.source_ton,
                report.source_npi,
                DeliverEsmClass::SmscDeliveryReceipt.into(),
            )
            .await;
        if !ok {
            warn!(
                "Dropping delivery receipt for message {}: \
                session {} did not accept it",
                event.message_id, report.session_id
            );
        }
    }
}

#[async_trait]
impl MessageHandler for SmscCore {
    async fn on_message(
        &self,
        session_id: &str,
        sm: &SmData,
    ) -> Result<String, SubmitSmError> {
        let message_id = new_message_id();
        let text =
            decode_short_message(sm.short_message(), sm.data_coding());

        if sm.registered_delivery() & RECEIPT_REQUESTED != 0 {
            self.pending_delivery_reports.lock().unwrap().insert(
                message_id.clone(),
                PendingDeliveryReport {
                    session_id: String::from(session_id),
                    source: String::from(sm.source_addr()),
                    destination: String::from(sm.destination_addr()),
                    source_ton: sm.source_addr_ton(),
                    source_npi: sm.source_addr_npi(),
                    dest_ton: sm.dest_addr_ton(),
                    dest_npi: sm.dest_addr_npi(),
                    submit_time: Utc::now(),
                    message_text: text.clone(),
                },
            );
        }

        let sms = SmsMessage {
            message_id: message_id.clone(),
            sender: String::from(sm.source_addr()),
            recipient: String::from(sm.destination_addr()),
            message: text,
            sent_time: Utc::now(),
            delivered_time: None,
        };
        self.queue
            .push_incoming(sms)
            .map_err(|_| SubmitSmError::InternalError)?;

        self.emit_event(
            SmsEvent::new(EventType::MessageSubmitted, &message_id)
                .with_data("source", sm.source_addr())
                .with_data("destination", sm.destination_addr()),
        );

        Ok(message_id)
    }
}

/// Listen for clients connecting, and spawn a new task every time one does
async fn listen_loop(listener: TcpListener, core: Arc<SmscCore>) {
    let sem = Arc::new(Semaphore::new(core.config.max_open_sockets));
    loop {
        match listener.accept().await {
            Err(e) => {
                error!("Client connection failed: {}", e);
            }
            Ok((tcp_stream, socket_addr)) => {
                let handle = tokio::spawn(process_stream(
                    Arc::clone(&sem),
                    tcp_stream,
                    socket_addr,
                    Arc::clone(&core),
                ));
                core.track_session_task(handle);
            }
        }
    }
}

async fn process_stream(
    sem: Arc<Semaphore>,
    tcp_stream: TcpStream,
    socket_addr: SocketAddr,
    core: Arc<SmscCore>,
) {
    let aqu = sem.try_acquire();
    match aqu {
        Ok(_guard) => {
            info!("Connection {} - opened", socket_addr);
            let connection = SmppConnection::new(tcp_stream, socket_addr);
            let result = process(connection, core).await;
            log_result(result, socket_addr);
        }
        Err(TryAcquireError::NoPermits) => {
            error!(
                "Refused connection {} - too many open sockets",
                socket_addr
            );
        }
        Err(TryAcquireError::Closed) => {
            error!("Unexpected error: semaphore closed");
        }
    }
}

async fn process(
    connection: SmppConnection,
    core: Arc<SmscCore>,
) -> Result<bool, SessionError> {
    let session = SmppSession::new(
        connection,
        &core.config.system_id,
        Duration::from_secs(core.config.enquire_link_timeout),
        Duration::from_secs(core.config.response_timeout),
        Arc::clone(&core.logic),
        Arc::clone(&core) as Arc<dyn MessageHandler>,
    );
    let id = String::from(session.id());
    core.register_session(Arc::clone(&session));

    let result = session.run().await;
    core.remove_session(&id);
    result
}

fn log_result(closed_by_us: Result<bool, SessionError>, addr: SocketAddr) {
    match closed_by_us {
        Ok(true) => {
            info!("Connection {} - closed by us", addr)
        }
        Ok(false) => info!(
            "Connection {} - closed since client closed the socket",
            addr
        ),
        Err(e) => {
            error!("Connection {} - closed due to error: {}", addr, e)
        }
    }
}

/// Drain the outgoing queue, polling with a short tick so shutdown is
/// observable
async fn dispatch_loop(core: Arc<SmscCore>) {
    loop {
        if core.stopping.load(Ordering::SeqCst) {
            break;
        }
        let sms = match core.queue.poll_outgoing(QUEUE_POLL_TICK).await {
            Some(sms) => sms,
            None => continue,
        };
        core.dispatch_message(sms).await;
    }
    debug!("Dispatcher stopped");
}

/// Watch the event bus and convert terminal delivery events into DLRs
async fn event_loop(
    core: Arc<SmscCore>,
    mut events: tokio::sync::mpsc::UnboundedReceiver<SmsEvent>,
) {
    loop {
        if core.stopping.load(Ordering::SeqCst) {
            break;
        }
        let event = match timeout(QUEUE_POLL_TICK, events.recv()).await {
            Err(_) => continue,
            Ok(None) => break,
            Ok(Some(event)) => event,
        };
        match event.event_type {
            EventType::MessageDelivered | EventType::MessageFailed => {
                core.send_delivery_receipt(&event).await
            }
            _ => {}
        }
    }
    debug!("Event consumer stopped");
}
