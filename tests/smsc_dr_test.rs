use regex::Regex;
use std::io::Cursor;
use tokio::time::{timeout, Duration};

use smsc::bus::EventType;
use smsc::pdu::{Pdu, PduBody};

mod test_utils;

use test_utils::{TestClient, TestSetup};

// submit_sm with registered_delivery=0x01: the submitter wants a receipt
const SUBMIT_SM_WITH_RECEIPT: &[u8] =
    b"\x00\x00\x00\x29\x00\x00\x00\x04\x00\x00\x00\x00\x00\x00\x00\x02\
\0\x00\x00111\0\x00\x00222\0\x00\x00\x00\0\0\x01\x00\x00\x00\x02hi";

async fn submit_and_get_message_id(client: &mut TestClient) -> String {
    client.send(SUBMIT_SM_WITH_RECEIPT).await;
    let resp = client.read_pdu_bytes().await;
    assert_eq!(resp.len(), 0x21);
    String::from_utf8(resp[16..32].to_vec()).unwrap()
}

/// Answer one deliver_sm on this client with ESME_ROK and return the
/// parsed PDU.
async fn ack_deliver_sm(client: &mut TestClient) -> Pdu {
    let bytes = client.read_pdu_bytes().await;
    let pdu = Pdu::parse(&mut Cursor::new(&bytes[..])).unwrap();
    assert_eq!(pdu.command_name(), "deliver_sm");

    let mut resp =
        b"\x00\x00\x00\x11\x80\x00\x00\x05\x00\x00\x00\x00\x00\x00\x00\x00\0"
            .to_vec();
    resp[12..16]
        .copy_from_slice(&pdu.sequence_number.value.to_be_bytes());
    client.send(&resp).await;
    pdu
}

#[tokio::test]
async fn delivered_message_produces_a_delivery_receipt() {
    let t = TestSetup::new().await;
    let mut events = t.server.smsc.event_bus().subscribe();

    let mut client = TestClient::connect_to(&t.server).await.unwrap();
    client.bind_transceiver(1).await;

    let message_id = submit_and_get_message_id(&mut client).await;

    // The submitted event fires first
    let event = events.recv().await.unwrap();
    assert_eq!(event.event_type, EventType::MessageSubmitted);
    assert_eq!(event.message_id, message_id);

    // Upstream turns the message around onto the outgoing queue
    let sms = t.server.smsc.receive_sms().await.unwrap();
    t.server.smsc.send_sms(sms).unwrap();

    // First deliver_sm carries the message itself
    let pdu = ack_deliver_sm(&mut client).await;
    match pdu.body() {
        PduBody::DeliverSm(body) => {
            assert_eq!(body.sm_data().source_addr(), "111");
            assert_eq!(body.sm_data().destination_addr(), "222");
            assert_eq!(body.sm_data().short_message(), b"hi");
            assert_eq!(body.sm_data().esm_class(), 0x00);
        }
        _ => panic!("Expected DeliverSm body"),
    }

    let event = events.recv().await.unwrap();
    assert_eq!(event.event_type, EventType::MessageDelivered);
    assert_eq!(event.message_id, message_id);

    // Second deliver_sm is the receipt: esm_class=0x04, addresses
    // swapped, appendix B text
    let pdu = ack_deliver_sm(&mut client).await;
    match pdu.body() {
        PduBody::DeliverSm(body) => {
            assert_eq!(body.sm_data().esm_class(), 0x04);
            assert_eq!(body.sm_data().source_addr(), "222");
            assert_eq!(body.sm_data().destination_addr(), "111");

            let text = String::from_utf8(
                body.sm_data().short_message().to_vec(),
            )
            .unwrap();
            let expected = format!(
                "^id:{} sub:001 dlvrd:001 submit date:\\d{{10}} \
                done date:\\d{{10}} stat:DELIVRD err:000 text:.{{0,20}}$",
                message_id
            );
            assert!(
                Regex::new(&expected).unwrap().is_match(&text),
                "unexpected receipt text: {}",
                text
            );
        }
        _ => panic!("Expected DeliverSm body"),
    }
}

#[tokio::test]
async fn no_receipt_is_sent_when_none_was_requested() {
    let t = TestSetup::new().await;
    let mut client = TestClient::connect_to(&t.server).await.unwrap();
    client.bind_transceiver(1).await;

    // registered_delivery=0x00
    client
        .send(
            b"\x00\x00\x00\x29\x00\x00\x00\x04\x00\x00\x00\x00\
            \x00\x00\x00\x02\
            \0\x00\x00111\0\x00\x00222\0\x00\x00\x00\0\0\x00\x00\x00\x00\
            \x02hi",
        )
        .await;
    let resp = client.read_pdu_bytes().await;
    assert_eq!(resp.len(), 0x21);

    let sms = t.server.smsc.receive_sms().await.unwrap();
    t.server.smsc.send_sms(sms).unwrap();

    ack_deliver_sm(&mut client).await;

    // No second deliver_sm should arrive
    let no_receipt = timeout(
        Duration::from_millis(1500),
        client.read_n_maybe(1),
    )
    .await;
    assert!(no_receipt.is_err(), "unexpected PDU after delivery");
}

#[tokio::test]
async fn failed_message_produces_an_undeliverable_receipt() {
    let mut config = test_utils::TestServer::config();
    config.max_delivery_retries = 1;
    let t = TestSetup {
        server: test_utils::TestServer::start_with_config(
            config,
            smsc::smsc::AllowAllLogic {},
        )
        .await
        .unwrap(),
    };
    let mut events = t.server.smsc.event_bus().subscribe();

    let mut client = TestClient::connect_to(&t.server).await.unwrap();
    client.bind_transceiver(1).await;

    let message_id = submit_and_get_message_id(&mut client).await;
    assert_eq!(
        events.recv().await.unwrap().event_type,
        EventType::MessageSubmitted
    );

    let sms = t.server.smsc.receive_sms().await.unwrap();
    t.server.smsc.send_sms(sms).unwrap();

    // Refuse the delivery attempt: deliver_sm_resp with ESME_RSYSERR
    let bytes = client.read_pdu_bytes().await;
    let pdu = Pdu::parse(&mut Cursor::new(&bytes[..])).unwrap();
    assert_eq!(pdu.command_name(), "deliver_sm");
    let mut nack =
        b"\x00\x00\x00\x11\x80\x00\x00\x05\x00\x00\x00\x08\x00\x00\x00\x00\0"
            .to_vec();
    nack[12..16]
        .copy_from_slice(&pdu.sequence_number.value.to_be_bytes());
    client.send(&nack).await;

    // With max_delivery_retries=1 the message fails immediately
    let event = events.recv().await.unwrap();
    assert_eq!(event.event_type, EventType::MessageFailed);
    assert_eq!(event.message_id, message_id);
    assert_eq!(
        event.data.get("reason").map(String::as_str),
        Some("No available session to deliver message")
    );

    // The receipt still goes back to the submitter, marked UNDELIV
    let pdu = ack_deliver_sm(&mut client).await;
    match pdu.body() {
        PduBody::DeliverSm(body) => {
            assert_eq!(body.sm_data().esm_class(), 0x04);
            let text = String::from_utf8(
                body.sm_data().short_message().to_vec(),
            )
            .unwrap();
            assert!(text.contains("stat:UNDELIV"), "got: {}", text);
            assert!(text.contains("err:001"), "got: {}", text);
            assert!(text.contains("dlvrd:000"), "got: {}", text);
        }
        _ => panic!("Expected DeliverSm body"),
    }
}
