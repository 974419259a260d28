mod test_utils;

use test_utils::{bytes_as_string, TestClient, TestSetup};

// submit_sm: source=111, dest=222, short_message="hi"
const SUBMIT_SM_SEQ_2: &[u8] =
    b"\x00\x00\x00\x29\x00\x00\x00\x04\x00\x00\x00\x00\x00\x00\x00\x02\
\0\x00\x00111\0\x00\x00222\0\x00\x00\x00\0\0\x00\x00\x00\x00\x02hi";

#[tokio::test]
async fn submitted_message_is_acknowledged_and_queued() {
    let t = TestSetup::new().await;
    let mut client = TestClient::connect_to(&t.server).await.unwrap();
    client.bind_transmitter(1).await;

    client.send(SUBMIT_SM_SEQ_2).await;

    // submit_sm_resp: ESME_ROK, echoed sequence, 16-char message id
    let resp = client.read_pdu_bytes().await;
    assert_eq!(resp.len(), 0x21);
    assert_eq!(
        bytes_as_string(&resp[..16]),
        bytes_as_string(
            b"\x00\x00\x00\x21\x80\x00\x00\x04\x00\x00\x00\x00\
            \x00\x00\x00\x02"
        )
    );
    let message_id = &resp[16..32];
    assert!(message_id.iter().all(|b| b.is_ascii_hexdigit()));
    assert_eq!(resp[32], 0);

    // The business record lands on the incoming queue
    let sms = t.server.smsc.receive_sms().await.unwrap();
    assert_eq!(sms.sender, "111");
    assert_eq!(sms.recipient, "222");
    assert_eq!(sms.message, "hi");
    assert_eq!(
        sms.message_id.as_bytes(),
        message_id,
        "submit_sm_resp must carry the queued message's id"
    );

    // unbind cleanly
    client
        .send(
            b"\x00\x00\x00\x10\x00\x00\x00\x06\x00\x00\x00\x00\
            \x00\x00\x00\x03",
        )
        .await;
    let resp = client.read_n(0x10).await;
    assert_eq!(
        bytes_as_string(&resp),
        bytes_as_string(
            b"\x00\x00\x00\x10\x80\x00\x00\x06\x00\x00\x00\x00\
            \x00\x00\x00\x03"
        )
    );
}

#[tokio::test]
async fn submit_on_a_receiver_session_is_rejected() {
    let t = TestSetup::new().await;
    let mut client = TestClient::connect_to(&t.server).await.unwrap();
    client.bind_receiver(1).await;

    let mut submit = SUBMIT_SM_SEQ_2.to_vec();
    submit[15] = 7;
    client.send(&submit).await;

    // submit_sm_resp with ESME_RINVBNDSTS and an empty message_id
    let resp = client.read_pdu_bytes().await;
    assert_eq!(
        bytes_as_string(&resp),
        bytes_as_string(
            b"\x00\x00\x00\x11\x80\x00\x00\x04\x00\x00\x00\x04\
            \x00\x00\x00\x07\0"
        )
    );
}

#[tokio::test]
async fn submit_before_binding_is_rejected() {
    let t = TestSetup::new().await;
    let mut client = TestClient::connect_to(&t.server).await.unwrap();

    client.send(SUBMIT_SM_SEQ_2).await;

    let resp = client.read_pdu_bytes().await;
    assert_eq!(
        bytes_as_string(&resp),
        bytes_as_string(
            b"\x00\x00\x00\x11\x80\x00\x00\x04\x00\x00\x00\x04\
            \x00\x00\x00\x02\0"
        )
    );
}

#[tokio::test]
async fn ucs2_submit_is_decoded_before_queueing() {
    let t = TestSetup::new().await;
    let mut client = TestClient::connect_to(&t.server).await.unwrap();
    client.bind_transceiver(1).await;

    // data_coding=0x08 (UCS2), short_message = "hé" as UTF-16BE
    client
        .send(
            b"\x00\x00\x00\x2b\x00\x00\x00\x04\x00\x00\x00\x00\
            \x00\x00\x00\x02\
            \0\x00\x00111\0\x00\x00222\0\x00\x00\x00\0\0\x00\x00\x08\x00\
            \x04\x00\x68\x00\xe9",
        )
        .await;
    let resp = client.read_pdu_bytes().await;
    assert_eq!(resp.len(), 0x21);

    let sms = t.server.smsc.receive_sms().await.unwrap();
    assert_eq!(sms.message, "h\u{e9}");
}
