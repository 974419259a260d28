use once_cell::sync::Lazy;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, Duration};

use smsc::async_result::AsyncResult;
use smsc::smsc::{AllowAllLogic, Smsc, SmscConfig, SmscLogic};

static INIT_LOGGING: Lazy<()> = Lazy::new(|| {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
});

/// Setup for running tests that send and receive PDUs
pub struct TestSetup {
    pub server: TestServer,
}

#[allow(dead_code)]
impl TestSetup {
    pub async fn new() -> Self {
        let server = TestServer::start().await.unwrap();
        Self { server }
    }

    pub async fn new_with_logic<L: SmscLogic + 'static>(
        smsc_logic: L,
    ) -> Self {
        let server =
            TestServer::start_with_logic(smsc_logic).await.unwrap();
        Self { server }
    }

    /// Connect a fresh client, send `input` and assert that exactly
    /// `expected_output` comes back.
    pub async fn send_and_expect_response(
        &self,
        input: &[u8],
        expected_output: &[u8],
    ) -> TestClient {
        let mut client = TestClient::connect_to(&self.server).await.unwrap();
        client.send(input).await;

        let resp = client.read_n(expected_output.len()).await;
        assert_eq!(bytes_as_string(&resp), bytes_as_string(expected_output));
        client
    }
}

/// A test server listening on an ephemeral local port
pub struct TestServer {
    pub smsc: Arc<Smsc>,
    pub bind_address: String,
}

#[allow(dead_code)]
impl TestServer {
    pub fn config() -> SmscConfig {
        SmscConfig {
            host: String::from("127.0.0.1"),
            port: 0,
            system_id: String::from("TestServer"),
            max_open_sockets: 10,
            enquire_link_timeout: 30,
            response_timeout: 2,
            max_delivery_retries: 3,
            retry_backoff: 1,
        }
    }

    pub async fn start() -> AsyncResult<TestServer> {
        Self::start_with_logic(AllowAllLogic {}).await
    }

    pub async fn start_with_logic<L: SmscLogic + 'static>(
        smsc_logic: L,
    ) -> AsyncResult<TestServer> {
        Self::start_with_config(Self::config(), smsc_logic).await
    }

    pub async fn start_with_config<L: SmscLogic + 'static>(
        config: SmscConfig,
        smsc_logic: L,
    ) -> AsyncResult<TestServer> {
        Lazy::force(&INIT_LOGGING);
        let smsc = Smsc::start(config, smsc_logic).await?;
        let bind_address = smsc.local_addr().to_string();
        Ok(TestServer { smsc, bind_address })
    }
}

/// A client that is able to connect to the server
pub struct TestClient {
    pub stream: TcpStream,
}

#[allow(dead_code)]
impl TestClient {
    pub async fn connect_to(server: &TestServer) -> AsyncResult<TestClient> {
        // Connect to the server, retrying with 10ms delay if we fail
        let mut i: u8 = 0;
        loop {
            match TcpStream::connect(&server.bind_address).await {
                Ok(stream) => return Ok(TestClient { stream }),
                Err(e) => {
                    i += 1;
                    sleep(Duration::from_millis(10)).await;
                    if i > 9 {
                        return Err(e.into());
                    }
                }
            }
        }
    }

    pub async fn send(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).await.unwrap();
    }

    pub async fn read_n_maybe(
        &mut self,
        n: usize,
    ) -> Result<Vec<u8>, io::Error> {
        let mut bytes: Vec<u8> = Vec::with_capacity(n);

        while bytes.len() < n {
            bytes.push(self.stream.read_u8().await?);
        }
        Ok(bytes)
    }

    pub async fn read_n(&mut self, n: usize) -> Vec<u8> {
        self.read_n_maybe(n)
            .await
            .unwrap_or_else(|e| match e.kind() {
                io::ErrorKind::UnexpectedEof => {
                    panic!("Error: Not enough bytes to read.")
                }
                _ => panic!("Error while reading: {}", e),
            })
    }

    /// Read one complete PDU: the 4 length bytes, then the rest
    pub async fn read_pdu_bytes(&mut self) -> Vec<u8> {
        let mut bytes = self.read_n(4).await;
        let length = u32::from_be_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3],
        ]) as usize;
        let mut rest = self.read_n(length - 4).await;
        bytes.append(&mut rest);
        bytes
    }

    /// Bind as a transceiver with the given sequence number, asserting
    /// the bind succeeds
    pub async fn bind_transceiver(&mut self, sequence_number: u8) {
        let mut bind = b"\x00\x00\x00\x29\x00\x00\x00\x09\
\x00\x00\x00\x00\x00\x00\x00\x00esmeid\0password\0type\0\x34\x00\x00\0"
            .to_vec();
        bind[15] = sequence_number;
        self.send(&bind).await;

        let mut expected = b"\x00\x00\x00\x1b\x80\x00\x00\x09\
\x00\x00\x00\x00\x00\x00\x00\x00TestServer\0"
            .to_vec();
        expected[15] = sequence_number;
        let resp = self.read_n(expected.len()).await;
        assert_eq!(bytes_as_string(&resp), bytes_as_string(&expected));
    }

    /// Bind as a receiver with the given sequence number
    pub async fn bind_receiver(&mut self, sequence_number: u8) {
        let mut bind = b"\x00\x00\x00\x29\x00\x00\x00\x01\
\x00\x00\x00\x00\x00\x00\x00\x00esmeid\0password\0type\0\x34\x00\x00\0"
            .to_vec();
        bind[15] = sequence_number;
        self.send(&bind).await;

        let mut expected = b"\x00\x00\x00\x1b\x80\x00\x00\x01\
\x00\x00\x00\x00\x00\x00\x00\x00TestServer\0"
            .to_vec();
        expected[15] = sequence_number;
        let resp = self.read_n(expected.len()).await;
        assert_eq!(bytes_as_string(&resp), bytes_as_string(&expected));
    }

    /// Bind as a transmitter with the given sequence number
    pub async fn bind_transmitter(&mut self, sequence_number: u8) {
        let mut bind = b"\x00\x00\x00\x29\x00\x00\x00\x02\
\x00\x00\x00\x00\x00\x00\x00\x00esmeid\0password\0type\0\x34\x00\x00\0"
            .to_vec();
        bind[15] = sequence_number;
        self.send(&bind).await;

        let mut expected = b"\x00\x00\x00\x1b\x80\x00\x00\x02\
\x00\x00\x00\x00\x00\x00\x00\x00TestServer\0"
            .to_vec();
        expected[15] = sequence_number;
        let resp = self.read_n(expected.len()).await;
        assert_eq!(bytes_as_string(&resp), bytes_as_string(&expected));
    }
}

#[allow(dead_code)]
pub fn bytes_as_string(arr: &[u8]) -> String {
    arr.iter()
        .map(|x| format!("{:>02x}", x))
        .collect::<Vec<String>>()
        .join("")
}
