use clap::Parser;

/// Short Message Service Centre (SMSC): SMPP v3.4 server
#[derive(Parser, Clone, Debug)]
#[clap(name = "smsc")]
pub struct SmscConfig {
    /// Address to listen on
    #[clap(long, default_value = "0.0.0.0")]
    pub host: String,

    /// TCP port to listen on
    #[clap(short, long, default_value = "2775")]
    pub port: u16,

    /// system_id presented by this SMSC in bind responses
    #[clap(short, long, default_value = "SMSC")]
    pub system_id: String,

    /// Maximum number of sockets that can be open
    #[clap(short, long, default_value = "100")]
    pub max_open_sockets: usize,

    /// Seconds of inactivity before an enquire_link is sent
    #[clap(long, default_value = "30")]
    pub enquire_link_timeout: u64,

    /// Seconds to wait for a response to a request we issued
    #[clap(long, default_value = "10")]
    pub response_timeout: u64,

    /// Delivery attempts before an outgoing message is failed
    #[clap(long, default_value = "3")]
    pub max_delivery_retries: u32,

    /// Seconds to wait after a failed delivery attempt
    #[clap(long, default_value = "1")]
    pub retry_backoff: u64,
}

impl SmscConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
